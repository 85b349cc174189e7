use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// TTL of a "stay logged in" session while connected, seconds
    pub persist_ttl_secs: u64,
    /// TTL of a temporary session while connected, seconds
    pub temp_ttl_secs: u64,
    /// Shortened TTL applied once the client disconnects, seconds
    pub idle_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            persist_ttl_secs: 30 * 24 * 3600,
            temp_ttl_secs: 24 * 3600,
            idle_ttl_secs: 15 * 60,
        }
    }
}

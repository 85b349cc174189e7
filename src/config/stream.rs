use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StreamConfig {
    /// Application-level ping period for idle connections, milliseconds
    pub keepalive_interval_ms: u64,
    /// Transport liveness poll period, milliseconds
    pub liveness_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            keepalive_interval_ms: 15_000,
            liveness_interval_ms: 2_000,
        }
    }
}

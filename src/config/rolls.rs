use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RollsConfig {
    /// Bounded hand-off depth between the die generator and consumers;
    /// the producer suspends once this many dice are queued.
    pub buffer_depth: usize,
}

impl Default for RollsConfig {
    fn default() -> Self {
        RollsConfig { buffer_depth: 64 }
    }
}

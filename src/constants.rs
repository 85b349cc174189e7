// -
// Pub/sub channel and history-key namespaces

/// Prefix for all update channels
pub(crate) const UPDATE_CHANNEL_PREFIX: &str = "update";

/// Prefix for the per-game ordered event collection
pub(crate) const HISTORY_KEY_PREFIX: &str = "history";

/// Filter token matching every game master
pub const GM_FILTER_TOKEN: &str = "gms";

/// Leading marker of a filtered pub/sub payload
pub(crate) const FILTER_MARKER: char = '-';

/// Broadcast channel for a game: every connected player receives it.
pub fn broadcast_channel(game_id: &str) -> String {
    format!("{}:{}", UPDATE_CHANNEL_PREFIX, game_id)
}

/// Private channel for one (game, player) pair.
pub fn player_channel(
    game_id: &str,
    player_id: &str,
) -> String {
    format!("{}:{}:{}", UPDATE_CHANNEL_PREFIX, game_id, player_id)
}

/// GM-only channel for a game.
pub fn gm_channel(game_id: &str) -> String {
    format!("{}:{}:{}", UPDATE_CHANNEL_PREFIX, game_id, GM_FILTER_TOKEN)
}

/// Key of a game's ordered event history.
pub fn history_key(game_id: &str) -> String {
    format!("{}:{}", HISTORY_KEY_PREFIX, game_id)
}

// -
// TUID layout

/// Low bits of an event id carrying random noise
pub(crate) const TUID_NOISE_BITS: u32 = 16;

/// Wall-clock truncation interval for the high bits, in milliseconds
pub(crate) const TUID_INTERVAL_MILLIS: i64 = 10;

// -
// Dice

/// A die counts as a hit at this value or above
pub(crate) const HIT_THRESHOLD: u8 = 5;

/// Largest multiple of 6 that fits a byte; higher raw bytes are rejected
/// so that `byte % 6` stays uniform.
pub(crate) const DIE_BYTE_BOUND: u8 = 252;

/// Raw bytes drawn from the random source per refill
pub(crate) const RAW_CHUNK_SIZE: usize = 64;

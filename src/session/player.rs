use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

/// How a player's online indicator is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnlineMode {
    /// Online iff at least one live connection is open
    Auto,
    /// Pinned online
    Online,
    /// Pinned offline
    Offline,
}

/// A player profile within a game.
///
/// `connection_count` is owned by the delivery-loop lifecycle and mutated
/// only via the player store's atomic increment, never written directly by
/// clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Display hue, degrees on the color wheel
    pub hue: u16,
    pub username: String,
    #[serde(default)]
    pub connection_count: i64,
    pub online_mode: OnlineMode,
}

impl Player {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Player {
            id: nanoid::nanoid!(),
            name: name.into(),
            hue: rand::thread_rng().gen_range(0..360),
            username: username.into(),
            connection_count: 0,
            online_mode: OnlineMode::Auto,
        }
    }

    pub fn is_online(&self) -> bool {
        match self.online_mode {
            OnlineMode::Auto => self.connection_count > 0,
            OnlineMode::Online => true,
            OnlineMode::Offline => false,
        }
    }
}

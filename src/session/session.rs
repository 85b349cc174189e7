use serde::Deserialize;
use serde::Serialize;

use super::Player;

/// An authenticated client session.
///
/// Stored with a time-to-live: refreshed to the full persist TTL while a
/// live subscription is open, shortened to the idle TTL once the client
/// disconnects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub game_id: String,
    pub player_id: String,
    /// Whether the client asked to stay logged in across restarts
    pub persist: bool,
    pub username: String,
}

impl Session {
    pub fn new(
        game_id: impl Into<String>,
        player: &Player,
        persist: bool,
    ) -> Self {
        Session {
            id: nanoid::nanoid!(),
            game_id: game_id.into(),
            player_id: player.id.clone(),
            persist,
            username: player.username.clone(),
        }
    }
}

/// Result of resolving a session token: the session plus the player's GM
/// standing within the session's game.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAuth {
    pub session: Session,
    pub is_gm: bool,
}

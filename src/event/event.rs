//! The immutable, ordered game event and its variants.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::Share;
use crate::id;
use crate::session::Player;

/// One entry in a game's ordered history.
///
/// The core (`id`, `player_id`, `player_name`, variant payload) is
/// immutable once created; `share` and `edit` change only through the
/// explicit event-store update operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// TUID: monotonic-ish timestamp id, unique within a game, doubles as
    /// the history sort score. Never changes.
    pub id: i64,

    /// 0 until first edit; epoch millis of the last modification after.
    #[serde(default)]
    pub edit: i64,

    pub share: Share,

    /// Denormalized author identity at creation time
    #[serde(rename = "pID")]
    pub player_id: String,
    #[serde(rename = "pName")]
    pub player_name: String,

    #[serde(flatten)]
    pub kind: EventKind,
}

/// Closed set of event variants, discriminated by the `ty` field so the
/// wire form is dispatchable on a single tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ty", rename_all = "camelCase")]
pub enum EventKind {
    Roll {
        title: String,
        dice: Vec<u8>,
    },
    EdgeRoll {
        title: String,
        rounds: Vec<Vec<u8>>,
    },
    Reroll {
        title: String,
        rounds: Vec<Vec<u8>>,
    },
    InitiativeRoll {
        title: String,
        base: i32,
        dice: Vec<u8>,
        seized: bool,
        blitzed: bool,
    },
    PlayerJoin,
}

impl Event {
    /// Build a fresh event authored by `player`, with a newly generated id
    /// and a zero edit stamp.
    pub fn new(
        player: &Player,
        share: Share,
        kind: EventKind,
    ) -> Self {
        Event {
            id: id::generate(),
            edit: 0,
            share,
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            kind,
        }
    }

    /// The event with `diff`'s keys overlaid onto its JSON object form.
    /// Field validity is the caller's concern; this only fails when the
    /// patched object no longer deserializes as an event.
    pub(crate) fn with_diff(
        &self,
        diff: &Map<String, Value>,
    ) -> std::result::Result<Event, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut value {
            for (key, patch) in diff {
                fields.insert(key.clone(), patch.clone());
            }
        }
        serde_json::from_value(value)
    }
}

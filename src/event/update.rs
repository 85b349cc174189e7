//! Outbound change notifications.
//!
//! An [`Update`] serializes as a compact JSON array with a leading type
//! tag (`["+evt", {...}]`), so a receiver can dispatch on the first
//! element without parsing the whole payload. Decoding goes through one
//! tag-match; no per-call-site type probing.

use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::Value;

use super::Event;
use super::Share;
use crate::session::Player;

/// A tagged notification describing a change to an event or a player.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    NewEvent(Event),
    EventDiff { id: i64, diff: Value, edit: i64 },
    EventShareChange { id: i64, share: Share },
    EventDelete { id: i64 },
    PlayerAdd(Player),
    PlayerDiff { id: String, diff: Value },
    PlayerOnlineChange { id: String, online: bool },
}

impl Update {
    /// Leading wire tag of this update.
    pub fn tag(&self) -> &'static str {
        match self {
            Update::NewEvent(_) => "+evt",
            Update::EventDiff { .. } => "~evt",
            Update::EventShareChange { .. } => "shr",
            Update::EventDelete { .. } => "-evt",
            Update::PlayerAdd(_) => "+plr",
            Update::PlayerDiff { .. } => "~plr",
            Update::PlayerOnlineChange { .. } => "onl",
        }
    }
}

impl Serialize for Update {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        match self {
            Update::NewEvent(event) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(event)?;
                seq.end()
            }
            Update::EventDiff { id, diff, edit } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(id)?;
                seq.serialize_element(diff)?;
                seq.serialize_element(edit)?;
                seq.end()
            }
            Update::EventShareChange { id, share } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(id)?;
                seq.serialize_element(share)?;
                seq.end()
            }
            Update::EventDelete { id } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(id)?;
                seq.end()
            }
            Update::PlayerAdd(player) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(player)?;
                seq.end()
            }
            Update::PlayerDiff { id, diff } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(id)?;
                seq.serialize_element(diff)?;
                seq.end()
            }
            Update::PlayerOnlineChange { id, online } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(id)?;
                seq.serialize_element(online)?;
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Update {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_tagged(value).map_err(de::Error::custom)
    }
}

/// The single decode-by-tag dispatch point for the update wire format.
fn decode_tagged(value: Value) -> std::result::Result<Update, String> {
    let Value::Array(items) = value else {
        return Err("update payload is not an array".into());
    };
    let tag = items
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| "update payload missing leading tag".to_string())?
        .to_string();

    fn field<T: serde::de::DeserializeOwned>(
        items: &[Value],
        index: usize,
        tag: &str,
    ) -> std::result::Result<T, String> {
        let raw = items
            .get(index)
            .cloned()
            .ok_or_else(|| format!("update {:?} missing element {}", tag, index))?;
        serde_json::from_value(raw).map_err(|e| format!("update {:?} element {}: {}", tag, index, e))
    }

    match tag.as_str() {
        "+evt" => Ok(Update::NewEvent(field(&items, 1, &tag)?)),
        "~evt" => Ok(Update::EventDiff {
            id: field(&items, 1, &tag)?,
            diff: field(&items, 2, &tag)?,
            edit: field(&items, 3, &tag)?,
        }),
        "shr" => Ok(Update::EventShareChange {
            id: field(&items, 1, &tag)?,
            share: field(&items, 2, &tag)?,
        }),
        "-evt" => Ok(Update::EventDelete { id: field(&items, 1, &tag)? }),
        "+plr" => Ok(Update::PlayerAdd(field(&items, 1, &tag)?)),
        "~plr" => Ok(Update::PlayerDiff {
            id: field(&items, 1, &tag)?,
            diff: field(&items, 2, &tag)?,
        }),
        "onl" => Ok(Update::PlayerOnlineChange {
            id: field(&items, 1, &tag)?,
            online: field(&items, 2, &tag)?,
        }),
        other => Err(format!("unknown update tag {:?}", other)),
    }
}

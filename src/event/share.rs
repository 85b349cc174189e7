//! Event visibility classes and the authorization predicate.

use std::fmt;

use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use super::Event;

/// Visibility class of an event. Serialized as its integer discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Share {
    /// Everyone in the game
    InGame,
    /// Author only
    Private,
    /// Author plus any game master
    GMs,
}

impl Share {
    pub fn discriminant(self) -> u8 {
        match self {
            Share::InGame => 0,
            Share::Private => 1,
            Share::GMs => 2,
        }
    }

    pub fn from_discriminant(value: u8) -> Option<Share> {
        match value {
            0 => Some(Share::InGame),
            1 => Some(Share::Private),
            2 => Some(Share::GMs),
            _ => None,
        }
    }

    /// All known shares, in discriminant order.
    pub const ALL: [Share; 3] = [Share::InGame, Share::Private, Share::GMs];
}

impl fmt::Display for Share {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Share::InGame => "in-game",
            Share::Private => "private",
            Share::GMs => "gms",
        };
        write!(f, "{}", name)
    }
}

impl Serialize for Share {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.discriminant())
    }
}

impl<'de> Deserialize<'de> for Share {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Share::from_discriminant(value)
            .ok_or_else(|| de::Error::custom(format!("unknown share discriminant {}", value)))
    }
}

/// Whether `viewer_id` may see `event` under its current share.
///
/// Authors always see their own events regardless of share.
pub fn can_see(
    viewer_id: &str,
    is_gm: bool,
    event: &Event,
) -> bool {
    match event.share {
        Share::InGame => true,
        Share::Private => viewer_id == event.player_id,
        Share::GMs => is_gm || viewer_id == event.player_id,
    }
}

//! Share/visibility packet engine.
//!
//! Computes, for every event mutation, the minimal non-duplicating set of
//! `{channel, filter, update}` packets so each viewer ends up with exactly
//! one notification reflecting the new truth. The author's own private
//! channel always receives a lightweight share diff across transitions,
//! never a delete + recreate — the author never loses visibility, and the
//! public packets are all filtered to exclude the author.

use crate::constants::broadcast_channel;
use crate::constants::gm_channel;
use crate::constants::player_channel;
use crate::constants::GM_FILTER_TOKEN;
use crate::errors::Error;
use crate::errors::Result;
use crate::event::Event;
use crate::event::Share;
use crate::event::Update;

/// One unit of outbound notification work: publish `update` on `channel`,
/// but receivers matching `filter` must suppress it.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub channel: String,
    pub filter: Vec<String>,
    pub update: Update,
}

impl Packet {
    pub fn new(
        channel: String,
        update: Update,
    ) -> Self {
        Packet {
            channel,
            filter: Vec::new(),
            update,
        }
    }

    pub fn with_filter(
        channel: String,
        filter: Vec<String>,
        update: Update,
    ) -> Self {
        Packet { channel, filter, update }
    }

    /// The wire payload: filter prefix plus update JSON.
    pub fn encode(&self) -> std::result::Result<String, serde_json::Error> {
        let body = serde_json::to_string(&self.update)?;
        Ok(super::encode_filter(&self.filter, &body))
    }
}

/// Channels an `update` targeting `share` must reach on a plain create or
/// delete. `GMs` goes to the GM channel with the author filtered out (the
/// author already sees their own private channel) plus the author's
/// private channel.
fn targeted(
    game_id: &str,
    event: &Event,
    share: Share,
    update: Update,
) -> Vec<Packet> {
    let author = &event.player_id;
    match share {
        Share::InGame => vec![Packet::new(broadcast_channel(game_id), update)],
        Share::Private => vec![Packet::new(player_channel(game_id, author), update)],
        Share::GMs => vec![
            Packet::with_filter(gm_channel(game_id), vec![author.clone()], update.clone()),
            Packet::new(player_channel(game_id, author), update),
        ],
    }
}

/// Packets implied by creating `event` under its current share.
pub fn creation_packets(
    game_id: &str,
    event: &Event,
) -> Vec<Packet> {
    targeted(game_id, event, event.share, Update::NewEvent(event.clone()))
}

/// Packets implied by deleting `event` (tombstone notification).
pub fn deletion_packets(
    game_id: &str,
    event: &Event,
) -> Vec<Packet> {
    targeted(game_id, event, event.share, Update::EventDelete { id: event.id })
}

/// Packets for a field edit of `event` (already patched and edit-stamped),
/// targeting its current share channels.
pub fn diff_packets(
    game_id: &str,
    event: &Event,
    diff: serde_json::Value,
) -> Vec<Packet> {
    let update = Update::EventDiff {
        id: event.id,
        diff,
        edit: event.edit,
    };
    targeted(game_id, event, event.share, update)
}

/// Packets for re-sharing `event` from its current share to `new_share`.
///
/// Must be computed *before* the new share is persisted, while the old
/// channel set is still known. Each of the four transition shapes emits
/// what a naive delete-then-recreate would miss or duplicate.
pub fn transition_packets(
    game_id: &str,
    event: &Event,
    new_share: Share,
) -> Result<Vec<Packet>> {
    let old_share = event.share;
    if old_share == new_share {
        return Err(Error::bad_request(format!("event {} already shared {}", event.id, new_share)));
    }

    let author = event.player_id.clone();
    let share_change = Update::EventShareChange {
        id: event.id,
        share: new_share,
    };
    // The public packets below all filter out the author, so this is the
    // author's only notification of the transition.
    let private_diff = Packet::new(player_channel(game_id, &author), share_change.clone());
    let delete = Update::EventDelete { id: event.id };
    let create = {
        let mut reshared = event.clone();
        reshared.share = new_share;
        Update::NewEvent(reshared)
    };

    let packets = match (old_share, new_share) {
        (Share::InGame, Share::Private) => vec![
            Packet::with_filter(broadcast_channel(game_id), vec![author], delete),
            private_diff,
        ],
        (Share::GMs, Share::Private) => vec![
            Packet::with_filter(gm_channel(game_id), vec![author], delete),
            private_diff,
        ],
        (Share::Private, Share::InGame) => vec![
            Packet::with_filter(broadcast_channel(game_id), vec![author], create),
            private_diff,
        ],
        (Share::Private, Share::GMs) => vec![
            Packet::with_filter(gm_channel(game_id), vec![author], create),
            private_diff,
        ],
        (Share::GMs, Share::InGame) => vec![
            Packet::with_filter(gm_channel(game_id), vec![author.clone()], share_change),
            private_diff,
            Packet::with_filter(broadcast_channel(game_id), vec![author], create),
        ],
        (Share::InGame, Share::GMs) => vec![
            Packet::with_filter(
                broadcast_channel(game_id),
                vec![GM_FILTER_TOKEN.to_string(), author.clone()],
                delete,
            ),
            Packet::with_filter(gm_channel(game_id), vec![author], share_change),
            private_diff,
        ],
        // old == new rejected above
        (old, new) => {
            return Err(Error::Fatal(format!("unhandled share transition {} -> {}", old, new)))
        }
    };
    Ok(packets)
}

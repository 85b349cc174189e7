//! Event-store operations.
//!
//! Every mutation is one atomic transaction against the backing store
//! that also carries the notification packets computed by the packet
//! engine. Reported mutation counts are verified against expectations;
//! a mismatch surfaces as a hard error instead of propagating corrupted
//! state.

use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::error;

use crate::constants::broadcast_channel;
use crate::constants::history_key;
use crate::errors::Error;
use crate::errors::Result;
use crate::errors::StoreError;
use crate::event::Event;
use crate::event::Share;
use crate::event::Update;
use crate::metrics::EVENTS_POSTED;
use crate::metrics::PACKETS_PUBLISHED;
use crate::session::Player;
use crate::store::Store;
use crate::store::Transaction;
use crate::utils::time;

use super::packets;
use super::Packet;

/// Event fields a diff may not touch; they are immutable or owned by the
/// store's own update paths.
const IMMUTABLE_EVENT_FIELDS: [&str; 6] = ["id", "ty", "pID", "pName", "share", "edit"];

/// CRUD over per-game ordered event collections.
pub struct EventStore {
    store: Arc<dyn Store>,
}

impl EventStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        EventStore { store }
    }

    /// Append `event` to the game history and notify the channels its
    /// share implies. Fails whole if the insert did not add exactly one
    /// entry (id collision or duplicate submission).
    pub async fn post(
        &self,
        game_id: &str,
        event: &Event,
    ) -> Result<()> {
        let body = serde_json::to_string(event).map_err(StoreError::Serde)?;
        let mut tx = Transaction::new();
        tx.history_add(history_key(game_id), event.id, body);
        queue_packets(&mut tx, packets::creation_packets(game_id, event))?;
        self.run(tx).await?;
        EVENTS_POSTED.inc();
        debug!(game_id, event_id = event.id, share = %event.share, "event posted");
        Ok(())
    }

    /// Remove `event` from the game history and emit tombstone packets.
    /// Fails whole if exactly one entry was not removed.
    pub async fn delete(
        &self,
        game_id: &str,
        event: &Event,
    ) -> Result<()> {
        let mut tx = Transaction::new();
        tx.history_remove(history_key(game_id), event.id);
        queue_packets(&mut tx, packets::deletion_packets(game_id, event))?;
        self.run(tx).await?;
        debug!(game_id, event_id = event.id, "event deleted");
        Ok(())
    }

    /// Patch `event`'s variant payload fields, stamping a fresh edit time.
    ///
    /// The backing store has no atomic "replace value at existing score",
    /// so the entry is removed and re-added inside one transaction.
    /// Returns the patched event.
    pub async fn update_fields(
        &self,
        game_id: &str,
        event: &Event,
        diff: &Map<String, Value>,
    ) -> Result<Event> {
        if diff.is_empty() {
            return Err(Error::bad_request("empty event diff"));
        }
        for field in IMMUTABLE_EVENT_FIELDS {
            if diff.contains_key(field) {
                return Err(Error::bad_request(format!("event field {:?} is immutable", field)));
            }
        }

        let mut updated = event.with_diff(diff).map_err(StoreError::Serde)?;
        updated.edit = time::now_millis();

        let body = serde_json::to_string(&updated).map_err(StoreError::Serde)?;
        let key = history_key(game_id);
        let mut tx = Transaction::new();
        tx.history_remove(key.clone(), event.id);
        tx.history_add(key, updated.id, body);
        queue_packets(
            &mut tx,
            packets::diff_packets(game_id, &updated, Value::Object(diff.clone())),
        )?;
        self.run(tx).await?;
        debug!(game_id, event_id = event.id, "event fields updated");
        Ok(updated)
    }

    /// Re-share `event` as `new_share`, notifying exactly the viewers
    /// whose visibility changes. A no-op change (old == new) is rejected
    /// so callers can treat it as idempotent-but-invalid rather than
    /// silently succeeding twice.
    pub async fn update_share(
        &self,
        game_id: &str,
        event: &Event,
        new_share: Share,
    ) -> Result<Event> {
        // Packets are computed before the new share is persisted, while
        // the old channel set is still known.
        let transition = packets::transition_packets(game_id, event, new_share)?;

        let mut updated = event.clone();
        updated.share = new_share;
        let body = serde_json::to_string(&updated).map_err(StoreError::Serde)?;

        let key = history_key(game_id);
        let mut tx = Transaction::new();
        tx.history_remove(key.clone(), event.id);
        tx.history_add(key, updated.id, body);
        queue_packets(&mut tx, transition)?;
        self.run(tx).await?;
        debug!(
            game_id,
            event_id = event.id,
            old = %event.share,
            new = %new_share,
            "event re-shared"
        );
        Ok(updated)
    }

    /// Announce a player joining the game on the broadcast channel.
    pub async fn announce_player(
        &self,
        game_id: &str,
        player: &Player,
    ) -> Result<()> {
        self.publish_one(game_id, Update::PlayerAdd(player.clone())).await
    }

    /// Announce a player profile change on the broadcast channel.
    pub async fn announce_player_diff(
        &self,
        game_id: &str,
        player_id: &str,
        diff: Value,
    ) -> Result<()> {
        self.publish_one(
            game_id,
            Update::PlayerDiff {
                id: player_id.to_string(),
                diff,
            },
        )
        .await
    }

    async fn publish_one(
        &self,
        game_id: &str,
        update: Update,
    ) -> Result<()> {
        let mut tx = Transaction::new();
        queue_packets(&mut tx, vec![Packet::new(broadcast_channel(game_id), update)])?;
        self.run(tx).await?;
        Ok(())
    }

    async fn run(
        &self,
        tx: Transaction,
    ) -> Result<Vec<i64>> {
        let counts = self.store.exec(tx.clone()).await?;
        if let Err(mismatch) = tx.verify(&counts) {
            error!(%mismatch, ?counts, "store transaction anomaly");
            return Err(mismatch.into());
        }
        Ok(counts)
    }
}

/// Serialize each packet onto the transaction as a publish command.
fn queue_packets(
    tx: &mut Transaction,
    packets: Vec<Packet>,
) -> Result<()> {
    for packet in packets {
        let payload = packet.encode().map_err(StoreError::Serde)?;
        tx.publish(packet.channel, payload);
        PACKETS_PUBLISHED.inc();
    }
    Ok(())
}

//! Backing-store abstraction.
//!
//! The reference deployment backs these traits with Redis; any store
//! offering an ordered, score-addressable collection, atomic
//! multi-command transactions that report per-command result counts, and
//! topic-string pub/sub satisfies them. The bundled [`super::MemStore`]
//! adaptor implements all three in process.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Map;
use serde_json::Value;

#[cfg(test)]
use mockall::automock;

use crate::errors::Result;
use crate::errors::StoreError;
use crate::errors::StreamError;
use crate::session::Player;
use crate::session::Session;
use crate::session::SessionAuth;

/// One message received from a pub/sub subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreMessage {
    pub channel: String,
    pub payload: String,
}

/// Expected result count for one transaction command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// The store must report exactly this count or the whole operation is
    /// treated as a concurrent-modification anomaly.
    Exactly(i64),
    /// Count is informational (e.g. a publish reports its receiver count,
    /// which the writer cannot know in advance).
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TxCommand {
    /// Ordered-collection insert keyed by score; must not overwrite an
    /// existing score (reports 0 on collision).
    HistoryAdd { key: String, score: i64, body: String },
    /// Remove the entry at exactly this score (reports 0 on miss).
    HistoryRemove { key: String, score: i64 },
    Publish { channel: String, payload: String },
}

impl TxCommand {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            TxCommand::HistoryAdd { .. } => "history-add",
            TxCommand::HistoryRemove { .. } => "history-remove",
            TxCommand::Publish { .. } => "publish",
        }
    }
}

/// An ordered list of commands executed atomically by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    commands: Vec<(TxCommand, Expect)>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_add(
        &mut self,
        key: String,
        score: i64,
        body: String,
    ) -> &mut Self {
        self.commands
            .push((TxCommand::HistoryAdd { key, score, body }, Expect::Exactly(1)));
        self
    }

    pub fn history_remove(
        &mut self,
        key: String,
        score: i64,
    ) -> &mut Self {
        self.commands
            .push((TxCommand::HistoryRemove { key, score }, Expect::Exactly(1)));
        self
    }

    pub fn publish(
        &mut self,
        channel: String,
        payload: String,
    ) -> &mut Self {
        self.commands.push((TxCommand::Publish { channel, payload }, Expect::Any));
        self
    }

    pub fn commands(&self) -> &[(TxCommand, Expect)] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Check the store's reported counts against each command's
    /// expectation; the first anomaly surfaces as a hard error with the
    /// offending command attached.
    pub fn verify(
        &self,
        counts: &[i64],
    ) -> std::result::Result<(), StoreError> {
        if counts.len() != self.commands.len() {
            return Err(StoreError::TxTruncated {
                expected: self.commands.len(),
                actual: counts.len(),
            });
        }
        for (index, ((command, expect), actual)) in self.commands.iter().zip(counts).enumerate() {
            if let Expect::Exactly(expected) = expect {
                if expected != actual {
                    return Err(StoreError::TxMismatch {
                        command: command.name(),
                        index,
                        expected: *expected,
                        actual: *actual,
                    });
                }
            }
        }
        Ok(())
    }
}

/// A live pub/sub subscription over a fixed channel set. Dropping it
/// unsubscribes.
pub struct Subscription {
    channels: Vec<String>,
    inner: BoxStream<'static, std::result::Result<StoreMessage, StreamError>>,
}

impl Subscription {
    pub fn new(
        channels: Vec<String>,
        inner: BoxStream<'static, std::result::Result<StoreMessage, StreamError>>,
    ) -> Self {
        Subscription { channels, inner }
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Next message; `None` means the upstream feed ended.
    pub async fn recv(&mut self) -> Option<std::result::Result<StoreMessage, StreamError>> {
        self.inner.next().await
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Execute all commands atomically, returning per-command result
    /// counts in command order.
    async fn exec(
        &self,
        tx: Transaction,
    ) -> Result<Vec<i64>>;

    /// Subscribe to a set of channels in one shot; failure leaves no
    /// partial subscription behind.
    async fn subscribe(
        &self,
        channels: Vec<String>,
    ) -> Result<Subscription>;

    /// Ordered event bodies for a game, ascending by id. Reconnecting
    /// clients re-fetch history through this instead of relying on missed
    /// notifications.
    async fn history(
        &self,
        game_id: &str,
    ) -> Result<Vec<String>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn create(
        &self,
        session: &Session,
    ) -> Result<()>;

    /// Resolve a session token to the session and the player's GM
    /// standing. Expired or unknown tokens surface as not-found.
    async fn resolve(
        &self,
        token: &str,
    ) -> Result<SessionAuth>;

    /// Refresh the session to its full TTL while a live subscription is
    /// open.
    async fn unexpire(
        &self,
        session: &Session,
    ) -> Result<()>;

    /// Drop the session to the short idle TTL once the client disconnects.
    async fn expire_soon(
        &self,
        session: &Session,
    ) -> Result<()>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PlayerStore: Send + Sync + 'static {
    async fn get_by_id(
        &self,
        player_id: &str,
    ) -> Result<Player>;

    /// Atomically add `delta` to the player's connection count, returning
    /// the new count. The count never goes below zero.
    async fn modify_connection_count(
        &self,
        player_id: &str,
        delta: i64,
    ) -> Result<i64>;

    /// Overlay `diff` onto the player's mutable profile fields.
    async fn update(
        &self,
        player_id: &str,
        diff: &Map<String, Value>,
    ) -> Result<()>;

    async fn insert(
        &self,
        player: &Player,
    ) -> Result<()>;
}

//! In-process backing-store adaptor.
//!
//! Backs the store traits with a single-lock ordered map (the lock makes
//! a multi-command transaction atomic), dashmaps for sessions and
//! players, and one broadcast bus filtered per subscription by channel
//! set. The reference backend for tests and embedded deployments; a Redis
//! adaptor implements the same traits out of process.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Map;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::config::SessionConfig;
use crate::constants::history_key;
use crate::errors::Error;
use crate::errors::Result;
use crate::errors::StoreError;
use crate::errors::StreamError;
use crate::session::Player;
use crate::session::Session;
use crate::session::SessionAuth;
use crate::store::PlayerStore;
use crate::store::SessionStore;
use crate::store::Store;
use crate::store::StoreMessage;
use crate::store::Subscription;
use crate::store::Transaction;
use crate::store::TxCommand;

const MEM_BUS_CAPACITY: usize = 256;

/// Player profile fields clients may not patch through a diff.
const IMMUTABLE_PLAYER_FIELDS: [&str; 2] = ["id", "connectionCount"];

struct SessionEntry {
    session: Session,
    deadline: Instant,
}

pub struct MemStore {
    /// history key -> (score -> serialized event); one lock is the
    /// transaction boundary.
    history: Mutex<HashMap<String, BTreeMap<i64, String>>>,
    sessions: DashMap<String, SessionEntry>,
    players: DashMap<String, Player>,
    /// game id -> GM player ids
    gms: DashMap<String, HashSet<String>>,
    bus: broadcast::Sender<StoreMessage>,
    cfg: SessionConfig,
}

impl MemStore {
    pub fn new(cfg: SessionConfig) -> Self {
        let (bus, _) = broadcast::channel(MEM_BUS_CAPACITY);
        MemStore {
            history: Mutex::new(HashMap::new()),
            sessions: DashMap::new(),
            players: DashMap::new(),
            gms: DashMap::new(),
            bus,
            cfg,
        }
    }

    /// Grant GM standing within a game.
    pub fn set_gm(
        &self,
        game_id: &str,
        player_id: &str,
    ) {
        self.gms
            .entry(game_id.to_string())
            .or_default()
            .insert(player_id.to_string());
    }

    pub fn is_gm(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> bool {
        self.gms
            .get(game_id)
            .map(|set| set.contains(player_id))
            .unwrap_or(false)
    }

    fn session_ttl(
        &self,
        session: &Session,
    ) -> Duration {
        if session.persist {
            Duration::from_secs(self.cfg.persist_ttl_secs)
        } else {
            Duration::from_secs(self.cfg.temp_ttl_secs)
        }
    }

    fn apply(
        &self,
        command: &TxCommand,
        history: &mut HashMap<String, BTreeMap<i64, String>>,
    ) -> i64 {
        match command {
            TxCommand::HistoryAdd { key, score, body } => {
                let tree = history.entry(key.clone()).or_default();
                if tree.contains_key(score) {
                    0
                } else {
                    tree.insert(*score, body.clone());
                    1
                }
            }
            TxCommand::HistoryRemove { key, score } => history
                .get_mut(key)
                .and_then(|tree| tree.remove(score))
                .map(|_| 1)
                .unwrap_or(0),
            TxCommand::Publish { channel, payload } => self
                .bus
                .send(StoreMessage {
                    channel: channel.clone(),
                    payload: payload.clone(),
                })
                // No subscribers is not an error; the count is zero.
                .map(|receivers| receivers as i64)
                .unwrap_or(0),
        }
    }
}

#[async_trait]
impl Store for MemStore {
    async fn exec(
        &self,
        tx: Transaction,
    ) -> Result<Vec<i64>> {
        // Holding the history lock across the whole command list is what
        // makes the transaction atomic; none of the commands await.
        let mut history = self.history.lock();
        let counts = tx
            .commands()
            .iter()
            .map(|(command, _expect)| self.apply(command, &mut history))
            .collect();
        Ok(counts)
    }

    async fn subscribe(
        &self,
        channels: Vec<String>,
    ) -> Result<Subscription> {
        if channels.is_empty() {
            return Err(StoreError::Subscribe("empty channel set".to_string()).into());
        }
        let channel_set: HashSet<String> = channels.iter().cloned().collect();
        debug!(?channels, "mem store subscription opened");
        let inner = BroadcastStream::new(self.bus.subscribe())
            .filter_map(move |received| {
                let forwarded = match received {
                    Ok(msg) if channel_set.contains(&msg.channel) => Some(Ok(msg)),
                    Ok(_) => None,
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        Some(Err(StreamError::Lagged(skipped)))
                    }
                };
                futures::future::ready(forwarded)
            })
            .boxed();
        Ok(Subscription::new(channels, inner))
    }

    async fn history(
        &self,
        game_id: &str,
    ) -> Result<Vec<String>> {
        let history = self.history.lock();
        Ok(history
            .get(&history_key(game_id))
            .map(|tree| tree.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SessionStore for MemStore {
    async fn create(
        &self,
        session: &Session,
    ) -> Result<()> {
        let deadline = Instant::now() + self.session_ttl(session);
        self.sessions.insert(
            session.id.clone(),
            SessionEntry {
                session: session.clone(),
                deadline,
            },
        );
        Ok(())
    }

    async fn resolve(
        &self,
        token: &str,
    ) -> Result<SessionAuth> {
        let expired = match self.sessions.get(token) {
            Some(entry) if entry.deadline > Instant::now() => {
                let session = entry.session.clone();
                let is_gm = self.is_gm(&session.game_id, &session.player_id);
                return Ok(SessionAuth { session, is_gm });
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.sessions.remove(token);
        }
        Err(Error::not_found("session", token))
    }

    async fn unexpire(
        &self,
        session: &Session,
    ) -> Result<()> {
        let ttl = self.session_ttl(session);
        match self.sessions.get_mut(&session.id) {
            Some(mut entry) => {
                entry.deadline = Instant::now() + ttl;
                Ok(())
            }
            None => Err(Error::not_found("session", &session.id)),
        }
    }

    async fn expire_soon(
        &self,
        session: &Session,
    ) -> Result<()> {
        match self.sessions.get_mut(&session.id) {
            Some(mut entry) => {
                entry.deadline = Instant::now() + Duration::from_secs(self.cfg.idle_ttl_secs);
                Ok(())
            }
            None => Err(Error::not_found("session", &session.id)),
        }
    }
}

#[async_trait]
impl PlayerStore for MemStore {
    async fn get_by_id(
        &self,
        player_id: &str,
    ) -> Result<Player> {
        self.players
            .get(player_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::not_found("player", player_id))
    }

    async fn modify_connection_count(
        &self,
        player_id: &str,
        delta: i64,
    ) -> Result<i64> {
        match self.players.get_mut(player_id) {
            Some(mut entry) => {
                entry.connection_count = (entry.connection_count + delta).max(0);
                Ok(entry.connection_count)
            }
            None => Err(Error::not_found("player", player_id)),
        }
    }

    async fn update(
        &self,
        player_id: &str,
        diff: &Map<String, Value>,
    ) -> Result<()> {
        for field in IMMUTABLE_PLAYER_FIELDS {
            if diff.contains_key(field) {
                return Err(Error::bad_request(format!("player field {:?} is immutable", field)));
            }
        }
        let mut entry = self
            .players
            .get_mut(player_id)
            .ok_or_else(|| Error::not_found("player", player_id))?;
        let mut value = serde_json::to_value(&*entry).map_err(StoreError::Serde)?;
        if let Value::Object(fields) = &mut value {
            for (key, patch) in diff {
                fields.insert(key.clone(), patch.clone());
            }
        }
        *entry = serde_json::from_value(value).map_err(StoreError::Serde)?;
        Ok(())
    }

    async fn insert(
        &self,
        player: &Player,
    ) -> Result<()> {
        self.players.insert(player.id.clone(), player.clone());
        Ok(())
    }
}

//! Shared fixtures for unit tests.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::SessionConfig;
use crate::errors::Result;
use crate::errors::StreamError;
use crate::event::Event;
use crate::event::EventKind;
use crate::event::Share;
use crate::session::OnlineMode;
use crate::session::Player;
use crate::store::MemStore;
use crate::stream::ClientTransport;

pub fn test_player(
    id: &str,
    name: &str,
) -> Player {
    Player {
        id: id.to_string(),
        name: name.to_string(),
        hue: 120,
        username: name.to_lowercase(),
        connection_count: 0,
        online_mode: OnlineMode::Auto,
    }
}

pub fn roll_event(
    player: &Player,
    share: Share,
    dice: Vec<u8>,
) -> Event {
    Event::new(
        player,
        share,
        EventKind::Roll {
            title: "test roll".to_string(),
            dice,
        },
    )
}

pub fn mem_store() -> Arc<MemStore> {
    Arc::new(MemStore::new(SessionConfig::default()))
}

/// Transport double recording every frame over a channel.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<String>,
    pings: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

/// Observer half of a [`ChannelTransport`].
pub struct TransportHandle {
    pub rx: mpsc::UnboundedReceiver<String>,
    pub pings: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
}

impl ChannelTransport {
    pub fn new() -> (Self, TransportHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pings = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        (
            ChannelTransport {
                tx,
                pings: pings.clone(),
                closed: closed.clone(),
            },
            TransportHandle { rx, pings, closed },
        )
    }
}

#[async_trait]
impl ClientTransport for ChannelTransport {
    async fn send_update(
        &mut self,
        body: &str,
    ) -> Result<()> {
        if self.is_closed() {
            return Err(StreamError::TransportClosed.into());
        }
        self.tx
            .send(body.to_string())
            .map_err(|_| StreamError::TransportClosed.into())
    }

    async fn ping(&mut self) -> Result<()> {
        if self.is_closed() {
            return Err(StreamError::TransportClosed.into());
        }
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

//! Per-connection subscription/delivery loop.
//!
//! One long-lived task per connected client: subscribes to the client's
//! channel set, applies the exclusion filter, forwards decoded payloads
//! to the client transport, keeps the session alive, and tracks
//! online/offline transitions. Cleanup runs exactly once on every exit
//! path, in order, even when an earlier step failed partway.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::config::StreamConfig;
use crate::constants::broadcast_channel;
use crate::constants::gm_channel;
use crate::constants::player_channel;
use crate::errors::Error;
use crate::errors::Result;
use crate::errors::StreamError;
use crate::event::Update;
use crate::history::decode_filter;
use crate::history::filter_excludes;
use crate::history::Packet;
use crate::metrics::OPEN_STREAMS;
use crate::session::OnlineMode;
use crate::session::Session;
use crate::store::PlayerStore;
use crate::store::SessionStore;
use crate::store::Store;
use crate::store::Subscription;
use crate::store::Transaction;
use crate::stream::ClientTransport;

/// Shared collaborators of every delivery loop.
pub struct StreamContext {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<dyn SessionStore>,
    pub players: Arc<dyn PlayerStore>,
    pub cfg: StreamConfig,
}

/// Run one client's delivery loop until the transport closes, the
/// upstream subscription fails, or `cancel` fires.
///
/// A subscription that cannot be established fails the whole connection
/// attempt; nothing is half-set-up at that point, so no cleanup runs.
pub async fn run_client_stream(
    ctx: &StreamContext,
    session: &Session,
    is_gm: bool,
    transport: &mut dyn ClientTransport,
    cancel: CancellationToken,
) -> Result<()> {
    let mut channels = vec![
        broadcast_channel(&session.game_id),
        player_channel(&session.game_id, &session.player_id),
    ];
    if is_gm {
        channels.push(gm_channel(&session.game_id));
    }
    let mut subscription = ctx.store.subscribe(channels).await?;
    OPEN_STREAMS.inc();
    debug!(
        game_id = %session.game_id,
        player_id = %session.player_id,
        is_gm,
        "client stream connected"
    );

    let mut counted = false;
    let setup: Result<()> = async {
        let count = ctx.players.modify_connection_count(&session.player_id, 1).await?;
        counted = true;
        let player = ctx.players.get_by_id(&session.player_id).await?;
        if count == 1 && player.online_mode == OnlineMode::Auto {
            publish_online(ctx, session, true).await?;
        }
        ctx.sessions.unexpire(session).await?;
        Ok(())
    }
    .await;

    let result = match setup {
        Ok(()) => drive(ctx, session, is_gm, &mut subscription, transport, &cancel).await,
        Err(e) => Err(e),
    };

    // Cleanup, always and in order: connection count down (1 -> 0
    // publishes offline), idle TTL back on the session, unsubscribe.
    if counted {
        match ctx.players.modify_connection_count(&session.player_id, -1).await {
            Ok(0) => {
                let auto = ctx
                    .players
                    .get_by_id(&session.player_id)
                    .await
                    .map(|p| p.online_mode == OnlineMode::Auto)
                    .unwrap_or(false);
                if auto {
                    if let Err(e) = publish_online(ctx, session, false).await {
                        warn!(player_id = %session.player_id, %e, "offline publish failed");
                    }
                }
            }
            Ok(_) => {}
            Err(e) => warn!(player_id = %session.player_id, %e, "connection count decrement failed"),
        }
    }
    if let Err(e) = ctx.sessions.expire_soon(session).await {
        warn!(session_id = %session.id, %e, "session idle expiry failed");
    }
    drop(subscription);
    OPEN_STREAMS.dec();
    debug!(
        game_id = %session.game_id,
        player_id = %session.player_id,
        "client stream closed"
    );
    result
}

/// The blocking multiplexed wait at the heart of the loop. The only
/// suspension points of a delivery task live in this `select!`.
async fn drive(
    ctx: &StreamContext,
    session: &Session,
    is_gm: bool,
    subscription: &mut Subscription,
    transport: &mut dyn ClientTransport,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut keepalive = interval(Duration::from_millis(ctx.cfg.keepalive_interval_ms));
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut liveness = interval(Duration::from_millis(ctx.cfg.liveness_interval_ms));
    liveness.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(player_id = %session.player_id, "client stream cancelled");
                return Ok(());
            }
            _ = keepalive.tick() => {
                if transport.ping().await.is_err() {
                    return Err(StreamError::TransportClosed.into());
                }
            }
            _ = liveness.tick() => {
                if transport.is_closed() {
                    return Err(StreamError::TransportClosed.into());
                }
            }
            received = subscription.recv() => match received {
                Some(Ok(message)) => {
                    let (filter, body) = decode_filter(&message.payload);
                    if filter_excludes(&filter, &session.player_id, is_gm) {
                        continue;
                    }
                    if transport.send_update(body).await.is_err() {
                        return Err(StreamError::TransportClosed.into());
                    }
                }
                Some(Err(e)) => return Err(Error::Stream(e)),
                None => {
                    return Err(StreamError::Upstream("subscription feed closed".to_string()).into())
                }
            }
        }
    }
}

/// Publish the player's online transition on the game broadcast channel.
async fn publish_online(
    ctx: &StreamContext,
    session: &Session,
    online: bool,
) -> Result<()> {
    let packet = Packet::new(
        broadcast_channel(&session.game_id),
        Update::PlayerOnlineChange {
            id: session.player_id.clone(),
            online,
        },
    );
    let payload = packet.encode().map_err(crate::errors::StoreError::Serde)?;
    let mut tx = Transaction::new();
    tx.publish(packet.channel, payload);
    let counts = ctx.store.exec(tx.clone()).await?;
    tx.verify(&counts)?;
    Ok(())
}

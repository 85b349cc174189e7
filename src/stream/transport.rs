use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::errors::Result;

/// Unidirectional server-to-client event stream.
///
/// Carries two message kinds: periodic pings and decoded
/// (filter-stripped) update payloads. The HTTP layer adapts its concrete
/// response stream (e.g. server-sent events) to this seam.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClientTransport: Send + 'static {
    /// Forward one decoded update payload to the client.
    async fn send_update(
        &mut self,
        body: &str,
    ) -> Result<()>;

    /// Application-level ping frame so idle connections are not reaped by
    /// intermediaries.
    async fn ping(&mut self) -> Result<()>;

    /// Cheap liveness probe, polled periodically to detect a closed
    /// transport promptly even with no traffic.
    fn is_closed(&self) -> bool;
}

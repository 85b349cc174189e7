//! Error hierarchy for the event distribution core.
//!
//! Error kind is always a data comparison (an enum variant match), never an
//! identity check against a shared sentinel value. Request handlers thread
//! these through with `?` and map the terminal kind to an outward-facing
//! status at the dispatch boundary.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or disallowed request input; nothing was mutated.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Event/session/player/game absent (client-visible 404 equivalent)
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Backing-store failures (transaction anomalies, serialization)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Delivery-loop terminal conditions (transport, upstream subscription)
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Roll Engine failures
    #[error(transparent)]
    Roll(#[from] RollError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Programming errors (e.g. a share value outside the known enum);
    /// logged with full context, never silently swallowed.
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl Error {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Error::BadRequest(msg.into())
    }

    pub fn not_found(
        kind: &'static str,
        id: impl Into<String>,
    ) -> Self {
        Error::NotFound { kind, id: id.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The atomic transaction reported a per-command mutation count other
    /// than expected. Surfaced with the offending command attached so
    /// silent concurrent-modification anomalies are diagnosable; never
    /// retried silently.
    #[error("transaction command {command} (index {index}) reported {actual}, expected {expected}")]
    TxMismatch {
        command: &'static str,
        index: usize,
        expected: i64,
        actual: i64,
    },

    /// The store returned a result vector of the wrong length.
    #[error("transaction reported {actual} command results, expected {expected}")]
    TxTruncated { expected: usize, actual: usize },

    /// Serialization failures for persisted or published data
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// Subscription could not be established
    #[error("subscribe failed: {0}")]
    Subscribe(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Client transport closed or refused a frame
    #[error("client transport closed")]
    TransportClosed,

    /// Upstream pub/sub subscription ended or failed
    #[error("upstream subscription ended: {0}")]
    Upstream(String),

    /// Subscriber fell behind the pub/sub bus
    #[error("subscription lagged behind by {0} messages")]
    Lagged(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum RollError {
    /// Cancellation fired before or during a fill; no partial result is
    /// returned.
    #[error("roll cancelled")]
    Cancelled,

    /// The die generator task exited; no further values will arrive.
    #[error("die generator stopped")]
    GeneratorStopped,
}

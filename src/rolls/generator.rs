//! Die generator: the Roll Engine's single producer task.
//!
//! Turns hardware randomness into a fair stream of 1-6 values over a
//! bounded hand-off buffer. When the buffer is full the producer suspends
//! until a consumer drains it; cancellation wins races against a pending
//! send so a slow consumer cannot delay shutdown.

use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::constants::DIE_BYTE_BOUND;
use crate::constants::RAW_CHUNK_SIZE;
use crate::metrics::DICE_GENERATED;

/// Spawn the producer task and return the consumer end of the hand-off
/// buffer. `depth` is the backpressure depth.
pub fn spawn_generator(
    depth: usize,
    cancel: CancellationToken,
) -> mpsc::Receiver<u8> {
    let (tx, rx) = mpsc::channel(depth.max(1));
    tokio::spawn(generate(tx, cancel));
    rx
}

async fn generate(
    tx: mpsc::Sender<u8>,
    cancel: CancellationToken,
) {
    debug!("die generator started");
    let mut raw = [0u8; RAW_CHUNK_SIZE];
    loop {
        // Checked both per batch and on every hand-off below.
        if cancel.is_cancelled() {
            break;
        }
        OsRng.fill_bytes(&mut raw);
        for byte in raw {
            // Rejection sampling: bytes past the largest multiple of 6
            // would bias the modulo.
            if byte >= DIE_BYTE_BOUND {
                continue;
            }
            let die = byte % 6 + 1;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("die generator cancelled");
                    return;
                }
                sent = tx.send(die) => {
                    if sent.is_err() {
                        debug!("all roll consumers dropped");
                        return;
                    }
                    DICE_GENERATED.inc();
                }
            }
        }
    }
    debug!("die generator stopped");
}

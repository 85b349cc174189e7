//! Consumer-facing Roll Engine API.

use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::constants::HIT_THRESHOLD;
use crate::errors::Result;
use crate::errors::RollError;

/// Blocking consumer over the die generator's hand-off buffer. One
/// producer, any number of consumers; consumers never write back.
pub struct Roller {
    rx: Mutex<mpsc::Receiver<u8>>,
}

impl Roller {
    pub fn new(rx: mpsc::Receiver<u8>) -> Self {
        Roller { rx: Mutex::new(rx) }
    }

    /// Drain exactly `buf.len()` dice into `buf`, returning the number of
    /// hits (5s and 6s). Cancellation propagates as an error, never a
    /// partial or garbage result; a pre-cancelled token returns before
    /// consuming any buffered values.
    pub async fn fill(
        &self,
        buf: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<usize> {
        if cancel.is_cancelled() {
            return Err(RollError::Cancelled.into());
        }
        let mut rx = self.rx.lock().await;
        let mut hits = 0;
        for slot in buf.iter_mut() {
            let die = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RollError::Cancelled.into()),
                die = rx.recv() => die.ok_or(RollError::GeneratorStopped)?,
            };
            *slot = die;
            if die >= HIT_THRESHOLD {
                hits += 1;
            }
        }
        Ok(hits)
    }

    /// Roll `n` dice.
    pub async fn roll(
        &self,
        n: usize,
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, usize)> {
        let mut dice = vec![0u8; n];
        let hits = self.fill(&mut dice, cancel).await?;
        Ok((dice, hits))
    }

    /// "Push the Limit": roll `pool` dice, then re-roll a pool equal to
    /// the 6s just rolled, repeating until a round has none. Returns all
    /// rounds and the cumulative hit count. Terminates because each
    /// round's pool is the previous round's 6-count, which hits zero.
    pub async fn exploding_sixes(
        &self,
        pool: usize,
        cancel: &CancellationToken,
    ) -> Result<(Vec<Vec<u8>>, usize)> {
        let mut rounds = Vec::new();
        let mut hits = 0;
        let mut pool = pool;
        while pool > 0 {
            let (dice, round_hits) = self.roll(pool, cancel).await?;
            hits += round_hits;
            pool = dice.iter().filter(|&&die| die == 6).count();
            rounds.push(dice);
        }
        Ok((rounds, hits))
    }

    /// "Second Chance": re-roll only the dice in `original` that were not
    /// hits. Returns the newly rolled dice and the combined hit count
    /// (original hits plus new hits). An all-hits input yields an empty
    /// reroll; callers treat that request as invalid upstream.
    pub async fn reroll_misses(
        &self,
        original: &[u8],
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, usize)> {
        let misses = original.iter().filter(|&&die| die < HIT_THRESHOLD).count();
        let original_hits = original.len() - misses;
        if misses == 0 {
            return Ok((Vec::new(), original_hits));
        }
        let (dice, new_hits) = self.roll(misses, cancel).await?;
        Ok((dice, original_hits + new_hits))
    }
}

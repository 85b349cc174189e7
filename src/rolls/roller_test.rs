use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::errors::Error;
use crate::errors::RollError;
use crate::rolls::spawn_generator;
use crate::rolls::Roller;

/// Roller over a hand-fed buffer, for deterministic dice.
fn scripted(dice: &[u8]) -> Roller {
    let (tx, rx) = mpsc::channel(dice.len().max(1));
    for &die in dice {
        tx.try_send(die).expect("buffer sized to script");
    }
    // Dropping the sender closes the channel once the script drains.
    drop(tx);
    Roller::new(rx)
}

#[tokio::test]
async fn test_fill_counts_hits() {
    let roller = scripted(&[1, 2, 5, 6]);
    let cancel = CancellationToken::new();

    let mut buf = [0u8; 4];
    let hits = roller.fill(&mut buf, &cancel).await.unwrap();
    assert_eq!(buf, [1, 2, 5, 6]);
    assert_eq!(hits, 2);
}

#[tokio::test]
async fn test_fill_with_cancelled_token_leaves_buffer_untouched() {
    let roller = scripted(&[4, 4]);
    let cancelled = CancellationToken::new();
    cancelled.cancel();

    let mut buf = [0u8; 2];
    match roller.fill(&mut buf, &cancelled).await {
        Err(Error::Roll(RollError::Cancelled)) => {}
        other => panic!("expected Cancelled, got {:?}", other),
    }
    assert_eq!(buf, [0, 0]);

    // The buffered values are still there for the next caller.
    let fresh = CancellationToken::new();
    let hits = roller.fill(&mut buf, &fresh).await.unwrap();
    assert_eq!(buf, [4, 4]);
    assert_eq!(hits, 0);
}

#[tokio::test]
async fn test_fill_reports_generator_stop() {
    let roller = scripted(&[6]);
    let cancel = CancellationToken::new();

    let mut buf = [0u8; 2];
    match roller.fill(&mut buf, &cancel).await {
        Err(Error::Roll(RollError::GeneratorStopped)) => {}
        other => panic!("expected GeneratorStopped, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exploding_sixes_rounds_and_hits() {
    // Round 1: pool 3 -> [6, 6, 5] (two 6s). Round 2: pool 2 -> [1, 2]
    // (no 6s, stop).
    let roller = scripted(&[6, 6, 5, 1, 2]);
    let cancel = CancellationToken::new();

    let (rounds, hits) = roller.exploding_sixes(3, &cancel).await.unwrap();
    assert_eq!(rounds, vec![vec![6, 6, 5], vec![1, 2]]);
    assert_eq!(hits, 3);

    // Sum identity: total dice == pool + 6-counts of non-final rounds.
    let total: usize = rounds.iter().map(Vec::len).sum();
    let carried: usize = rounds[..rounds.len() - 1]
        .iter()
        .map(|round| round.iter().filter(|&&d| d == 6).count())
        .sum();
    assert_eq!(total, 3 + carried);
}

#[tokio::test]
async fn test_exploding_sixes_zero_pool() {
    let roller = scripted(&[]);
    let cancel = CancellationToken::new();
    let (rounds, hits) = roller.exploding_sixes(0, &cancel).await.unwrap();
    assert!(rounds.is_empty());
    assert_eq!(hits, 0);
}

#[tokio::test]
async fn test_reroll_misses_rerolls_only_non_hits() {
    // Original [6, 5, 2, 1]: two hits, two misses. Script the two
    // replacement dice as [5, 3].
    let roller = scripted(&[5, 3]);
    let cancel = CancellationToken::new();

    let (rerolled, hits) = roller.reroll_misses(&[6, 5, 2, 1], &cancel).await.unwrap();
    assert_eq!(rerolled, vec![5, 3]);
    assert_eq!(hits, 3); // 2 original + 1 new
}

#[tokio::test]
async fn test_reroll_misses_all_hits_is_empty() {
    let roller = scripted(&[]);
    let cancel = CancellationToken::new();

    let (rerolled, hits) = roller.reroll_misses(&[5, 6, 5], &cancel).await.unwrap();
    assert!(rerolled.is_empty());
    assert_eq!(hits, 3);
}

#[tokio::test]
async fn test_roller_over_live_generator() {
    let cancel = CancellationToken::new();
    let roller = Roller::new(spawn_generator(32, cancel.clone()));

    let (dice, hits) = roller.roll(20, &cancel).await.unwrap();
    assert_eq!(dice.len(), 20);
    assert!(dice.iter().all(|die| (1..=6).contains(die)));
    assert_eq!(hits, dice.iter().filter(|&&die| die >= 5).count());

    let (rounds, _) = roller.exploding_sixes(8, &cancel).await.unwrap();
    assert!(!rounds.is_empty());
    assert_eq!(rounds[0].len(), 8);
    // Terminates with a final round containing no 6s.
    assert_eq!(rounds.last().unwrap().iter().filter(|&&d| d == 6).count(), 0);

    cancel.cancel();
}

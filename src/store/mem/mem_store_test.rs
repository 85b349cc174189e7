use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

use crate::config::SessionConfig;
use crate::constants::broadcast_channel;
use crate::constants::history_key;
use crate::errors::Error;
use crate::session::Session;
use crate::store::MemStore;
use crate::store::PlayerStore;
use crate::store::SessionStore;
use crate::store::Store;
use crate::store::Transaction;
use crate::test_utils::mem_store;
use crate::test_utils::test_player;

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

#[tokio::test]
async fn test_history_add_reports_collision() {
    let store = mem_store();
    let key = history_key("g1");

    let mut tx = Transaction::new();
    tx.history_add(key.clone(), 7, "a".into());
    assert_eq!(store.exec(tx).await.unwrap(), vec![1]);

    // Same score again: no overwrite, count 0.
    let mut tx = Transaction::new();
    tx.history_add(key, 7, "b".into());
    assert_eq!(store.exec(tx).await.unwrap(), vec![0]);

    assert_eq!(store.history("g1").await.unwrap(), vec!["a".to_string()]);
}

#[tokio::test]
async fn test_history_remove_reports_miss() {
    let store = mem_store();
    let mut tx = Transaction::new();
    tx.history_remove(history_key("g1"), 99);
    assert_eq!(store.exec(tx).await.unwrap(), vec![0]);
}

#[tokio::test]
async fn test_history_is_ordered_by_score() {
    let store = mem_store();
    let key = history_key("g1");
    let mut tx = Transaction::new();
    tx.history_add(key.clone(), 30, "third".into());
    tx.history_add(key.clone(), 10, "first".into());
    tx.history_add(key, 20, "second".into());
    store.exec(tx).await.unwrap();

    assert_eq!(store.history("g1").await.unwrap(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_publish_reaches_only_subscribed_channels() {
    let store = mem_store();
    let mut sub = store
        .subscribe(vec![broadcast_channel("g1")])
        .await
        .unwrap();

    let mut tx = Transaction::new();
    tx.publish(broadcast_channel("g2"), "other-game".into());
    tx.publish(broadcast_channel("g1"), "mine".into());
    let counts = store.exec(tx).await.unwrap();
    // Both publishes saw one bus subscriber; filtering happens on the
    // subscription side.
    assert_eq!(counts, vec![1, 1]);

    let msg = timeout(RECV_TIMEOUT, sub.recv()).await.unwrap().unwrap().unwrap();
    assert_eq!(msg.channel, broadcast_channel("g1"));
    assert_eq!(msg.payload, "mine");
}

#[tokio::test]
async fn test_publish_without_subscribers_counts_zero() {
    let store = mem_store();
    let mut tx = Transaction::new();
    tx.publish(broadcast_channel("g1"), "nobody".into());
    assert_eq!(store.exec(tx).await.unwrap(), vec![0]);
}

#[tokio::test]
async fn test_subscribe_rejects_empty_channel_set() {
    let store = mem_store();
    assert!(store.subscribe(Vec::new()).await.is_err());
}

#[tokio::test]
async fn test_session_lifecycle() {
    let store = mem_store();
    let player = test_player("p1", "Alice");
    store.insert(&player).await.unwrap();
    store.set_gm("g1", "p1");

    let session = Session::new("g1", &player, true);
    store.create(&session).await.unwrap();

    let auth = store.resolve(&session.id).await.unwrap();
    assert_eq!(auth.session, session);
    assert!(auth.is_gm);

    match store.resolve("no-such-token").await {
        Err(Error::NotFound { kind, .. }) => assert_eq!(kind, "session"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_expire_soon_with_zero_idle_ttl_drops_session() {
    let cfg = SessionConfig {
        idle_ttl_secs: 0,
        ..SessionConfig::default()
    };
    let store = MemStore::new(cfg);
    let player = test_player("p1", "Alice");
    let session = Session::new("g1", &player, false);
    store.create(&session).await.unwrap();

    store.expire_soon(&session).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(store.resolve(&session.id).await.is_err());
}

#[tokio::test]
async fn test_unexpire_restores_full_ttl() {
    let cfg = SessionConfig {
        idle_ttl_secs: 0,
        ..SessionConfig::default()
    };
    let store = MemStore::new(cfg);
    let player = test_player("p1", "Alice");
    let session = Session::new("g1", &player, true);
    store.create(&session).await.unwrap();

    store.expire_soon(&session).await.unwrap();
    store.unexpire(&session).await.unwrap();
    assert!(store.resolve(&session.id).await.is_ok());
}

#[tokio::test]
async fn test_connection_count_is_atomic_and_clamped() {
    let store = mem_store();
    let player = test_player("p1", "Alice");
    store.insert(&player).await.unwrap();

    assert_eq!(store.modify_connection_count("p1", 1).await.unwrap(), 1);
    assert_eq!(store.modify_connection_count("p1", 1).await.unwrap(), 2);
    assert_eq!(store.modify_connection_count("p1", -1).await.unwrap(), 1);
    assert_eq!(store.modify_connection_count("p1", -5).await.unwrap(), 0);

    assert!(store.modify_connection_count("ghost", 1).await.is_err());
}

#[tokio::test]
async fn test_player_update_overlays_mutable_fields() {
    let store = mem_store();
    let player = test_player("p1", "Alice");
    store.insert(&player).await.unwrap();

    let diff = json!({"name": "Alicia", "hue": 200})
        .as_object()
        .cloned()
        .unwrap();
    store.update("p1", &diff).await.unwrap();

    let updated = store.get_by_id("p1").await.unwrap();
    assert_eq!(updated.name, "Alicia");
    assert_eq!(updated.hue, 200);
    assert_eq!(updated.username, player.username);
}

#[tokio::test]
async fn test_player_update_rejects_immutable_fields() {
    let store = mem_store();
    let player = test_player("p1", "Alice");
    store.insert(&player).await.unwrap();

    let diff = json!({"connectionCount": 9}).as_object().cloned().unwrap();
    match store.update("p1", &diff).await {
        Err(Error::BadRequest(_)) => {}
        other => panic!("expected BadRequest, got {:?}", other),
    }
    assert_eq!(store.get_by_id("p1").await.unwrap().connection_count, 0);
}

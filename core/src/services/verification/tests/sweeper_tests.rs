//! Unit tests for the expired-record sweeper

use chrono::{Duration, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::domain::entities::verification_record::{Purpose, VerificationRecord};
use crate::repositories::{CodeStore, InMemoryCodeStore};
use crate::services::verification::{CodeSweeper, SweeperConfig};

fn config(enabled: bool) -> SweeperConfig {
    SweeperConfig {
        interval: StdDuration::from_secs(60),
        grace_period: Duration::minutes(5),
        enabled,
    }
}

async fn put_expiring(store: &InMemoryCodeStore, subject: &str, expires_in: Duration) {
    let issued_at = Utc::now() + expires_in - Duration::minutes(15);
    let record =
        VerificationRecord::issue(subject, Purpose::ResetPassword, Duration::minutes(15), issued_at);
    store
        .put(&record.subject, record.purpose, record.clone())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sweep_respects_grace_period() {
    let store = Arc::new(InMemoryCodeStore::new());
    put_expiring(&store, "old@example.com", Duration::minutes(-10)).await;
    put_expiring(&store, "recent@example.com", Duration::minutes(-1)).await;
    put_expiring(&store, "active@example.com", Duration::minutes(10)).await;

    let sweeper = CodeSweeper::new(store.clone(), config(true));
    let purged = sweeper.run_sweep(Utc::now()).await.unwrap();

    assert_eq!(purged, 1);
    assert!(store.get("old@example.com", Purpose::ResetPassword).await.unwrap().is_none());
    assert!(store.get("recent@example.com", Purpose::ResetPassword).await.unwrap().is_some());
    assert!(store.get("active@example.com", Purpose::ResetPassword).await.unwrap().is_some());
}

#[tokio::test]
async fn test_sweep_on_empty_store() {
    let store = Arc::new(InMemoryCodeStore::new());
    let sweeper = CodeSweeper::new(store, config(true));

    assert_eq!(sweeper.run_sweep(Utc::now()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_disabled_sweeper_does_not_start() {
    let store = Arc::new(InMemoryCodeStore::new());
    let sweeper = Arc::new(CodeSweeper::new(store, config(false)));

    assert!(sweeper.start_background_task().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_background_task_evicts_records() {
    let store = Arc::new(InMemoryCodeStore::new());
    put_expiring(&store, "old@example.com", Duration::hours(-1)).await;

    let sweeper = Arc::new(CodeSweeper::new(store.clone(), config(true)));
    let handle = sweeper.start_background_task().unwrap();

    // First tick fires immediately
    tokio::time::sleep(StdDuration::from_millis(10)).await;
    assert!(store.is_empty().await);

    handle.abort();
}

use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use once_cell::sync::Lazy;
use serde_json::Value;

/// Unsent roster selections keyed by (class, date). Purely a convenience
/// for the marking screen: cleared after a successful submission, expired
/// automatically, and never consulted by the attendance rules.
static DRAFT_CACHE: Lazy<Cache<String, Value>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(12 * 60 * 60)) // drafts die after half a day
        .build()
});

fn key(class_id: u64, date: NaiveDate) -> String {
    format!("{}:{}", class_id, date)
}

pub async fn save(class_id: u64, date: NaiveDate, entries: Value) {
    DRAFT_CACHE.insert(key(class_id, date), entries).await;
}

pub async fn get(class_id: u64, date: NaiveDate) -> Option<Value> {
    DRAFT_CACHE.get(&key(class_id, date)).await
}

/// Invalidation point: call only after the submission actually persisted.
pub async fn clear(class_id: u64, date: NaiveDate) {
    DRAFT_CACHE.invalidate(&key(class_id, date)).await;
}

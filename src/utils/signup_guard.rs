use std::sync::RwLock;
use std::time::Duration;

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

/// Capacity and false-positive rate sized for a single school's staff.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// First tier: fast negative. If the filter has never seen the username,
/// it is free (false positives possible).
static USERNAME_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// Second tier: fast positive for recently active accounts.
static TAKEN_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

#[inline]
fn normalize(username: &str) -> String {
    username.to_lowercase()
}

/// Record a username as taken in both tiers (after a successful insert).
pub async fn remember(username: &str) {
    let username = normalize(username);
    USERNAME_FILTER
        .write()
        .expect("username filter poisoned")
        .add(&username);
    TAKEN_CACHE.insert(username, true).await;
}

/// true  => username AVAILABLE
/// false => username TAKEN
pub async fn is_available(pool: &MySqlPool, username: &str) -> bool {
    let username = normalize(username);

    if !USERNAME_FILTER
        .read()
        .expect("username filter poisoned")
        .contains(&username)
    {
        return true;
    }

    if TAKEN_CACHE.get(&username).await.unwrap_or(false) {
        return false;
    }

    // Database fallback for filter false positives
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
    )
    .bind(&username)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// Warm both tiers from the users table: every username goes into the
/// filter, accounts active within `recent_days` also land in the cache.
pub async fn warmup(pool: &MySqlPool, recent_days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT username, COALESCE(last_login_at >= NOW() - INTERVAL ? DAY, 0) AS recent
        FROM users
        "#,
    )
    .bind(recent_days)
    .fetch(pool);

    let mut batch: Vec<(String, bool)> = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (username, recent) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
        batch.push((normalize(&username), recent != 0));
        total += 1;

        if batch.len() >= batch_size {
            insert_batch(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch).await;
    }

    log::info!(
        "Signup guard warmup complete: {} users (cache window {} days)",
        total,
        recent_days
    );

    Ok(())
}

async fn insert_batch(batch: &[(String, bool)]) {
    {
        let mut filter = USERNAME_FILTER.write().expect("username filter poisoned");
        for (username, _) in batch {
            filter.add(username);
        }
    }

    let inserts: Vec<_> = batch
        .iter()
        .filter(|(_, recent)| *recent)
        .map(|(username, _)| TAKEN_CACHE.insert(username.clone(), true))
        .collect();
    futures::future::join_all(inserts).await;
}

// Counter store contract and the in-process implementation

use crate::errors::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Increments between sweeps of expired counters
const DEFAULT_SWEEP_EVERY: u64 = 1024;

/// Shared counter store used by the rate limiter.
///
/// Implementations must make `increment` a single atomic step: concurrent
/// callers on the same key each observe a distinct post-increment value, and
/// the TTL is applied exactly when that value is 1.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment `key` and return the post-increment count
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64>;

    /// Current count for `key`, 0 when absent or expired
    async fn get(&self, key: &str) -> Result<u64>;

    /// Remove `key`
    async fn delete(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u64,
    expires_at: Instant,
}

impl Counter {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory counter store for tests and single-process deployments.
///
/// Every window id is a fresh key, so old windows are never touched again.
/// `increment` sweeps expired counters every `sweep_every` calls to keep the
/// map bounded by the number of keys live in the current window.
#[derive(Debug)]
pub struct MemoryCounterStore {
    counters: DashMap<String, Counter>,
    ops: AtomicU64,
    sweep_every: u64,
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::with_sweep_every(DEFAULT_SWEEP_EVERY)
    }
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_every(sweep_every: u64) -> Self {
        Self {
            counters: DashMap::new(),
            ops: AtomicU64::new(0),
            sweep_every: sweep_every.max(1),
        }
    }

    /// Drop expired counters
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.counters.len();
        self.counters.retain(|_, counter| !counter.is_expired(now));
        before - self.counters.len()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64> {
        // Sweep before taking the entry guard; retain locks every shard
        let op = self.ops.fetch_add(1, Ordering::Relaxed) + 1;
        if op % self.sweep_every == 0 {
            let purged = self.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = self.counters.len(), "Swept expired counters");
            }
        }

        let now = Instant::now();

        // The entry guard holds the shard lock for the whole read-modify-write
        let mut entry = self.counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: now + ttl,
        });

        if entry.is_expired(now) {
            entry.count = 0;
        }

        entry.count += 1;
        if entry.count == 1 {
            entry.expires_at = now + ttl;
        }

        Ok(entry.count)
    }

    async fn get(&self, key: &str) -> Result<u64> {
        let now = Instant::now();
        Ok(self
            .counters
            .get(key)
            .filter(|counter| !counter.is_expired(now))
            .map(|counter| counter.count)
            .unwrap_or(0))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.counters.remove(key);
        Ok(())
    }
}

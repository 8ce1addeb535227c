use serde::Serialize;
use std::time::Duration;

/// Fixed window arithmetic: window boundaries, counter keys and decisions.
///
/// Windows are aligned to the unix epoch, so every process sharing a store
/// agrees on which window a given instant falls into.
#[derive(Debug, Clone, Copy)]
pub struct FixedWindow {
    limit: u64,
    window_ms: u64,
}

impl FixedWindow {
    /// Create a new fixed window. `limit` and `window` must be non-zero.
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            limit,
            window_ms: window.as_millis() as u64,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Identifier of the window containing `now_ms`
    pub fn window_id(&self, now_ms: u64) -> u64 {
        now_ms / self.window_ms
    }

    /// Unix millis at which the window after `window_id` starts
    pub fn reset_at(&self, window_id: u64) -> u64 {
        (window_id + 1) * self.window_ms
    }

    /// Counter key for `key` in window `window_id`
    pub fn counter_key(&self, prefix: &str, key: &str, window_id: u64) -> String {
        format!("{}:{}:{}", prefix, key, window_id)
    }

    /// Turn a post-increment hit count into a decision
    pub fn decide(&self, count: u64, window_id: u64) -> Decision {
        Decision {
            allowed: count <= self.limit,
            limit: self.limit,
            remaining: self.limit.saturating_sub(count),
            reset_at: self.reset_at(window_id),
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the request is allowed
    pub allowed: bool,
    /// The rate limit (max hits per window)
    pub limit: u64,
    /// Number of hits remaining in the current window
    pub remaining: u64,
    /// Unix millis when the next window starts
    pub reset_at: u64,
}

impl Decision {
    /// Whole seconds until the window resets, rounded up
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        let wait_ms = self.reset_at.saturating_sub(now_ms);
        (wait_ms + 999) / 1000
    }
}

use crate::config::RateLimitConfig;
use crate::errors::{AppError, Result};
use crate::observability::MetricsRecorder;
use crate::rate_limit::analytics::{AnalyticsSink, DecisionEvent};
use crate::rate_limit::clock::{Clock, SystemClock};
use crate::rate_limit::fixed_window::{Decision, FixedWindow};
use crate::rate_limit::store::CounterStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Fixed window rate limiter over a shared counter store.
///
/// Holds no mutable state of its own; every call is one round trip to the
/// store, so clones can be handed to any number of concurrent tasks.
#[derive(Clone)]
pub struct RateLimiter {
    window: FixedWindow,
    key_prefix: String,
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    analytics_enabled: bool,
    store_timeout: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(store: Arc<dyn CounterStore>, config: &RateLimitConfig) -> Self {
        Self {
            window: FixedWindow::new(config.limit, config.window()),
            key_prefix: config.key_prefix.clone(),
            store,
            clock: Arc::new(SystemClock),
            analytics: None,
            analytics_enabled: config.analytics_enabled,
            store_timeout: config.store_timeout(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_analytics(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(sink);
        self
    }

    pub fn limit(&self) -> u64 {
        self.window.limit()
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Count one hit for `key` and decide whether it is allowed
    pub async fn check(&self, key: &str) -> Result<Decision> {
        validate_key(key)?;

        let now = self.clock.now_millis();
        let window_id = self.window.window_id(now);
        let counter_key = self.window.counter_key(&self.key_prefix, key, window_id);

        tracing::debug!(
            key = %key,
            limit = %self.window.limit(),
            window_id = %window_id,
            "Checking rate limit"
        );

        let count = self
            .with_timeout(self.store.increment(&counter_key, self.window.window()))
            .await?;

        let decision = self.window.decide(count, window_id);

        tracing::debug!(
            key = %key,
            allowed = %decision.allowed,
            count = %count,
            remaining = %decision.remaining,
            "Rate limit check result"
        );

        MetricsRecorder::record_rate_limit_decision(decision.allowed);
        self.emit(key, &decision, window_id, now);

        Ok(decision)
    }

    /// Remaining hits for `key` in the current window, without counting one
    pub async fn remaining(&self, key: &str) -> Result<u64> {
        validate_key(key)?;

        let window_id = self.window.window_id(self.clock.now_millis());
        let counter_key = self.window.counter_key(&self.key_prefix, key, window_id);
        let count = self.with_timeout(self.store.get(&counter_key)).await?;

        Ok(self.window.limit().saturating_sub(count))
    }

    /// Clear the current window's counter for `key`
    pub async fn reset(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let window_id = self.window.window_id(self.clock.now_millis());
        let counter_key = self.window.counter_key(&self.key_prefix, key, window_id);
        self.with_timeout(self.store.delete(&counter_key)).await?;

        tracing::info!(key = %key, "Rate limit reset");

        Ok(())
    }

    async fn with_timeout<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.store_timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(AppError::StoreUnavailable(msg))) => Err(AppError::StoreUnavailable(msg)),
            Ok(Err(e)) => {
                MetricsRecorder::record_store_error("error");
                Err(AppError::StoreUnavailable(e.to_string()))
            }
            Err(_) => {
                MetricsRecorder::record_store_error("timeout");
                Err(AppError::StoreUnavailable(format!(
                    "no response within {}ms",
                    self.store_timeout.as_millis()
                )))
            }
        }
    }

    fn emit(&self, key: &str, decision: &Decision, window_id: u64, now: u64) {
        if !self.analytics_enabled {
            return;
        }
        let Some(sink) = self.analytics.clone() else {
            return;
        };

        let event = DecisionEvent {
            key: key.to_string(),
            allowed: decision.allowed,
            window_id,
            timestamp_ms: now,
        };

        tokio::spawn(async move {
            if let Err(e) = sink.record(&event).await {
                tracing::warn!(key = %event.key, error = %e, "Failed to record rate limit analytics");
            }
        });
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(AppError::ValidationError(
            "Rate limit key must not be empty".to_string(),
        ));
    }
    Ok(())
}

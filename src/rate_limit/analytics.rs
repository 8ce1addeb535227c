use crate::errors::Result;
use async_trait::async_trait;
use serde::Serialize;

/// A single rate limit decision, as recorded for analytics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionEvent {
    pub key: String,
    pub allowed: bool,
    pub window_id: u64,
    pub timestamp_ms: u64,
}

/// Destination for decision events.
///
/// Recording happens off the request path; implementations may fail freely,
/// failures are logged and dropped by the limiter.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record(&self, event: &DecisionEvent) -> Result<()>;
}

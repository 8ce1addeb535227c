// Rate limit analytics in Redis

use crate::errors::Result;
use crate::rate_limit::analytics::{AnalyticsSink, DecisionEvent};
use async_trait::async_trait;
use redis::aio::ConnectionManager;

/// How long per-identifier tallies are kept
const ANALYTICS_RETENTION_SECONDS: i64 = 7 * 24 * 3600;

/// Per-identifier `success` / `blocked` tallies in a Redis hash
#[derive(Clone)]
pub struct RedisAnalytics {
    manager: ConnectionManager,
    prefix: String,
}

impl RedisAnalytics {
    pub fn new(manager: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            manager,
            prefix: prefix.into(),
        }
    }

    fn analytics_key(&self, identifier: &str) -> String {
        format!("{}:analytics:{}", self.prefix, identifier)
    }
}

#[async_trait]
impl AnalyticsSink for RedisAnalytics {
    async fn record(&self, event: &DecisionEvent) -> Result<()> {
        let mut conn = self.manager.clone();
        let key = self.analytics_key(&event.key);
        let field = if event.allowed { "success" } else { "blocked" };

        let _: () = redis::pipe()
            .atomic()
            .hincr(&key, field, 1)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(ANALYTICS_RETENTION_SECONDS)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::AsyncCommands;
    use std::collections::HashMap;

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_record_tallies_outcomes() {
        let config = crate::config::RedisConfig {
            url: "redis://localhost:6379".to_string(),
            connection_timeout_seconds: 5,
        };
        let mut manager = crate::redis::create_client(&config).await.unwrap();
        let analytics = RedisAnalytics::new(manager.clone(), "test");
        let _: () = manager.del("test:analytics:10.0.0.9").await.unwrap();

        for allowed in [true, true, false] {
            let event = DecisionEvent {
                key: "10.0.0.9".to_string(),
                allowed,
                window_id: 1,
                timestamp_ms: 60_000,
            };
            analytics.record(&event).await.unwrap();
        }

        let tallies: HashMap<String, u64> = manager.hgetall("test:analytics:10.0.0.9").await.unwrap();
        assert_eq!(tallies["success"], 2);
        assert_eq!(tallies["blocked"], 1);

        let _: () = manager.del("test:analytics:10.0.0.9").await.unwrap();
    }
}

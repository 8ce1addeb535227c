use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: ComponentStatus,
    pub redis: ComponentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub status: String,
    pub message: Option<String>,
}

impl ComponentStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    fn unknown() -> Self {
        Self {
            status: "unknown".to_string(),
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

pub struct HealthChecker {
    db_pool: PgPool,
    redis_manager: ConnectionManager,
}

impl HealthChecker {
    pub fn new(db_pool: PgPool, redis_manager: ConnectionManager) -> Self {
        Self {
            db_pool,
            redis_manager,
        }
    }

    /// Liveness: the process is up
    pub async fn liveness(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks: HealthChecks {
                database: ComponentStatus::unknown(),
                redis: ComponentStatus::unknown(),
            },
        }
    }

    /// Readiness: the database and the counter store both answer
    pub async fn readiness(&self) -> HealthStatus {
        let (database, redis) = tokio::join!(self.check_database(), self.check_redis());

        let status = if database.is_ok() && redis.is_ok() {
            "ok"
        } else {
            "degraded"
        };

        HealthStatus {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks: HealthChecks { database, redis },
        }
    }

    async fn check_database(&self) -> ComponentStatus {
        match crate::db::health_check(&self.db_pool).await {
            Ok(_) => ComponentStatus::ok(),
            Err(e) => ComponentStatus::error(format!("Database check failed: {}", e)),
        }
    }

    async fn check_redis(&self) -> ComponentStatus {
        let mut manager = self.redis_manager.clone();
        match crate::redis::health_check(&mut manager).await {
            Ok(_) => ComponentStatus::ok(),
            Err(e) => ComponentStatus::error(format!("Redis check failed: {}", e)),
        }
    }
}

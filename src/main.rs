use library_gate::{
    api::{create_router, health_router, AppState},
    authz::{AdminGate, PgRoleLookup},
    config::{Config, CounterBackend},
    db::{create_pool, run_migrations},
    observability::{init_tracing, HealthChecker},
    rate_limit::{CounterStore, MemoryCounterStore, RateLimitGuard, RateLimiter},
    redis::{create_client, RedisAnalytics, RedisCounterStore},
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config.observability)?;

    tracing::info!("Starting Library Gate");
    tracing::info!("Configuration loaded: {:?}", config.server);

    let db_pool = create_pool(&config.database).await?;
    run_migrations(&db_pool).await?;

    let redis_manager = create_client(&config.redis).await?;

    let store: Arc<dyn CounterStore> = match config.rate_limit.backend {
        CounterBackend::Redis => Arc::new(RedisCounterStore::new(redis_manager.clone())),
        CounterBackend::Memory => {
            tracing::warn!("Using in-process rate limit counters; limits are per instance");
            Arc::new(MemoryCounterStore::new())
        }
    };
    let mut limiter = RateLimiter::new(store, &config.rate_limit);
    if config.rate_limit.analytics_enabled {
        limiter = limiter.with_analytics(Arc::new(RedisAnalytics::new(
            redis_manager.clone(),
            config.rate_limit.key_prefix.clone(),
        )));
    }
    tracing::info!(
        limit = config.rate_limit.limit,
        window_seconds = config.rate_limit.window_seconds,
        failure_policy = ?config.rate_limit.failure_policy,
        backend = ?config.rate_limit.backend,
        "Rate limiter configured"
    );

    let rate_limit = RateLimitGuard::new(limiter, config.rate_limit.failure_policy);
    let admin_gate = AdminGate::new(Arc::new(PgRoleLookup::new(db_pool.clone())));
    let health_checker = Arc::new(HealthChecker::new(db_pool, redis_manager));

    let state = AppState {
        imagekit: Arc::new(config.imagekit.clone()),
    };

    let app = create_router(state, rate_limit, admin_gate).merge(health_router(health_checker));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

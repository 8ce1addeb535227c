use crate::{
    api::{admin, health, imagekit},
    authz::{require_admin, session_middleware, AdminGate},
    config::ImageKitConfig,
    observability::{HealthChecker, MetricsRecorder},
    rate_limit::{rate_limit_middleware, RateLimitGuard},
};
use axum::{
    extract::Request,
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub imagekit: Arc<ImageKitConfig>,
}

pub fn create_router(state: AppState, rate_limit: RateLimitGuard, admin_gate: AdminGate) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes(rate_limit))
        .nest("/admin", admin_routes(admin_gate))
        .route("/metrics", get(health::metrics))
        .layer(from_fn(session_middleware))
        .layer(from_fn(track_http_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Probe routes, which need live database and Redis handles
pub fn health_router(health_checker: Arc<HealthChecker>) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(health_checker)
}

fn api_routes(rate_limit: RateLimitGuard) -> Router<AppState> {
    Router::new()
        .route("/auth/imagekit", get(imagekit::upload_auth))
        .layer(from_fn_with_state(rate_limit, rate_limit_middleware))
}

fn admin_routes(admin_gate: AdminGate) -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .layer(from_fn_with_state(admin_gate, require_admin))
}

async fn track_http_metrics(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;
    MetricsRecorder::record_http_request(method.as_str(), response.status().as_u16());
    response
}

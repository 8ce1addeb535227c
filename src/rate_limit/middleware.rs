use crate::config::FailurePolicy;
use crate::errors::AppError;
use crate::rate_limit::fixed_window::Decision;
use crate::rate_limit::limiter::RateLimiter;
use axum::{
    extract::{Request, State},
    http::{header::HeaderName, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Identity used when no client address header is present
const FALLBACK_IDENTIFIER: &str = "127.0.0.1";

/// State for the rate limiting middleware
#[derive(Clone)]
pub struct RateLimitGuard {
    pub limiter: RateLimiter,
    pub failure_policy: FailurePolicy,
}

impl RateLimitGuard {
    pub fn new(limiter: RateLimiter, failure_policy: FailurePolicy) -> Self {
        Self {
            limiter,
            failure_policy,
        }
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(guard): State<RateLimitGuard>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identifier = extract_identifier(request.headers());

    match guard.limiter.check(&identifier).await {
        Ok(decision) if decision.allowed => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(response.headers_mut(), &decision, None);
            Ok(response)
        }
        Ok(decision) => {
            tracing::warn!(
                identifier = %identifier,
                limit = %decision.limit,
                reset_at = %decision.reset_at,
                "Rate limit exceeded"
            );

            let retry_after = decision.retry_after_secs(guard.limiter.now_millis());
            let mut response = AppError::RateLimitExceeded.into_response();
            add_rate_limit_headers(response.headers_mut(), &decision, Some(retry_after));
            Ok(response)
        }
        Err(AppError::StoreUnavailable(msg)) => match guard.failure_policy {
            FailurePolicy::Open => {
                tracing::warn!(
                    identifier = %identifier,
                    error = %msg,
                    "Counter store unavailable, letting request through"
                );
                Ok(next.run(request).await)
            }
            FailurePolicy::Closed => Err(AppError::StoreUnavailable(msg)),
        },
        Err(e) => Err(e),
    }
}

/// Extract the client identity from request headers
fn extract_identifier(headers: &HeaderMap) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(ip) = forwarded_for.to_str() {
            let first = ip.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip) = real_ip.to_str() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    FALLBACK_IDENTIFIER.to_string()
}

fn add_rate_limit_headers(headers: &mut HeaderMap, decision: &Decision, retry_after: Option<u64>) {
    let mut insert = |name: &'static str, value: u64| {
        if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
            headers.insert(HeaderName::from_static(name), value);
        }
    };

    insert("x-ratelimit-limit", decision.limit);
    insert("x-ratelimit-remaining", decision.remaining);
    // Unix millis at which the window resets
    insert("x-ratelimit-reset", decision.reset_at);

    if let Some(retry_after) = retry_after {
        insert("retry-after", retry_after);
    }
}

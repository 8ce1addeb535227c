use crate::{
    authz::gate::{check_admin, AccessDecision, RoleLookup, SessionUser},
    errors::Result,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the signed-in user id, set by the upstream session proxy
pub const SESSION_USER_HEADER: &str = "x-session-user-id";

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const HOME_PATH: &str = "/";

/// State for the admin gate middleware
#[derive(Clone)]
pub struct AdminGate {
    pub roles: Arc<dyn RoleLookup>,
}

impl AdminGate {
    pub fn new(roles: Arc<dyn RoleLookup>) -> Self {
        Self { roles }
    }
}

/// Copy the session user from the proxy header into request extensions
pub async fn session_middleware(mut request: Request, next: Next) -> Response {
    let session = request
        .headers()
        .get(SESSION_USER_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(|id| SessionUser { id });

    if let Some(session) = session {
        request.extensions_mut().insert(session);
    }

    next.run(request).await
}

/// Gate for the admin area.
///
/// Signed-out users go to the sign-in page, signed-in non-admins go home.
pub async fn require_admin(
    State(gate): State<AdminGate>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let session = request.extensions().get::<SessionUser>().copied();

    match check_admin(session.as_ref(), gate.roles.as_ref()).await? {
        AccessDecision::Authorized => Ok(next.run(request).await),
        AccessDecision::Unauthenticated => {
            tracing::info!(path = %request.uri().path(), "Admin area requested without session");
            Ok(Redirect::to(SIGN_IN_PATH).into_response())
        }
        AccessDecision::Forbidden => {
            tracing::warn!(
                user_id = ?session.map(|s| s.id),
                path = %request.uri().path(),
                "Admin area requested by non-admin"
            );
            Ok(Redirect::to(HOME_PATH).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::gate::testing::StaticRoles;
    use crate::db::schema::UserRole;
    use axum::{
        body::Body,
        http::{header::LOCATION, StatusCode},
        middleware::{from_fn, from_fn_with_state},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app(roles: StaticRoles) -> Router {
        let gate = AdminGate::new(Arc::new(roles));

        Router::new()
            .route("/admin", get(|| async { "dashboard" }))
            .layer(from_fn_with_state(gate, require_admin))
            .layer(from_fn(session_middleware))
    }

    fn request(user: Option<Uuid>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/admin");
        if let Some(id) = user {
            builder = builder.header(SESSION_USER_HEADER, id.to_string());
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_admin_reaches_dashboard() {
        let id = Uuid::new_v4();
        let app = app(StaticRoles::default().with(id, UserRole::Admin));

        let response = app.oneshot(request(Some(id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_session_redirects_to_sign_in() {
        let app = app(StaticRoles::default());

        let response = app.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/sign-in");
    }

    #[tokio::test]
    async fn test_non_admin_redirects_home() {
        let id = Uuid::new_v4();
        let app = app(StaticRoles::default().with(id, UserRole::User));

        let response = app.oneshot(request(Some(id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[tokio::test]
    async fn test_malformed_session_header_is_ignored() {
        let app = app(StaticRoles::default());
        let request = axum::http::Request::builder()
            .uri("/admin")
            .header(SESSION_USER_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[LOCATION], "/sign-in");
    }
}

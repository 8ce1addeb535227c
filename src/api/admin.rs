use crate::authz::SessionUser;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct AdminSummary {
    pub user_id: Uuid,
    pub area: &'static str,
}

/// GET /admin
///
/// Only reachable through the admin gate
pub async fn dashboard(Extension(session): Extension<SessionUser>) -> Json<AdminSummary> {
    Json(AdminSummary {
        user_id: session.id,
        area: "admin",
    })
}

// Upload auth endpoint for the media service

use crate::api::routes::AppState;
use crate::errors::Result;
use crate::media::{upload_auth_params, UploadAuthParams};
use crate::observability::MetricsRecorder;
use axum::{extract::State, Json};

/// GET /api/auth/imagekit
///
/// Sign a one-off token the browser uses to upload directly to ImageKit
pub async fn upload_auth(State(state): State<AppState>) -> Result<Json<UploadAuthParams>> {
    let now = chrono::Utc::now().timestamp();

    match upload_auth_params(&state.imagekit, now) {
        Ok(params) => {
            MetricsRecorder::record_upload_auth(true);
            tracing::debug!(expire = params.expire, "Issued upload auth params");
            Ok(Json(params))
        }
        Err(e) => {
            MetricsRecorder::record_upload_auth(false);
            Err(e)
        }
    }
}

// Upload client for the media service

use crate::config::ImageKitConfig;
use crate::media::imagekit::UploadAuthParams;
use bytes::Bytes;
use futures::future::{abortable, AbortHandle, Aborted};
use reqwest::{multipart, StatusCode};
use serde::Deserialize;
use std::future::Future;
use thiserror::Error;

/// Largest image accepted for upload
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Upload failure, one variant per message shown to the user.
///
/// `NoFileSelected` is raised before any request goes out. The other five
/// cover what can happen once an upload has started.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("upload cancelled")]
    Cancelled,

    #[error("invalid upload request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("media server error: {0}")]
    Server(String),

    #[error("{0}")]
    Failed(String),
}

impl UploadError {
    pub fn title(&self) -> &'static str {
        match self {
            UploadError::NoFileSelected => "No File Selected",
            UploadError::Cancelled => "Upload Cancelled",
            UploadError::InvalidRequest(_) => "Invalid Request",
            UploadError::Network(_) => "Network Error",
            UploadError::Server(_) => "Server Error",
            UploadError::Failed(_) => "Upload Failed",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            UploadError::NoFileSelected => "Please select a file to upload".to_string(),
            UploadError::Cancelled => "The upload was cancelled by the user.".to_string(),
            UploadError::InvalidRequest(_) => {
                "The file or upload parameters are invalid.".to_string()
            }
            UploadError::Network(_) => {
                "Please check your internet connection and try again.".to_string()
            }
            UploadError::Server(_) => {
                "ImageKit servers are experiencing issues. Please try later.".to_string()
            }
            UploadError::Failed(msg) => msg.clone(),
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return classify_status(status, err.to_string());
        }
        if err.is_connect() || err.is_timeout() || err.is_request() {
            return UploadError::Network(err.to_string());
        }
        UploadError::Failed(err.to_string())
    }
}

fn classify_status(status: StatusCode, body: String) -> UploadError {
    if status.is_server_error() {
        UploadError::Server(format!("{}: {}", status, body))
    } else if status.is_client_error() {
        UploadError::InvalidRequest(format!("{}: {}", status, body))
    } else {
        UploadError::Failed(format!("unexpected status {}", status))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// A file to upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub folder: String,
    pub kind: MediaKind,
    pub bytes: Bytes,
}

impl UploadFile {
    fn validate(&self) -> Result<(), UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::NoFileSelected);
        }
        if self.kind == MediaKind::Image && self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(UploadError::Failed(
                "Image size must be less than 20MB".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of a successful upload response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    url: Option<String>,
    file_path: Option<String>,
    file_id: Option<String>,
    name: Option<String>,
}

/// A stored file and its public location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub url: String,
    pub file_path: Option<String>,
    pub file_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct Uploader {
    client: reqwest::Client,
    upload_endpoint: String,
    url_endpoint: String,
}

impl Uploader {
    pub fn new(upload_endpoint: impl Into<String>, url_endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_endpoint: upload_endpoint.into(),
            url_endpoint: url_endpoint.into(),
        }
    }

    pub fn from_config(config: &ImageKitConfig) -> Self {
        Self::new(config.upload_endpoint.clone(), config.url_endpoint.clone())
    }

    /// Public URL of a stored path under the account's URL endpoint
    pub fn public_url(&self, file_path: &str) -> String {
        format!(
            "{}/{}",
            self.url_endpoint.trim_end_matches('/'),
            file_path.trim_start_matches('/')
        )
    }

    fn resolve(&self, response: UploadResponse) -> Result<UploadedFile, UploadError> {
        let url = match (response.url, response.file_path.as_deref()) {
            (Some(url), _) => url,
            (None, Some(path)) => self.public_url(path),
            (None, None) => {
                return Err(UploadError::Failed(
                    "Upload response did not include a file location".to_string(),
                ))
            }
        };

        Ok(UploadedFile {
            url,
            file_path: response.file_path,
            file_id: response.file_id,
            name: response.name,
        })
    }

    /// Upload `file` with pre-signed `params` and return its public location
    pub async fn upload(
        &self,
        file: UploadFile,
        params: &UploadAuthParams,
    ) -> Result<UploadedFile, UploadError> {
        file.validate()?;

        tracing::info!(
            file_name = %file.file_name,
            folder = %file.folder,
            size = file.bytes.len(),
            "Uploading file"
        );

        let part = multipart::Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
        let form = multipart::Form::new()
            .part("file", part)
            .text("fileName", file.file_name.clone())
            .text("folder", file.folder.clone())
            .text("publicKey", params.public_key.clone())
            .text("signature", params.signature.clone())
            .text("expire", params.expire.to_string())
            .text("token", params.token.clone());

        let response = self
            .client
            .post(&self.upload_endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status, body);
            tracing::warn!(file_name = %file.file_name, error = %err, "Upload rejected");
            return Err(err);
        }

        let uploaded = self.resolve(response.json::<UploadResponse>().await?)?;

        tracing::info!(file_name = %file.file_name, url = %uploaded.url, "Upload complete");

        Ok(uploaded)
    }

    /// Like [`Uploader::upload`], with a handle that cancels the upload
    pub fn upload_cancellable(
        &self,
        file: UploadFile,
        params: UploadAuthParams,
    ) -> (
        impl Future<Output = Result<UploadedFile, UploadError>>,
        AbortHandle,
    ) {
        let uploader = self.clone();
        let (task, handle) = abortable(async move { uploader.upload(file, &params).await });

        let task = async move {
            match task.await {
                Ok(result) => result,
                Err(Aborted) => {
                    tracing::info!("Upload cancelled");
                    Err(UploadError::Cancelled)
                }
            }
        };

        (task, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::json;
    use std::time::Duration;

    const URL_ENDPOINT: &str = "https://ik.imagekit.io/library";

    fn uploader(upload_endpoint: impl Into<String>) -> Uploader {
        Uploader::new(upload_endpoint, URL_ENDPOINT)
    }

    fn params() -> UploadAuthParams {
        UploadAuthParams {
            token: "token".to_string(),
            expire: 1_800,
            signature: "sig".to_string(),
            public_key: "public".to_string(),
        }
    }

    fn image(len: usize) -> UploadFile {
        UploadFile {
            file_name: "cover.png".to_string(),
            folder: "books/covers".to_string(),
            kind: MediaKind::Image,
            bytes: Bytes::from(vec![7u8; len]),
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/upload", addr)
    }

    #[test]
    fn test_each_kind_has_distinct_message() {
        let errors = [
            UploadError::NoFileSelected,
            UploadError::Cancelled,
            UploadError::InvalidRequest("bad".to_string()),
            UploadError::Network("down".to_string()),
            UploadError::Server("500".to_string()),
            UploadError::Failed("Image size must be less than 20MB".to_string()),
        ];

        let titles: std::collections::HashSet<_> = errors.iter().map(|e| e.title()).collect();
        assert_eq!(titles.len(), errors.len());
        assert_eq!(errors[5].user_message(), "Image size must be less than 20MB");
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, String::new()),
            UploadError::InvalidRequest(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, String::new()),
            UploadError::Server(_)
        ));
    }

    #[tokio::test]
    async fn test_oversized_image_rejected_locally() {
        let uploader = uploader("http://127.0.0.1:9/upload");
        let result = uploader.upload(image(MAX_IMAGE_BYTES + 1), &params()).await;
        assert!(matches!(result, Err(UploadError::Failed(_))));
    }

    #[tokio::test]
    async fn test_empty_file_reports_no_file_selected() {
        let result = uploader("http://127.0.0.1:9/upload").upload(image(0), &params()).await;

        let err = result.unwrap_err();
        assert!(matches!(err, UploadError::NoFileSelected));
        assert_eq!(err.title(), "No File Selected");
        assert_eq!(err.user_message(), "Please select a file to upload");
    }

    #[tokio::test]
    async fn test_url_built_from_file_path_when_missing() {
        let app = Router::new().route(
            "/upload",
            post(|| async {
                Json(json!({
                    "filePath": "/books/covers/cover.png",
                    "fileId": "abc123"
                }))
            }),
        );
        let uploader = uploader(serve(app).await);

        let uploaded = uploader.upload(image(16), &params()).await.unwrap();
        assert_eq!(uploaded.url, "https://ik.imagekit.io/library/books/covers/cover.png");
        assert_eq!(uploaded.file_path.as_deref(), Some("/books/covers/cover.png"));
    }

    #[tokio::test]
    async fn test_response_without_location_fails() {
        let app = Router::new().route("/upload", post(|| async { Json(json!({ "fileId": "abc" })) }));
        let uploader = uploader(serve(app).await);

        let result = uploader.upload(image(16), &params()).await;
        assert!(matches!(result, Err(UploadError::Failed(_))));
    }

    #[test]
    fn test_from_config_uses_url_endpoint() {
        let config = ImageKitConfig {
            public_key: "public".to_string(),
            private_key: "private".to_string(),
            url_endpoint: "https://ik.imagekit.io/library/".to_string(),
            upload_endpoint: "https://upload.imagekit.io/api/v1/files/upload".to_string(),
        };

        let uploader = Uploader::from_config(&config);
        assert_eq!(uploader.public_url("covers/a.png"), "https://ik.imagekit.io/library/covers/a.png");
    }

    #[tokio::test]
    async fn test_successful_upload_returns_url() {
        let app = Router::new().route(
            "/upload",
            post(|| async {
                Json(json!({
                    "url": "https://ik.imagekit.io/library/books/covers/cover.png",
                    "fileId": "abc123",
                    "name": "cover.png"
                }))
            }),
        );
        let uploader = uploader(serve(app).await);

        let uploaded = uploader.upload(image(16), &params()).await.unwrap();
        assert_eq!(uploaded.url, "https://ik.imagekit.io/library/books/covers/cover.png");
        assert_eq!(uploaded.file_id.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_server_error_classified() {
        let app = Router::new().route(
            "/upload",
            post(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let uploader = uploader(serve(app).await);

        let result = uploader.upload(image(16), &params()).await;
        assert!(matches!(result, Err(UploadError::Server(_))));
    }

    #[tokio::test]
    async fn test_bad_signature_classified_as_invalid_request() {
        let app = Router::new().route(
            "/upload",
            post(|| async { (AxumStatus::FORBIDDEN, "signature mismatch") }),
        );
        let uploader = uploader(serve(app).await);

        let result = uploader.upload(image(16), &params()).await;
        assert!(matches!(result, Err(UploadError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let uploader = uploader(format!("http://{}/upload", addr));
        let result = uploader.upload(image(16), &params()).await;
        assert!(matches!(result, Err(UploadError::Network(_))));
    }

    #[tokio::test]
    async fn test_cancelled_upload() {
        let app = Router::new().route(
            "/upload",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        );
        let uploader = uploader(serve(app).await);

        let (task, handle) = uploader.upload_cancellable(image(16), params());
        let task = tokio::spawn(task);
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(UploadError::Cancelled)));
    }
}

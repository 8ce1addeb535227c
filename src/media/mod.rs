pub mod imagekit;
pub mod upload;

pub use imagekit::{upload_auth_params, UploadAuthParams};
pub use upload::{MediaKind, UploadError, UploadFile, UploadedFile, Uploader};

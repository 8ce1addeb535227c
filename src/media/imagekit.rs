// Upload authentication parameters for ImageKit

use crate::config::ImageKitConfig;
use crate::errors::{AppError, Result};
use ring::hmac;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use uuid::Uuid;

/// Lifetime of a signed upload token, in seconds
pub const UPLOAD_TOKEN_TTL_SECONDS: i64 = 30 * 60;

/// Parameters a client needs to upload straight to ImageKit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAuthParams {
    pub token: String,
    /// Unix seconds after which the signature is rejected
    pub expire: i64,
    pub signature: String,
    pub public_key: String,
}

/// Sign a fresh upload token with the account's private key
pub fn upload_auth_params(config: &ImageKitConfig, now_secs: i64) -> Result<UploadAuthParams> {
    if config.public_key.is_empty() {
        return Err(AppError::UploadAuth("public key is not configured".to_string()));
    }
    if config.private_key.is_empty() {
        return Err(AppError::UploadAuth("private key is not configured".to_string()));
    }

    let token = Uuid::new_v4().to_string();
    let expire = now_secs + UPLOAD_TOKEN_TTL_SECONDS;
    let signature = sign(&config.private_key, &token, expire);

    Ok(UploadAuthParams {
        token,
        expire,
        signature,
        public_key: config.public_key.clone(),
    })
}

/// HMAC-SHA1 over `token || expire`, lowercase hex
pub fn sign(private_key: &str, token: &str, expire: i64) -> String {
    hmac_sha1_hex(private_key.as_bytes(), format!("{}{}", token, expire).as_bytes())
}

fn hmac_sha1_hex(key: &[u8], message: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key);
    let tag = hmac::sign(&key, message);

    tag.as_ref().iter().fold(String::with_capacity(40), |mut out, byte| {
        let _ = write!(out, "{:02x}", byte);
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ImageKitConfig {
        ImageKitConfig {
            public_key: "public_test_key".to_string(),
            private_key: "private_test_key".to_string(),
            url_endpoint: "https://ik.imagekit.io/library".to_string(),
            upload_endpoint: "https://upload.imagekit.io/api/v1/files/upload".to_string(),
        }
    }

    #[test]
    fn test_hmac_sha1_known_vector() {
        // RFC 2202, test case 2
        assert_eq!(
            hmac_sha1_hex(b"Jefe", b"what do ya want for nothing?"),
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
    }

    #[test]
    fn test_params_are_signed_and_expire_in_thirty_minutes() {
        let params = upload_auth_params(&config(), 1_700_000_000).unwrap();

        assert_eq!(params.expire, 1_700_001_800);
        assert_eq!(params.public_key, "public_test_key");
        assert_eq!(params.signature.len(), 40);
        assert_eq!(
            params.signature,
            sign("private_test_key", &params.token, params.expire)
        );
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = upload_auth_params(&config(), 0).unwrap();
        let b = upload_auth_params(&config(), 0).unwrap();
        assert_ne!(a.token, b.token);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_missing_private_key_fails() {
        let mut config = config();
        config.private_key.clear();
        assert!(matches!(
            upload_auth_params(&config, 0),
            Err(AppError::UploadAuth(_))
        ));
    }

    #[test]
    fn test_serializes_with_public_key_camel_case() {
        let params = upload_auth_params(&config(), 0).unwrap();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["publicKey"], "public_test_key");
        assert_eq!(json["expire"], 1800);
    }
}

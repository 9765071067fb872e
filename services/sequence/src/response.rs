//! JSON bodies returned to the admin panel.
//!
//! Success and failure are distinct shapes:
//!
//! ```text
//! 200  {"success":true,"sequencePath":"<url>/sequences/oppo-reno/frame-","frameCount":2}
//! 4xx  {"success":false,"error":"Missing file or device name","code":"MISSING_INPUT"}
//! ```
//!
//! `sequencePath` is a prefix. Frame `i` lives at
//! `sequencePath + format!("{:03}", i) + ".jpg"` for `i` in `1..=frameCount`.

use crate::assets::StoredAsset;
use crate::error::{AssetError, SequenceError};
use crate::pipeline::SequenceResult;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Successful sequence upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceResponse {
    pub success: bool,
    pub sequence_path: String,
    pub frame_count: usize,
}

impl From<SequenceResult> for SequenceResponse {
    fn from(result: SequenceResult) -> Self {
        Self {
            success: true,
            sequence_path: result.sequence_path,
            frame_count: result.frame_count,
        }
    }
}

/// Successful asset upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    pub success: bool,
    pub path: String,
    pub public_url: String,
}

impl From<StoredAsset> for AssetResponse {
    fn from(asset: StoredAsset) -> Self {
        Self {
            success: true,
            path: asset.path,
            public_url: asset.public_url,
        }
    }
}

/// Public address lookup
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUrlResponse {
    pub public_url: String,
}

/// Failure body shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString, code: &str) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            code: code.to_string(),
        }
    }
}

fn status_for(client_error: bool) -> StatusCode {
    if client_error {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for SequenceError {
    fn into_response(self) -> Response {
        let status = match self {
            SequenceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => status_for(self.is_client_error()),
        };
        (status, Json(ErrorResponse::new(&self, self.code()))).into_response()
    }
}

impl IntoResponse for AssetError {
    fn into_response(self) -> Response {
        let status = match self {
            AssetError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => status_for(self.is_client_error()),
        };
        (status, Json(ErrorResponse::new(&self, self.code()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_success_shape() {
        let response: SequenceResponse = SequenceResult {
            sequence_path: "https://cdn.test/sequences/oppo-reno/frame-".to_string(),
            frame_count: 2,
        }
        .into();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "success": true,
                "sequencePath": "https://cdn.test/sequences/oppo-reno/frame-",
                "frameCount": 2
            })
        );
    }

    #[test]
    fn test_failure_shape() {
        let body = ErrorResponse::new(SequenceError::MissingInput, SequenceError::MissingInput.code());
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "success": false,
                "error": "Missing file or device name",
                "code": "MISSING_INPUT"
            })
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SequenceError::MissingInput.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SequenceError::CorruptArchive("bad".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SequenceError::InvalidDeviceName {
                name: " ".to_string(),
                reason: "blank",
            }
            .into_response()
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SequenceError::PayloadTooLarge("length limit exceeded".to_string())
                .into_response()
                .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AssetError::PayloadTooLarge("length limit exceeded".to_string())
                .into_response()
                .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );

        let upload_failed = SequenceError::UploadFailed {
            path: "sequences/a/frame-001.jpg".to_string(),
            source: StoreError::Backend("timeout".to_string()),
        };
        assert_eq!(
            upload_failed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AssetError::UnknownKind("x".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}

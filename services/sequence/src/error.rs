use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur while ingesting an image sequence.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("Missing file or device name")]
    MissingInput,

    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("Invalid device name {name:?}: {reason}")]
    InvalidDeviceName { name: String, reason: &'static str },

    #[error("Archive contains {count} frames, the limit is {limit}")]
    TooManyFrames { count: usize, limit: usize },

    #[error("Failed to upload {path}: {source}")]
    UploadFailed {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("{0}")]
    Unknown(String),
}

impl SequenceError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            SequenceError::MissingInput => "MISSING_INPUT",
            SequenceError::CorruptArchive(_) => "CORRUPT_ARCHIVE",
            SequenceError::InvalidDeviceName { .. } => "INVALID_DEVICE_NAME",
            SequenceError::TooManyFrames { .. } => "TOO_MANY_FRAMES",
            SequenceError::UploadFailed { .. } => "UPLOAD_FAILED",
            SequenceError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            SequenceError::MalformedRequest(_) => "MALFORMED_REQUEST",
            SequenceError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Whether the caller can fix the request and retry
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            SequenceError::UploadFailed { .. } | SequenceError::Unknown(_)
        )
    }
}

/// Errors that can occur while uploading a single admin asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Missing file or asset kind")]
    MissingInput,

    #[error("Unknown asset kind: {0:?}")]
    UnknownKind(String),

    #[error("Failed to upload {path}: {source}")]
    UploadFailed {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("{0}")]
    Unknown(String),
}

impl AssetError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            AssetError::MissingInput => "MISSING_INPUT",
            AssetError::UnknownKind(_) => "UNKNOWN_KIND",
            AssetError::UploadFailed { .. } => "UPLOAD_FAILED",
            AssetError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AssetError::MalformedRequest(_) => "MALFORMED_REQUEST",
            AssetError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Whether the caller can fix the request and retry
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AssetError::UploadFailed { .. } | AssetError::Unknown(_)
        )
    }
}

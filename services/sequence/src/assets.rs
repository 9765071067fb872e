use crate::error::AssetError;
use crate::store::{content_type_for, ObjectStore};
use bytes::Bytes;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Storage path of the CV, replaced on every upload
pub const CV_PATH: &str = "cv.pdf";

/// Kind of single-file asset managed from the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Project thumbnail, stored under `project-images/`
    ProjectImage,
    /// Device photo, stored under `gear-images/`
    GearImage,
    /// Curriculum vitae, always `cv.pdf`
    Cv,
}

impl FromStr for AssetKind {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project-image" => Ok(AssetKind::ProjectImage),
            "gear-image" => Ok(AssetKind::GearImage),
            "cv" => Ok(AssetKind::Cv),
            other => Err(AssetError::UnknownKind(other.to_string())),
        }
    }
}

impl AssetKind {
    /// Storage path and content type for an uploaded file name
    pub fn destination(&self, file_name: &str) -> (String, &'static str) {
        match self {
            AssetKind::Cv => (CV_PATH.to_string(), "application/pdf"),
            AssetKind::ProjectImage => image_destination("project-images", file_name),
            AssetKind::GearImage => image_destination("gear-images", file_name),
        }
    }
}

/// Images get a random name so uploads never collide
fn image_destination(folder: &str, file_name: &str) -> (String, &'static str) {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "bin".to_string());

    (
        format!("{}/{}.{}", folder, Uuid::new_v4(), extension),
        content_type_for(&extension),
    )
}

/// A single asset upload request
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub kind: AssetKind,
    /// Original file name, used for the extension
    pub file_name: String,
    pub data: Bytes,
}

/// Where an asset ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub path: String,
    pub public_url: String,
}

/// Uploads admin assets next to the sequences
pub struct AssetUploader {
    store: Arc<dyn ObjectStore>,
}

impl AssetUploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Store one asset and return its public address
    #[instrument(skip(self, upload), fields(kind = ?upload.kind, file_name = %upload.file_name))]
    pub async fn upload(&self, upload: AssetUpload) -> Result<StoredAsset, AssetError> {
        if upload.data.is_empty() {
            return Err(AssetError::MissingInput);
        }

        let (path, content_type) = upload.kind.destination(&upload.file_name);
        let size_bytes = upload.data.len();

        if let Err(source) = self.store.upsert(&path, upload.data, content_type).await {
            error!(path = %path, error = %source, "Asset upload failed");
            return Err(AssetError::UploadFailed { path, source });
        }

        metrics::counter!("assets.uploaded").increment(1);

        let public_url = self.store.public_url(&path);

        info!(
            path = %path,
            size_bytes = size_bytes,
            "Asset stored"
        );

        Ok(StoredAsset { path, public_url })
    }

    /// Public address of the current CV
    pub fn cv_url(&self) -> String {
        self.store.public_url(CV_PATH)
    }
}

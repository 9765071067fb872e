//! Sequence Service
//!
//! Upload backend for the portfolio admin panel. Its main job is turning a
//! zip of still images into a scroll-driven animation sequence: the archive
//! is unpacked, image entries are ordered by name and every frame is written
//! to an S3-compatible bucket as `sequences/{device}/frame-{NNN}.jpg`.
//!
//! ## Features
//!
//! - **Sequence ingestion**: zip in, numbered JPEG-labelled frames out, with
//!   the public base address and frame count reported back
//! - **Asset uploads**: project thumbnails, gear photos and the CV go into the
//!   same bucket
//! - **Any S3-compatible store**: Supabase Storage, MinIO or AWS S3, with
//!   multipart uploads for large objects
//!
//! ## Architecture
//!
//! ```text
//! POST /api/upload-sequence
//!        │
//!        ▼
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Device       │───▶│ Archive      │───▶│ Sequence     │
//! │ Folder       │    │ Reader       │    │ Ingestor     │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!                                                │ concurrent upserts
//!                                                ▼
//!                                         ┌──────────────┐
//!                                         │ Object       │
//!                                         │ Store        │
//!                                         └──────────────┘
//! ```

pub mod api;
pub mod archive;
pub mod assets;
pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod response;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{create_router, start_api_server, AppState};
pub use archive::{read_frames, ArchiveEntry, ArchiveLimits};
pub use assets::{AssetKind, AssetUpload, AssetUploader, StoredAsset};
pub use config::Config;
pub use error::{AssetError, SequenceError};
pub use naming::DeviceFolder;
pub use pipeline::{SequenceIngestor, SequenceResult, SequenceUpload};
pub use response::{ErrorResponse, SequenceResponse};
pub use store::{ObjectStore, S3ObjectStore, StoreError};

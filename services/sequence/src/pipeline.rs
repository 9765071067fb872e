//! Sequence ingestion: archive in, stored frames out.
//!
//! ```text
//! zip + device name ─▶ DeviceFolder ─▶ read_frames ─▶ Frame[1..N] ─▶ ObjectStore
//!                                                                     (concurrent)
//! ```
//!
//! Uploads are settled together and the request fails if any single frame
//! failed. Frames that were stored before the failure stay in the bucket;
//! nothing is rolled back and the caller only sees the first failure.

use crate::archive::{self, ArchiveLimits};
use crate::config::UploadConfig;
use crate::error::SequenceError;
use crate::naming::{DeviceFolder, FRAME_CONTENT_TYPE, FRAME_EXTENSION};
use crate::store::ObjectStore;
use bytes::Bytes;
use futures::future;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// One sequence upload request
#[derive(Debug, Clone)]
pub struct SequenceUpload {
    /// Caller label for the illustrated device
    pub device_name: String,
    /// Raw zip archive
    pub archive: Bytes,
}

/// A frame ready for upload
#[derive(Debug, Clone)]
pub struct Frame {
    /// 1-based position in the sequence
    pub index: usize,
    /// Storage path
    pub path: String,
    /// Frame contents
    pub data: Bytes,
}

/// Result of uploading a single frame
#[derive(Debug)]
pub struct UploadOutcome {
    pub index: usize,
    /// Public address on success
    pub result: Result<String, SequenceError>,
}

/// Aggregate result of a successful ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceResult {
    /// Public address prefix ending at `frame-`
    pub sequence_path: String,
    /// Number of accepted archive entries
    pub frame_count: usize,
}

impl SequenceResult {
    /// Public address of the frame at a 1-based index
    pub fn frame_url(&self, index: usize) -> String {
        format!("{}{:03}.{}", self.sequence_path, index, FRAME_EXTENSION)
    }
}

/// Drives archive extraction and frame uploads for one request at a time
pub struct SequenceIngestor {
    store: Arc<dyn ObjectStore>,
    concurrency: Option<usize>,
    max_frames: usize,
    limits: ArchiveLimits,
}

impl SequenceIngestor {
    pub fn new(store: Arc<dyn ObjectStore>, config: &UploadConfig) -> Self {
        Self {
            store,
            concurrency: config.concurrency,
            max_frames: config.max_frames,
            limits: ArchiveLimits::from_config(config),
        }
    }

    /// Ingest an archive as the frame sequence of a device
    #[instrument(skip(self, upload), fields(device_name = %upload.device_name, archive_bytes = upload.archive.len()))]
    pub async fn ingest(&self, upload: SequenceUpload) -> Result<SequenceResult, SequenceError> {
        if upload.archive.is_empty() || upload.device_name.is_empty() {
            return Err(SequenceError::MissingInput);
        }

        let folder = DeviceFolder::parse(&upload.device_name)?;

        let entries = archive::read_frames_blocking(upload.archive, self.limits).await?;

        if entries.len() > self.max_frames {
            return Err(SequenceError::TooManyFrames {
                count: entries.len(),
                limit: self.max_frames,
            });
        }

        let frames: Vec<Frame> = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| Frame {
                index: i + 1,
                path: folder.frame_path(i + 1),
                data: entry.data,
            })
            .collect();

        // Counted before upload; not re-verified afterwards
        let frame_count = frames.len();

        info!(
            folder = %folder,
            frame_count = frame_count,
            "Uploading frame sequence"
        );

        self.upload_frames(frames).await?;

        let result = SequenceResult {
            sequence_path: self.store.public_url(&folder.sequence_prefix()),
            frame_count,
        };

        info!(
            folder = %folder,
            frame_count = frame_count,
            sequence_path = %result.sequence_path,
            "Frame sequence stored"
        );

        Ok(result)
    }

    /// Upload every frame, wait for all of them, surface the lowest-index failure
    async fn upload_frames(&self, frames: Vec<Frame>) -> Result<(), SequenceError> {
        let uploads = frames.into_iter().map(|frame| self.upload_frame(frame));

        let mut outcomes: Vec<UploadOutcome> = match self.concurrency {
            Some(limit) => stream::iter(uploads).buffer_unordered(limit).collect().await,
            None => future::join_all(uploads).await,
        };

        outcomes.sort_by_key(|outcome| outcome.index);

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        let uploaded = outcomes.len() - failed;

        match outcomes.into_iter().find_map(|o| o.result.err()) {
            Some(err) => {
                warn!(
                    uploaded = uploaded,
                    failed = failed,
                    "Sequence upload failed, stored frames are left in place"
                );
                Err(err)
            }
            None => Ok(()),
        }
    }

    async fn upload_frame(&self, frame: Frame) -> UploadOutcome {
        let started = Instant::now();
        let size_bytes = frame.data.len();

        let result = self
            .store
            .upsert(&frame.path, frame.data, FRAME_CONTENT_TYPE)
            .await;

        metrics::histogram!("sequence.upload.duration_seconds")
            .record(started.elapsed().as_secs_f64());

        let result = match result {
            Ok(()) => {
                metrics::counter!("sequence.frames.uploaded").increment(1);
                metrics::counter!("sequence.bytes.uploaded").increment(size_bytes as u64);
                debug!(path = %frame.path, size_bytes = size_bytes, "Frame uploaded");
                Ok(self.store.public_url(&frame.path))
            }
            Err(source) => {
                metrics::counter!("sequence.uploads.failed").increment(1);
                error!(path = %frame.path, error = %source, "Frame upload failed");
                Err(SequenceError::UploadFailed {
                    path: frame.path,
                    source,
                })
            }
        };

        UploadOutcome {
            index: frame.index,
            result,
        }
    }
}

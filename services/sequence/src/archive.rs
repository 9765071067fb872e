//! Zip archive reading for frame uploads.
//!
//! Only regular files whose lower-cased name ends in `.jpg`, `.jpeg` or
//! `.png` are frames. Frames are ordered by their full in-archive name, so
//! callers control animation order through file naming (`001.jpg`, `002.jpg`).

use crate::config::UploadConfig;
use crate::error::SequenceError;
use bytes::Bytes;
use std::io::{Cursor, Read};
use tracing::{debug, trace};
use zip::ZipArchive;

/// Accepted image extensions, compared against the lower-cased entry name
pub const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// An accepted image entry extracted from an archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Full name inside the archive
    pub name: String,
    /// Decompressed file contents
    pub data: Bytes,
}

/// Whether an archive entry name denotes an accepted image
pub fn is_image_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Decompression caps applied while reading an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Largest accepted frame, declared or actual
    pub max_entry_bytes: usize,
    /// Largest accepted sum of all frames
    pub max_total_bytes: usize,
}

impl ArchiveLimits {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_entry_bytes: config.max_frame_bytes,
            max_total_bytes: config.max_archive_bytes,
        }
    }
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

/// Extract and order the image entries of a zip payload.
///
/// Any parse or decompression failure aborts the whole read, as does a
/// frame or archive that exceeds `limits`. An archive without images yields
/// an empty list.
pub fn read_frames(payload: &[u8], limits: ArchiveLimits) -> Result<Vec<ArchiveEntry>, SequenceError> {
    let mut archive = ZipArchive::new(Cursor::new(payload))
        .map_err(|e| SequenceError::CorruptArchive(e.to_string()))?;

    let mut entries = Vec::new();
    let mut total_bytes = 0usize;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| SequenceError::CorruptArchive(e.to_string()))?;

        let name = file.name().to_string();

        if file.is_dir() || !is_image_name(&name) {
            trace!(entry = %name, "Skipping archive entry");
            continue;
        }

        // Declared sizes are untrusted; reject early, then cap the actual read
        if file.size() > limits.max_entry_bytes as u64 {
            return Err(entry_too_large(&name, limits.max_entry_bytes));
        }

        let budget = limits
            .max_entry_bytes
            .min(limits.max_total_bytes.saturating_sub(total_bytes));

        let mut data = Vec::new();
        (&mut file)
            .take(budget as u64 + 1)
            .read_to_end(&mut data)
            .map_err(|e| SequenceError::CorruptArchive(format!("{}: {}", name, e)))?;

        if data.len() > limits.max_entry_bytes {
            return Err(entry_too_large(&name, limits.max_entry_bytes));
        }

        total_bytes += data.len();
        if total_bytes > limits.max_total_bytes {
            return Err(SequenceError::CorruptArchive(format!(
                "frames exceed {} bytes once decompressed",
                limits.max_total_bytes
            )));
        }

        entries.push(ArchiveEntry {
            name,
            data: Bytes::from(data),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    debug!(
        total_entries = archive.len(),
        image_entries = entries.len(),
        decompressed_bytes = total_bytes,
        "Archive read"
    );

    Ok(entries)
}

fn entry_too_large(name: &str, limit: usize) -> SequenceError {
    SequenceError::CorruptArchive(format!("{}: frame exceeds {} bytes", name, limit))
}

/// Run [`read_frames`] on the blocking pool; decompression is CPU bound
pub async fn read_frames_blocking(
    payload: Bytes,
    limits: ArchiveLimits,
) -> Result<Vec<ArchiveEntry>, SequenceError> {
    tokio::task::spawn_blocking(move || read_frames(&payload, limits))
        .await
        .map_err(|e| SequenceError::Unknown(format!("Archive reader task failed: {}", e)))?
}

//! Storage paths for sequence frames.
//!
//! Every frame of a sequence lives under
//! `sequences/{device-folder}/frame-{NNN}.jpg`, where `NNN` is the 1-based
//! frame index zero-padded to three digits. The extension is always `.jpg`
//! and the content type always `image/jpeg`, whatever the source format was.

use crate::error::SequenceError;
use std::fmt;

/// Top-level prefix for all sequences
pub const SEQUENCE_ROOT: &str = "sequences";

/// Content type every frame is stored with
pub const FRAME_CONTENT_TYPE: &str = "image/jpeg";

/// Extension every frame is stored with
pub const FRAME_EXTENSION: &str = "jpg";

/// Folder segment derived from a caller-supplied device name.
///
/// Normalization lower-cases the name and collapses every whitespace run
/// into one hyphen. The name is not trimmed, so `" Pixel"` becomes `-pixel`.
///
/// Whitespace is the ECMAScript `\s` set: Unicode `White_Space` plus
/// U+FEFF, minus U+0085.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceFolder(String);

impl DeviceFolder {
    /// Normalize a device name into a folder segment
    pub fn parse(device_name: &str) -> Result<Self, SequenceError> {
        if device_name.chars().all(is_name_space) {
            return Err(SequenceError::InvalidDeviceName {
                name: device_name.to_string(),
                reason: "name is blank",
            });
        }

        // A folder is exactly one key segment
        if device_name.contains(['/', '\\']) {
            return Err(SequenceError::InvalidDeviceName {
                name: device_name.to_string(),
                reason: "name contains a path separator",
            });
        }

        let mut folder = String::with_capacity(device_name.len());
        let mut in_whitespace = false;

        for c in device_name.to_lowercase().chars() {
            if is_name_space(c) {
                if !in_whitespace {
                    folder.push('-');
                }
                in_whitespace = true;
            } else {
                folder.push(c);
                in_whitespace = false;
            }
        }

        Ok(Self(folder))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage path of the frame at a 1-based index
    pub fn frame_path(&self, index: usize) -> String {
        format!("{}{:03}.{}", self.sequence_prefix(), index, FRAME_EXTENSION)
    }

    /// Path prefix shared by every frame, ending at `frame-`
    pub fn sequence_prefix(&self) -> String {
        format!("{}/{}/frame-", SEQUENCE_ROOT, self.0)
    }
}

fn is_name_space(c: char) -> bool {
    match c {
        '\u{feff}' => true,
        '\u{85}' => false,
        c => c.is_whitespace(),
    }
}

impl fmt::Display for DeviceFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

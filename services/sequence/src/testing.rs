//! Fixtures shared by the unit tests.

use crate::store::{ObjectStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Mutex;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const PUBLIC_BASE: &str = "https://cdn.test/storage/v1/object/public/documents";

/// Build a zip archive in memory; names ending in `/` become directories
pub fn build_zip(entries: &[(&str, &str)]) -> Bytes {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, FileOptions::default()).unwrap();
        } else {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
    }

    Bytes::from(writer.finish().unwrap().into_inner())
}

/// Build a single stored entry whose zip64 extra field declares
/// `declared_size` uncompressed bytes, whatever `data` really holds
pub fn build_zip_declaring_size(name: &str, data: &[u8], declared_size: u64) -> Bytes {
    // Zip64 extended information: uncompressed size only
    let mut extra = Vec::new();
    extra.extend_from_slice(&0x0001u16.to_le_bytes());
    extra.extend_from_slice(&8u16.to_le_bytes());
    extra.extend_from_slice(&declared_size.to_le_bytes());

    let mut local = Vec::new();
    local.extend_from_slice(&0x04034b50u32.to_le_bytes());
    local.extend_from_slice(&45u16.to_le_bytes()); // version needed
    local.extend_from_slice(&0u16.to_le_bytes()); // flags
    local.extend_from_slice(&0u16.to_le_bytes()); // stored
    local.extend_from_slice(&0u16.to_le_bytes()); // time
    local.extend_from_slice(&0x0021u16.to_le_bytes()); // date
    local.extend_from_slice(&0u32.to_le_bytes()); // crc32
    local.extend_from_slice(&(data.len() as u32).to_le_bytes());
    local.extend_from_slice(&u32::MAX.to_le_bytes());
    local.extend_from_slice(&(name.len() as u16).to_le_bytes());
    local.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    local.extend_from_slice(name.as_bytes());
    local.extend_from_slice(&extra);
    local.extend_from_slice(data);

    let mut central = Vec::new();
    central.extend_from_slice(&0x02014b50u32.to_le_bytes());
    central.extend_from_slice(&45u16.to_le_bytes()); // version made by
    central.extend_from_slice(&45u16.to_le_bytes()); // version needed
    central.extend_from_slice(&0u16.to_le_bytes());
    central.extend_from_slice(&0u16.to_le_bytes());
    central.extend_from_slice(&0u16.to_le_bytes());
    central.extend_from_slice(&0x0021u16.to_le_bytes());
    central.extend_from_slice(&0u32.to_le_bytes());
    central.extend_from_slice(&(data.len() as u32).to_le_bytes());
    central.extend_from_slice(&u32::MAX.to_le_bytes());
    central.extend_from_slice(&(name.len() as u16).to_le_bytes());
    central.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    central.extend_from_slice(&0u16.to_le_bytes()); // comment length
    central.extend_from_slice(&0u16.to_le_bytes()); // disk number
    central.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
    central.extend_from_slice(&0u32.to_le_bytes()); // external attributes
    central.extend_from_slice(&0u32.to_le_bytes()); // local header offset
    central.extend_from_slice(name.as_bytes());
    central.extend_from_slice(&extra);

    let mut end = Vec::new();
    end.extend_from_slice(&0x06054b50u32.to_le_bytes());
    end.extend_from_slice(&0u16.to_le_bytes());
    end.extend_from_slice(&0u16.to_le_bytes());
    end.extend_from_slice(&1u16.to_le_bytes());
    end.extend_from_slice(&1u16.to_le_bytes());
    end.extend_from_slice(&(central.len() as u32).to_le_bytes());
    end.extend_from_slice(&(local.len() as u32).to_le_bytes());
    end.extend_from_slice(&0u16.to_le_bytes());

    let mut archive = local;
    archive.extend_from_slice(&central);
    archive.extend_from_slice(&end);
    Bytes::from(archive)
}

/// A stored object
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-memory object store that keeps every write and fails on chosen paths
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    failing_paths: HashSet<String>,
    writes: Mutex<usize>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(paths: &[&str]) -> Self {
        Self {
            failing_paths: paths.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upsert(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), StoreError> {
        // Yield so sibling uploads interleave
        tokio::task::yield_now().await;

        *self.writes.lock().unwrap() += 1;

        if self.failing_paths.contains(path) {
            return Err(StoreError::Backend(format!("simulated storage error for {}", path)));
        }

        self.objects.lock().unwrap().insert(
            path.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", PUBLIC_BASE, path)
    }
}

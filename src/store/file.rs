//! JSON file record store
//!
//! Layout: one JSON document
//!
//! ```text
//! {"checksum": <u32>, "records": {"<id>": {<flat record>}, ...}}
//! ```
//!
//! The checksum is CRC32 over the compact serialization of `records`.
//! `serde_json` maps are key-sorted, so the bytes are canonical.
//!
//! Writes:
//! 1. Serialize the next record set
//! 2. Write it to `<file>.tmp` and fsync
//! 3. Rename over the store file
//! 4. Only then swap the in-memory copy

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{StoreError, StoreResult};
use super::RecordStore;
use crate::record::FlatRecord;

type RecordSet = BTreeMap<String, FlatRecord>;

#[derive(Serialize, Deserialize)]
struct StoreFile {
    checksum: u32,
    records: RecordSet,
}

/// Durable store kept entirely in memory and mirrored to one JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: RecordSet,
}

impl JsonFileStore {
    /// Opens the store at `path`, creating an empty one if the file is missing.
    ///
    /// # Errors
    ///
    /// - `Malformed` if the file is not a store document
    /// - `Corrupted` if the checksum does not match the records
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Self::create(path);
            }
            Err(e) => {
                return Err(StoreError::io(
                    format!("Failed to read store file: {}", path.display()),
                    e,
                ))
            }
        };

        let file: StoreFile =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Malformed(e.to_string()))?;

        let canonical = canonical_bytes(&file.records)?;
        if !verify_checksum(&canonical, file.checksum) {
            return Err(StoreError::Corrupted {
                expected: file.checksum,
                actual: compute_checksum(&canonical),
            });
        }

        Ok(Self {
            path,
            records: file.records,
        })
    }

    /// Writes an empty store at `path`, replacing anything there.
    pub fn create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::io(
                    format!("Failed to create data directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let records = RecordSet::new();
        write_atomic(&path, &records)?;
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists `next` and adopts it only if the write succeeded.
    fn commit(&mut self, next: RecordSet) -> StoreResult<()> {
        write_atomic(&self.path, &next)?;
        self.records = next;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn get(&self, id: &str) -> StoreResult<Option<FlatRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, id: &str, record: FlatRecord) -> StoreResult<()> {
        let mut next = self.records.clone();
        next.insert(id.to_string(), record);
        self.commit(next)
    }

    fn list(&self) -> StoreResult<Vec<FlatRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn remove(&mut self, id: &str) -> StoreResult<bool> {
        if !self.records.contains_key(id) {
            return Ok(false);
        }
        let mut next = self.records.clone();
        next.remove(id);
        self.commit(next)?;
        Ok(true)
    }

    fn contains(&self, id: &str) -> StoreResult<bool> {
        Ok(self.records.contains_key(id))
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.records.len())
    }
}

fn canonical_bytes(records: &RecordSet) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(records).map_err(|e| StoreError::Malformed(e.to_string()))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomic(path: &Path, records: &RecordSet) -> StoreResult<()> {
    let checksum = compute_checksum(&canonical_bytes(records)?);
    let document = StoreFile {
        checksum,
        records: records.clone(),
    };
    let bytes =
        serde_json::to_vec_pretty(&document).map_err(|e| StoreError::Malformed(e.to_string()))?;

    let tmp = temp_path(path);
    let mut file = File::create(&tmp).map_err(|e| {
        StoreError::io(format!("Failed to create temp file: {}", tmp.display()), e)
    })?;
    file.write_all(&bytes)
        .map_err(|e| StoreError::io(format!("Failed to write temp file: {}", tmp.display()), e))?;
    file.sync_all()
        .map_err(|e| StoreError::io(format!("fsync failed: {}", tmp.display()), e))?;

    fs::rename(&tmp, path).map_err(|e| {
        StoreError::io(format!("Failed to replace store file: {}", path.display()), e)
    })
}

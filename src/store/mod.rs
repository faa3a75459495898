//! Record store
//!
//! Holds flat record representations keyed by patient identifier. The store
//! knows nothing about validation; it persists whatever the service hands it.
//!
//! # Invariants
//!
//! - `list` is ordered by identifier
//! - A failed write leaves the previous contents visible
//! - File stores verify their checksum before serving anything

mod checksum;
mod errors;
mod file;
mod memory;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::record::FlatRecord;

/// Keyed access to stored flat records.
pub trait RecordStore {
    fn get(&self, id: &str) -> StoreResult<Option<FlatRecord>>;

    /// Inserts or replaces the record stored under `id`.
    fn put(&mut self, id: &str, record: FlatRecord) -> StoreResult<()>;

    /// All stored records, ordered by identifier.
    fn list(&self) -> StoreResult<Vec<FlatRecord>>;

    /// Removes the record under `id`, returning whether one existed.
    fn remove(&mut self, id: &str) -> StoreResult<bool>;

    fn contains(&self, id: &str) -> StoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.list()?.len())
    }
}

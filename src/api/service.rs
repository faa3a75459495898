//! Record service
//!
//! Read/modify/write orchestration over a [`RecordStore`].
//!
//! Flow for writes:
//! 1. Reject what can be rejected without the store (update keys)
//! 2. Read the current state (conflict / not-found checks)
//! 3. Build the new record through the full pipeline
//! 4. Put the flat form
//!
//! Nothing is written unless step 3 succeeded.

use thiserror::Error;

use crate::merge::{Merger, PartialUpdate};
use crate::observability::{log_event_with_fields, Event};
use crate::record::{FlatRecord, Record, RecordError, RecordValidator};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Numeric field a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Height,
    Weight,
    Bmi,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "height" => Some(SortKey::Height),
            "weight" => Some(SortKey::Weight),
            "bmi" => Some(SortKey::Bmi),
            _ => None,
        }
    }

    fn value(&self, record: &Record) -> f64 {
        match self {
            SortKey::Height => record.height(),
            SortKey::Weight => record.weight(),
            SortKey::Bmi => record.bmi(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

pub struct RecordService<S: RecordStore> {
    store: S,
    validator: RecordValidator,
}

impl<S: RecordStore> RecordService<S> {
    pub fn new(store: S, validator: RecordValidator) -> Self {
        Self { store, validator }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn validator(&self) -> &RecordValidator {
        &self.validator
    }

    /// Validates and stores a new record.
    ///
    /// # Errors
    ///
    /// - `Conflict` if `id` is already stored (checked before validation)
    /// - `FieldValidation` / `CrossFieldValidation` from the pipeline
    pub fn create(&mut self, id: &str, input: &FlatRecord) -> ServiceResult<Record> {
        if self.store.contains(id)? {
            return Err(RecordError::Conflict(id.to_string()).into());
        }

        let record = self
            .validator
            .build(id, input)
            .map_err(|e| rejected("create", id, e))?;

        self.store
            .put(id, record.to_flat())
            .map_err(|e| write_failed("create", id, e))?;
        log_event_with_fields(
            Event::RecordCreated,
            &[("id", id), ("verdict", record.verdict().as_str())],
        );
        Ok(record)
    }

    /// Reads a record; derived fields are recomputed, never trusted.
    pub fn get(&self, id: &str) -> ServiceResult<Record> {
        let stored = self
            .store
            .get(id)?
            .ok_or_else(|| RecordError::NotFound(id.to_string()))?;
        Ok(self.validator.from_flat(&stored)?)
    }

    /// All records, ordered by identifier.
    pub fn list(&self) -> ServiceResult<Vec<Record>> {
        self.store
            .list()?
            .iter()
            .map(|flat| self.validator.from_flat(flat).map_err(ServiceError::from))
            .collect()
    }

    /// All records ordered by `key`. Ties keep identifier order.
    pub fn sorted(&self, key: SortKey, order: SortOrder) -> ServiceResult<Vec<Record>> {
        let mut records = self.list()?;
        records.sort_by(|a, b| {
            let ord = key.value(a).total_cmp(&key.value(b));
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        Ok(records)
    }

    /// Applies a partial update and stores the rebuilt record.
    ///
    /// # Errors
    ///
    /// - `FieldValidation` for reserved, unknown or cleared required keys
    ///   (before the store is read)
    /// - `NotFound` if `id` is not stored
    /// - `FieldValidation` / `CrossFieldValidation` for the merged record;
    ///   the stored record is left untouched
    pub fn update(&mut self, id: &str, update: &PartialUpdate) -> ServiceResult<Record> {
        let merger = Merger::new(&self.validator);
        merger
            .check_update(update)
            .map_err(|e| rejected("update", id, e))?;

        let stored = self.store.get(id)?;
        let record = merger
            .apply(id, stored.as_ref(), update)
            .map_err(|e| rejected("update", id, e))?;

        self.store
            .put(id, record.to_flat())
            .map_err(|e| write_failed("update", id, e))?;

        let fields = update.fields().collect::<Vec<_>>().join(",");
        log_event_with_fields(
            Event::RecordUpdated,
            &[
                ("fields", fields.as_str()),
                ("id", id),
                ("verdict", record.verdict().as_str()),
            ],
        );
        Ok(record)
    }

    pub fn delete(&mut self, id: &str) -> ServiceResult<()> {
        let removed = self
            .store
            .remove(id)
            .map_err(|e| write_failed("delete", id, e))?;
        if !removed {
            return Err(RecordError::NotFound(id.to_string()).into());
        }
        log_event_with_fields(Event::RecordDeleted, &[("id", id)]);
        Ok(())
    }

    pub fn count(&self) -> ServiceResult<usize> {
        Ok(self.store.len()?)
    }
}

/// Logs validation rejections and lifts the error.
fn rejected(op: &str, id: &str, err: RecordError) -> ServiceError {
    if err.is_validation() {
        let count = err.violations().len().to_string();
        log_event_with_fields(
            Event::ValidationRejected,
            &[
                ("code", err.code().code()),
                ("id", id),
                ("op", op),
                ("violations", count.as_str()),
            ],
        );
    }
    ServiceError::Record(err)
}

/// Logs a failed store write and lifts the error.
fn write_failed(op: &str, id: &str, err: StoreError) -> ServiceError {
    let detail = err.to_string();
    log_event_with_fields(
        Event::StoreWriteFailed,
        &[
            ("code", err.code()),
            ("error", detail.as_str()),
            ("id", id),
            ("op", op),
        ],
    );
    ServiceError::Store(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Verdict;
    use crate::store::{MemoryStore, StoreResult};
    use serde_json::{json, Value};
    use std::io;

    /// Serves reads from memory and refuses every write.
    struct ReadOnlyStore(MemoryStore);

    impl RecordStore for ReadOnlyStore {
        fn get(&self, id: &str) -> StoreResult<Option<FlatRecord>> {
            self.0.get(id)
        }

        fn put(&mut self, _id: &str, _record: FlatRecord) -> StoreResult<()> {
            Err(StoreError::io(
                "store is read-only",
                io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }

        fn list(&self) -> StoreResult<Vec<FlatRecord>> {
            self.0.list()
        }

        fn remove(&mut self, _id: &str) -> StoreResult<bool> {
            Err(StoreError::io(
                "store is read-only",
                io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }
    }

    fn service() -> RecordService<MemoryStore> {
        RecordService::new(MemoryStore::new(), RecordValidator::default())
    }

    fn input(value: Value) -> FlatRecord {
        value.as_object().unwrap().clone()
    }

    fn patient(height: f64, weight: f64) -> FlatRecord {
        input(json!({
            "name": "asha",
            "city": "delhi",
            "age": 30,
            "gender": "female",
            "height": height,
            "weight": weight
        }))
    }

    #[test]
    fn test_create_then_get() {
        let mut svc = service();
        let created = svc.create("P001", &patient(170.0, 70.0)).unwrap();
        assert_eq!(created.bmi(), 24.22);
        assert_eq!(created.verdict(), Verdict::Normal);
        assert_eq!(svc.get("P001").unwrap(), created);
        assert_eq!(svc.count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_create_conflicts() {
        let mut svc = service();
        svc.create("P001", &patient(170.0, 70.0)).unwrap();
        let before = svc.store().get("P001").unwrap();

        let err = svc.create("P001", &patient(150.0, 90.0)).unwrap_err();
        assert!(matches!(err, ServiceError::Record(RecordError::Conflict(_))));
        assert_eq!(svc.store().get("P001").unwrap(), before);
    }

    #[test]
    fn test_elderly_without_emergency_not_persisted() {
        let mut svc = service();
        let mut raw = patient(170.0, 70.0);
        raw.insert("age".into(), json!(65));
        raw.insert("contacts".into(), json!({"phone": "123"}));

        let err = svc.create("P001", &raw).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Record(RecordError::CrossFieldValidation(_))
        ));
        assert_eq!(svc.count().unwrap(), 0);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut svc = service();
        let err = svc
            .update("P999", &PartialUpdate::new().set("weight", json!(90)))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Record(RecordError::NotFound(_))));
        assert_eq!(svc.count().unwrap(), 0);
    }

    #[test]
    fn test_update_persists_recomputed_verdict() {
        let mut svc = service();
        svc.create("P002", &patient(160.0, 50.0)).unwrap();
        svc.update("P002", &PartialUpdate::new().set("weight", json!(90)))
            .unwrap();

        let stored = svc.store().get("P002").unwrap().unwrap();
        assert_eq!(stored["bmi"], json!(35.16));
        assert_eq!(stored["verdict"], json!("obese"));
    }

    #[test]
    fn test_sorted_desc_keeps_id_order_on_ties() {
        let mut svc = service();
        svc.create("P003", &patient(170.0, 70.0)).unwrap();
        svc.create("P001", &patient(170.0, 50.0)).unwrap();
        svc.create("P002", &patient(170.0, 70.0)).unwrap();

        let ids: Vec<String> = svc
            .sorted(SortKey::Weight, SortOrder::Desc)
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["P002", "P003", "P001"]);

        let ids: Vec<String> = svc
            .sorted(SortKey::Bmi, SortOrder::Asc)
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["P001", "P002", "P003"]);
    }

    #[test]
    fn test_delete() {
        let mut svc = service();
        svc.create("P001", &patient(170.0, 70.0)).unwrap();
        svc.delete("P001").unwrap();
        assert!(matches!(
            svc.delete("P001").unwrap_err(),
            ServiceError::Record(RecordError::NotFound(_))
        ));
        assert!(matches!(
            svc.get("P001").unwrap_err(),
            ServiceError::Record(RecordError::NotFound(_))
        ));
    }

    #[test]
    fn test_store_write_failure_surfaces_as_store_error() {
        let mut seeded = MemoryStore::new();
        let record = RecordValidator::default()
            .build("P001", &patient(170.0, 70.0))
            .unwrap();
        seeded.put("P001", record.to_flat()).unwrap();
        let mut svc = RecordService::new(ReadOnlyStore(seeded), RecordValidator::default());

        let err = svc.create("P002", &patient(170.0, 70.0)).unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Io { .. })));

        let err = svc
            .update("P001", &PartialUpdate::new().set("weight", json!(90)))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert!(matches!(svc.delete("P001").unwrap_err(), ServiceError::Store(_)));

        assert_eq!(svc.get("P001").unwrap(), record);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!(SortKey::parse("bmi"), Some(SortKey::Bmi));
        assert_eq!(SortKey::parse("age"), None);
        assert_eq!(SortOrder::parse("desc"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::parse("DESC"), None);
        assert_eq!(SortOrder::default(), SortOrder::Asc);
    }
}

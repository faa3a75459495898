//! In-memory record store

use std::collections::BTreeMap;

use super::errors::StoreResult;
use super::RecordStore;
use crate::record::FlatRecord;

/// Volatile store backed by an ordered map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, FlatRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, id: &str) -> StoreResult<Option<FlatRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, id: &str, record: FlatRecord) -> StoreResult<()> {
        self.records.insert(id.to_string(), record);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<FlatRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn remove(&mut self, id: &str) -> StoreResult<bool> {
        Ok(self.records.remove(id).is_some())
    }

    fn contains(&self, id: &str) -> StoreResult<bool> {
        Ok(self.records.contains_key(id))
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(id: &str) -> FlatRecord {
        json!({"id": id, "age": 30}).as_object().unwrap().clone()
    }

    #[test]
    fn test_put_get_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("P001").unwrap(), None);

        store.put("P001", flat("P001")).unwrap();
        assert!(store.contains("P001").unwrap());
        assert_eq!(store.get("P001").unwrap(), Some(flat("P001")));

        assert!(store.remove("P001").unwrap());
        assert!(!store.remove("P001").unwrap());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_list_ordered_by_id() {
        let mut store = MemoryStore::new();
        store.put("P010", flat("P010")).unwrap();
        store.put("P002", flat("P002")).unwrap();
        store.put("A001", flat("A001")).unwrap();

        let ids: Vec<_> = store
            .list()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["A001", "P002", "P010"]);
    }
}

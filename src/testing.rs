use crate::errors::StoreError;
use crate::models::{CatalogItem, Owner, OwnerProfile, RawProgressRecord};
use crate::store::{Catalog, OwnerDirectory, ProgressStore};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory store with switchable failures.
#[derive(Default)]
pub struct MemoryStore {
    pub owners: Vec<Owner>,
    pub records: Mutex<BTreeMap<String, BTreeMap<String, Map<String, Value>>>>,
    pub books: Vec<CatalogItem>,
    pub fail_owner_listing: bool,
    pub failing_owners: HashSet<String>,
    pub failing_writes: HashSet<String>,
    pub failing_books: HashSet<String>,
    pub writes: AtomicU64,
}

impl MemoryStore {
    pub fn with_owner(mut self, id: &str, name: &str) -> Self {
        self.owners.push(Owner {
            id: id.to_string(),
            profile: OwnerProfile {
                full_name: Some(name.to_string()),
                ..OwnerProfile::default()
            },
        });
        self
    }

    pub fn with_record(self, owner_id: &str, record_id: &str, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => panic!("record fields must be an object"),
        };
        self.records
            .lock()
            .unwrap()
            .entry(owner_id.to_string())
            .or_default()
            .insert(record_id.to_string(), fields);
        self
    }

    pub fn with_book(mut self, id: &str, title: &str) -> Self {
        self.books.push(CatalogItem {
            id: id.to_string(),
            title: Some(title.to_string()),
        });
        self
    }

    pub fn record(&self, owner_id: &str, record_id: &str) -> Option<Map<String, Value>> {
        self.records
            .lock()
            .unwrap()
            .get(owner_id)
            .and_then(|records| records.get(record_id))
            .cloned()
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn owner_records(&self, owner_id: &str) -> Result<Vec<RawProgressRecord>, StoreError> {
        if self.failing_owners.contains(owner_id) {
            return Err(StoreError::Backend(format!("owner {owner_id} unavailable")));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(owner_id)
            .map(|records| {
                records
                    .iter()
                    .map(|(id, fields)| RawProgressRecord::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl OwnerDirectory for MemoryStore {
    async fn list_owners(&self) -> Result<Vec<Owner>, StoreError> {
        if self.fail_owner_listing {
            return Err(StoreError::Backend("users unavailable".into()));
        }
        Ok(self.owners.clone())
    }

    async fn owner_profile(&self, owner_id: &str) -> Result<Option<OwnerProfile>, StoreError> {
        Ok(self
            .owners
            .iter()
            .find(|owner| owner.id == owner_id)
            .map(|owner| owner.profile.clone()))
    }
}

impl ProgressStore for MemoryStore {
    async fn list_records(&self, owner_id: &str) -> Result<Vec<RawProgressRecord>, StoreError> {
        self.owner_records(owner_id)
    }

    async fn list_recent(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<RawProgressRecord>, StoreError> {
        let mut records: Vec<_> = self
            .owner_records(owner_id)?
            .into_iter()
            .filter_map(|record| record.last_read_at().map(|at| (at, record)))
            .collect();
        records.sort_by(|a, b| b.0.sort_key().cmp(&a.0.sort_key()));
        Ok(records.into_iter().take(limit).map(|(_, record)| record).collect())
    }

    async fn get_record(
        &self,
        owner_id: &str,
        record_id: &str,
    ) -> Result<Option<RawProgressRecord>, StoreError> {
        Ok(self
            .record(owner_id, record_id)
            .map(|fields| RawProgressRecord::new(record_id, fields)))
    }

    async fn write_record(
        &self,
        owner_id: &str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        if self.failing_writes.contains(record_id) {
            return Err(StoreError::Backend(format!("write to {record_id} rejected")));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let stored = records
            .entry(owner_id.to_string())
            .or_default()
            .entry(record_id.to_string())
            .or_default();
        stored.extend(fields);
        Ok(())
    }

    async fn delete_record(&self, owner_id: &str, record_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get_mut(owner_id)
            .and_then(|records| records.remove(record_id))
            .is_some())
    }
}

impl Catalog for MemoryStore {
    async fn find_by_book_id(&self, book_id: &str) -> Result<Option<CatalogItem>, StoreError> {
        if self.failing_books.contains(book_id) {
            return Err(StoreError::Backend(format!("book {book_id} lookup failed")));
        }
        Ok(self.books.iter().find(|book| book.id == book_id).cloned())
    }

    async fn count_items(&self) -> Result<u64, StoreError> {
        Ok(self.books.len() as u64)
    }
}

use crate::errors::StoreError;
use crate::models::{CatalogItem, Owner, OwnerProfile, RawProgressRecord};
use crate::store::{Catalog, OwnerDirectory, ProgressStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::error;

/// The whole document database as held on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreData {
    #[serde(default)]
    pub users: BTreeMap<String, OwnerProfile>,
    #[serde(default)]
    pub books: Vec<CatalogItem>,
    #[serde(default, rename = "readingStates")]
    pub reading_states: BTreeMap<String, BTreeMap<String, Map<String, Value>>>,
}

pub async fn load_data(path: &Path) -> StoreData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                StoreData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            StoreData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

/// File-backed store; every write rewrites the document.
pub struct JsonStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonStore {
    pub fn new(path: PathBuf, data: StoreData) -> Self {
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self::new(path, data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OwnerDirectory for JsonStore {
    async fn list_owners(&self) -> Result<Vec<Owner>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .iter()
            .map(|(id, profile)| Owner {
                id: id.clone(),
                profile: profile.clone(),
            })
            .collect())
    }

    async fn owner_profile(&self, owner_id: &str) -> Result<Option<OwnerProfile>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.users.get(owner_id).cloned())
    }
}

impl ProgressStore for JsonStore {
    async fn list_records(&self, owner_id: &str) -> Result<Vec<RawProgressRecord>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .reading_states
            .get(owner_id)
            .map(|records| {
                records
                    .iter()
                    .map(|(id, fields)| RawProgressRecord::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_recent(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<RawProgressRecord>, StoreError> {
        let mut dated: Vec<_> = self
            .list_records(owner_id)
            .await?
            .into_iter()
            .filter_map(|record| record.last_read_at().map(|at| (at, record)))
            .collect();
        dated.sort_by(|a, b| b.0.sort_key().cmp(&a.0.sort_key()));
        Ok(dated.into_iter().take(limit).map(|(_, record)| record).collect())
    }

    async fn get_record(
        &self,
        owner_id: &str,
        record_id: &str,
    ) -> Result<Option<RawProgressRecord>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .reading_states
            .get(owner_id)
            .and_then(|records| records.get(record_id))
            .map(|fields| RawProgressRecord::new(record_id, fields.clone())))
    }

    async fn write_record(
        &self,
        owner_id: &str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut updated = data.clone();
        updated
            .reading_states
            .entry(owner_id.to_string())
            .or_default()
            .entry(record_id.to_string())
            .or_default()
            .extend(fields);
        persist_data(&self.path, &updated).await?;
        *data = updated;
        Ok(())
    }

    async fn delete_record(&self, owner_id: &str, record_id: &str) -> Result<bool, StoreError> {
        let mut data = self.data.lock().await;
        let mut updated = data.clone();
        let removed = updated
            .reading_states
            .get_mut(owner_id)
            .and_then(|records| records.remove(record_id))
            .is_some();
        if removed {
            persist_data(&self.path, &updated).await?;
            *data = updated;
        }
        Ok(removed)
    }
}

impl Catalog for JsonStore {
    async fn find_by_book_id(&self, book_id: &str) -> Result<Option<CatalogItem>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.books.iter().find(|book| book.id == book_id).cloned())
    }

    async fn count_items(&self) -> Result<u64, StoreError> {
        let data = self.data.lock().await;
        Ok(data.books.len() as u64)
    }
}

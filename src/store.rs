//! Seams to the document store that owns users, books and reading progress.
//!
//! Every method returns a `Send` future so the operations built on top can be
//! driven from axum handlers.

use crate::errors::StoreError;
use crate::models::{CatalogItem, Owner, OwnerProfile, RawProgressRecord};
use serde_json::{Map, Value};
use std::future::Future;

pub trait OwnerDirectory: Sync {
    fn list_owners(&self) -> impl Future<Output = Result<Vec<Owner>, StoreError>> + Send;

    fn owner_profile(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<Option<OwnerProfile>, StoreError>> + Send;
}

pub trait ProgressStore: Sync {
    /// Every record in the owner's sub-collection, in id order.
    fn list_records(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<Vec<RawProgressRecord>, StoreError>> + Send;

    /// Up to `limit` records ordered by `lastReadAt` descending. Records
    /// without a `lastReadAt` are not part of this ordering.
    fn list_recent(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RawProgressRecord>, StoreError>> + Send;

    fn get_record(
        &self,
        owner_id: &str,
        record_id: &str,
    ) -> impl Future<Output = Result<Option<RawProgressRecord>, StoreError>> + Send;

    /// Merges `fields` into the stored record, creating it if needed.
    fn write_record(
        &self,
        owner_id: &str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns whether a record was removed.
    fn delete_record(
        &self,
        owner_id: &str,
        record_id: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

pub trait Catalog: Sync {
    fn find_by_book_id(
        &self,
        book_id: &str,
    ) -> impl Future<Output = Result<Option<CatalogItem>, StoreError>> + Send;

    fn count_items(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

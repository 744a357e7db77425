//! Recent reading activity across every owner.
//!
//! The pipeline is split into an I/O stage that collects one batch per owner,
//! a pure stage that filters, normalizes, orders and truncates, and a final
//! I/O stage that attaches book titles.

use crate::errors::StoreError;
use crate::models::{NormalizedProgressRecord, RawProgressRecord, ReadingActivity};
use crate::normalize::{normalize, owner_display_name};
use crate::store::{Catalog, OwnerDirectory, ProgressStore};
use tracing::{debug, warn};

pub const DEFAULT_PER_OWNER_LIMIT: usize = 5;
pub const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationLimits {
    pub per_owner: usize,
    pub recent: usize,
}

impl Default for AggregationLimits {
    fn default() -> Self {
        Self {
            per_owner: DEFAULT_PER_OWNER_LIMIT,
            recent: DEFAULT_RECENT_LIMIT,
        }
    }
}

/// Raw records fetched for one owner.
#[derive(Debug, Clone)]
pub struct OwnerBatch {
    pub owner_id: String,
    pub owner_name: String,
    pub records: Vec<RawProgressRecord>,
}

pub async fn recent_activity<D, P, C>(
    directory: &D,
    progress: &P,
    catalog: &C,
    limits: AggregationLimits,
) -> Result<Vec<ReadingActivity>, StoreError>
where
    D: OwnerDirectory,
    P: ProgressStore,
    C: Catalog,
{
    let batches = fetch_owner_batches(directory, progress, limits.per_owner).await?;
    let recent = merge_recent(&batches, limits.recent);
    Ok(attach_titles(catalog, recent).await)
}

/// Only a failure to enumerate owners is returned; a failing owner is logged
/// and left out.
pub async fn fetch_owner_batches<D, P>(
    directory: &D,
    progress: &P,
    per_owner: usize,
) -> Result<Vec<OwnerBatch>, StoreError>
where
    D: OwnerDirectory,
    P: ProgressStore,
{
    let owners = directory.list_owners().await?;
    let mut batches = Vec::with_capacity(owners.len());

    for owner in owners {
        match progress.list_recent(&owner.id, per_owner).await {
            Ok(records) => batches.push(OwnerBatch {
                owner_name: owner_display_name(&owner.profile),
                owner_id: owner.id,
                records,
            }),
            Err(err) => warn!(owner_id = %owner.id, "failed to load reading states: {err}"),
        }
    }

    Ok(batches)
}

pub fn merge_recent(batches: &[OwnerBatch], limit: usize) -> Vec<NormalizedProgressRecord> {
    let mut merged: Vec<NormalizedProgressRecord> = batches
        .iter()
        .flat_map(|batch| {
            batch
                .records
                .iter()
                .filter(|record| record.has_field("lastReadAt"))
                .map(|record| normalize(record, &batch.owner_id, &batch.owner_name))
        })
        .collect();

    // Stable: ties keep owner enumeration order.
    merged.sort_by_key(|record| std::cmp::Reverse(record.last_read_at.sort_key()));
    merged.truncate(limit);
    merged
}

pub async fn attach_titles<C: Catalog>(
    catalog: &C,
    records: Vec<NormalizedProgressRecord>,
) -> Vec<ReadingActivity> {
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let book_title = book_title(catalog, &record.book_id).await;
        rows.push(ReadingActivity {
            progress_percent: record.progress_percent(),
            book_title,
            record,
        });
    }
    rows
}

/// Title for display, or a placeholder naming the raw book id.
pub async fn book_title<C: Catalog>(catalog: &C, book_id: &str) -> String {
    match catalog.find_by_book_id(book_id).await {
        Ok(Some(item)) => match item.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => placeholder_title(book_id),
        },
        Ok(None) => {
            debug!(book_id, "book not in catalog");
            placeholder_title(book_id)
        }
        Err(err) => {
            warn!(book_id, "failed to look up book: {err}");
            placeholder_title(book_id)
        }
    }
}

fn placeholder_title(book_id: &str) -> String {
    format!("Unknown Book ({book_id})")
}

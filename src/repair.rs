use crate::errors::StoreError;
use crate::models::{RawProgressRecord, RepairReport};
use crate::store::{OwnerDirectory, ProgressStore};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Fields a record is missing, with the values that fill them. Empty when
/// the record is already complete.
pub fn missing_fields(record: &RawProgressRecord, owner_id: &str) -> Map<String, Value> {
    let mut fixes = Map::new();

    if record.book_id().is_none() {
        fixes.insert("bookId".into(), Value::String(record.id.clone()));
    }
    if !record.has_field("progress") {
        if let Some(legacy) = record.field("readingProgress") {
            fixes.insert("progress".into(), legacy.clone());
        }
    }
    if !record.has_field("userId") {
        fixes.insert("userId".into(), Value::String(owner_id.to_string()));
    }

    fixes
}

/// Backfills every record of every owner. Safe to re-run: a second pass right
/// after the first writes nothing.
pub async fn repair_all<D, P>(directory: &D, progress: &P) -> Result<RepairReport, StoreError>
where
    D: OwnerDirectory,
    P: ProgressStore,
{
    let owners = directory.list_owners().await?;
    let mut report = RepairReport::default();

    for owner in owners {
        let records = match progress.list_records(&owner.id).await {
            Ok(records) => records,
            Err(err) => {
                warn!(owner_id = %owner.id, "repair skipped owner: {err}");
                report.total_errors += 1;
                continue;
            }
        };
        report.owners_scanned += 1;

        for record in records {
            report.records_scanned += 1;
            let fixes = missing_fields(&record, &owner.id);
            if fixes.is_empty() {
                continue;
            }

            match progress.write_record(&owner.id, &record.id, fixes).await {
                Ok(()) => report.total_fixed += 1,
                Err(err) => {
                    warn!(owner_id = %owner.id, record_id = %record.id, "repair write failed: {err}");
                    report.total_errors += 1;
                }
            }
        }
    }

    info!(
        owners = report.owners_scanned,
        records = report.records_scanned,
        fixed = report.total_fixed,
        errors = report.total_errors,
        "repair sweep finished"
    );
    Ok(report)
}

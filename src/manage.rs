use crate::aggregate::book_title;
use crate::errors::StoreError;
use crate::models::ReadingStateDetail;
use crate::normalize::{UNKNOWN_OWNER, normalize, owner_display_name};
use crate::store::{Catalog, OwnerDirectory, ProgressStore};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::info;

fn not_found(owner_id: &str, state_id: &str) -> StoreError {
    StoreError::NotFound(format!("reading state {owner_id}/{state_id}"))
}

pub async fn reading_state_detail<D, P, C>(
    directory: &D,
    progress: &P,
    catalog: &C,
    owner_id: &str,
    state_id: &str,
) -> Result<ReadingStateDetail, StoreError>
where
    D: OwnerDirectory,
    P: ProgressStore,
    C: Catalog,
{
    let raw = progress
        .get_record(owner_id, state_id)
        .await?
        .ok_or_else(|| not_found(owner_id, state_id))?;

    let owner_name = directory
        .owner_profile(owner_id)
        .await?
        .map(|profile| owner_display_name(&profile))
        .unwrap_or_else(|| UNKNOWN_OWNER.to_string());

    let count = |name: &str| match raw.field(name) {
        Some(Value::Array(items)) => items.len(),
        _ => 0,
    };
    let notes = count("notes");
    let bookmarks = count("bookmarks");

    let record = normalize(&raw, owner_id, &owner_name);
    let book_title = book_title(catalog, &record.book_id).await;

    Ok(ReadingStateDetail {
        progress_percent: record.progress_percent(),
        id: record.id,
        owner_id: record.owner_id,
        owner_name,
        book_id: record.book_id,
        book_title,
        current_page: record.current_page,
        last_read_at: record.last_read_at,
        notes,
        bookmarks,
    })
}

/// Sets progress from a 0-100 percentage; stored as a fraction.
pub async fn update_progress<P: ProgressStore>(
    progress: &P,
    owner_id: &str,
    state_id: &str,
    percent: f64,
) -> Result<(), StoreError> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(StoreError::InvalidInput(
            "progress must be a number between 0 and 100".into(),
        ));
    }
    if progress.get_record(owner_id, state_id).await?.is_none() {
        return Err(not_found(owner_id, state_id));
    }

    let mut fields = Map::new();
    fields.insert("progress".into(), Value::from(percent / 100.0));
    fields.insert(
        "updatedAt".into(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    progress.write_record(owner_id, state_id, fields).await?;

    info!(owner_id, state_id, percent, "reading progress updated");
    Ok(())
}

pub async fn delete_reading_state<P: ProgressStore>(
    progress: &P,
    owner_id: &str,
    state_id: &str,
) -> Result<(), StoreError> {
    if !progress.delete_record(owner_id, state_id).await? {
        return Err(not_found(owner_id, state_id));
    }
    info!(owner_id, state_id, "reading state deleted");
    Ok(())
}

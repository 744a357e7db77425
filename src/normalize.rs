use crate::models::{NormalizedProgressRecord, OwnerProfile, RawProgressRecord};
use crate::timestamp::Timestamp;
use serde_json::Value;

pub const UNKNOWN_OWNER: &str = "Unknown User";

/// Fields consumed by normalization; everything else lands in `extra`.
const KNOWN_FIELDS: [&str; 6] = [
    "bookId",
    "progress",
    "readingProgress",
    "lastReadAt",
    "currentPage",
    "isReading",
];

/// Full name, then name, then display name, then email.
pub fn owner_display_name(profile: &OwnerProfile) -> String {
    [
        &profile.full_name,
        &profile.name,
        &profile.display_name,
        &profile.email,
    ]
    .into_iter()
    .flatten()
    .map(|value| value.trim())
    .find(|value| !value.is_empty())
    .unwrap_or(UNKNOWN_OWNER)
    .to_string()
}

/// The stored progress value: `progress` when present (including `0`),
/// otherwise `readingProgress`.
pub fn progress_source(raw: &RawProgressRecord) -> Option<&Value> {
    raw.field("progress").or_else(|| raw.field("readingProgress"))
}

pub fn progress_fraction(raw: &RawProgressRecord) -> f64 {
    let value = match progress_source(raw) {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };

    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn to_page(value: Option<&Value>) -> u32 {
    let page = match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
            .unwrap_or(0),
        Some(Value::String(text)) => text.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    };
    page.clamp(0, u32::MAX as i64) as u32
}

/// Never fails: every absent or malformed field is defaulted.
///
/// A missing `lastReadAt` yields `Timestamp::Unknown`; the aggregator filters
/// those records out before they reach this point.
pub fn normalize(
    raw: &RawProgressRecord,
    owner_id: &str,
    owner_display_name: &str,
) -> NormalizedProgressRecord {
    let extra = raw
        .fields
        .iter()
        .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    NormalizedProgressRecord {
        id: raw.id.clone(),
        owner_id: owner_id.to_string(),
        book_id: raw.book_id().unwrap_or_else(|| raw.id.clone()),
        progress_fraction: progress_fraction(raw),
        last_read_at: raw.last_read_at().unwrap_or(Timestamp::Unknown),
        current_page: to_page(raw.field("currentPage")),
        is_reading: matches!(raw.field("isReading"), Some(Value::Bool(true))),
        owner_display_name: owner_display_name.to_string(),
        extra,
    }
}

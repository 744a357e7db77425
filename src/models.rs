use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One reading-progress entry exactly as the store holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProgressRecord {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl RawProgressRecord {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Field lookup where an explicit `null` counts as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn last_read_at(&self) -> Option<Timestamp> {
        self.field("lastReadAt").map(Timestamp::from_value)
    }

    /// The referenced book id, if one is stored and non-empty.
    pub fn book_id(&self) -> Option<String> {
        match self.field("bookId")? {
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OwnerProfile {
    #[serde(default, alias = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Remaining user document fields, kept so rewrites do not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OwnerProfile {
    pub fn is_premium(&self) -> bool {
        matches!(self.extra.get("isPremium"), Some(Value::Bool(true)))
    }

    pub fn has_active_subscription(&self) -> bool {
        self.extra
            .get("subscription")
            .and_then(|subscription| subscription.get("status"))
            .and_then(Value::as_str)
            == Some("active")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Owner {
    pub id: String,
    pub profile: OwnerProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProgressRecord {
    pub id: String,
    pub owner_id: String,
    pub book_id: String,
    pub progress_fraction: f64,
    pub last_read_at: Timestamp,
    pub current_page: u32,
    pub is_reading: bool,
    pub owner_display_name: String,
    pub extra: Map<String, Value>,
}

impl NormalizedProgressRecord {
    pub fn progress_percent(&self) -> f64 {
        (self.progress_fraction * 100.0).clamp(0.0, 100.0)
    }
}

/// A row of the recent-activity view.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingActivity {
    #[serde(flatten)]
    pub record: NormalizedProgressRecord,
    pub book_title: String,
    pub progress_percent: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub owners_scanned: u64,
    pub records_scanned: u64,
    pub total_fixed: u64,
    pub total_errors: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStateDetail {
    pub id: String,
    pub owner_id: String,
    pub owner_name: String,
    pub book_id: String,
    pub book_title: String,
    pub progress_percent: f64,
    pub current_page: u32,
    pub last_read_at: Timestamp,
    pub notes: usize,
    pub bookmarks: usize,
}

#[derive(Debug, Deserialize)]
pub struct ProgressUpdateRequest {
    pub percent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivePoint {
    pub date: String,
    pub active_readers: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub total_users: u64,
    pub total_books: u64,
    pub premium_users: u64,
    pub active_subscriptions: u64,
    pub active_readers_this_month: u64,
    pub daily_active_readers: Vec<DailyActivePoint>,
}

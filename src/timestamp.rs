use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A `lastReadAt` value as stored, parsed once at the normalization boundary.
///
/// `Unknown` orders and serializes as the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timestamp {
    #[default]
    Unknown,
    Known(DateTime<Utc>),
}

impl Timestamp {
    pub fn from_value(value: &Value) -> Self {
        let parsed = match value {
            Value::String(text) => parse_text(text.trim()),
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            Value::Object(map) => {
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))
                    .and_then(Value::as_i64);
                let nanos = map
                    .get("nanoseconds")
                    .or_else(|| map.get("_nanoseconds"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                seconds.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, nanos.min(999_999_999) as u32))
            }
            _ => None,
        };

        parsed.map(Timestamp::Known).unwrap_or(Timestamp::Unknown)
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Known(at) => Some(*at),
            Timestamp::Unknown => None,
        }
    }

    /// Ordering key: the known instant, or the epoch.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.instant().unwrap_or_default()
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Timestamp::Known(_))
    }
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.sort_key().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

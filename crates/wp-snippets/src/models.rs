//! Snippet data model and the normalized result shapes returned to callers.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::SnippetError;

/// Page size the remote endpoint uses when none is requested.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Success message for a completed save.
pub const SAVE_SUCCESS_MESSAGE: &str = "Text saved successfully!";

/// One saved text entry, owned by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(with = "wp_date")]
    pub date: NaiveDateTime,
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Vec<String>,
}

/// Two-valued outcome reported to every caller of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Success,
    Error,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Normalized result of a save, regardless of which failure occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub status: SaveStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
}

impl SaveResult {
    pub fn success(post_id: Option<i64>) -> Self {
        Self {
            status: SaveStatus::Success,
            message: SAVE_SUCCESS_MESSAGE.to_string(),
            post_id,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SaveStatus::Error,
            message: message.into(),
            post_id: None,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == SaveStatus::Success
    }
}

impl From<SnippetError> for SaveResult {
    fn from(err: SnippetError) -> Self {
        Self::error(err.save_message())
    }
}

/// One page of snippets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    pub items: Vec<Snippet>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl ListResult {
    /// Build a page, deriving `total_pages` from `total_items` and `page_size`
    /// and clamping `current_page` into `1..=max(total_pages, 1)`.
    pub fn from_page(items: Vec<Snippet>, total_items: u64, page_size: u32, page: u64) -> Self {
        let page_size = u64::from(page_size.max(1));
        let total_pages = total_items.div_ceil(page_size);
        let current_page = page.clamp(1, total_pages.max(1));
        Self {
            items,
            total_items,
            total_pages,
            current_page,
        }
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// Body of a save response. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SaveResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /strings`.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Vec<Snippet>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub current_page: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /strings/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct SingleResponse {
    #[serde(default)]
    pub success: Option<bool>,
    pub data: Snippet,
}

/// Pull a human-readable message out of an error body.
///
/// Uses the JSON `message` field when the body is JSON and has one, the raw
/// body text otherwise, and `fallback` when the body is empty.
pub fn extract_error_message(body: &str, fallback: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body)
        && let Some(Value::String(message)) = map.get("message")
        && !message.is_empty()
    {
        return message.clone();
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

// PHP encodes ceil() results as floats and some plugins quote numbers, so
// numeric fields accept ints, floats and numeric strings.
fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64),
        _ => None,
    }
}

fn lenient_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_u64))
}

fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_as_u64)
        .and_then(|v| i64::try_from(v).ok())
        .filter(|id| *id > 0))
}

/// `wp_get_post_terms` returns an error object instead of a list when the
/// taxonomy is missing; treat anything but a string list as "no categories".
fn lenient_categories<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// `post_date` values: `YYYY-MM-DD HH:MM:SS` in site-local time.
mod wp_date {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| DateTime::parse_from_rfc3339(&raw).map(|d| d.naive_local()))
            .map_err(|e| D::Error::custom(format!("invalid date '{raw}': {e}")))
    }
}

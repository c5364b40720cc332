//! Ingestion payload parsing.
//!
//! The scraper emits a JSON array of pitch objects:
//!
//! ```json
//! [{
//!   "meta_data": { "final_url": "https://acme.dev" },
//!   "seo_data":  { "name": "Acme", "seo_title": "Acme rockets",
//!                  "category_id": 7, "category": "Dev Tools" },
//!   "pitch_data": { "replyLink": "...", "user": {...}, "engagement": {...} }
//! }]
//! ```
//!
//! Entries are keyed by `meta_data.final_url`; entries without one are
//! skipped at apply time. `pitch_data` is a single mention record.
//! `seo_data.category_id` (string or integer) files the pitch under a
//! category; `seo_data.category` names it.
//! Applying records to the store lives in [`crate::db::store`].

use crate::error::ErrorCode;
use crate::model::category::CategoryRef;
use crate::model::mention::Mention;
use serde::Serialize;
use serde_json::Value;

/// Errors for payloads that cannot be interpreted at all.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON array of pitch objects, got {0}")]
    NotAList(&'static str),
}

impl IngestError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidIngestPayload
    }
}

/// One scraped pitch entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestRecord {
    pub url: Option<String>,
    pub name: Option<String>,
    pub category: Option<CategoryRef>,
    /// `None` when `pitch_data` is absent or not an object.
    pub mention: Option<Mention>,
}

impl IngestRecord {
    /// Interpret one array element. Non-objects produce an empty record.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let url = map
            .get("meta_data")
            .and_then(|meta| meta.get("final_url"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        let seo = map.get("seo_data");
        let seo_text = |key: &str| {
            seo.and_then(|seo| seo.get(key))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };
        let name = seo_text("name").or_else(|| seo_text("seo_title"));

        let category_id = match seo.and_then(|seo| seo.get("category_id")) {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        };
        let category = category_id.map(|category_id| CategoryRef {
            name: seo_text("category").unwrap_or_else(|| category_id.clone()),
            category_id,
        });

        let mention = map.get("pitch_data").and_then(Mention::from_value);

        Self {
            url,
            name,
            category,
            mention,
        }
    }
}

/// Counts reported after applying a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: usize,
}

/// Parse a scraper payload into records.
///
/// # Errors
///
/// Returns [`IngestError`] if the text is not JSON or not a JSON array.
pub fn parse_payload(text: &str) -> Result<Vec<IngestRecord>, IngestError> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(items) => Ok(items.iter().map(IngestRecord::from_value).collect()),
        other => Err(IngestError::NotAList(json_kind(&other))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_url_name_and_mention() {
        let records = parse_payload(
            r#"[{
                "meta_data": {"final_url": "https://acme.dev"},
                "seo_data": {"seo_title": "Acme rockets"},
                "pitch_data": {"replyLink": "r1", "engagement": {"likes": 3}}
            }]"#,
        )
        .expect("valid payload");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url.as_deref(), Some("https://acme.dev"));
        assert_eq!(records[0].name.as_deref(), Some("Acme rockets"));
        let mention = records[0].mention.as_ref().expect("mention");
        assert_eq!(mention.engagement.likes, 3);
    }

    #[test]
    fn seo_name_beats_title() {
        let record = IngestRecord::from_value(&serde_json::json!({
            "seo_data": {"name": "Acme", "seo_title": "Acme rockets"}
        }));
        assert_eq!(record.name.as_deref(), Some("Acme"));
        assert!(record.url.is_none());
        assert!(record.mention.is_none());
    }

    #[test]
    fn category_id_accepts_numbers_and_strings() {
        let record = IngestRecord::from_value(&serde_json::json!({
            "seo_data": {"category_id": 7, "category": " Dev Tools "}
        }));
        assert_eq!(
            record.category,
            Some(CategoryRef {
                category_id: "7".into(),
                name: "Dev Tools".into(),
            })
        );

        let record = IngestRecord::from_value(&serde_json::json!({
            "seo_data": {"category_id": "games"}
        }));
        let category = record.category.expect("category");
        assert_eq!(category.category_id, "games");
        assert_eq!(category.name, "games");

        for blank in [serde_json::json!(""), serde_json::json!(null), serde_json::json!(true)] {
            let record = IngestRecord::from_value(&serde_json::json!({
                "seo_data": {"category_id": blank, "category": "Ignored"}
            }));
            assert!(record.category.is_none());
        }
    }

    #[test]
    fn non_object_entries_become_empty_records() {
        let records = parse_payload(r#"[1, "x", null]"#).expect("array");
        assert!(records.iter().all(|r| *r == IngestRecord::default()));
    }

    #[test]
    fn non_array_payload_is_rejected() {
        let err = parse_payload(r#"{"meta_data": {}}"#).expect_err("object payload");
        assert!(matches!(err, IngestError::NotAList("an object")));
        assert_eq!(err.code(), ErrorCode::InvalidIngestPayload);

        assert!(matches!(parse_payload("nope"), Err(IngestError::Json(_))));
    }
}

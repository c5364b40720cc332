//! Social-media mention records attached to a pitch.
//!
//! Mentions arrive as loosely shaped JSON from the scraping pipeline.
//! [`Mention::from_value`] is the only place that inspects raw JSON: it
//! coerces engagement counters to non-negative integers and drops empty
//! strings, so everything downstream works with a typed record.
//!
//! Coercion rules for engagement counters:
//! - JSON integers are taken as-is (negative values become `0`)
//! - non-negative floats are truncated
//! - strings holding a number are parsed with the same rules
//! - anything else (`null`, booleans, arrays, objects, prose) is `0`
//!
//! Every counter, and every sum of counters, is capped at [`MAX_COUNT`].

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Ceiling for engagement counters: the largest value an SQLite `INTEGER`
/// holds (`i64::MAX`).
pub const MAX_COUNT: u64 = u64::MAX >> 1;

const fn capped_add(a: u64, b: u64) -> u64 {
    let sum = a.saturating_add(b);
    if sum > MAX_COUNT { MAX_COUNT } else { sum }
}

/// Engagement counters for one mention, or the field-wise sum over many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Engagement {
    pub replies: u64,
    pub retweets: u64,
    pub likes: u64,
    pub views: u64,
}

impl Engagement {
    /// The four counter names, in the order they appear in payloads.
    pub const KEYS: [&'static str; 4] = ["replies", "retweets", "likes", "views"];

    /// Build from an `engagement` sub-map. Missing or non-object input is all zeroes.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = value else {
            return Self::default();
        };
        let read = |key: &str| map.get(key).map_or(0, coerce_count);
        Self {
            replies: read("replies"),
            retweets: read("retweets"),
            likes: read("likes"),
            views: read("views"),
        }
    }

    /// Field-wise sum, saturating at [`MAX_COUNT`].
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self {
            replies: capped_add(self.replies, other.replies),
            retweets: capped_add(self.retweets, other.retweets),
            likes: capped_add(self.likes, other.likes),
            views: capped_add(self.views, other.views),
        }
    }

    /// Look up a counter by payload key name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<u64> {
        match key {
            "replies" => Some(self.replies),
            "retweets" => Some(self.retweets),
            "likes" => Some(self.likes),
            "views" => Some(self.views),
            _ => None,
        }
    }

    /// Lightweight engagement score shown next to listings.
    ///
    /// `likes + retweets*2 + replies*3`. Display only; ranking uses
    /// [`crate::rank::rank_for`].
    #[must_use]
    pub const fn display_score(&self) -> u64 {
        self.likes
            .saturating_add(self.retweets.saturating_mul(2))
            .saturating_add(self.replies.saturating_mul(3))
    }
}

/// Author of a mention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One social-media post that mentions a pitch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Permalink of the post; the identity used when merging re-scraped mentions.
    #[serde(rename = "replyLink", default, skip_serializing_if = "Option::is_none")]
    pub reply_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<MentionUser>,
    /// Post time as supplied by the scraper (usually RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub engagement: Engagement,
}

impl Mention {
    /// Normalize one raw JSON element. Returns `None` for non-objects.
    ///
    /// `timestamp` may be a bare string or an object with a `datetime`
    /// field; `text` falls back to `content`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };

        let user = match map.get("user") {
            Some(Value::Object(user)) => {
                let handle = non_empty_str(user.get("handle"));
                let name = non_empty_str(user.get("name"));
                (handle.is_some() || name.is_some()).then_some(MentionUser { handle, name })
            }
            _ => None,
        };

        let timestamp = match map.get("timestamp") {
            Some(Value::Object(ts)) => non_empty_str(ts.get("datetime")),
            other => non_empty_str(other),
        };

        Some(Self {
            reply_link: non_empty_str(map.get("replyLink")),
            user,
            timestamp,
            text: non_empty_str(map.get("text")).or_else(|| non_empty_str(map.get("content"))),
            engagement: Engagement::from_value(map.get("engagement")),
        })
    }

    /// Author handle, if known.
    #[must_use]
    pub fn handle(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.handle.as_deref())
    }

    /// True when both mentions carry the same non-empty `replyLink`.
    #[must_use]
    pub fn is_same_post(&self, other: &Self) -> bool {
        matches!((&self.reply_link, &other.reply_link), (Some(a), Some(b)) if a == b)
    }

    fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
    }

    /// Ordering by post time: parseable timestamps compare chronologically,
    /// everything else falls back to the raw string. Missing sorts first.
    #[must_use]
    pub fn cmp_by_time(&self, other: &Self) -> Ordering {
        match (self.parsed_timestamp(), other.parsed_timestamp()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.timestamp.cmp(&other.timestamp),
        }
    }
}

/// Normalize whatever is stored for a mention list into typed records.
///
/// Arrays keep their object elements. A JSON string holding an array is
/// unwrapped once. Anything else is an empty list.
#[must_use]
pub fn normalize_mentions(raw: &Value) -> Vec<Mention> {
    match raw {
        Value::Array(items) => items.iter().filter_map(Mention::from_value).collect(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items.iter().filter_map(Mention::from_value).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Decode a stored mention list. Malformed text yields an empty list.
#[must_use]
pub fn decode_mentions(text: &str) -> Vec<Mention> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => normalize_mentions(&value),
        Err(error) => {
            tracing::warn!(%error, "stored mention list is not valid JSON; treating as empty");
            Vec::new()
        }
    }
}

/// Most recent mention by post time. Ties keep the earliest list entry.
#[must_use]
pub fn latest_mention(mentions: &[Mention]) -> Option<&Mention> {
    mentions.iter().rev().max_by(|a, b| a.cmp_by_time(b))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_from_f64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

fn coerce_count(value: &Value) -> u64 {
    let count = match value {
        Value::Number(n) => n
            .as_u64()
            .unwrap_or_else(|| n.as_f64().map_or(0, count_from_f64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .unwrap_or_else(|_| s.parse::<f64>().map_or(0, count_from_f64))
        }
        _ => 0,
    };
    count.min(MAX_COUNT)
}

//! The pitch aggregate and its cached derived fields.
//!
//! `mention_count`, `total_engagement` and `rank` are private and only ever
//! written by [`Pitch::recompute`]. Every mutator that changes an input
//! (mentions, effective claps, claimed flag) recomputes before returning, and
//! the store recomputes again right before each write, so a persisted pitch
//! is always consistent with its inputs.

use crate::model::mention::{Engagement, Mention, latest_mention};
use crate::rank::{self, DerivedFields};
use serde::Serialize;

/// Name used when a pitch arrives without one.
pub const UNTITLED_PITCH: &str = "Untitled Pitch";

/// Where a merged mention ended up in the mention list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Replaced the mention at this index (same `replyLink`).
    Replaced(usize),
    /// Appended as a new mention.
    Appended,
}

/// A tracked product pitch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pitch {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `replyLink` of the last mention in the list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// `category_id` of the category this pitch is filed under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub is_featured: bool,
    pub created_at_us: i64,
    pub updated_at_us: i64,
    mentions: Vec<Mention>,
    claimed: bool,
    clap: u64,
    #[serde(flatten)]
    derived: DerivedFields,
}

/// Column values as read back from the store.
pub(crate) struct StoredPitch {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub is_featured: bool,
    pub created_at_us: i64,
    pub updated_at_us: i64,
    pub mentions: Vec<Mention>,
    pub claimed: bool,
    pub clap: u64,
    pub derived: DerivedFields,
}

impl From<StoredPitch> for Pitch {
    fn from(stored: StoredPitch) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
            url: stored.url,
            source: stored.source,
            category: stored.category,
            is_featured: stored.is_featured,
            created_at_us: stored.created_at_us,
            updated_at_us: stored.updated_at_us,
            mentions: stored.mentions,
            claimed: stored.claimed,
            clap: stored.clap,
            derived: stored.derived,
        }
    }
}

impl Pitch {
    /// Create an unsaved pitch with no mentions, claps, or claim.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, now_us: i64) -> Self {
        let name = name.into();
        let mut pitch = Self {
            id: id.into(),
            name: if name.trim().is_empty() {
                UNTITLED_PITCH.to_string()
            } else {
                name.trim().to_string()
            },
            url: None,
            source: None,
            category: None,
            is_featured: false,
            created_at_us: now_us,
            updated_at_us: now_us,
            mentions: Vec::new(),
            claimed: false,
            clap: 0,
            derived: DerivedFields::default(),
        };
        pitch.recompute();
        pitch
    }

    /// Recompute every cached field from the current inputs.
    ///
    /// Idempotent: a second call without intervening mutation returns the
    /// same values.
    pub fn recompute(&mut self) -> DerivedFields {
        self.derived = rank::derive(&self.mentions, self.clap, self.claimed);
        tracing::debug!(
            pitch_id = %self.id,
            mention_count = self.derived.mention_count,
            clap = self.clap,
            claimed = self.claimed,
            rank = self.derived.rank,
            "recomputed pitch rank"
        );
        self.derived
    }

    /// True when the cached fields match a fresh recomputation.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        rank::derive(&self.mentions, self.clap, self.claimed) == self.derived
    }

    /// Replace the whole mention list.
    pub fn set_mentions(&mut self, mentions: Vec<Mention>) {
        self.mentions = mentions;
        self.refresh_source();
        self.recompute();
    }

    /// Merge a re-scraped mention: replace the entry with the same
    /// `replyLink`, otherwise append.
    pub fn merge_mention(&mut self, mention: Mention) -> MergeOutcome {
        let outcome = match self.mentions.iter().position(|m| m.is_same_post(&mention)) {
            Some(index) => {
                self.mentions[index] = mention;
                MergeOutcome::Replaced(index)
            }
            None => {
                self.mentions.push(mention);
                MergeOutcome::Appended
            }
        };
        self.refresh_source();
        self.recompute();
        outcome
    }

    /// Toggle the claimed boost.
    pub fn set_claimed(&mut self, claimed: bool) {
        self.claimed = claimed;
        self.recompute();
    }

    /// Set the effective clap total. Only the clap ledger writes this.
    pub(crate) fn set_effective_claps(&mut self, clap: u64) {
        self.clap = clap;
        self.recompute();
    }

    fn refresh_source(&mut self) {
        if let Some(last) = self.mentions.last() {
            self.source.clone_from(&last.reply_link);
        }
    }

    #[must_use]
    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    #[must_use]
    pub const fn claimed(&self) -> bool {
        self.claimed
    }

    /// Effective clap total across all users.
    #[must_use]
    pub const fn clap(&self) -> u64 {
        self.clap
    }

    #[must_use]
    pub const fn derived(&self) -> DerivedFields {
        self.derived
    }

    #[must_use]
    pub const fn mention_count(&self) -> u64 {
        self.derived.mention_count
    }

    #[must_use]
    pub const fn total_engagement(&self) -> Engagement {
        self.derived.total_engagement
    }

    #[must_use]
    pub const fn rank(&self) -> i64 {
        self.derived.rank
    }

    /// Display-only engagement score of the cached totals.
    #[must_use]
    pub const fn engagement_score(&self) -> u64 {
        self.derived.total_engagement.display_score()
    }

    /// Most recent mention by post time.
    #[must_use]
    pub fn latest_mention(&self) -> Option<&Mention> {
        latest_mention(&self.mentions)
    }

    /// True when any mention was posted by `handle` (case-insensitive, `@` optional).
    #[must_use]
    pub fn mentions_handle(&self, handle: &str) -> bool {
        let wanted = handle.trim().trim_start_matches('@');
        !wanted.is_empty()
            && self.mentions.iter().any(|m| {
                m.handle()
                    .is_some_and(|h| h.trim_start_matches('@').eq_ignore_ascii_case(wanted))
            })
    }
}

/// URL-friendly slug: lowercase ASCII alphanumerics separated by single dashes.
#[must_use]
pub fn slugify(name: &str) -> String {
    slugify_or(name, "pitch")
}

/// [`slugify`] with a caller-chosen slug for names that have no ASCII
/// alphanumerics at all.
#[must_use]
pub fn slugify_or(name: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Host part of a URL, used to name pitches that arrive without a name.
#[must_use]
pub fn url_host(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    (!host.is_empty()).then_some(host)
}

//! Ranking engine: engagement aggregation, clap ledger math, and the rank formula.
//!
//! Everything here is pure. [`derive`] is the single function that turns a
//! pitch's inputs (mentions, effective clap total, claimed flag) into its
//! cached outputs; [`crate::model::pitch::Pitch::recompute`] is its only caller.

pub mod engagement;
pub mod ledger;
pub mod score;

pub use engagement::{EngagementTotals, aggregate, aggregate_values};
pub use ledger::{MAX_RAW_CLAPS, effective_count, effective_total, next_raw_count, raw_total};
pub use score::{RankWeights, base_score, rank_for, round_half_up};

use crate::model::mention::Mention;
use serde::{Deserialize, Serialize};

/// Cached fields a pitch derives from its inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedFields {
    pub mention_count: u64,
    pub total_engagement: EngagementTotals,
    pub rank: i64,
}

/// Derive `mention_count`, `total_engagement` and `rank` in one pass.
#[must_use]
pub fn derive(mentions: &[Mention], effective_claps: u64, claimed: bool) -> DerivedFields {
    let total_engagement = aggregate(mentions);
    DerivedFields {
        mention_count: u64::try_from(mentions.len()).unwrap_or(u64::MAX),
        total_engagement,
        rank: rank_for(&total_engagement, effective_claps, claimed),
    }
}

use super::EngagementTotals;
use serde::{Deserialize, Serialize};

/// Weights for the rank formula:
///
/// `rank = round((R*replies + T*retweets + L*likes + views/V + C*claps) * boost)`
///
/// where `boost` is `claimed_boost` for claimed pitches and `1.0` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankWeights {
    pub replies: f64,
    pub retweets: f64,
    pub likes: f64,
    pub views_divisor: f64,
    pub claps: f64,
    pub claimed_boost: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            replies: 4.0,
            retweets: 2.5,
            likes: 1.5,
            views_divisor: 800.0,
            claps: 3.0,
            claimed_boost: 1.5,
        }
    }
}

impl RankWeights {
    /// Weighted score before the claimed boost.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn base_score(&self, totals: &EngagementTotals, effective_claps: u64) -> f64 {
        (totals.replies as f64 * self.replies)
            + (totals.retweets as f64 * self.retweets)
            + (totals.likes as f64 * self.likes)
            + (totals.views as f64 / self.views_divisor)
            + (effective_claps as f64 * self.claps)
    }

    /// Boosted score before rounding.
    #[must_use]
    pub fn boosted_score(&self, totals: &EngagementTotals, effective_claps: u64, claimed: bool) -> f64 {
        let boost = if claimed { self.claimed_boost } else { 1.0 };
        self.base_score(totals, effective_claps) * boost
    }

    /// Final integer rank.
    #[must_use]
    pub fn rank(&self, totals: &EngagementTotals, effective_claps: u64, claimed: bool) -> i64 {
        round_half_up(self.boosted_score(totals, effective_claps, claimed))
    }
}

/// Unboosted score with the default weights.
#[must_use]
pub fn base_score(totals: &EngagementTotals, effective_claps: u64) -> f64 {
    RankWeights::default().base_score(totals, effective_claps)
}

/// Rank for a pitch with the default weights.
#[must_use]
pub fn rank_for(totals: &EngagementTotals, effective_claps: u64, claimed: bool) -> i64 {
    RankWeights::default().rank(totals, effective_claps, claimed)
}

/// Round to the nearest integer, halves going up (`2.5 -> 3`).
///
/// Scores are never negative, so `f64::round` (half away from zero) is
/// exactly half-up here. Non-finite or negative input maps to `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round() as i64
}

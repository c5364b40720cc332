use crate::model::mention::{Engagement, MAX_COUNT, Mention};
use serde_json::Value;

/// Field-wise engagement sums across all mentions of a pitch.
pub type EngagementTotals = Engagement;

/// Sum the engagement counters of every mention.
///
/// Order-invariant and idempotent; an empty list is all zeroes. Each sum
/// saturates at [`MAX_COUNT`], so totals always fit the store's columns.
#[must_use]
pub fn aggregate(mentions: &[Mention]) -> EngagementTotals {
    mentions
        .iter()
        .fold(EngagementTotals::default(), |acc, m| acc.saturating_add(m.engagement))
}

/// Aggregate untyped JSON elements, skipping anything that is not an object.
#[must_use]
pub fn aggregate_values(values: &[Value]) -> EngagementTotals {
    values
        .iter()
        .filter_map(Mention::from_value)
        .fold(EngagementTotals::default(), |acc, m| acc.saturating_add(m.engagement))
}

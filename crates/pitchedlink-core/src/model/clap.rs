use crate::rank::ledger;
use serde::Serialize;

/// One user's clap counter on one pitch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClapEntry {
    pub pitch_id: String,
    pub user_id: String,
    pub raw_count: u32,
    pub created_at_us: i64,
    pub last_clapped_at_us: i64,
}

impl ClapEntry {
    /// Contribution of this entry to the pitch's effective clap total.
    #[must_use]
    pub const fn effective_count(&self) -> u32 {
        ledger::effective_count(self.raw_count)
    }
}

/// Result of recording one or more claps.
///
/// A clap at the ceiling still succeeds; `changed` is `false` and
/// `raw_count` reports the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndorsementOutcome {
    pub pitch_id: String,
    pub user_id: String,
    pub raw_count: u32,
    pub effective_count: u32,
    pub changed: bool,
    /// Pitch-wide effective clap total after the write.
    pub clap: u64,
    /// Pitch-wide raw clap total after the write, for display.
    pub display_claps: u64,
    pub rank: i64,
}

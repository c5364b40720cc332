//! Clap ledger arithmetic.
//!
//! Each user keeps one counter per pitch. The raw counter grows by one per
//! clap up to [`MAX_RAW_CLAPS`]; its ranking contribution follows a step
//! function with diminishing returns:
//!
//! | raw     | effective |
//! |---------|-----------|
//! | 0, 1    | raw       |
//! | 2 ..= 6 | 2         |
//! | 7 ..=10 | 3         |

/// Raw clap counter ceiling per (user, pitch).
pub const MAX_RAW_CLAPS: u32 = 10;

/// Effective contribution of a raw clap counter.
#[must_use]
pub const fn effective_count(raw: u32) -> u32 {
    match raw {
        0 | 1 => raw,
        2..=6 => 2,
        _ => 3,
    }
}

/// Next raw counter after one more clap. `None` means no ledger entry yet.
///
/// At the ceiling the counter is returned unchanged.
#[must_use]
pub const fn next_raw_count(current: Option<u32>) -> u32 {
    match current {
        None => 1,
        Some(raw) if raw < MAX_RAW_CLAPS => raw + 1,
        Some(raw) => raw,
    }
}

/// Sum of effective contributions across ledger entries.
pub fn effective_total<I>(raw_counts: I) -> u64
where
    I: IntoIterator<Item = u32>,
{
    raw_counts
        .into_iter()
        .map(|raw| u64::from(effective_count(raw)))
        .sum()
}

/// Sum of raw counters across ledger entries. Display only.
pub fn raw_total<I>(raw_counts: I) -> u64
where
    I: IntoIterator<Item = u32>,
{
    raw_counts.into_iter().map(u64::from).sum()
}

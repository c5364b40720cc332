#![forbid(unsafe_code)]
//! pitchedlink-core library.
//!
//! Pitches collect social-media mentions, user claps and ownership claims.
//! The [`rank`] module turns those inputs into a single integer rank, the
//! [`model`] module owns the cached derived fields, and [`db`] persists
//! everything in SQLite with one recompute-then-write path per mutation.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at module seams ([`db::StoreError`],
//!   [`ingest::IngestError`]), each mapping to a stable [`error::ErrorCode`];
//!   `anyhow::Result` for configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod model;
pub mod rank;

pub use db::{Store, StoreError};
pub use model::mention::{Engagement, Mention};
pub use model::pitch::Pitch;
pub use rank::{EngagementTotals, aggregate, effective_count, rank_for};

/// Current wall-clock time in microseconds since the Unix epoch.
#[must_use]
pub fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

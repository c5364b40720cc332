//! Domain records: mentions, pitches, categories, clap ledger entries and claims.

pub mod category;
pub mod claim;
pub mod clap;
pub mod mention;
pub mod pitch;

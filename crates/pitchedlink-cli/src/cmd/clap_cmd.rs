//! `pl clap`: endorse a pitch as the current user.
//!
//! Each user's counter stops at ten raw claps; further claps succeed but
//! change nothing.

use crate::cmd::{open_project, require_user, store_failure};
use crate::identity::UserSources;
use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use pitchedlink_core::model::clap::EndorsementOutcome;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ClapArgs {
    /// Pitch ID or unique prefix.
    pub id: String,

    /// Number of claps to record in one write.
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub count: u32,
}

fn write_outcome(outcome: &EndorsementOutcome, w: &mut dyn Write) -> std::io::Result<()> {
    if outcome.changed {
        writeln!(
            w,
            "✓ {} clapped {} ({}/10, counts as {})",
            outcome.user_id, outcome.pitch_id, outcome.raw_count, outcome.effective_count
        )?;
    } else {
        writeln!(
            w,
            "✓ {} already at the clap limit for {}",
            outcome.user_id, outcome.pitch_id
        )?;
    }
    writeln!(
        w,
        "  claps {} (effective {})  rank {}",
        outcome.display_claps, outcome.clap, outcome.rank
    )
}

/// Execute `pl clap`.
///
/// # Errors
///
/// Returns an error if no identity is configured, the pitch cannot be
/// resolved, or the write fails.
pub fn run_clap(
    args: &ClapArgs,
    users: UserSources<'_>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let user = require_user(users, output)?;
    let (mut store, _) = open_project(project_root, output)?;
    let pitch_id = store
        .resolve_pitch_id(&args.id)
        .map_err(|e| store_failure(output, e))?;

    let outcome = store
        .record_endorsements(&user, &pitch_id, args.count)
        .map_err(|e| store_failure(output, e))?;

    render(output, &outcome, |outcome, w| write_outcome(outcome, w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(changed: bool) -> EndorsementOutcome {
        EndorsementOutcome {
            pitch_id: "acme".into(),
            user_id: "alice".into(),
            raw_count: 10,
            effective_count: 3,
            changed,
            clap: 3,
            display_claps: 10,
            rank: 9,
        }
    }

    #[test]
    fn capped_clap_says_so() {
        let mut buf = Vec::new();
        write_outcome(&outcome(false), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("already at the clap limit"));
        assert!(text.contains("rank 9"));
    }

    #[test]
    fn fresh_clap_reports_raw_and_effective() {
        let mut buf = Vec::new();
        write_outcome(&outcome(true), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("✓ alice clapped acme (10/10, counts as 3)"));
    }
}

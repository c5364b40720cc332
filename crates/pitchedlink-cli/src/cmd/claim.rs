use crate::cmd::{PitchRow, open_project, require_user, store_failure};
use crate::identity::UserSources;
use crate::output::{OutputMode, render_item};
use anyhow::Result;
use clap::Args;
use pitchedlink_core::model::claim::ClaimStatus;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ClaimArgs {
    /// Pitch ID or unique prefix.
    pub id: String,

    /// Claim status: pending, verified, or rejected.
    #[arg(short, long, default_value_t = ClaimStatus::Verified)]
    pub status: ClaimStatus,

    /// Withdraw the current user's claim instead.
    #[arg(long, conflicts_with = "status")]
    pub remove: bool,
}

/// Execute `pl claim`. Only verified claims boost a pitch's rank.
///
/// # Errors
///
/// Returns an error if no identity is configured, the pitch cannot be
/// resolved, or the write fails.
pub fn run_claim(
    args: &ClaimArgs,
    users: UserSources<'_>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let user = require_user(users, output)?;
    let (mut store, _) = open_project(project_root, output)?;
    let pitch_id = store
        .resolve_pitch_id(&args.id)
        .map_err(|e| store_failure(output, e))?;

    let pitch = if args.remove {
        store.remove_claim(&user, &pitch_id)
    } else {
        store.set_claim(&user, &pitch_id, args.status)
    }
    .map_err(|e| store_failure(output, e))?;

    render_item(&PitchRow::new(pitch), output)?;
    Ok(())
}

use crate::cmd::{PitchRow, open_project, store_failure};
use crate::output::{OutputMode, render_item};
use anyhow::Result;
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct FeatureArgs {
    /// Pitch ID or unique prefix.
    pub id: String,

    /// Remove the pitch from the featured listing.
    #[arg(long)]
    pub off: bool,
}

/// Execute `pl feature`. Featuring does not affect rank.
///
/// # Errors
///
/// Returns an error if the pitch cannot be resolved or the write fails.
pub fn run_feature(args: &FeatureArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (mut store, _) = open_project(project_root, output)?;
    let pitch_id = store
        .resolve_pitch_id(&args.id)
        .map_err(|e| store_failure(output, e))?;
    let pitch = store
        .set_featured(&pitch_id, !args.off)
        .map_err(|e| store_failure(output, e))?;
    render_item(&PitchRow::new(pitch), output)?;
    Ok(())
}

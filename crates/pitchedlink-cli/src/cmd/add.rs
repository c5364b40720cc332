use crate::cmd::{PitchRow, open_project, store_failure};
use crate::output::{OutputMode, render_item};
use anyhow::Result;
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Display name. Falls back to the URL host, then "Untitled Pitch".
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Canonical product URL. Must not already be tracked.
    #[arg(short, long)]
    pub url: Option<String>,
}

/// Execute `pl add`: create an empty pitch by hand.
///
/// # Errors
///
/// Returns an error if the URL is already tracked or the write fails.
pub fn run_add(args: &AddArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (mut store, _) = open_project(project_root, output)?;
    let pitch = store
        .create_pitch(&args.name, args.url.as_deref())
        .map_err(|e| store_failure(output, e))?;
    render_item(&PitchRow::new(pitch), output)?;
    Ok(())
}

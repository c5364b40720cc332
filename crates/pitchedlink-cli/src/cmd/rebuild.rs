use crate::cmd::{open_project, store_failure};
use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use pitchedlink_core::db::RebuildReport;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

#[derive(Args, Debug, Default)]
pub struct RebuildArgs {}

fn write_report(report: &RebuildReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "✓ Recomputed {} pitch(es), {} changed",
        report.pitches,
        report.changed.len()
    )?;
    for id in &report.changed {
        writeln!(w, "  ~ {id}")?;
    }
    Ok(())
}

/// Execute `pl rebuild`: recompute every cached pitch field from mentions,
/// the clap ledger and verified claims.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the rewrite fails.
pub fn run_rebuild(_args: &RebuildArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (mut store, _) = open_project(project_root, output)?;
    let start = Instant::now();
    let report = store.rebuild().map_err(|e| store_failure(output, e))?;
    tracing::info!(
        pitches = report.pitches,
        changed = report.changed.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "rebuild finished"
    );
    render(output, &report, |report, w| write_report(report, w))
}

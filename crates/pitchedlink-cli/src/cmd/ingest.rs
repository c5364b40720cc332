//! `pl ingest`: merge a scraper payload into the store.

use crate::cmd::{fail, open_project, store_failure};
use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use clap::Args;
use pitchedlink_core::ingest::{IngestReport, parse_payload};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON payload file, or `-` to read from stdin.
    pub file: PathBuf,
}

fn read_payload(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read payload from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn write_report(report: &IngestReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "✓ Ingested {} record(s): {} created, {} updated, {} skipped",
        report.created.len() + report.updated.len() + report.skipped,
        report.created.len(),
        report.updated.len(),
        report.skipped,
    )?;
    for id in &report.created {
        writeln!(w, "  + {id}")?;
    }
    for id in &report.updated {
        writeln!(w, "  ~ {id}")?;
    }
    Ok(())
}

/// Execute `pl ingest`.
///
/// # Errors
///
/// Returns an error if the payload cannot be read or parsed, or if the
/// batch fails to apply. A failed batch leaves the store untouched.
pub fn run_ingest(args: &IngestArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (mut store, _) = open_project(project_root, output)?;
    let text = read_payload(&args.file)?;

    let records = match parse_payload(&text) {
        Ok(records) => records,
        Err(e) => return Err(fail(output, e.code(), e.to_string())),
    };
    tracing::debug!(records = records.len(), "parsed ingest payload");

    let report = store
        .ingest_batch(&records)
        .map_err(|e| store_failure(output, e))?;

    render(output, &report, |report, w| write_report(report, w))
}

//! `pl verify`: check every stored pitch against a fresh recomputation.
//!
//! Read-only. Exits non-zero when anything disagrees; `pl rebuild` repairs it.

use crate::cmd::{fail, open_project, store_failure};
use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use pitchedlink_core::db::Inconsistency;
use pitchedlink_core::error::ErrorCode;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug, Default)]
pub struct VerifyArgs {}

#[derive(Debug, Serialize)]
struct VerifyReport {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_rebuild_at_us: Option<i64>,
    inconsistencies: Vec<Inconsistency>,
}

fn write_report(report: &VerifyReport, w: &mut dyn Write) -> std::io::Result<()> {
    if report.ok {
        return writeln!(w, "✓ All cached pitch fields match their inputs");
    }
    writeln!(w, "✗ {} inconsistent field(s)", report.inconsistencies.len())?;
    for issue in &report.inconsistencies {
        writeln!(
            w,
            "  {:<24} {:<16} stored {} expected {}",
            issue.pitch_id, issue.field, issue.stored, issue.expected
        )?;
    }
    Ok(())
}

/// Execute `pl verify`.
///
/// # Errors
///
/// Returns an error if the store cannot be read or any inconsistency is found.
pub fn run_verify(_args: &VerifyArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (store, _) = open_project(project_root, output)?;
    let inconsistencies = store.verify().map_err(|e| store_failure(output, e))?;
    let report = VerifyReport {
        ok: inconsistencies.is_empty(),
        last_rebuild_at_us: store
            .last_rebuild_at_us()
            .map_err(|e| store_failure(output, e))?,
        inconsistencies,
    };

    render(output, &report, |report, w| write_report(report, w))?;
    if report.ok {
        Ok(())
    } else {
        Err(fail(
            output,
            ErrorCode::CorruptStore,
            format!("{} inconsistent field(s)", report.inconsistencies.len()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_report_is_one_line() {
        let report = VerifyReport {
            ok: true,
            last_rebuild_at_us: None,
            inconsistencies: Vec::new(),
        };
        let mut buf = Vec::new();
        write_report(&report, &mut buf).expect("render");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "✓ All cached pitch fields match their inputs\n"
        );
    }

    #[test]
    fn dirty_report_lists_fields() {
        let report = VerifyReport {
            ok: false,
            last_rebuild_at_us: None,
            inconsistencies: vec![Inconsistency {
                pitch_id: "acme".into(),
                field: "rank",
                stored: "999".into(),
                expected: "6".into(),
            }],
        };
        let mut buf = Vec::new();
        write_report(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("1 inconsistent field(s)"));
        assert!(text.contains("stored 999 expected 6"));
    }
}

//! `pl leaderboard`: paginated ranking with absolute positions.

use crate::cmd::{PitchRow, open_project, store_failure};
use crate::output::{OutputMode, Renderable, pretty_rule, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use pitchedlink_core::db::LeaderboardPage;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct LeaderboardArgs {
    /// Page number, starting at 1.
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    /// Rows per page. Defaults to `listing.page_size` in config.toml.
    #[arg(long)]
    pub page_size: Option<u32>,
}

/// JSON shape: page metadata plus rows carrying their `position`.
#[derive(Debug, Serialize)]
struct LeaderboardView {
    page: u32,
    page_size: u32,
    total: u64,
    total_pages: u64,
    start_rank: u64,
    #[serde(skip)]
    rows: Vec<PitchRow>,
    entries: Vec<serde_json::Value>,
}

impl LeaderboardView {
    fn from_page(page: LeaderboardPage) -> Result<Self> {
        let rows: Vec<PitchRow> = page
            .entries
            .into_iter()
            .map(|entry| PitchRow {
                position: Some(entry.position),
                pitch: entry.pitch,
            })
            .collect();
        let entries = rows
            .iter()
            .map(|row| {
                let mut buf = Vec::new();
                row.render_json(&mut buf)?;
                Ok(serde_json::from_slice(&buf)?)
            })
            .collect::<Result<Vec<serde_json::Value>>>()?;
        Ok(Self {
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            total_pages: page.total_pages,
            start_rank: page.start_rank,
            rows,
            entries,
        })
    }

    fn footer(&self) -> String {
        format!(
            "page {}/{}  ({} pitches)",
            self.page,
            self.total_pages.max(1),
            self.total
        )
    }
}

fn write_text(view: &LeaderboardView, w: &mut dyn Write) -> std::io::Result<()> {
    if !view.rows.is_empty() {
        writeln!(w, "{}", PitchRow::table_headers().join("  "))?;
    }
    for row in &view.rows {
        row.render_table(w)?;
    }
    writeln!(w, "{}", view.footer())
}

fn write_pretty(view: &LeaderboardView, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Leaderboard")?;
    if view.rows.is_empty() {
        writeln!(w, "No pitches on this page.")?;
    }
    for row in &view.rows {
        row.render_human(w)?;
    }
    pretty_rule(w)?;
    writeln!(w, "{}", view.footer())
}

/// Execute `pl leaderboard`.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub fn run_leaderboard(args: &LeaderboardArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (store, project) = open_project(project_root, output)?;
    let page_size = args.page_size.unwrap_or(project.listing.page_size).max(1);
    let page = store
        .leaderboard(args.page, page_size)
        .map_err(|e| store_failure(output, e))?;

    let view = LeaderboardView::from_page(page)?;
    render_mode(output, &view, write_text, write_pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchedlink_core::Pitch;
    use pitchedlink_core::db::LeaderboardEntry;

    fn page() -> LeaderboardPage {
        LeaderboardPage {
            page: 2,
            page_size: 1,
            total: 2,
            total_pages: 2,
            start_rank: 2,
            entries: vec![LeaderboardEntry {
                position: 2,
                pitch: Pitch::new("beta", "Beta", 0),
            }],
        }
    }

    #[test]
    fn json_entries_carry_positions() {
        let view = LeaderboardView::from_page(page()).expect("view");
        let value = serde_json::to_value(&view).expect("serialize");
        assert_eq!(value["start_rank"], 2);
        assert_eq!(value["entries"][0]["position"], 2);
        assert_eq!(value["entries"][0]["id"], "beta");
        assert!(value.get("rows").is_none());
    }

    #[test]
    fn text_ends_with_page_footer() {
        let view = LeaderboardView::from_page(page()).expect("view");
        let mut buf = Vec::new();
        write_text(&view, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("POS  ID"));
        assert!(text.ends_with("page 2/2  (2 pitches)\n"));
    }
}

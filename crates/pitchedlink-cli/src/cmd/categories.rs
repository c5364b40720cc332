//! `pl categories`: every category with its slug and pitch count.

use crate::cmd::{open_project, store_failure};
use crate::output::{OutputMode, Renderable, render_list};
use anyhow::Result;
use clap::Args;
use pitchedlink_core::model::category::CategorySummary;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug, Default)]
pub struct CategoriesArgs {}

struct CategoryRow(CategorySummary);

impl Renderable for CategoryRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{:<24} {:>4} pitch(es)  {}",
            self.0.category.name, self.0.pitch_count, self.0.category.slug
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(w, &self.0).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}",
            self.0.category.slug,
            self.0.category.category_id,
            self.0.pitch_count,
            self.0.category.name
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["SLUG", "ID", "PITCHES", "NAME"]
    }
}

/// Execute `pl categories`.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub fn run_categories(_args: &CategoriesArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (store, _) = open_project(project_root, output)?;
    let rows: Vec<CategoryRow> = store
        .categories()
        .map_err(|e| store_failure(output, e))?
        .into_iter()
        .map(CategoryRow)
        .collect();

    if rows.is_empty() && output == OutputMode::Pretty {
        println!("No categories.");
        return Ok(());
    }
    render_list(&rows, output)?;
    Ok(())
}

pub mod add;
pub mod categories;
pub mod claim;
pub mod clap_cmd;
pub mod completions;
pub mod feature;
pub mod ingest;
pub mod init;
pub mod leaderboard;
pub mod list;
pub mod rebuild;
pub mod show;
pub mod stats;
pub mod verify;

use crate::identity::UserSources;
use crate::output::{CliError, OutputMode, Renderable, render_error};
use chrono::{DateTime, Local, Utc};
use pitchedlink_core::config::{self, PROJECT_DIR, ProjectConfig};
use pitchedlink_core::error::ErrorCode;
use pitchedlink_core::{Pitch, Store, StoreError};
use std::io::{self, Write};
use std::path::Path;

/// Open the project's store, rendering a structured error when the project
/// is missing or its config is broken.
///
/// # Errors
///
/// Returns an error if the project is not initialized, the config does not
/// parse, or the database cannot be opened.
pub fn open_project(project_root: &Path, output: OutputMode) -> anyhow::Result<(Store, ProjectConfig)> {
    if !project_root.join(PROJECT_DIR).is_dir() {
        return Err(fail(
            output,
            ErrorCode::NotInitialized,
            format!("no {PROJECT_DIR}/ directory in {}", project_root.display()),
        ));
    }

    let project = match config::load_project_config(project_root) {
        Ok(project) => project,
        Err(e) => return Err(fail(output, ErrorCode::ConfigParseError, format!("{e:#}"))),
    };

    let store = Store::open(&project.db_path(project_root)).map_err(|e| store_failure(output, e))?;
    Ok((store, project))
}

/// Resolve the acting user or render an identity error.
///
/// # Errors
///
/// Returns an error when no identity source is set.
pub fn require_user(users: UserSources<'_>, output: OutputMode) -> anyhow::Result<String> {
    users
        .require()
        .map_err(|e| fail(output, ErrorCode::InvalidUser, e.to_string()))
}

/// Render a coded error and turn it into an `anyhow` error for `main`.
pub fn fail(output: OutputMode, code: ErrorCode, message: impl Into<String>) -> anyhow::Error {
    let error = CliError::from_code(code, message);
    if let Err(render_err) = render_error(output, &error) {
        return render_err;
    }
    anyhow::anyhow!("{}", error.message)
}

/// Render a [`StoreError`] and wrap it for `main`.
pub fn store_failure(output: OutputMode, err: StoreError) -> anyhow::Error {
    if let Err(render_err) = render_error(output, &CliError::from(&err)) {
        return render_err;
    }
    anyhow::Error::new(err)
}

/// Format microseconds since the epoch as local wall-clock time.
pub fn micros_to_local_datetime(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us).map_or_else(
        || us.to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// A pitch as a listing row.
///
/// `position` is set on leaderboard pages and left empty elsewhere.
#[derive(Debug)]
pub struct PitchRow {
    pub position: Option<u64>,
    pub pitch: Pitch,
}

impl PitchRow {
    pub const fn new(pitch: Pitch) -> Self {
        Self {
            position: None,
            pitch,
        }
    }

    fn marker(&self) -> &'static str {
        match (self.pitch.is_featured, self.pitch.claimed()) {
            (true, true) => "★✓",
            (true, false) => "★",
            (false, true) => "✓",
            (false, false) => "",
        }
    }
}

impl Renderable for PitchRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let position = self
            .position
            .map_or_else(String::new, |p| format!("{p:>3}. "));
        writeln!(
            w,
            "{position}{:<28} rank {:>6}  claps {:>3}  mentions {:>3} {}",
            self.pitch.name,
            self.pitch.rank(),
            self.pitch.clap(),
            self.pitch.mention_count(),
            self.marker(),
        )?;
        writeln!(w, "     {}", self.pitch.id)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        let mut value = serde_json::to_value(&self.pitch).map_err(io::Error::other)?;
        if let (Some(position), Some(map)) = (self.position, value.as_object_mut()) {
            map.insert("position".to_string(), position.into());
        }
        serde_json::to_writer(w, &value).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let position = self.position.map_or_else(|| "-".to_string(), |p| p.to_string());
        writeln!(
            w,
            "{position}  {}  {}  {}  {}  {}",
            self.pitch.id,
            self.pitch.rank(),
            self.pitch.clap(),
            self.pitch.mention_count(),
            self.pitch.name,
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["POS", "ID", "RANK", "CLAPS", "MENTIONS", "NAME"]
    }
}

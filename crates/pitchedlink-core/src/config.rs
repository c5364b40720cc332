use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project directory holding config and the SQLite store.
pub const PROJECT_DIR: &str = ".pitched";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_file: default_db_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_featured_limit")]
    pub featured_limit: u32,
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: u32,
    #[serde(default = "default_latest_limit")]
    pub latest_limit: u32,
    /// Related pitches shown by `pl show`.
    #[serde(default = "default_related_limit")]
    pub related_limit: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            featured_limit: default_featured_limit(),
            leaderboard_limit: default_leaderboard_limit(),
            latest_limit: default_latest_limit(),
            related_limit: default_related_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Default identity for clap/claim commands.
    #[serde(default)]
    pub user: Option<String>,
}

impl ProjectConfig {
    /// Absolute path of the SQLite store for a project rooted at `project_root`.
    #[must_use]
    pub fn db_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(PROJECT_DIR).join(&self.store.db_file)
    }
}

/// Default `config.toml` written by `pl init`.
#[must_use]
pub fn default_config_toml() -> String {
    format!(
        "[store]\n\
         db_file = \"{}\"\n\
         \n\
         [listing]\n\
         page_size = {}\n\
         featured_limit = {}\n\
         leaderboard_limit = {}\n\
         latest_limit = {}\n\
         related_limit = {}\n",
        default_db_file(),
        default_page_size(),
        default_featured_limit(),
        default_leaderboard_limit(),
        default_latest_limit(),
        default_related_limit(),
    )
}

/// Load `.pitched/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the per-user config from the platform config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("pitchedlink/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Normalize an output mode name; unknown names are `None`.
#[must_use]
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn default_db_file() -> String {
    "pitched.db".to_string()
}

const fn default_page_size() -> u32 {
    20
}

const fn default_featured_limit() -> u32 {
    2
}

const fn default_leaderboard_limit() -> u32 {
    10
}

const fn default_latest_limit() -> u32 {
    16
}

const fn default_related_limit() -> u32 {
    10
}

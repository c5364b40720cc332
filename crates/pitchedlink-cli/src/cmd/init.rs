use anyhow::{Context as _, Result};
use clap::Args;
use pitchedlink_core::Store;
use pitchedlink_core::config::{self, PROJECT_DIR};
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite config even if `.pitched/` already exists. The store is kept.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "pitched.db\npitched.db-wal\npitched.db-shm\n";

/// Execute `pl init`. Creates the project skeleton:
///
/// ```text
/// .pitched/
///   config.toml   (default project config)
///   .gitignore    (pitched.db and its WAL files)
///   pitched.db    (SQLite store, migrated to the latest schema)
/// ```
///
/// # Errors
///
/// Returns an error if `.pitched/` already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, project_root: &Path) -> Result<()> {
    let pitched_dir = project_root.join(PROJECT_DIR);

    if pitched_dir.exists() && !args.force {
        anyhow::bail!("{PROJECT_DIR}/ already exists. Use `pl init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&pitched_dir)
        .with_context(|| format!("Failed to create {}", pitched_dir.display()))?;

    let config_path = pitched_dir.join("config.toml");
    std::fs::write(&config_path, config::default_config_toml())
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let gitignore_path = pitched_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    let project = config::load_project_config(project_root)?;
    let db_path = project.db_path(project_root);
    Store::open(&db_path).with_context(|| format!("Failed to open store: {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "initialized pitch store");

    println!("✓ Initialized {PROJECT_DIR}/ project structure.");
    println!();
    println!("  Store:  {PROJECT_DIR}/{}", project.store.db_file);
    println!("  Config: {PROJECT_DIR}/config.toml");
    println!();
    println!("Next steps:");
    println!("  Set your identity (required for claps and claims):");
    println!("    export PITCHED_USER=your-name");
    println!();
    println!("  Load scraped pitches:");
    println!("    pl ingest pitches.json");

    Ok(())
}

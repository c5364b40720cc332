//! `pl list`: top-ranked, featured and latest listings, one category's
//! pitches, the current user's claimed pitches, and pitches suggested for
//! a handle.

use crate::cmd::{PitchRow, open_project, require_user, store_failure};
use crate::identity::UserSources;
use crate::output::{OutputMode, render_list};
use anyhow::Result;
use clap::{Args, ValueEnum};
use pitchedlink_core::config::ListingConfig;
use std::path::Path;

/// Which listing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ListView {
    /// Highest rank first.
    #[default]
    Top,
    /// Featured pitches by rank.
    Featured,
    /// Most recently added.
    Latest,
    /// Pitches the current user has claimed (pending or verified).
    Claimed,
    /// Unclaimed pitches whose mentions came from `--handle`.
    Suggested,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Listing to show.
    #[arg(long, value_enum, default_value_t = ListView::Top)]
    pub view: ListView,

    /// Maximum rows. Defaults come from `[listing]` in config.toml.
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,

    /// Social handle for `--view suggested` (leading `@` optional).
    #[arg(long, required_if_eq("view", "suggested"))]
    pub handle: Option<String>,

    /// List one category (slug or ID) by rank instead of a view.
    #[arg(long, conflicts_with_all = ["view", "handle"])]
    pub category: Option<String>,
}

const fn default_limit(args: &ListArgs, listing: &ListingConfig) -> Option<u32> {
    if args.category.is_some() {
        return Some(listing.page_size);
    }
    match args.view {
        ListView::Top => Some(listing.leaderboard_limit),
        ListView::Featured => Some(listing.featured_limit),
        ListView::Latest => Some(listing.latest_limit),
        ListView::Claimed | ListView::Suggested => None,
    }
}

/// Execute `pl list`.
///
/// # Errors
///
/// Returns an error if the store read fails, the category is unknown, or a
/// user-scoped view is requested without an identity.
pub fn run_list(
    args: &ListArgs,
    users: UserSources<'_>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let (store, project) = open_project(project_root, output)?;
    let limit = args.limit.or_else(|| default_limit(args, &project.listing));

    let pitches = if let Some(category) = args.category.as_deref() {
        store.by_category(category, limit.unwrap_or(u32::MAX))
    } else {
        match args.view {
            ListView::Top => store.top_ranked(limit.unwrap_or(u32::MAX)),
            ListView::Featured => store.featured(limit.unwrap_or(u32::MAX)),
            ListView::Latest => store.latest(limit.unwrap_or(u32::MAX)),
            ListView::Claimed => {
                let user = require_user(users, output)?;
                store.claimed_by(&user)
            }
            ListView::Suggested => {
                let user = require_user(users, output)?;
                // clap requires --handle for this view
                let handle = args.handle.as_deref().unwrap_or_default();
                store.suggested_for_handle(handle, &user)
            }
        }
    }
    .map_err(|e| store_failure(output, e))?;

    let mut rows: Vec<PitchRow> = pitches.into_iter().map(PitchRow::new).collect();
    if args.category.is_none()
        && matches!(args.view, ListView::Claimed | ListView::Suggested)
        && let Some(limit) = limit
    {
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }

    if rows.is_empty() && output == OutputMode::Pretty {
        println!("No pitches.");
        return Ok(());
    }
    render_list(&rows, output)?;
    Ok(())
}

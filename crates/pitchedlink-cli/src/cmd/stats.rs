//! `pl stats`: ownership summary for the current user.

use crate::cmd::{open_project, require_user, store_failure};
use crate::identity::UserSources;
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use pitchedlink_core::db::UserStats;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug, Default)]
pub struct StatsArgs {}

fn write_text(stats: &UserStats, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "{}  owned {}  verified {}  engagement {}",
        stats.user_id, stats.total_owned, stats.verified_claims, stats.total_engagement
    )
}

fn write_pretty(stats: &UserStats, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Stats for {}", stats.user_id))?;
    pretty_kv(w, "Owned", stats.total_owned.to_string())?;
    pretty_kv(w, "Verified", stats.verified_claims.to_string())?;
    pretty_kv(w, "Engagement", stats.total_engagement.to_string())?;
    pretty_rule(w)
}

/// Execute `pl stats`.
///
/// # Errors
///
/// Returns an error if no user identity is set or the store read fails.
pub fn run_stats(
    _args: &StatsArgs,
    users: UserSources<'_>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let user = require_user(users, output)?;
    let (store, _) = open_project(project_root, output)?;
    let stats = store.user_stats(&user).map_err(|e| store_failure(output, e))?;
    render_mode(output, &stats, write_text, write_pretty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> UserStats {
        UserStats {
            user_id: "alice".into(),
            total_owned: 2,
            verified_claims: 1,
            total_engagement: 8,
        }
    }

    #[test]
    fn text_is_one_line() {
        let mut buf = Vec::new();
        write_text(&stats(), &mut buf).expect("render");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "alice  owned 2  verified 1  engagement 8\n"
        );
    }

    #[test]
    fn json_uses_summary_field_names() {
        let value = serde_json::to_value(stats()).expect("serialize");
        assert_eq!(value["total_owned"], 2);
        assert_eq!(value["verified_claims"], 1);
        assert_eq!(value["total_engagement"], 8);
    }
}

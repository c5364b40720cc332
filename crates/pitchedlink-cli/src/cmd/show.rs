//! `pl show`: one pitch in full, with its cached ranking fields, mentions,
//! the clap ledger, ownership claims and related pitches.

use crate::cmd::{micros_to_local_datetime, open_project, store_failure};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use pitchedlink_core::Pitch;
use pitchedlink_core::model::claim::Claim;
use pitchedlink_core::model::clap::ClapEntry;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Pitch ID or unique prefix.
    pub id: String,
}

/// Pitch detail as returned in JSON output.
#[derive(Debug, Serialize)]
pub struct ShowPitch {
    #[serde(flatten)]
    pub pitch: Pitch,
    pub engagement_score: u64,
    /// Raw clap total, for display next to the effective `clap`.
    pub display_claps: u64,
    pub claps: Vec<ClapEntry>,
    pub claims: Vec<Claim>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    pub related: Vec<RelatedPitch>,
}

/// Short form of a related pitch.
#[derive(Debug, Serialize)]
pub struct RelatedPitch {
    pub id: String,
    pub name: String,
    pub rank: i64,
}

impl From<Pitch> for RelatedPitch {
    fn from(pitch: Pitch) -> Self {
        Self {
            rank: pitch.rank(),
            id: pitch.id,
            name: pitch.name,
        }
    }
}

fn write_text(detail: &ShowPitch, w: &mut dyn Write) -> std::io::Result<()> {
    let pitch = &detail.pitch;
    let totals = pitch.total_engagement();
    writeln!(w, "{}  {}", pitch.id, pitch.name)?;
    writeln!(
        w,
        "rank {}  claps {} ({} raw)  claimed {}  featured {}",
        pitch.rank(),
        pitch.clap(),
        detail.display_claps,
        pitch.claimed(),
        pitch.is_featured
    )?;
    writeln!(
        w,
        "mentions {}  replies {}  retweets {}  likes {}  views {}",
        pitch.mention_count(),
        totals.replies,
        totals.retweets,
        totals.likes,
        totals.views
    )
}

fn write_pretty(detail: &ShowPitch, w: &mut dyn Write) -> std::io::Result<()> {
    let pitch = &detail.pitch;
    let totals = pitch.total_engagement();

    pretty_section(w, &format!("{} ({})", pitch.name, pitch.id))?;
    if let Some(url) = &pitch.url {
        pretty_kv(w, "URL", url)?;
    }
    pretty_kv(w, "Rank", pitch.rank().to_string())?;
    pretty_kv(
        w,
        "Claps",
        format!("{} effective, {} raw", pitch.clap(), detail.display_claps),
    )?;
    pretty_kv(w, "Claimed", if pitch.claimed() { "yes" } else { "no" })?;
    pretty_kv(w, "Featured", if pitch.is_featured { "yes" } else { "no" })?;
    if let Some(slug) = &detail.category_slug {
        pretty_kv(w, "Category", slug)?;
    }
    pretty_kv(w, "Score", detail.engagement_score.to_string())?;
    pretty_kv(w, "Created", micros_to_local_datetime(pitch.created_at_us))?;
    pretty_kv(w, "Updated", micros_to_local_datetime(pitch.updated_at_us))?;

    writeln!(w)?;
    pretty_section(w, &format!("Mentions ({})", pitch.mention_count()))?;
    pretty_kv(
        w,
        "Totals",
        format!(
            "{} replies, {} retweets, {} likes, {} views",
            totals.replies, totals.retweets, totals.likes, totals.views
        ),
    )?;
    for mention in pitch.mentions() {
        let who = mention.handle().map_or_else(|| "?".to_string(), |h| format!("@{h}"));
        let when = mention.timestamp.as_deref().unwrap_or("-");
        let e = mention.engagement;
        writeln!(
            w,
            "  {who:<16} {when:<26} r{} rt{} l{} v{}",
            e.replies, e.retweets, e.likes, e.views
        )?;
        if let Some(link) = &mention.reply_link {
            writeln!(w, "  {:<16} {link}", "")?;
        }
    }

    if !detail.claps.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Claps")?;
        for entry in &detail.claps {
            writeln!(
                w,
                "  {:<16} {:>2}/10 → {}  last {}",
                entry.user_id,
                entry.raw_count,
                entry.effective_count(),
                micros_to_local_datetime(entry.last_clapped_at_us)
            )?;
        }
    }

    if !detail.claims.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Claims")?;
        for claim in &detail.claims {
            writeln!(
                w,
                "  {:<16} {:<9} {}",
                claim.user_id,
                claim.status,
                micros_to_local_datetime(claim.updated_at_us)
            )?;
        }
    }

    if !detail.related.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Related")?;
        for related in &detail.related {
            writeln!(w, "  {:<28} rank {:>6}  {}", related.name, related.rank, related.id)?;
        }
    }

    pretty_rule(w)
}

/// Execute `pl show`.
///
/// # Errors
///
/// Returns an error if the pitch cannot be resolved or the store read fails.
pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (store, project) = open_project(project_root, output)?;
    let pitch = store.get_pitch(&args.id).map_err(|e| store_failure(output, e))?;
    let category_slug = match pitch.category.as_deref() {
        Some(key) => Some(
            store
                .get_category(key)
                .map(|category| category.slug)
                .map_err(|e| store_failure(output, e))?,
        ),
        None => None,
    };
    let related = store
        .related(&pitch.id, project.listing.related_limit)
        .map_err(|e| store_failure(output, e))?
        .into_iter()
        .map(RelatedPitch::from)
        .collect();

    let detail = ShowPitch {
        engagement_score: pitch.engagement_score(),
        display_claps: store
            .raw_clap_total(&pitch.id)
            .map_err(|e| store_failure(output, e))?,
        claps: store
            .clap_entries(&pitch.id)
            .map_err(|e| store_failure(output, e))?,
        claims: store
            .claims_for(&pitch.id)
            .map_err(|e| store_failure(output, e))?,
        category_slug,
        related,
        pitch,
    };

    render_mode(output, &detail, write_text, write_pretty)
}

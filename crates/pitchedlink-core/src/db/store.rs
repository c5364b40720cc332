//! Write paths for the pitch store.
//!
//! Each public mutation opens one IMMEDIATE transaction, loads the pitch,
//! applies its rule, lets the pitch recompute its cached fields, writes the
//! row and commits. A failure anywhere rolls the whole call back.

use super::query::{self, sql_int};
use super::{Store, StoreError};
use crate::ingest::{IngestRecord, IngestReport};
use crate::model::category::{Category, CategoryRef, CategorySummary};
use crate::model::claim::{Claim, ClaimStatus};
use crate::model::clap::{ClapEntry, EndorsementOutcome};
use crate::model::mention::Engagement;
use crate::model::pitch::{Pitch, slugify, slugify_or, url_host};
use crate::now_us;
use crate::rank::{self, effective_count, next_raw_count};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{info, warn};

/// A persisted pitch whose stored fields disagree with its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    pub pitch_id: String,
    pub field: &'static str,
    pub stored: String,
    pub expected: String,
}

/// Summary of a full recompute pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub pitches: usize,
    /// Pitches whose stored fields changed during the pass.
    pub changed: Vec<String>,
    pub rebuilt_at_us: i64,
}

impl Store {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Resolve an exact ID or unique prefix to a pitch ID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PitchNotFound`] or [`StoreError::AmbiguousId`].
    pub fn resolve_pitch_id(&self, input: &str) -> Result<String, StoreError> {
        query::resolve_pitch_id(self.connection(), input)
    }

    /// Fetch a pitch by exact ID or unique prefix.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PitchNotFound`] when no pitch matches.
    pub fn get_pitch(&self, id_or_prefix: &str) -> Result<Pitch, StoreError> {
        let pitch_id = self.resolve_pitch_id(id_or_prefix)?;
        load_pitch(self.connection(), &pitch_id)
    }

    /// Fetch the pitch tracking `url`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_pitch_by_url(&self, url: &str) -> Result<Option<Pitch>, StoreError> {
        query::find_pitch_by_url(self.connection(), url.trim())
    }

    /// Sum of effective clap contributions, read from the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn effective_clap_total(&self, pitch_id: &str) -> Result<u64, StoreError> {
        query::effective_clap_total(self.connection(), pitch_id)
    }

    /// Sum of raw clap counters, for display.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn raw_clap_total(&self, pitch_id: &str) -> Result<u64, StoreError> {
        query::raw_clap_total(self.connection(), pitch_id)
    }

    /// Raw clap count one user has given one pitch.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn user_clap_count(&self, user_id: &str, pitch_id: &str) -> Result<u32, StoreError> {
        query::user_clap_count(self.connection(), pitch_id, user_id.trim())
    }

    /// Whether a user has clapped a pitch.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn has_user_clapped(&self, user_id: &str, pitch_id: &str) -> Result<bool, StoreError> {
        query::has_user_clapped(self.connection(), pitch_id, user_id.trim())
    }

    /// Ledger rows for a pitch.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn clap_entries(&self, pitch_id: &str) -> Result<Vec<ClapEntry>, StoreError> {
        query::clap_entries(self.connection(), pitch_id)
    }

    /// Claims recorded on a pitch.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn claims_for(&self, pitch_id: &str) -> Result<Vec<Claim>, StoreError> {
        query::claims_for(self.connection(), pitch_id)
    }

    /// One page of the leaderboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn leaderboard(&self, page: u32, page_size: u32) -> Result<query::LeaderboardPage, StoreError> {
        query::leaderboard(self.connection(), page, page_size)
    }

    /// Top pitches by rank.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn top_ranked(&self, limit: u32) -> Result<Vec<Pitch>, StoreError> {
        query::top_ranked(self.connection(), limit)
    }

    /// Featured pitches by rank.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn featured(&self, limit: u32) -> Result<Vec<Pitch>, StoreError> {
        query::featured(self.connection(), limit)
    }

    /// Newest pitches.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn latest(&self, limit: u32) -> Result<Vec<Pitch>, StoreError> {
        query::latest(self.connection(), limit)
    }

    /// Pitches claimed by a user (rejected claims excluded).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn claimed_by(&self, user_id: &str) -> Result<Vec<Pitch>, StoreError> {
        query::claimed_by(self.connection(), user_id.trim())
    }

    /// Unclaimed pitches whose mentions were posted by `handle`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn suggested_for_handle(&self, handle: &str, user_id: &str) -> Result<Vec<Pitch>, StoreError> {
        query::suggested_for_handle(self.connection(), handle, user_id.trim())
    }

    /// Pitches related to `id_or_prefix`: same category first, then by rank.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PitchNotFound`] for an unknown pitch.
    pub fn related(&self, id_or_prefix: &str, limit: u32) -> Result<Vec<Pitch>, StoreError> {
        let pitch = self.get_pitch(id_or_prefix)?;
        query::related(self.connection(), &pitch, limit)
    }

    /// Look up a category by slug or `category_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CategoryNotFound`] when nothing matches.
    pub fn get_category(&self, key: &str) -> Result<Category, StoreError> {
        query::find_category(self.connection(), key)?
            .ok_or_else(|| StoreError::CategoryNotFound(key.trim().to_string()))
    }

    /// Every category by name, with pitch counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn categories(&self) -> Result<Vec<CategorySummary>, StoreError> {
        query::categories(self.connection())
    }

    /// Pitches in a category (slug or `category_id`), highest rank first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CategoryNotFound`] for an unknown category.
    pub fn by_category(&self, key: &str, limit: u32) -> Result<Vec<Pitch>, StoreError> {
        let category = self.get_category(key)?;
        query::by_category(self.connection(), &category.category_id, limit)
    }

    /// Claim and engagement summary for a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUser`] for a blank user.
    pub fn user_stats(&self, user_id: &str) -> Result<query::UserStats, StoreError> {
        let user_id = validate_user(user_id)?;
        query::user_stats(self.connection(), &user_id)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Create an empty pitch. The ID is a slug of the name, suffixed `-N`
    /// on collision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicatePitch`] if `url` is already tracked.
    pub fn create_pitch(&mut self, name: &str, url: Option<&str>) -> Result<Pitch, StoreError> {
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        let tx = self.write_tx()?;
        if let Some(url) = url
            && query::find_pitch_by_url(&tx, url)?.is_some()
        {
            return Err(StoreError::DuplicatePitch(url.to_string()));
        }

        let mut pitch = new_pitch(&tx, name, url, now_us())?;
        persist_pitch(&tx, &mut pitch)?;
        tx.commit()?;

        info!(pitch_id = %pitch.id, name = %pitch.name, "created pitch");
        Ok(pitch)
    }

    /// Merge a batch of scraped records, all in one transaction.
    ///
    /// Records are matched to pitches by URL; mentions are matched by
    /// `replyLink` and replaced in place, otherwise appended. A record's
    /// category is created on first sight and refiles the pitch.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails. Nothing from the batch is kept.
    pub fn ingest_batch(&mut self, records: &[IngestRecord]) -> Result<IngestReport, StoreError> {
        let now = now_us();
        let tx = self.write_tx()?;
        let mut report = IngestReport::default();

        for (index, record) in records.iter().enumerate() {
            let Some(url) = record.url.as_deref() else {
                warn!(index, "skipping ingest record without meta_data.final_url");
                report.skipped += 1;
                continue;
            };

            let category = match &record.category {
                Some(category) => Some(ensure_category(&tx, category, now)?),
                None => None,
            };

            if let Some(mut pitch) = query::find_pitch_by_url(&tx, url)? {
                if let Some(name) = &record.name {
                    pitch.name.clone_from(name);
                }
                if category.is_some() {
                    pitch.category = category;
                }
                if let Some(mention) = record.mention.clone() {
                    pitch.merge_mention(mention);
                }
                pitch.updated_at_us = now;
                persist_pitch(&tx, &mut pitch)?;
                report.updated.push(pitch.id);
            } else {
                let name = record.name.as_deref().unwrap_or_default();
                let mut pitch = new_pitch(&tx, name, Some(url), now)?;
                pitch.category = category;
                if let Some(mention) = record.mention.clone() {
                    pitch.set_mentions(vec![mention]);
                }
                persist_pitch(&tx, &mut pitch)?;
                report.created.push(pitch.id);
            }
        }

        tx.commit()?;
        info!(
            created = report.created.len(),
            updated = report.updated.len(),
            skipped = report.skipped,
            "ingested batch"
        );
        Ok(report)
    }

    /// Record one clap by `user_id` on `pitch_id`.
    ///
    /// At the ceiling the call succeeds without changing anything.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUser`] for a blank user and
    /// [`StoreError::PitchNotFound`] for an unknown pitch.
    pub fn record_endorsement(
        &mut self,
        user_id: &str,
        pitch_id: &str,
    ) -> Result<EndorsementOutcome, StoreError> {
        self.record_endorsements(user_id, pitch_id, 1)
    }

    /// Record `times` sequential claps (at least one) in one transaction.
    ///
    /// # Errors
    ///
    /// Same as [`Store::record_endorsement`].
    pub fn record_endorsements(
        &mut self,
        user_id: &str,
        pitch_id: &str,
        times: u32,
    ) -> Result<EndorsementOutcome, StoreError> {
        let user_id = validate_user(user_id)?;
        let now = now_us();
        let tx = self.write_tx()?;
        let mut pitch = load_pitch(&tx, pitch_id)?;

        let current = query::clap_entry(&tx, &pitch.id, &user_id)?.map(|entry| entry.raw_count);
        let raw_count = (0..times.max(1))
            .fold(current, |raw, _| Some(next_raw_count(raw)))
            .unwrap_or_default();
        let changed = current != Some(raw_count);

        if changed {
            tx.execute(
                "INSERT INTO claps (pitch_id, user_id, raw_count, created_at_us, last_clapped_at_us)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(pitch_id, user_id) DO UPDATE SET
                     raw_count = excluded.raw_count,
                     last_clapped_at_us = excluded.last_clapped_at_us",
                params![pitch.id, user_id, i64::from(raw_count), now],
            )?;
            pitch.set_effective_claps(query::effective_clap_total(&tx, &pitch.id)?);
            pitch.updated_at_us = now;
            persist_pitch(&tx, &mut pitch)?;
        }
        let display_claps = query::raw_clap_total(&tx, &pitch.id)?;
        tx.commit()?;

        if changed {
            info!(pitch_id = %pitch.id, user_id = %user_id, raw_count, rank = pitch.rank(), "recorded clap");
        }

        Ok(EndorsementOutcome {
            pitch_id: pitch.id.clone(),
            user_id,
            raw_count,
            effective_count: effective_count(raw_count),
            changed,
            clap: pitch.clap(),
            display_claps,
            rank: pitch.rank(),
        })
    }

    /// Create or update `user_id`'s claim on a pitch.
    ///
    /// The pitch counts as claimed while at least one claim is verified.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUser`] or [`StoreError::PitchNotFound`].
    pub fn set_claim(
        &mut self,
        user_id: &str,
        pitch_id: &str,
        status: ClaimStatus,
    ) -> Result<Pitch, StoreError> {
        let user_id = validate_user(user_id)?;
        let now = now_us();
        let tx = self.write_tx()?;
        let mut pitch = load_pitch(&tx, pitch_id)?;

        tx.execute(
            "INSERT INTO claims (pitch_id, user_id, status, claimed_at_us, updated_at_us)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(pitch_id, user_id) DO UPDATE SET
                 status = excluded.status,
                 updated_at_us = excluded.updated_at_us",
            params![pitch.id, user_id, status.as_str(), now],
        )?;
        refresh_claimed(&tx, &mut pitch, now)?;
        tx.commit()?;

        info!(pitch_id = %pitch.id, user_id = %user_id, %status, claimed = pitch.claimed(), "set claim");
        Ok(pitch)
    }

    /// Drop `user_id`'s claim on a pitch. Removing a missing claim is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUser`] or [`StoreError::PitchNotFound`].
    pub fn remove_claim(&mut self, user_id: &str, pitch_id: &str) -> Result<Pitch, StoreError> {
        let user_id = validate_user(user_id)?;
        let now = now_us();
        let tx = self.write_tx()?;
        let mut pitch = load_pitch(&tx, pitch_id)?;

        let removed = tx.execute(
            "DELETE FROM claims WHERE pitch_id = ?1 AND user_id = ?2",
            params![pitch.id, user_id],
        )?;
        if removed > 0 {
            refresh_claimed(&tx, &mut pitch, now)?;
        }
        tx.commit()?;

        info!(pitch_id = %pitch.id, user_id = %user_id, removed, "removed claim");
        Ok(pitch)
    }

    /// Toggle the featured flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PitchNotFound`] for an unknown pitch.
    pub fn set_featured(&mut self, pitch_id: &str, featured: bool) -> Result<Pitch, StoreError> {
        let tx = self.write_tx()?;
        let mut pitch = load_pitch(&tx, pitch_id)?;
        pitch.is_featured = featured;
        pitch.updated_at_us = now_us();
        persist_pitch(&tx, &mut pitch)?;
        tx.commit()?;

        info!(pitch_id = %pitch.id, featured, "set featured flag");
        Ok(pitch)
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Compare every stored pitch against a fresh recomputation from its
    /// mentions, the clap ledger and the claim table.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the store fails.
    pub fn verify(&self) -> Result<Vec<Inconsistency>, StoreError> {
        let conn = self.connection();
        let mut problems = Vec::new();

        for pitch_id in query::all_pitch_ids(conn)? {
            let pitch = load_pitch(conn, &pitch_id)?;
            let ledger_clap = query::effective_clap_total(conn, &pitch_id)?;
            let verified = query::has_verified_claim(conn, &pitch_id)?;

            let mut report = |field: &'static str, stored: String, expected: String| {
                if stored != expected {
                    problems.push(Inconsistency {
                        pitch_id: pitch_id.clone(),
                        field,
                        stored,
                        expected,
                    });
                }
            };

            report("clap", pitch.clap().to_string(), ledger_clap.to_string());
            report("claimed", pitch.claimed().to_string(), verified.to_string());

            let stored = pitch.derived();
            let fresh = rank::derive(pitch.mentions(), ledger_clap, verified);
            report(
                "mention_count",
                stored.mention_count.to_string(),
                fresh.mention_count.to_string(),
            );
            for key in Engagement::KEYS {
                report(
                    key,
                    stored.total_engagement.get(key).unwrap_or_default().to_string(),
                    fresh.total_engagement.get(key).unwrap_or_default().to_string(),
                );
            }
            report("rank", stored.rank.to_string(), fresh.rank.to_string());
        }

        if !problems.is_empty() {
            warn!(count = problems.len(), "store has stale cached fields");
        }
        Ok(problems)
    }

    /// Recompute and rewrite every pitch from its inputs in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any read or write fails. Nothing is kept on error.
    pub fn rebuild(&mut self) -> Result<RebuildReport, StoreError> {
        let now = now_us();
        let tx = self.write_tx()?;
        let mut report = RebuildReport {
            rebuilt_at_us: now,
            ..RebuildReport::default()
        };

        for pitch_id in query::all_pitch_ids(&tx)? {
            let mut pitch = load_pitch(&tx, &pitch_id)?;
            let before = (pitch.derived(), pitch.clap(), pitch.claimed());

            pitch.set_effective_claps(query::effective_clap_total(&tx, &pitch_id)?);
            pitch.set_claimed(query::has_verified_claim(&tx, &pitch_id)?);
            persist_pitch(&tx, &mut pitch)?;

            if before != (pitch.derived(), pitch.clap(), pitch.claimed()) {
                report.changed.push(pitch_id);
            }
            report.pitches += 1;
        }

        tx.execute(
            "UPDATE store_meta SET last_rebuild_at_us = ?1 WHERE id = 1",
            [now],
        )?;
        tx.commit()?;

        info!(
            pitches = report.pitches,
            changed = report.changed.len(),
            "rebuilt cached pitch fields"
        );
        Ok(report)
    }

    /// Timestamp of the last completed rebuild, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_rebuild_at_us(&self) -> Result<Option<i64>, StoreError> {
        let value: Option<i64> = self
            .connection()
            .query_row(
                "SELECT last_rebuild_at_us FROM store_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.filter(|us| *us > 0))
    }
}

fn validate_user(user_id: &str) -> Result<String, StoreError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidUser(user_id.to_string()));
    }
    Ok(trimmed.to_string())
}

fn load_pitch(conn: &Connection, pitch_id: &str) -> Result<Pitch, StoreError> {
    query::find_pitch(conn, pitch_id)?.ok_or_else(|| StoreError::PitchNotFound(pitch_id.to_string()))
}

fn refresh_claimed(conn: &Connection, pitch: &mut Pitch, now: i64) -> Result<(), StoreError> {
    pitch.set_claimed(query::has_verified_claim(conn, &pitch.id)?);
    pitch.updated_at_us = now;
    persist_pitch(conn, pitch)
}

/// Build an unsaved pitch with a fresh unique ID.
fn new_pitch(conn: &Connection, name: &str, url: Option<&str>, now: i64) -> Result<Pitch, StoreError> {
    let name = match (name.trim(), url.and_then(url_host)) {
        ("", Some(host)) => format!("Pitch from {host}"),
        (name, _) => name.to_string(),
    };
    let mut pitch = Pitch::new(String::new(), name, now);
    pitch.id = unique_slug(&slugify(&pitch.name), |id| {
        Ok(query::find_pitch(conn, id)?.is_some())
    })?;
    pitch.url = url.map(str::to_string);
    Ok(pitch)
}

/// Make sure the referenced category exists and return its `category_id`.
fn ensure_category(conn: &Connection, category: &CategoryRef, now: i64) -> Result<String, StoreError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE category_id = ?1)",
        [&category.category_id],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(category.category_id.clone());
    }

    let slug = unique_slug(&slugify_or(&category.name, "category"), |slug| {
        query::category_slug_taken(conn, slug)
    })?;
    conn.execute(
        "INSERT INTO categories (category_id, name, slug, created_at_us) VALUES (?1, ?2, ?3, ?4)",
        params![category.category_id, category.name, slug, now],
    )?;
    info!(category_id = %category.category_id, %slug, "created category");
    Ok(category.category_id.clone())
}

/// `base`, or `base-1`, `base-2`, ... whichever is free first.
fn unique_slug(
    base: &str,
    mut taken: impl FnMut(&str) -> Result<bool, StoreError>,
) -> Result<String, StoreError> {
    let mut candidate = base.to_string();
    let mut suffix = 1_u32;
    while taken(&candidate)? {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    Ok(candidate)
}

/// Recompute and upsert one pitch row. The only writer of the `pitches` table.
fn persist_pitch(conn: &Connection, pitch: &mut Pitch) -> Result<(), StoreError> {
    let derived = pitch.recompute();
    let totals = derived.total_engagement;
    let mentions_json = serde_json::to_string(pitch.mentions())?;

    conn.execute(
        "INSERT INTO pitches (
             pitch_id, name, url, source, mentions_json, mention_count,
             replies, retweets, likes, views, clap, claimed, is_featured, rank,
             created_at_us, updated_at_us, category_id
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
         ON CONFLICT(pitch_id) DO UPDATE SET
             name = excluded.name,
             url = excluded.url,
             source = excluded.source,
             mentions_json = excluded.mentions_json,
             mention_count = excluded.mention_count,
             replies = excluded.replies,
             retweets = excluded.retweets,
             likes = excluded.likes,
             views = excluded.views,
             clap = excluded.clap,
             claimed = excluded.claimed,
             is_featured = excluded.is_featured,
             rank = excluded.rank,
             updated_at_us = excluded.updated_at_us,
             category_id = excluded.category_id",
        params![
            pitch.id,
            pitch.name,
            pitch.url,
            pitch.source,
            mentions_json,
            sql_int(derived.mention_count),
            sql_int(totals.replies),
            sql_int(totals.retweets),
            sql_int(totals.likes),
            sql_int(totals.views),
            sql_int(pitch.clap()),
            pitch.claimed(),
            pitch.is_featured,
            derived.rank,
            pitch.created_at_us,
            pitch.updated_at_us,
            pitch.category,
        ],
    )?;
    Ok(())
}

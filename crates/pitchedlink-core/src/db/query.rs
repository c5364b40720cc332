//! Read-side queries over the pitch store.
//!
//! All functions take a shared `&Connection` and return typed structs. Every
//! listing orders by the stored `rank`; none of them recompute it.

use super::StoreError;
use crate::model::category::{Category, CategorySummary};
use crate::model::claim::{Claim, ClaimStatus};
use crate::model::clap::ClapEntry;
use crate::model::mention::{Engagement, decode_mentions};
use crate::model::pitch::{Pitch, StoredPitch};
use crate::rank::{DerivedFields, effective_total, raw_total};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

pub(crate) const PITCH_COLUMNS: &str = "pitch_id, name, url, source, mentions_json, \
     mention_count, replies, retweets, likes, views, clap, claimed, is_featured, rank, \
     created_at_us, updated_at_us, category_id";

/// Canonical listing order: rank, then newest first, then ID for stability.
const RANK_ORDER: &str = "ORDER BY rank DESC, created_at_us DESC, pitch_id ASC";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A pitch with its 1-based position on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub position: u64,
    pub pitch: Pitch,
}

/// One page of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardPage {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
    /// Position of the first entry on this page.
    pub start_rank: u64,
    pub entries: Vec<LeaderboardEntry>,
}

/// Ownership summary for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub user_id: String,
    /// Pitches with a pending or verified claim by the user.
    pub total_owned: u64,
    pub verified_claims: u64,
    /// `likes + retweets + replies` summed over the owned pitches.
    pub total_engagement: u64,
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn column_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(error)))
}

fn column_u32(row: &Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    let value: i64 = row.get(idx)?;
    u32::try_from(value)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(error)))
}

/// Saturating conversion for writing unsigned counters to SQLite.
pub(crate) fn sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Map a row selected with [`PITCH_COLUMNS`] to a [`Pitch`].
///
/// The cached columns are read as stored, so a stale row stays visible to
/// [`crate::db::store`]'s verify pass.
pub(crate) fn pitch_from_row(row: &Row<'_>) -> rusqlite::Result<Pitch> {
    let mentions_json: String = row.get(4)?;
    let stored = StoredPitch {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        source: row.get(3)?,
        category: row.get(16)?,
        mentions: decode_mentions(&mentions_json),
        derived: DerivedFields {
            mention_count: column_u64(row, 5)?,
            total_engagement: Engagement {
                replies: column_u64(row, 6)?,
                retweets: column_u64(row, 7)?,
                likes: column_u64(row, 8)?,
                views: column_u64(row, 9)?,
            },
            rank: row.get(13)?,
        },
        clap: column_u64(row, 10)?,
        claimed: row.get(11)?,
        is_featured: row.get(12)?,
        created_at_us: row.get(14)?,
        updated_at_us: row.get(15)?,
    };
    Ok(stored.into())
}

fn clap_from_row(row: &Row<'_>) -> rusqlite::Result<ClapEntry> {
    Ok(ClapEntry {
        pitch_id: row.get(0)?,
        user_id: row.get(1)?,
        raw_count: column_u32(row, 2)?,
        created_at_us: row.get(3)?,
        last_clapped_at_us: row.get(4)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        category_id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at_us: row.get(3)?,
    })
}

fn claim_from_row(row: &Row<'_>) -> rusqlite::Result<Claim> {
    let status: String = row.get(2)?;
    let status = status.parse::<ClaimStatus>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error))
    })?;
    Ok(Claim {
        pitch_id: row.get(0)?,
        user_id: row.get(1)?,
        status,
        claimed_at_us: row.get(3)?,
        updated_at_us: row.get(4)?,
    })
}

fn prefixed_pitch_columns(alias: &str) -> String {
    PITCH_COLUMNS
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn collect_pitches(conn: &Connection, sql: &str, limit: u32) -> Result<Vec<Pitch>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([i64::from(limit)], pitch_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// ---------------------------------------------------------------------------
// Pitch lookups
// ---------------------------------------------------------------------------

/// Fetch a pitch by exact ID.
///
/// # Errors
///
/// Returns an error if the query fails or the row is corrupt.
pub fn find_pitch(conn: &Connection, pitch_id: &str) -> Result<Option<Pitch>, StoreError> {
    let sql = format!("SELECT {PITCH_COLUMNS} FROM pitches WHERE pitch_id = ?1");
    Ok(conn
        .query_row(&sql, [pitch_id], pitch_from_row)
        .optional()?)
}

/// Fetch a pitch by its source product URL.
///
/// # Errors
///
/// Returns an error if the query fails or the row is corrupt.
pub fn find_pitch_by_url(conn: &Connection, url: &str) -> Result<Option<Pitch>, StoreError> {
    let sql = format!("SELECT {PITCH_COLUMNS} FROM pitches WHERE url = ?1");
    Ok(conn.query_row(&sql, [url], pitch_from_row).optional()?)
}

/// Resolve user input to a pitch ID: exact match first, then a unique prefix.
///
/// # Errors
///
/// Returns [`StoreError::PitchNotFound`] when nothing matches and
/// [`StoreError::AmbiguousId`] when several IDs share the prefix.
pub fn resolve_pitch_id(conn: &Connection, input: &str) -> Result<String, StoreError> {
    let input = input.trim();
    let exact: Option<String> = conn
        .query_row(
            "SELECT pitch_id FROM pitches WHERE pitch_id = ?1",
            [input],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = exact {
        return Ok(id);
    }
    if input.is_empty() {
        return Err(StoreError::PitchNotFound(input.to_string()));
    }

    let escaped = input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let mut stmt = conn.prepare(
        "SELECT pitch_id FROM pitches WHERE pitch_id LIKE ?1 ESCAPE '\\' ORDER BY pitch_id LIMIT 6",
    )?;
    let matches = stmt
        .query_map([format!("{escaped}%")], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if matches.len() > 1 {
        return Err(StoreError::AmbiguousId {
            input: input.to_string(),
            matches,
        });
    }
    matches
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::PitchNotFound(input.to_string()))
}

/// Every pitch ID in the store, sorted.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn all_pitch_ids(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare("SELECT pitch_id FROM pitches ORDER BY pitch_id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

/// Number of pitches in the store.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_pitches(conn: &Connection) -> Result<u64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM pitches", [], |row| column_u64(row, 0))?)
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// One page of pitches ordered by rank. Pages are 1-based; page 0 is page 1.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn leaderboard(
    conn: &Connection,
    page: u32,
    page_size: u32,
) -> Result<LeaderboardPage, StoreError> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = count_pitches(conn)?;
    let offset = u64::from(page - 1) * u64::from(page_size);
    let start_rank = offset + 1;

    let sql = format!("SELECT {PITCH_COLUMNS} FROM pitches {RANK_ORDER} LIMIT ?1 OFFSET ?2");
    let mut stmt = conn.prepare(&sql)?;
    let pitches = stmt
        .query_map(params![i64::from(page_size), sql_int(offset)], pitch_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let entries = (start_rank..)
        .zip(pitches)
        .map(|(position, pitch)| LeaderboardEntry { position, pitch })
        .collect();

    Ok(LeaderboardPage {
        page,
        page_size,
        total,
        total_pages: total.div_ceil(u64::from(page_size)),
        start_rank,
        entries,
    })
}

/// Top pitches by rank, ignoring the featured flag.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn top_ranked(conn: &Connection, limit: u32) -> Result<Vec<Pitch>, StoreError> {
    let sql = format!("SELECT {PITCH_COLUMNS} FROM pitches {RANK_ORDER} LIMIT ?1");
    collect_pitches(conn, &sql, limit)
}

/// Featured pitches, highest rank first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn featured(conn: &Connection, limit: u32) -> Result<Vec<Pitch>, StoreError> {
    let sql = format!("SELECT {PITCH_COLUMNS} FROM pitches WHERE is_featured = 1 {RANK_ORDER} LIMIT ?1");
    collect_pitches(conn, &sql, limit)
}

/// Most recently created pitches.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn latest(conn: &Connection, limit: u32) -> Result<Vec<Pitch>, StoreError> {
    let sql = format!(
        "SELECT {PITCH_COLUMNS} FROM pitches ORDER BY created_at_us DESC, pitch_id ASC LIMIT ?1"
    );
    collect_pitches(conn, &sql, limit)
}

/// Pitches `user_id` has claimed (pending or verified), highest rank first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn claimed_by(conn: &Connection, user_id: &str) -> Result<Vec<Pitch>, StoreError> {
    let columns = prefixed_pitch_columns("p");
    let sql = format!(
        "SELECT {columns} FROM pitches p \
         JOIN claims c ON c.pitch_id = p.pitch_id \
         WHERE c.user_id = ?1 AND c.status != 'rejected' \
         ORDER BY p.rank DESC, p.created_at_us DESC, p.pitch_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let pitches = stmt
        .query_map([user_id], pitch_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pitches)
}

/// Pitches mentioning `handle` that `user_id` has not claimed yet.
///
/// Handle matching is case-insensitive and happens on the decoded mention
/// list, so malformed stored lists simply never match.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn suggested_for_handle(
    conn: &Connection,
    handle: &str,
    user_id: &str,
) -> Result<Vec<Pitch>, StoreError> {
    let sql = format!(
        "SELECT {PITCH_COLUMNS} FROM pitches \
         WHERE pitch_id NOT IN (SELECT pitch_id FROM claims WHERE user_id = ?1) \
         {RANK_ORDER}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let pitches = stmt
        .query_map([user_id], pitch_from_row)?
        .filter(|row| match row {
            Ok(pitch) => pitch.mentions_handle(handle),
            Err(_) => true,
        })
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pitches)
}

/// Pitches filed under `category_id`, highest rank first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn by_category(conn: &Connection, category_id: &str, limit: u32) -> Result<Vec<Pitch>, StoreError> {
    let sql = format!("SELECT {PITCH_COLUMNS} FROM pitches WHERE category_id = ?2 {RANK_ORDER} LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let pitches = stmt
        .query_map(params![i64::from(limit), category_id], pitch_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pitches)
}

/// Pitches related to `pitch`: the rest of its category first (uncategorized
/// pitches relate to each other), topped up with the best of the rest.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn related(conn: &Connection, pitch: &Pitch, limit: u32) -> Result<Vec<Pitch>, StoreError> {
    let same = format!(
        "SELECT {PITCH_COLUMNS} FROM pitches \
         WHERE pitch_id != ?2 AND category_id IS ?3 {RANK_ORDER} LIMIT ?1"
    );
    let other = format!(
        "SELECT {PITCH_COLUMNS} FROM pitches \
         WHERE pitch_id != ?2 AND category_id IS NOT ?3 {RANK_ORDER} LIMIT ?1"
    );

    let mut pitches = Vec::new();
    for sql in [same, other] {
        let remaining = limit.saturating_sub(u32::try_from(pitches.len()).unwrap_or(u32::MAX));
        if remaining == 0 {
            break;
        }
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![i64::from(remaining), pitch.id, pitch.category], pitch_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        pitches.extend(rows);
    }
    Ok(pitches)
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Find a category by slug or `category_id`. Slugs win.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_category(conn: &Connection, key: &str) -> Result<Option<Category>, StoreError> {
    let key = key.trim();
    Ok(conn
        .query_row(
            "SELECT category_id, name, slug, created_at_us FROM categories \
             WHERE slug = ?1 OR category_id = ?1 \
             ORDER BY slug = ?1 DESC LIMIT 1",
            [key],
            category_from_row,
        )
        .optional()?)
}

/// Whether a category already uses `slug`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn category_slug_taken(conn: &Connection, slug: &str) -> Result<bool, StoreError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE slug = ?1)",
        [slug],
        |row| row.get(0),
    )?)
}

/// Every category by name, with its pitch count.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn categories(conn: &Connection) -> Result<Vec<CategorySummary>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT c.category_id, c.name, c.slug, c.created_at_us, COUNT(p.pitch_id) \
         FROM categories c LEFT JOIN pitches p ON p.category_id = c.category_id \
         GROUP BY c.category_id \
         ORDER BY c.name ASC, c.slug ASC",
    )?;
    let summaries = stmt
        .query_map([], |row| {
            Ok(CategorySummary {
                category: category_from_row(row)?,
                pitch_count: column_u64(row, 4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(summaries)
}

// ---------------------------------------------------------------------------
// Clap ledger
// ---------------------------------------------------------------------------

/// Ledger entries for a pitch, most recently clapped first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn clap_entries(conn: &Connection, pitch_id: &str) -> Result<Vec<ClapEntry>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT pitch_id, user_id, raw_count, created_at_us, last_clapped_at_us \
         FROM claps WHERE pitch_id = ?1 \
         ORDER BY last_clapped_at_us DESC, user_id ASC",
    )?;
    let entries = stmt
        .query_map([pitch_id], clap_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// One user's ledger entry on a pitch.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn clap_entry(
    conn: &Connection,
    pitch_id: &str,
    user_id: &str,
) -> Result<Option<ClapEntry>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT pitch_id, user_id, raw_count, created_at_us, last_clapped_at_us \
             FROM claps WHERE pitch_id = ?1 AND user_id = ?2",
            params![pitch_id, user_id],
            clap_from_row,
        )
        .optional()?)
}

fn raw_counts(conn: &Connection, pitch_id: &str) -> Result<Vec<u32>, StoreError> {
    let mut stmt = conn.prepare("SELECT raw_count FROM claps WHERE pitch_id = ?1")?;
    let counts = stmt
        .query_map([pitch_id], |row| column_u32(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(counts)
}

/// Sum of effective clap contributions for a pitch, straight from the ledger.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn effective_clap_total(conn: &Connection, pitch_id: &str) -> Result<u64, StoreError> {
    Ok(effective_total(raw_counts(conn, pitch_id)?))
}

/// Sum of raw clap counters for a pitch. Display only.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn raw_clap_total(conn: &Connection, pitch_id: &str) -> Result<u64, StoreError> {
    Ok(raw_total(raw_counts(conn, pitch_id)?))
}

/// Raw clap count `user_id` has given `pitch_id`; 0 when none.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn user_clap_count(conn: &Connection, pitch_id: &str, user_id: &str) -> Result<u32, StoreError> {
    Ok(clap_entry(conn, pitch_id, user_id)?.map_or(0, |entry| entry.raw_count))
}

/// Whether `user_id` has clapped `pitch_id` at least once.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn has_user_clapped(conn: &Connection, pitch_id: &str, user_id: &str) -> Result<bool, StoreError> {
    Ok(user_clap_count(conn, pitch_id, user_id)? > 0)
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// Every claim on a pitch, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn claims_for(conn: &Connection, pitch_id: &str) -> Result<Vec<Claim>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT pitch_id, user_id, status, claimed_at_us, updated_at_us \
         FROM claims WHERE pitch_id = ?1 ORDER BY claimed_at_us ASC, user_id ASC",
    )?;
    let claims = stmt
        .query_map([pitch_id], claim_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(claims)
}

/// Whether any claim on the pitch is verified.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn has_verified_claim(conn: &Connection, pitch_id: &str) -> Result<bool, StoreError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM claims WHERE pitch_id = ?1 AND status = 'verified')",
        [pitch_id],
        |row| row.get(0),
    )?)
}

/// Claim counts and summed engagement for `user_id`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn user_stats(conn: &Connection, user_id: &str) -> Result<UserStats, StoreError> {
    let owned = claimed_by(conn, user_id)?;
    let verified_claims = conn.query_row(
        "SELECT COUNT(*) FROM claims WHERE user_id = ?1 AND status = 'verified'",
        [user_id],
        |row| column_u64(row, 0),
    )?;
    let total_engagement = owned.iter().fold(0_u64, |acc, pitch| {
        let totals = pitch.total_engagement();
        acc.saturating_add(totals.likes)
            .saturating_add(totals.retweets)
            .saturating_add(totals.replies)
    });

    Ok(UserStats {
        user_id: user_id.to_string(),
        total_owned: u64::try_from(owned.len()).unwrap_or(u64::MAX),
        verified_claims,
        total_engagement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        migrations::migrate(&mut conn).expect("migrate");
        conn
    }

    fn insert(conn: &Connection, id: &str, rank: i64, created: i64) {
        conn.execute(
            "INSERT INTO pitches (pitch_id, name, rank, created_at_us, updated_at_us)
             VALUES (?1, ?1, ?2, ?3, ?3)",
            params![id, rank, created],
        )
        .expect("insert pitch");
    }

    #[test]
    fn resolve_prefers_exact_then_unique_prefix() {
        let conn = conn();
        insert(&conn, "acme", 1, 1);
        insert(&conn, "acme-2", 1, 2);
        insert(&conn, "zeta", 1, 3);

        assert_eq!(resolve_pitch_id(&conn, "acme").expect("exact"), "acme");
        assert_eq!(resolve_pitch_id(&conn, "ze").expect("prefix"), "zeta");
        assert!(matches!(
            resolve_pitch_id(&conn, "ac"),
            Err(StoreError::AmbiguousId { .. })
        ));
        assert!(matches!(
            resolve_pitch_id(&conn, "nope"),
            Err(StoreError::PitchNotFound(_))
        ));
    }

    #[test]
    fn resolve_treats_like_wildcards_literally() {
        let conn = conn();
        insert(&conn, "acme", 1, 1);
        assert!(matches!(
            resolve_pitch_id(&conn, "%"),
            Err(StoreError::PitchNotFound(_))
        ));
    }

    #[test]
    fn leaderboard_orders_by_rank_then_newest() {
        let conn = conn();
        insert(&conn, "low", 1, 10);
        insert(&conn, "old-high", 50, 1);
        insert(&conn, "new-high", 50, 5);

        let page = leaderboard(&conn, 1, 10).expect("leaderboard");
        let ids: Vec<&str> = page.entries.iter().map(|e| e.pitch.id.as_str()).collect();
        assert_eq!(ids, ["new-high", "old-high", "low"]);
        assert_eq!(page.start_rank, 1);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn leaderboard_second_page_starts_after_first() {
        let conn = conn();
        for i in 0..5 {
            insert(&conn, &format!("p{i}"), i, i);
        }
        let page = leaderboard(&conn, 2, 2).expect("leaderboard");
        assert_eq!(page.start_rank, 3);
        assert_eq!(page.total_pages, 3);
        let positions: Vec<u64> = page.entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, [3, 4]);
        assert_eq!(page.entries[0].pitch.id, "p2");
    }

    #[test]
    fn featured_only_returns_flagged_pitches() {
        let conn = conn();
        insert(&conn, "a", 10, 1);
        insert(&conn, "b", 20, 2);
        insert(&conn, "c", 30, 3);
        conn.execute("UPDATE pitches SET is_featured = 1 WHERE pitch_id IN ('a', 'b')", [])
            .expect("flag");

        let ids: Vec<String> = featured(&conn, 2)
            .expect("featured")
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn latest_orders_by_creation_time() {
        let conn = conn();
        insert(&conn, "first", 99, 1);
        insert(&conn, "second", 0, 2);
        let ids: Vec<String> = latest(&conn, 16)
            .expect("latest")
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, ["second", "first"]);
    }

    fn file_under(conn: &Connection, pitch_id: &str, category_id: &str) {
        conn.execute(
            "INSERT OR IGNORE INTO categories (category_id, name, slug, created_at_us)
             VALUES (?1, ?1, ?1, 1)",
            [category_id],
        )
        .expect("insert category");
        conn.execute(
            "UPDATE pitches SET category_id = ?2 WHERE pitch_id = ?1",
            params![pitch_id, category_id],
        )
        .expect("file pitch");
    }

    fn ids(pitches: Vec<Pitch>) -> Vec<String> {
        pitches.into_iter().map(|p| p.id).collect()
    }

    #[test]
    fn by_category_orders_by_stored_rank() {
        let conn = conn();
        insert(&conn, "low", 1, 1);
        insert(&conn, "high", 9, 2);
        insert(&conn, "elsewhere", 50, 3);
        file_under(&conn, "low", "tools");
        file_under(&conn, "high", "tools");
        file_under(&conn, "elsewhere", "games");

        assert_eq!(ids(by_category(&conn, "tools", 20).expect("list")), ["high", "low"]);
        assert_eq!(ids(by_category(&conn, "tools", 1).expect("list")), ["high"]);
        assert!(by_category(&conn, "missing", 20).expect("list").is_empty());
    }

    #[test]
    fn related_prefers_same_category_then_fills_by_rank() {
        let conn = conn();
        insert(&conn, "me", 5, 1);
        insert(&conn, "sibling", 2, 2);
        insert(&conn, "star", 80, 3);
        insert(&conn, "loose", 10, 4);
        file_under(&conn, "me", "tools");
        file_under(&conn, "sibling", "tools");
        file_under(&conn, "star", "games");

        let me = find_pitch(&conn, "me").expect("query").expect("present");
        assert_eq!(ids(related(&conn, &me, 10).expect("related")), ["sibling", "star", "loose"]);
        assert_eq!(ids(related(&conn, &me, 2).expect("related")), ["sibling", "star"]);

        let loose = find_pitch(&conn, "loose").expect("query").expect("present");
        assert_eq!(ids(related(&conn, &loose, 1).expect("related")), ["star"]);
    }

    #[test]
    fn categories_count_their_pitches() {
        let conn = conn();
        insert(&conn, "a", 1, 1);
        insert(&conn, "b", 1, 2);
        file_under(&conn, "a", "tools");
        file_under(&conn, "b", "tools");
        conn.execute(
            "INSERT INTO categories (category_id, name, slug, created_at_us) VALUES ('9', 'Arcade', 'arcade', 1)",
            [],
        )
        .expect("insert category");

        let summaries = categories(&conn).expect("categories");
        let counts: Vec<(&str, u64)> = summaries
            .iter()
            .map(|s| (s.category.slug.as_str(), s.pitch_count))
            .collect();
        assert_eq!(counts, [("arcade", 0), ("tools", 2)]);

        assert_eq!(find_category(&conn, "arcade").expect("query").map(|c| c.category_id), Some("9".into()));
        assert_eq!(find_category(&conn, "9").expect("query").map(|c| c.slug), Some("arcade".into()));
        assert!(find_category(&conn, "nope").expect("query").is_none());
    }

    #[test]
    fn user_stats_sum_owned_engagement() {
        let conn = conn();
        insert(&conn, "mine", 1, 1);
        insert(&conn, "pending", 1, 2);
        insert(&conn, "rejected", 1, 3);
        conn.execute(
            "UPDATE pitches SET replies = 1, retweets = 2, likes = 3, views = 4000 WHERE pitch_id = 'mine'",
            [],
        )
        .expect("totals");
        conn.execute("UPDATE pitches SET likes = 10 WHERE pitch_id IN ('pending', 'rejected')", [])
            .expect("totals");
        for (pitch, status) in [("mine", "verified"), ("pending", "pending"), ("rejected", "rejected")] {
            conn.execute(
                "INSERT INTO claims (pitch_id, user_id, status, claimed_at_us, updated_at_us)
                 VALUES (?1, 'alice', ?2, 1, 1)",
                params![pitch, status],
            )
            .expect("claim");
        }

        let stats = user_stats(&conn, "alice").expect("stats");
        assert_eq!(stats.total_owned, 2);
        assert_eq!(stats.verified_claims, 1);
        assert_eq!(stats.total_engagement, 16);

        assert_eq!(user_stats(&conn, "nobody").expect("stats").total_owned, 0);
    }

    #[test]
    fn clap_totals_follow_ledger_rows() {
        let conn = conn();
        insert(&conn, "p", 0, 1);
        for (user, raw) in [("u1", 1), ("u2", 4), ("u3", 10)] {
            conn.execute(
                "INSERT INTO claps (pitch_id, user_id, raw_count, created_at_us, last_clapped_at_us)
                 VALUES ('p', ?1, ?2, 1, 1)",
                params![user, raw],
            )
            .expect("insert clap");
        }

        assert_eq!(effective_clap_total(&conn, "p").expect("effective"), 6);
        assert_eq!(raw_clap_total(&conn, "p").expect("raw"), 15);
        assert_eq!(user_clap_count(&conn, "p", "u2").expect("count"), 4);
        assert_eq!(user_clap_count(&conn, "p", "nobody").expect("count"), 0);
        assert!(has_user_clapped(&conn, "p", "u1").expect("clapped"));
        assert!(!has_user_clapped(&conn, "p", "nobody").expect("clapped"));
        assert_eq!(clap_entries(&conn, "p").expect("entries").len(), 3);
    }

    #[test]
    fn malformed_mentions_column_reads_as_empty() {
        let conn = conn();
        insert(&conn, "p", 0, 1);
        conn.execute("UPDATE pitches SET mentions_json = 'not json' WHERE pitch_id = 'p'", [])
            .expect("corrupt mentions");
        let pitch = find_pitch(&conn, "p").expect("query").expect("present");
        assert!(pitch.mentions().is_empty());
    }

    #[test]
    fn negative_counter_is_reported_as_conversion_failure() {
        let conn = conn();
        insert(&conn, "p", 0, 1);
        conn.execute_batch("PRAGMA ignore_check_constraints = ON")
            .expect("disable checks");
        conn.execute("UPDATE pitches SET likes = -3 WHERE pitch_id = 'p'", [])
            .expect("update");
        let err = find_pitch(&conn, "p").expect_err("negative likes");
        assert_eq!(err.code(), crate::error::ErrorCode::CorruptStore);
    }
}

//! Canonical SQLite schema for the pitch store.
//!
//! - `pitches` holds each pitch's inputs (mention list as JSON, claimed flag,
//!   effective clap total) next to the cached outputs derived from them
//! - `claps` is the per-(pitch, user) clap ledger
//! - `claims` records ownership claims and their verification status
//! - `categories` names the categories pitches are filed under
//! - `store_meta` tracks schema version and the last full rebuild

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS pitches (
    pitch_id TEXT PRIMARY KEY CHECK (length(trim(pitch_id)) > 0),
    name TEXT NOT NULL,
    url TEXT UNIQUE,
    source TEXT,
    mentions_json TEXT NOT NULL DEFAULT '[]',
    mention_count INTEGER NOT NULL DEFAULT 0 CHECK (mention_count >= 0),
    replies INTEGER NOT NULL DEFAULT 0 CHECK (replies >= 0),
    retweets INTEGER NOT NULL DEFAULT 0 CHECK (retweets >= 0),
    likes INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
    views INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
    clap INTEGER NOT NULL DEFAULT 0 CHECK (clap >= 0),
    claimed INTEGER NOT NULL DEFAULT 0 CHECK (claimed IN (0, 1)),
    is_featured INTEGER NOT NULL DEFAULT 0 CHECK (is_featured IN (0, 1)),
    rank INTEGER NOT NULL DEFAULT 0,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS claps (
    pitch_id TEXT NOT NULL REFERENCES pitches(pitch_id) ON DELETE CASCADE,
    user_id TEXT NOT NULL CHECK (length(trim(user_id)) > 0),
    raw_count INTEGER NOT NULL DEFAULT 1 CHECK (raw_count BETWEEN 1 AND 10),
    created_at_us INTEGER NOT NULL,
    last_clapped_at_us INTEGER NOT NULL,
    PRIMARY KEY (pitch_id, user_id)
);

CREATE TABLE IF NOT EXISTS claims (
    pitch_id TEXT NOT NULL REFERENCES pitches(pitch_id) ON DELETE CASCADE,
    user_id TEXT NOT NULL CHECK (length(trim(user_id)) > 0),
    status TEXT NOT NULL DEFAULT 'verified'
        CHECK (status IN ('pending', 'verified', 'rejected')),
    claimed_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    PRIMARY KEY (pitch_id, user_id)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_rebuild_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, last_rebuild_at_us)
VALUES (1, 1, 0);
";

/// Migration v2: listing indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_pitches_rank_created
    ON pitches(rank DESC, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_pitches_featured_rank
    ON pitches(is_featured, rank DESC);

CREATE INDEX IF NOT EXISTS idx_pitches_created
    ON pitches(created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_claps_pitch_last
    ON claps(pitch_id, last_clapped_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_claims_user_status
    ON claims(user_id, status, pitch_id);
";

/// Migration v3: categories and the pitch category column.
pub const MIGRATION_V3_SQL: &str = r"
CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY CHECK (length(trim(category_id)) > 0),
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE CHECK (length(slug) > 0),
    created_at_us INTEGER NOT NULL
);

ALTER TABLE pitches ADD COLUMN category_id TEXT
    REFERENCES categories(category_id) ON DELETE SET NULL;

CREATE INDEX IF NOT EXISTS idx_pitches_category_rank
    ON pitches(category_id, rank DESC, created_at_us DESC);
";

/// Indexes every fully migrated store must have.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_pitches_rank_created",
    "idx_pitches_featured_rank",
    "idx_pitches_created",
    "idx_claps_pitch_last",
    "idx_claims_user_status",
    "idx_pitches_category_rank",
];

//! SQLite persistence for pitches, categories, the clap ledger and claims.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers keep working while one writer commits
//! - `busy_timeout = 5s` so concurrent writers queue instead of failing
//! - `foreign_keys = ON` to keep ledger and claim rows tied to live pitches
//!
//! Every mutation goes through [`Store`] and runs in one `BEGIN IMMEDIATE`
//! transaction: read, apply the rule, [`Pitch::recompute`], write, commit.
//!
//! [`Pitch::recompute`]: crate::model::pitch::Pitch::recompute

pub mod migrations;
pub mod query;
pub mod schema;
pub mod store;

pub use query::{LeaderboardEntry, LeaderboardPage, UserStats};
pub use store::{Inconsistency, RebuildReport};

use crate::error::ErrorCode;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by store reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("pitch '{0}' not found")]
    PitchNotFound(String),
    #[error("pitch ID '{input}' is ambiguous: {}", matches.join(", "))]
    AmbiguousId { input: String, matches: Vec<String> },
    #[error("a pitch for url '{0}' already exists")]
    DuplicatePitch(String),
    #[error("invalid user identity '{0}'")]
    InvalidUser(String),
    #[error("category '{0}' not found")]
    CategoryNotFound(String),
    #[error("pitch store is busy: {0}")]
    Busy(#[source] rusqlite::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
    #[error("failed to prepare store directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode mention list: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        if is_busy(&error) {
            Self::Busy(error)
        } else {
            Self::Sqlite(error)
        }
    }
}

impl StoreError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::PitchNotFound(_) => ErrorCode::PitchNotFound,
            Self::AmbiguousId { .. } => ErrorCode::AmbiguousId,
            Self::DuplicatePitch(_) => ErrorCode::DuplicatePitch,
            Self::InvalidUser(_) => ErrorCode::InvalidUser,
            Self::CategoryNotFound(_) => ErrorCode::CategoryNotFound,
            Self::Busy(_) => ErrorCode::StoreBusy,
            Self::Sqlite(rusqlite::Error::FromSqlConversionFailure(..)) => ErrorCode::CorruptStore,
            Self::Sqlite(_) | Self::Io { .. } => ErrorCode::StoreWriteFailed,
            Self::Encode(_) => ErrorCode::InternalUnexpected,
        }
    }
}

fn is_busy(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(inner, _)
            if matches!(
                inner.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            )
    )
}

/// Open (or create) a store database, apply runtime pragmas, and migrate
/// the schema to the latest version.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or opening,
/// configuring or migrating the database fails.
pub fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut conn = Connection::open(path)?;
    configure_connection(&conn)?;
    migrations::migrate(&mut conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// Handle to one store database.
///
/// Each handle owns its own connection. Open one handle per thread; SQLite
/// serializes writers across handles.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store at `path`, creating and migrating it as needed.
    ///
    /// # Errors
    ///
    /// See [`open_connection`].
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_connection(path)?;
        tracing::debug!(path = %path.display(), "opened pitch store");
        Ok(Self { conn })
    }

    /// Open a private in-memory store. Used by tests and dry runs.
    ///
    /// # Errors
    ///
    /// Returns an error if configuring or migrating the database fails.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut conn = Connection::open_in_memory()?;
        configure_connection(&conn)?;
        migrations::migrate(&mut conn)?;
        Ok(Self { conn })
    }

    /// Read-only access to the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin a write transaction that takes the write lock up front.
    fn write_tx(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(".pitched").join("pitched.db");
        (dir, path)
    }

    #[test]
    fn open_sets_wal_busy_timeout_and_fk() {
        let (_dir, path) = temp_db_path();
        let store = Store::open(&path).expect("open store");
        let conn = store.connection();

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("query journal_mode");
        assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

        let busy_timeout_ms: u64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .expect("query busy_timeout");
        assert_eq!(u128::from(busy_timeout_ms), DEFAULT_BUSY_TIMEOUT.as_millis());

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("query foreign_keys");
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn open_creates_parent_dir_and_migrates() {
        let (_dir, path) = temp_db_path();
        let store = Store::open(&path).expect("open store");
        assert!(path.exists());

        let version =
            migrations::current_schema_version(store.connection()).expect("schema version");
        assert_eq!(version, migrations::LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn busy_errors_map_to_store_busy() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let err = StoreError::from(busy);
        assert!(matches!(err, StoreError::Busy(_)));
        assert_eq!(err.code(), ErrorCode::StoreBusy);

        let other = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(other.code(), ErrorCode::StoreWriteFailed);
    }

    #[test]
    fn error_codes_cover_domain_variants() {
        assert_eq!(
            StoreError::PitchNotFound("x".into()).code(),
            ErrorCode::PitchNotFound
        );
        assert_eq!(
            StoreError::InvalidUser(String::new()).code(),
            ErrorCode::InvalidUser
        );
        assert_eq!(
            StoreError::CategoryNotFound("tools".into()).code(),
            ErrorCode::CategoryNotFound
        );
        let ambiguous = StoreError::AmbiguousId {
            input: "ac".into(),
            matches: vec!["acme".into(), "acorn".into()],
        };
        assert_eq!(ambiguous.code(), ErrorCode::AmbiguousId);
        assert!(ambiguous.to_string().contains("acme, acorn"));
    }
}

//! SQLite-backed entity store.
//!
//! # Responsibility
//! - Open the database, enable foreign keys, register SQL helpers and apply
//!   schema migrations before handing out a [`Store`].
//! - Serialize access to the single connection.
//!
//! # Invariants
//! - Slugs are stored lowercase and are unique per table.
//! - Deleting a post or tag removes its `post_tags` rows and nothing else.
//! - Multi-statement writes run inside one transaction.

pub mod posts;
pub mod tags;

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, ErrorCode};
use tracing::{error, info};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{kind} not found: id={id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("{kind} slug already taken: {slug}")]
    Conflict { kind: &'static str, slug: String },
}

/// Ordered schema migrations; `PRAGMA user_version` records how many ran.
const MIGRATIONS: &[&str] = &[
    "CREATE TABLE posts (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        title    TEXT NOT NULL,
        slug     TEXT NOT NULL UNIQUE COLLATE NOCASE,
        body     TEXT NOT NULL,
        date_pub TEXT NOT NULL
    );
    CREATE TABLE tags (
        id    INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        slug  TEXT NOT NULL UNIQUE COLLATE NOCASE
    );
    CREATE TABLE post_tags (
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        tag_id  INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (post_id, tag_id)
    );
    CREATE INDEX post_tags_tag ON post_tags(tag_id);
    CREATE INDEX posts_date_pub ON posts(date_pub DESC, id DESC);",
];

/// Handle to the blog database.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if needed) the database at `path`. `:memory:` opens a
    /// private in-memory database.
    pub fn open(path: &str) -> StoreResult<Self> {
        if path == ":memory:" {
            return Self::open_in_memory();
        }
        let started = Instant::now();
        let conn = Connection::open(path).inspect_err(|e| {
            error!(path, error = %e, "store open failed");
        })?;
        let store = Self::bootstrap(conn)?;
        info!(path, duration_ms = started.elapsed().as_millis() as u64, "store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(mut conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.create_scalar_function(
            "unicode_lower",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: String = ctx.get(0)?;
                Ok(text.to_lowercase())
            },
        )?;
        migrate(&mut conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Runs `f` with shared access to the connection.
    pub fn read<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }

    /// Runs `f` with exclusive access to the connection. Validation that
    /// reads (slug uniqueness) and the write it guards belong in one call.
    pub fn write<T, E>(&self, f: impl FnOnce(&mut Connection) -> Result<T, E>) -> Result<T, E> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn)
    }

    /// Whether the database answers a trivial query.
    pub fn ping(&self) -> bool {
        self.read(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .is_ok()
    }
}

fn migrate(conn: &mut Connection) -> StoreResult<()> {
    let applied: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let applied = usize::try_from(applied).unwrap_or(0);
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(applied) {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", (index + 1) as i64)?;
        tx.commit()?;
        info!(version = index + 1, "store migration applied");
    }
    Ok(())
}

/// Maps a unique-constraint violation on `slug` to [`StoreError::Conflict`].
pub(crate) fn conflict_on_slug(
    kind: &'static str,
    slug: &str,
) -> impl FnOnce(rusqlite::Error) -> StoreError {
    let slug = slug.to_owned();
    move |err| match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StoreError::Conflict { kind, slug },
        _ => StoreError::Sqlite(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_recorded_and_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|conn| {
                let version: i64 = conn.pragma_query_value(None, "user_version", |r| r.get(0))?;
                assert_eq!(version, MIGRATIONS.len() as i64);
                migrate(conn)
            })
            .unwrap();
    }

    #[test]
    fn file_store_reopens_with_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.sqlite3");
        let path = path.to_str().unwrap();
        {
            let store = Store::open(path).unwrap();
            store
                .write(|conn| {
                    tags::insert(conn, &tags::TagFields { title: "Rust".into(), slug: "rust".into() })
                })
                .unwrap();
        }
        let store = Store::open(path).unwrap();
        assert_eq!(store.read(tags::count).unwrap(), 1);
        assert!(store.ping());
    }

    #[test]
    fn unicode_lower_folds_non_ascii() {
        let store = Store::open_in_memory().unwrap();
        let lowered: String = store
            .read(|conn| conn.query_row("SELECT unicode_lower('ПРИВЕТ Rust')", [], |r| r.get(0)))
            .unwrap();
        assert_eq!(lowered, "привет rust");
    }
}

//! SQLite implementation of `GameStore`
//!
//! Schema:
//! ```sql
//! CREATE TABLE games (
//!     title TEXT, url TEXT, platform TEXT, end_date TEXT,
//!     PRIMARY KEY (title, platform)
//! )
//! ```
//!
//! `end_date` is fixed-width RFC 3339 UTC text with millisecond precision
//! (`2024-01-11T16:00:00.000Z`), so `end_date >= ?` compares as time.

use super::{GameStore, StoreError};
use crate::models::Game;
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const CREATE_GAMES_TABLE: &str = "CREATE TABLE IF NOT EXISTS games (
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    platform TEXT NOT NULL,
    end_date TEXT,
    PRIMARY KEY (title, platform)
)";

/// Render a timestamp the way `end_date` is stored
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Single shared connection; every statement runs under the mutex
#[derive(Clone)]
pub struct SqliteGameStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGameStore {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;

        log::info!("✅ Game store opened: {}", db_path.display());
        Self::with_connection(conn)
    }

    /// Non-durable store, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_GAMES_TABLE, [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_games_end_date ON games(end_date)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Number of stored promotions
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn try_insert(&self, game: &Game) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO games (title, url, platform, end_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                game.title,
                game.url,
                game.platform,
                game.end_date.map(format_timestamp),
            ],
        )?;
        Ok(changed == 1)
    }
}

#[async_trait]
impl GameStore for SqliteGameStore {
    async fn exists(&self, title: &str, platform: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM games WHERE title = ?1 AND platform = ?2",
                params![title, platform],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    async fn insert_if_absent(&self, game: &Game) -> bool {
        match self.try_insert(game) {
            Ok(inserted) => {
                if inserted {
                    log::debug!("💾 Stored {}", game);
                }
                inserted
            }
            Err(e) => {
                log::error!("❌ Failed to store {}: {}", game, e);
                false
            }
        }
    }

    async fn query_active(&self, as_of: DateTime<Utc>) -> Result<Vec<Game>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT title, url, platform, end_date
             FROM games
             WHERE end_date IS NOT NULL AND end_date >= ?1
             ORDER BY end_date ASC, title ASC",
        )?;

        let rows = stmt.query_map([format_timestamp(as_of)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut games = Vec::new();
        for row in rows {
            let (title, url, platform, raw_end_date) = row?;
            match parse_timestamp(&raw_end_date) {
                Some(end_date) => {
                    games.push(Game::new(title, url, platform).with_end_date(end_date));
                }
                None => {
                    log::warn!(
                        "⚠️  Skipping {} ({}): unreadable end_date '{}'",
                        title,
                        platform,
                        raw_end_date
                    );
                }
            }
        }

        Ok(games)
    }
}

//! Durable set of already-reported promotions
//!
//! Keyed by `(title, platform)`. Rows are append-only: a promotion is
//! inserted once and never updated or deleted.

pub mod sqlite;

pub use sqlite::SqliteGameStore;

use crate::models::Game;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Io(std::io::Error),
    /// Another task panicked while holding the connection
    LockPoisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::LockPoisoned => write!(f, "Database connection lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistence contract used by the aggregator and the notifier
#[async_trait]
pub trait GameStore: Send + Sync {
    /// True iff a record with this identity was previously persisted
    async fn exists(&self, title: &str, platform: &str) -> Result<bool, StoreError>;

    /// Persist `game` unless its identity is already present
    ///
    /// Returns true only when this call created the row. The identity check
    /// and the insert are one atomic statement, so concurrent callers can
    /// never both get `true` for the same identity. Persistence errors are
    /// logged and reported as `false`; the game stays absent and is retried
    /// on the next poll.
    async fn insert_if_absent(&self, game: &Game) -> bool;

    /// Games whose `end_date` is at or after `as_of`
    ///
    /// Games without an `end_date` are never returned.
    async fn query_active(&self, as_of: DateTime<Utc>) -> Result<Vec<Game>, StoreError>;
}

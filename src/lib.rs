//! Free game promotion notifier
//!
//! Polls storefronts for games that are temporarily free to keep, records
//! each promotion once in SQLite and tells chat subscribers about new ones.

pub mod config;
pub mod error_handler;
pub mod models;
pub mod notifier;
pub mod pipeline;
pub mod sources;
pub mod sqlite_pragma;
pub mod store;
pub mod transport;

pub use models::{Game, RecipientId};
pub use notifier::Notifier;

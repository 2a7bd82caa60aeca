//! In-memory set of subscribed recipients
//!
//! Lives for the process lifetime only. Mutated by subscribe commands and by
//! delivery failures, possibly from several tasks at once; every mutation
//! goes through the lock.

use crate::models::RecipientId;
use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct RecipientRegistry {
    recipients: RwLock<HashSet<RecipientId>>,
}

impl RecipientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the recipient was not already registered
    pub async fn add(&self, recipient: RecipientId) -> bool {
        self.recipients.write().await.insert(recipient)
    }

    /// Returns true if the recipient was registered
    pub async fn remove(&self, recipient: RecipientId) -> bool {
        self.recipients.write().await.remove(&recipient)
    }

    pub async fn contains(&self, recipient: RecipientId) -> bool {
        self.recipients.read().await.contains(&recipient)
    }

    /// Sorted copy, so fan-out never holds the lock while delivering
    pub async fn snapshot(&self) -> Vec<RecipientId> {
        let mut recipients: Vec<RecipientId> =
            self.recipients.read().await.iter().copied().collect();
        recipients.sort();
        recipients
    }
}

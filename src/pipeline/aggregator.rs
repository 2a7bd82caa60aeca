//! Fetch–dedupe step of the pipeline
//!
//! Runs every adapter as its own task, concatenates the results in
//! registration order, and pushes each game through the store. Only games
//! this cycle actually inserted make it into the delta.

use crate::models::Game;
use crate::sources::SourceAdapter;
use crate::store::GameStore;
use std::sync::Arc;
use std::time::Instant;

pub struct Aggregator {
    sources: Vec<Arc<dyn SourceAdapter>>,
    store: Arc<dyn GameStore>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn SourceAdapter>>, store: Arc<dyn GameStore>) -> Self {
        Self { sources, store }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run all adapters and return the games not seen before
    ///
    /// A failing or panicking adapter contributes nothing; the others are
    /// unaffected. Games repeated within the cycle are returned once.
    pub async fn collect_new_games(&self) -> Vec<Game> {
        let started = Instant::now();
        let fetched = self.fetch_all().await;
        let fetched_count = fetched.len();

        let mut new_games = Vec::new();
        for game in fetched {
            match self.store.exists(&game.title, &game.platform).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    // insert_if_absent still dedupes atomically
                    log::warn!("⚠️  Existence check failed for {}: {}", game, e);
                }
            }

            if self.store.insert_if_absent(&game).await {
                log::info!("🆕 New promotion: {}", game);
                new_games.push(game);
            }
        }

        log::info!(
            "✅ Collection cycle: {} fetched, {} new ({}ms)",
            fetched_count,
            new_games.len(),
            started.elapsed().as_millis()
        );

        new_games
    }

    async fn fetch_all(&self) -> Vec<Game> {
        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let name = source.name().to_string();
                let handle = tokio::spawn(async move { source.fetch_free_games().await });
                (name, handle)
            })
            .collect();

        let mut games = Vec::new();
        for (name, handle) in handles {
            match handle.await {
                Ok(Ok(found)) => {
                    log::debug!("📥 {} returned {} promotions", name, found.len());
                    games.extend(found);
                }
                Ok(Err(e)) => {
                    log::warn!("⚠️  Source {} failed, skipping this cycle: {}", name, e);
                }
                Err(e) => {
                    log::error!("❌ Source {} task aborted: {}", name, e);
                }
            }
        }

        games
    }
}

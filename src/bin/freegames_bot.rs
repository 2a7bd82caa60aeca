//! Free games bot runtime
//!
//! - Opens the SQLite game store
//! - Registers the Epic Games and Steam sources
//! - Spawns the recurring check scheduler
//! - Long-polls Telegram for `/start` and `/check`
//!
//! Usage:
//!   cargo run --release --bin freegames_bot
//!
//! Environment variables: see `NotifierConfig::from_env`.

use dotenv::dotenv;
use freegames::config::NotifierConfig;
use freegames::notifier::{spawn_scheduler, Notifier};
use freegames::pipeline::Aggregator;
use freegames::sources::{build_http_client, EpicGamesSource, SourceAdapter, SteamSource};
use freegames::store::SqliteGameStore;
use freegames::transport::{TelegramCommandListener, TelegramTransport};
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let config = NotifierConfig::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.rust_log.as_str()))
        .target(env_logger::Target::Stderr)
        .init();

    info!("🚀 Free games notifier");
    info!("   ├─ Version: {}", env!("CARGO_PKG_VERSION"));
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Check interval: {}s", config.check_interval.as_secs());
    info!("   ├─ First check after: {}s", config.initial_delay.as_secs());
    info!("   ├─ HTTP timeout: {}s", config.http_timeout.as_secs());
    info!("   └─ Update long-poll: {}s", config.updates_poll_timeout.as_secs());

    let store = Arc::new(SqliteGameStore::open(&config.db_path)?);
    info!("✅ Store ready ({} promotions recorded)", store.count()?);

    let http = build_http_client(config.http_timeout)?;
    let sources: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(EpicGamesSource::new(http.clone())),
        Arc::new(SteamSource::new(http.clone())),
    ];
    let aggregator = Aggregator::new(sources, store.clone());
    info!("✅ Sources registered: {}", aggregator.source_names().join(", "));

    let transport = Arc::new(TelegramTransport::new(http.clone(), &config.telegram_token));
    let notifier = Arc::new(Notifier::new(aggregator, store, transport));

    let scheduler = spawn_scheduler(notifier.clone(), config.initial_delay, config.check_interval);
    let listener = TelegramCommandListener::new(http, &config.telegram_token, config.updates_poll_timeout);

    info!("🔄 Press CTRL+C to shutdown gracefully");

    let outcome: Result<(), Box<dyn std::error::Error>> = tokio::select! {
        result = listener.run(notifier.clone()) => {
            match result {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!("❌ Telegram update feed unreachable: {}", e);
                    Err(e.into())
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("⚠️  Received CTRL+C, shutting down..."),
                Err(e) => error!("❌ Failed to listen for CTRL+C: {}", e),
            }
            Ok(())
        }
    };

    scheduler.abort();
    info!("✅ Free games notifier stopped");
    outcome
}

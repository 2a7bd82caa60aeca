//! # Notifier
//!
//! Turns the three triggers into deliveries:
//! - **subscribe**: register the recipient, greet it, list what is redeemable now
//! - **on-demand check**: run a collection cycle, report the delta to the requester only
//! - **timer tick**: run a collection cycle, fan the delta out to every registered recipient
//!
//! Any failed delivery prunes that recipient from the registry and stops
//! further messages to it for the current call. Other recipients are never
//! affected.
//!
//! Tick fan-out is capped at `MAX_CONCURRENT_DELIVERIES` recipients in flight,
//! keeping a large registry under the chat service's rate limit.

pub mod registry;
pub mod scheduler;

pub use registry::RecipientRegistry;
pub use scheduler::{run_scheduler, spawn_scheduler};

use crate::models::{Game, RecipientId};
use crate::pipeline::Aggregator;
use crate::store::GameStore;
use crate::transport::{Message, Transport};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Recipients served at once during a timer tick
pub const MAX_CONCURRENT_DELIVERIES: usize = 8;

pub const CHECKING_TEXT: &str = "🔍 Checking for free games...";
pub const NO_NEW_GAMES_TEXT: &str = "No new free games found at the moment.";
pub const ACTIVE_HEADER_TEXT: &str = "🎮 Here are some free games you can redeem now!";
pub const NOTHING_ACTIVE_TEXT: &str =
    "There is no free game you can redeem today, but I'll tell you as soon as new ones show up.";

/// Outcome of one timer tick
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub new_games: usize,
    pub recipients: usize,
    pub delivered: usize,
    pub pruned: Vec<RecipientId>,
}

pub struct Notifier {
    aggregator: Aggregator,
    store: Arc<dyn GameStore>,
    registry: Arc<RecipientRegistry>,
    transport: Arc<dyn Transport>,
    delivery_slots: Arc<Semaphore>,
}

impl Notifier {
    pub fn new(
        aggregator: Aggregator,
        store: Arc<dyn GameStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            aggregator,
            store,
            registry: Arc::new(RecipientRegistry::new()),
            transport,
            delivery_slots: Arc::new(Semaphore::new(MAX_CONCURRENT_DELIVERIES)),
        }
    }

    /// Override how many recipients a tick serves concurrently (minimum 1)
    pub fn with_delivery_concurrency(mut self, limit: usize) -> Self {
        self.delivery_slots = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    pub fn registry(&self) -> &RecipientRegistry {
        &self.registry
    }

    fn welcome_message(&self) -> Message {
        let sources = self.aggregator.source_names();
        let watched = if sources.is_empty() {
            "no storefronts yet".to_string()
        } else {
            sources.join(" and ")
        };

        Message::plain(format!(
            "👋 Welcome to the free games notifier!\n\
             I'll let you know whenever a storefront gives a game away.\n\
             Currently watching: {}.\n\
             Use /check to look for new giveaways right now.",
            watched
        ))
    }

    /// Deliver one message, pruning the recipient if it cannot be reached
    async fn send(&self, recipient: RecipientId, message: Message) -> bool {
        deliver_or_prune(&*self.transport, &self.registry, recipient, &message).await
    }

    /// Register `recipient` and list the promotions still redeemable at `as_of`
    pub async fn on_subscribe(&self, recipient: RecipientId, as_of: DateTime<Utc>) {
        if self.registry.add(recipient).await {
            log::info!("📬 New subscriber {}", recipient);
        }

        if !self.send(recipient, self.welcome_message()).await {
            return;
        }

        let active = match self.store.query_active(as_of).await {
            Ok(games) => games,
            Err(e) => {
                log::error!("❌ Failed to list active games for {}: {}", recipient, e);
                Vec::new()
            }
        };

        if active.is_empty() {
            self.send(recipient, Message::plain(NOTHING_ACTIVE_TEXT)).await;
            return;
        }

        if !self.send(recipient, Message::plain(ACTIVE_HEADER_TEXT)).await {
            return;
        }
        self.send_games(recipient, &active).await;
    }

    /// Run a collection cycle and report the delta to `recipient` only
    pub async fn on_demand_check(&self, recipient: RecipientId) {
        if !self.send(recipient, Message::plain(CHECKING_TEXT)).await {
            return;
        }

        let new_games = self.aggregator.collect_new_games().await;
        if new_games.is_empty() {
            self.send(recipient, Message::plain(NO_NEW_GAMES_TEXT)).await;
            return;
        }

        self.send_games(recipient, &new_games).await;
    }

    async fn send_games(&self, recipient: RecipientId, games: &[Game]) -> usize {
        let mut delivered = 0;
        for game in games {
            if !self.send(recipient, Message::markdown(game.to_message())).await {
                break;
            }
            delivered += 1;
        }
        delivered
    }

    /// Run a collection cycle and fan the delta out to every recipient
    pub async fn on_timer_tick(&self) -> TickReport {
        let new_games = self.aggregator.collect_new_games().await;
        let mut report = TickReport {
            new_games: new_games.len(),
            ..TickReport::default()
        };

        if new_games.is_empty() {
            log::debug!("⏰ Tick: nothing new");
            return report;
        }

        let recipients = self.registry.snapshot().await;
        report.recipients = recipients.len();
        if recipients.is_empty() {
            log::info!("⏰ Tick: {} new games, no subscribers", new_games.len());
            return report;
        }

        let messages: Arc<Vec<Message>> = Arc::new(
            new_games
                .iter()
                .map(|game| Message::markdown(game.to_message()))
                .collect(),
        );

        let mut deliveries = JoinSet::new();
        for recipient in recipients {
            let transport = Arc::clone(&self.transport);
            let registry = Arc::clone(&self.registry);
            let messages = Arc::clone(&messages);
            let slots = Arc::clone(&self.delivery_slots);

            deliveries.spawn(async move {
                let _permit = slots.acquire_owned().await.ok();
                let mut delivered = 0;
                for message in messages.iter() {
                    if !deliver_or_prune(&*transport, &registry, recipient, message).await {
                        return (recipient, delivered, false);
                    }
                    delivered += 1;
                }
                (recipient, delivered, true)
            });
        }

        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok((recipient, delivered, reachable)) => {
                    report.delivered += delivered;
                    if !reachable {
                        report.pruned.push(recipient);
                    }
                }
                Err(e) => {
                    log::error!("❌ Delivery task aborted: {}", e);
                }
            }
        }
        report.pruned.sort();

        log::info!(
            "📤 Tick: {} new games, {} messages to {} recipients, {} pruned",
            report.new_games,
            report.delivered,
            report.recipients,
            report.pruned.len()
        );

        report
    }
}

async fn deliver_or_prune(
    transport: &dyn Transport,
    registry: &RecipientRegistry,
    recipient: RecipientId,
    message: &Message,
) -> bool {
    match transport.deliver(recipient, message).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("⚠️  Delivery to {} failed, unsubscribing: {}", recipient, e);
            registry.remove(recipient).await;
            false
        }
    }
}

//! Recurring timer that drives `Notifier::on_timer_tick`
//!
//! Waits `initial_delay` before the first tick so the process can settle
//! before hitting the storefronts, then ticks every `period`. Ticks run one
//! at a time; a tick that overruns the period delays the next one instead of
//! bursting.

use super::Notifier;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

/// Runs until the task is dropped or the runtime shuts down
pub async fn run_scheduler(notifier: Arc<Notifier>, initial_delay: Duration, period: Duration) {
    log::info!(
        "⏰ Starting check scheduler (first tick in {}s, then every {}s)",
        initial_delay.as_secs(),
        period.as_secs()
    );

    sleep(initial_delay).await;

    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        timer.tick().await;
        let report = notifier.on_timer_tick().await;
        log::debug!("⏰ Tick finished: {:?}", report);
    }
}

pub fn spawn_scheduler(
    notifier: Arc<Notifier>,
    initial_delay: Duration,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run_scheduler(notifier, initial_delay, period))
}

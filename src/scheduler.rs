//! Scheduler
//!
//! Runs a dispatch pass at startup and then once per interval.

use crate::dispatcher::{Dispatcher, WalletReport};
use std::sync::Arc;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::info;

/// Scheduler for orchestrating dispatch passes
pub struct Scheduler {
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(dispatcher: Arc<Dispatcher>, interval: Duration) -> Self {
        Self {
            dispatcher,
            interval,
        }
    }

    pub async fn run_once(&self) -> Vec<WalletReport> {
        Self::pass(&self.dispatcher).await
    }

    async fn pass(dispatcher: &Dispatcher) -> Vec<WalletReport> {
        let reports = dispatcher.dispatch_all().await;
        let sent = reports.iter().filter(|r| r.outcome.is_sent()).count();
        info!(
            "Dispatch pass complete: {} of {} wallets sent funds",
            sent,
            reports.len()
        );
        reports
    }

    /// Never returns. The first pass finishes before the interval starts;
    /// later passes are spawned per tick so a slow pass never delays the
    /// next one.
    pub async fn run_continuous(&self) {
        self.run_once().await;

        info!(
            "Starting continuous dispatch (interval: {}s)",
            self.interval.as_secs()
        );

        let mut ticks = interval_at(Instant::now() + self.interval, self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            let dispatcher = Arc::clone(&self.dispatcher);
            tokio::spawn(async move {
                Self::pass(&dispatcher).await;
            });
        }
    }
}

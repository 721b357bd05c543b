//! Reflex loop: the autonomous heartbeat
//!
//! A background task that checks the seal latch once per interval and, while
//! it is unset, seals with the configured default signal as an automatic
//! trigger. The first check happens immediately.
//!
//! A failing or panicking tick is logged and the loop moves on to the next
//! interval. The loop ends only on the shutdown signal (or when the runtime
//! is dropped at process exit).

use crate::api::Sealer;
use crate::seal::TriggerSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Tick counters shared between the loop and its handle
#[derive(Debug, Default)]
pub struct ReflexStats {
    ticks: AtomicU64,
    fired: AtomicU64,
    failures: AtomicU64,
}

impl ReflexStats {
    /// Intervals elapsed (including the immediate first tick)
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Successful automatic seals
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Ticks whose seal attempt failed or panicked
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Handle to a running reflex loop
#[derive(Debug)]
pub struct ReflexHandle {
    join: JoinHandle<()>,
    stats: Arc<ReflexStats>,
}

impl ReflexHandle {
    /// Live tick counters
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &ReflexStats {
        &self.stats
    }

    /// Check if the loop has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel the loop without waiting for the shutdown signal
    pub fn abort(&self) {
        self.join.abort();
    }

    /// Wait for the loop to exit
    ///
    /// # Errors
    /// Returns the join error if the task was aborted or panicked
    pub async fn join(self) -> Result<(), JoinError> {
        self.join.await
    }
}

/// Periodic automatic sealer
pub struct ReflexLoop {
    /// Seal target
    sealer: Arc<dyn Sealer>,
    /// Time between checks
    interval: Duration,
    /// Signal used for automatic seals
    signal: String,
    /// Shutdown signal
    shutdown_rx: broadcast::Receiver<()>,
    /// Counters
    stats: Arc<ReflexStats>,
}

impl ReflexLoop {
    /// Create a reflex loop
    #[must_use]
    pub fn new(
        sealer: Arc<dyn Sealer>,
        interval: Duration,
        signal: impl Into<String>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            sealer,
            interval,
            signal: signal.into(),
            shutdown_rx,
            stats: Arc::new(ReflexStats::default()),
        }
    }

    /// Spawn the loop on the current tokio runtime
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime
    #[must_use]
    pub fn spawn(self) -> ReflexHandle {
        let stats = Arc::clone(&self.stats);
        let join = tokio::spawn(self.run());
        ReflexHandle { join, stats }
    }

    async fn run(mut self) {
        info!(
            interval_secs = self.interval.as_secs_f64(),
            signal = %self.signal,
            "Reflex loop started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!(ticks = self.stats.ticks(), "Reflex loop shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    async fn tick(&self) {
        let tick = self.stats.ticks.fetch_add(1, Ordering::Relaxed) + 1;

        if self.sealer.is_sealed() {
            debug!(tick, "Seal already latched; reflex idle");
            return;
        }

        let sealer = Arc::clone(&self.sealer);
        let signal = self.signal.clone();
        let attempt =
            tokio::task::spawn_blocking(move || sealer.seal(&signal, TriggerSource::Automatic))
                .await;

        match attempt {
            Ok(Ok(outcome)) => {
                self.stats.fired.fetch_add(1, Ordering::Relaxed);
                info!(
                    tick,
                    status = %outcome.status,
                    newly_sealed = outcome.newly_sealed,
                    "Reflex sealed"
                );
            }
            Ok(Err(e)) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(tick, error = %e, "Reflex tick failed");
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(tick, error = %e, "Reflex tick panicked");
            }
        }
    }
}

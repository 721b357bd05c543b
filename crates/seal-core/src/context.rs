//! Process-scoped seal context
//!
//! Owns the ledger, the seal action and the annotator. The entry point
//! creates one at startup, hands references to whatever needs them, and
//! drops it at shutdown.

use crate::annotator::{Annotator, MotifTable};
use crate::api::Sealer;
use crate::config::SealConfig;
use crate::error::SealError;
use crate::reflex::{ReflexHandle, ReflexLoop};
use crate::seal::{SealAction, SealOutcome, SealState, TriggerSource};
use seal_ledger::{Event, EventLedger};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Explicit context for one seal process
#[derive(Debug)]
pub struct SealContext {
    /// Validated configuration
    config: SealConfig,
    /// Shared ledger
    ledger: Arc<EventLedger>,
    /// Shared seal action
    action: Arc<SealAction>,
    /// Read-side projections
    annotator: Annotator,
}

impl SealContext {
    /// Validate configuration and build the context
    ///
    /// # Errors
    /// - `SealError::Config` if the configuration is invalid
    /// - `SealError::Ledger` if recovery is enabled and the durable file
    ///   cannot be read
    pub fn open(config: SealConfig) -> Result<Self, SealError> {
        config.validate()?;

        let ledger = Arc::new(EventLedger::open(
            config.ledger_path.clone(),
            config.ledger_options(),
        )?);
        let action = Arc::new(SealAction::new(Arc::clone(&ledger), config.health_rule()));
        let annotator = Annotator::new(MotifTable::builtin().extended(&config.motifs));

        info!(
            ledger = %ledger.path().display(),
            ceiling = config.signal_ceiling,
            recovered = ledger.len(),
            "Seal context opened"
        );

        Ok(Self {
            config,
            ledger,
            action,
            annotator,
        })
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SealConfig {
        &self.config
    }

    /// Shared ledger
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Arc<EventLedger> {
        &self.ledger
    }

    /// Shared seal action
    #[inline]
    #[must_use]
    pub fn action(&self) -> &Arc<SealAction> {
        &self.action
    }

    /// Annotator
    #[inline]
    #[must_use]
    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    /// Seal with a signal
    ///
    /// # Errors
    /// See [`SealAction::seal`]
    pub fn seal(&self, signal: &str, source: TriggerSource) -> Result<SealOutcome, SealError> {
        self.action.seal(signal, source)
    }

    /// Record a diagnostic pulse
    ///
    /// # Errors
    /// See [`SealAction::pulse`]
    pub fn pulse(&self, signal: &str) -> Result<SealOutcome, SealError> {
        self.action.pulse(signal)
    }

    /// Current seal state
    #[must_use]
    pub fn state(&self) -> SealState {
        self.action.state()
    }

    /// In-memory ledger, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        self.ledger.snapshot()
    }

    /// Audit view: last `limit` durable events, newest first
    ///
    /// # Errors
    /// Durable read failures
    pub fn audit(&self, limit: usize) -> Result<Vec<Event>, SealError> {
        Ok(self.ledger.tail(limit, true)?)
    }

    /// Rendered journal of the `limit` most recent events
    ///
    /// `None` uses the configured journal limit.
    ///
    /// # Errors
    /// Durable read failures
    pub fn journal(&self, limit: Option<usize>) -> Result<String, SealError> {
        let limit = limit.unwrap_or(self.config.journal_limit);
        Ok(self.annotator.render_journal(&self.ledger, limit)?)
    }

    /// Motif tags for an event type
    #[must_use]
    pub fn annotate(&self, event_type: &str) -> BTreeSet<String> {
        self.annotator.annotate(event_type)
    }

    /// Start the reflex loop against this context's seal action
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime
    #[must_use]
    pub fn spawn_reflex(&self, shutdown_rx: broadcast::Receiver<()>) -> ReflexHandle {
        let sealer: Arc<dyn Sealer> = Arc::clone(&self.action) as Arc<dyn Sealer>;
        ReflexLoop::new(
            sealer,
            self.config.reflex_interval(),
            self.config.reflex_signal.clone(),
            shutdown_rx,
        )
        .spawn()
    }
}

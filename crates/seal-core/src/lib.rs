//! Seal Core - the Sovereign Seal decision engine
//!
//! Everything above the raw ledger:
//! - Classifies numeric signals against a single configured ceiling
//! - Records every decision in the [`EventLedger`](seal_ledger::EventLedger)
//! - Latches a one-way seal on the first success, manual or automatic
//! - Re-triggers the seal from a background reflex loop until it latches
//! - Projects the ledger into motif-tagged journals
//!
//! # Example
//!
//! ```rust,ignore
//! use seal_core::{SealConfig, SealContext, TriggerSource};
//!
//! let ctx = SealContext::open(SealConfig::new().with_ledger_path("vault.csv"))?;
//!
//! let outcome = ctx.seal("92.6", TriggerSource::Manual)?;
//! println!("{}", outcome.report);
//!
//! println!("{}", ctx.journal(Some(5))?);
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod annotator;
pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod reflex;
pub mod seal;
pub mod signal;
pub mod state_machine;

// Re-exports for convenience
pub use annotator::{Annotator, MotifTable, EMPTY_JOURNAL, UNCLASSIFIED_TAG};
pub use api::Sealer;
pub use config::{
    SealConfig, DEFAULT_JOURNAL_LIMIT, DEFAULT_LEDGER_PATH, DEFAULT_REFLEX_INTERVAL_SECS,
    DEFAULT_REFLEX_SIGNAL,
};
pub use context::SealContext;
pub use error::{ConfigError, SealError, StateMachineError};
pub use reflex::{ReflexHandle, ReflexLoop, ReflexStats};
pub use seal::{
    SealAction, SealOutcome, SealState, TriggerSource, AUTO_SEAL_EVENT, MANUAL_SEAL_EVENT,
    PULSE_EVENT,
};
pub use signal::{parse_signal, HealthRule, HealthStatus, DEFAULT_SIGNAL_CEILING};
pub use state_machine::SealPhase;

pub use seal_ledger::{Event, EventLedger, LedgerError, LedgerOptions, TIMESTAMP_FORMAT};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Seal Core
    pub use crate::{
        Annotator, Event, EventLedger, HealthStatus, SealAction, SealConfig, SealContext,
        SealError, SealOutcome, Sealer, TriggerSource,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

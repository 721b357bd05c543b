//! Error types for Seal Core
//!
//! Separates the failures callers must treat differently:
//! - Unparseable signals (recovered locally, no state change)
//! - Ledger persistence failures (propagated, the seal did not happen)
//! - Configuration problems (fatal at startup)

use crate::state_machine::SealPhase;
use seal_ledger::LedgerError;
use std::path::PathBuf;

/// Main seal error type
#[derive(Debug, thiserror::Error)]
pub enum SealError {
    /// Signal is not a finite number
    #[error("invalid signal: {input:?} is not a finite number")]
    InvalidSignal {
        /// Raw input as supplied by the caller
        input: String,
    },

    /// Trigger label does not name a known source
    #[error("unknown trigger source: {0:?}")]
    UnknownTrigger(String),

    /// Ledger append or read failed
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Seal state transition rejected
    #[error("state machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SealError {
    /// Check if the caller can simply correct the input and try again
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidSignal { .. } | Self::UnknownTrigger(_))
    }

    /// Check if the durable ledger could not be written
    #[inline]
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Ledger(e) if e.is_persistence())
    }

    /// Check if retrying the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(e) if e.is_retryable())
    }

    /// Human-readable error report for presentation layers
    #[must_use]
    pub fn report(&self) -> String {
        match self {
            Self::InvalidSignal { input } => {
                format!("[ERROR] Invalid Signal\nInput: {input:?}\nNo event recorded; seal state unchanged.")
            }
            Self::Ledger(e) if e.is_persistence() => {
                format!("[ERROR] Ledger Write Failed\n{e}\nNo event recorded; seal state unchanged.")
            }
            other => format!("[ERROR] {other}"),
        }
    }
}

/// Seal state machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// Transition not in the allowed set
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        /// Current phase
        from: SealPhase,
        /// Requested phase
        to: SealPhase,
    },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`SealConfig`](crate::SealConfig)
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but violate a constraint
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

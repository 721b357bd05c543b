//! Error types for the ledger
//!
//! A ledger fails in three distinct ways:
//! - the durable mirror cannot be written (the append is aborted)
//! - the durable mirror cannot be read back
//! - the durable mirror holds rows that do not decode as events

use std::io;
use std::path::PathBuf;

/// Ledger error type
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Writing the durable mirror failed; neither store was changed
    #[error("failed to persist event to {}: {source}", .path.display())]
    Persistence {
        /// Durable file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// Reading the durable mirror failed
    #[error("failed to read ledger {}: {source}", .path.display())]
    Read {
        /// Durable file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// An event could not be encoded as a CSV record
    #[error("failed to encode ledger record: {0}")]
    Encode(#[from] csv::Error),

    /// A durable row does not decode as an event
    #[error("corrupt ledger record at line {line}: {reason}")]
    Corrupt {
        /// 1-based line number in the durable file
        line: u64,
        /// Decoder message
        reason: String,
    },
}

impl LedgerError {
    /// Check if the error came from writing the durable mirror
    #[inline]
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    /// Check if the durable mirror holds undecodable data
    #[inline]
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Check if retrying the operation may succeed
    ///
    /// I/O failures (disk full, transient permission issues) may clear;
    /// corrupt rows and encoding failures will not.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Read { .. })
    }
}

//! Sovereign Seal Ledger
//!
//! Append-only record of timestamped events, held twice:
//! - an in-memory sequence that lives as long as the process
//! - a durable CSV mirror that survives restarts and backs every audit read
//!
//! # Core Concepts
//!
//! - [`Event`]: Immutable `(timestamp, event_type, details)` record
//! - [`EventLedger`]: Owner of both stores; every append lands in both or neither
//! - [`LedgerOptions`]: fsync and recovery behavior
//! - [`LedgerError`]: Persistence, encoding and corruption failures
//!
//! # Example
//!
//! ```rust,ignore
//! use seal_ledger::EventLedger;
//!
//! let ledger = EventLedger::new("memory_vault.csv");
//! ledger.append("Pulse", "Optimal")?;
//!
//! // Audit view straight from disk, newest first
//! for event in ledger.tail(5, true)? {
//!     println!("{event}");
//! }
//! ```

#![warn(unreachable_pub)]

mod codec;
mod error;
mod event;
mod ledger;

pub use codec::{HEADER, TIMESTAMP_FORMAT};
pub use error::LedgerError;
pub use event::Event;
pub use ledger::{EventLedger, LedgerOptions};

/// Result alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

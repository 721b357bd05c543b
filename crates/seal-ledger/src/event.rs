//! Ledger event record

use crate::codec::timestamp_format;
use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Immutable ledger record
///
/// Field names double as the durable CSV header (`Timestamp,Event,Details`).
/// Events are minted by [`EventLedger::append`](crate::EventLedger::append)
/// or decoded back from the durable file; nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "Timestamp", with = "timestamp_format")]
    timestamp: NaiveDateTime,
    #[serde(rename = "Event")]
    event_type: String,
    #[serde(rename = "Details")]
    details: String,
}

impl Event {
    /// Stamp a new event with the local wall clock, truncated to whole seconds
    pub(crate) fn now(event_type: String, details: String) -> Self {
        Self {
            timestamp: Local::now().naive_local().trunc_subsecs(0),
            event_type,
            details,
        }
    }

    /// Build an event from existing parts
    ///
    /// Does not record anything; use [`EventLedger::append`](crate::EventLedger::append)
    /// to add an event to a ledger.
    #[must_use]
    pub fn from_parts(
        timestamp: NaiveDateTime,
        event_type: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            event_type: event_type.into(),
            details: details.into(),
        }
    }

    /// Wall-clock time of the append (second precision)
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Event type tag (e.g. `Pulse`, `SEAL_INITIATED`, `AUTO-REFLEX`)
    #[inline]
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Free-text description
    #[inline]
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Timestamp in the durable `YYYY-MM-DD HH:MM:SS` format
    #[must_use]
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp
            .format(crate::codec::TIMESTAMP_FORMAT)
            .to_string()
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.formatted_timestamp(),
            self.event_type,
            self.details
        )
    }
}

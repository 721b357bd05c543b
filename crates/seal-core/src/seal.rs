//! Seal action
//!
//! The shared reflex used by both human and automatic triggers:
//! - Parse and classify the signal
//! - Record the decision in the ledger
//! - Latch the seal state (first success only)
//!
//! Append and latch run under the seal lock; the ledger takes its own lock
//! inside it. The order never inverts, so concurrent manual and automatic
//! seals serialize into one latch transition and one entry per call.

use crate::error::SealError;
use crate::signal::{parse_signal, HealthRule, HealthStatus};
use crate::state_machine::{validate_transition, SealPhase};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use seal_ledger::{Event, EventLedger};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Event type recorded by manual seals
pub const MANUAL_SEAL_EVENT: &str = "SEAL_INITIATED";

/// Event type recorded by automatic seals
pub const AUTO_SEAL_EVENT: &str = "AUTO-REFLEX";

/// Event type recorded by diagnostic pulses
pub const PULSE_EVENT: &str = "Pulse";

/// Who asked for the seal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerSource {
    /// Human or front-end request
    Manual,
    /// Reflex loop tick
    Automatic,
}

impl TriggerSource {
    /// Label embedded in event details and reports
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Automatic => "AUTO-REFLEX",
        }
    }

    /// Event type recorded for this source
    #[inline]
    #[must_use]
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Manual => MANUAL_SEAL_EVENT,
            Self::Automatic => AUTO_SEAL_EVENT,
        }
    }

    /// Check if the trigger came from the reflex loop
    #[inline]
    #[must_use]
    pub fn is_automatic(self) -> bool {
        matches!(self, Self::Automatic)
    }
}

impl Display for TriggerSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TriggerSource {
    type Err = SealError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "manual" | "human" => Ok(Self::Manual),
            "auto" | "automatic" | "auto-reflex" | "reflex" => Ok(Self::Automatic),
            _ => Err(SealError::UnknownTrigger(label.to_string())),
        }
    }
}

/// Seal latch plus the most recent decision report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SealState {
    /// Lifecycle phase
    pub phase: SealPhase,
    /// Report of the most recent successful seal
    pub last_report: Option<String>,
    /// Timestamp of the latching event
    pub sealed_at: Option<NaiveDateTime>,
    /// Source of the latching seal
    pub sealed_by: Option<TriggerSource>,
}

impl SealState {
    /// Check if the latch is set
    #[inline]
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.phase.is_sealed()
    }

    /// Set the latch if unset
    ///
    /// Returns `true` only for the call that performed the transition.
    fn latch(&mut self, source: TriggerSource, at: NaiveDateTime) -> Result<bool, SealError> {
        if self.phase.is_sealed() {
            return Ok(false);
        }
        validate_transition(self.phase, SealPhase::Sealed)?;
        self.phase = SealPhase::Sealed;
        self.sealed_at = Some(at);
        self.sealed_by = Some(source);
        Ok(true)
    }
}

/// Result of a successful seal or pulse
#[derive(Debug, Clone)]
pub struct SealOutcome {
    /// Multi-line human-readable report
    pub report: String,
    /// Derived classification
    pub status: HealthStatus,
    /// Parsed signal
    pub signal: f64,
    /// Recorded ledger event
    pub event: Event,
    /// Whether this call flipped the latch
    pub newly_sealed: bool,
    /// In-memory ledger after the append, oldest first
    pub snapshot: Vec<Event>,
}

/// The seal action shared by manual and automatic triggers
#[derive(Debug)]
pub struct SealAction {
    /// Ledger receiving every decision
    ledger: Arc<EventLedger>,
    /// Classification rule
    rule: HealthRule,
    /// Latch, guarded across append + latch
    state: Mutex<SealState>,
}

impl SealAction {
    /// Create a seal action over a ledger
    #[must_use]
    pub fn new(ledger: Arc<EventLedger>, rule: HealthRule) -> Self {
        Self {
            ledger,
            rule,
            state: Mutex::new(SealState::default()),
        }
    }

    /// Underlying ledger
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Arc<EventLedger> {
        &self.ledger
    }

    /// Classification rule
    #[inline]
    #[must_use]
    pub fn rule(&self) -> HealthRule {
        self.rule
    }

    /// Seal with a signal
    ///
    /// # Arguments
    /// * `signal` - Raw numeric signal
    /// * `source` - Trigger source; selects the recorded event type
    ///
    /// # Returns
    /// Report, classification, recorded event and ledger snapshot
    ///
    /// # Errors
    /// - `SealError::InvalidSignal` if the signal does not parse; nothing is
    ///   recorded and the latch is untouched
    /// - `SealError::Ledger` if the durable append fails; nothing is recorded
    ///   and the latch is untouched
    pub fn seal(&self, signal: &str, source: TriggerSource) -> Result<SealOutcome, SealError> {
        let value = parse_signal(signal)?;
        let status = self.rule.classify(value);
        let signal = signal.trim();

        let mut state = self.state.lock();
        let event = self
            .ledger
            .append(source.event_type(), decision_details(source, signal, status))?;
        let newly_sealed = state.latch(source, event.timestamp())?;

        let report = self.seal_report(source, signal, status, newly_sealed);
        state.last_report = Some(report.clone());
        let snapshot = self.ledger.snapshot();
        drop(state);

        info!(
            source = source.label(),
            signal,
            status = %status,
            newly_sealed,
            "Seal recorded"
        );

        Ok(SealOutcome {
            report,
            status,
            signal: value,
            event,
            newly_sealed,
            snapshot,
        })
    }

    /// Seal and flatten the outcome for display
    ///
    /// Errors become an error report with an empty ledger view instead of
    /// propagating.
    #[must_use]
    pub fn seal_view(&self, signal: &str, source: TriggerSource) -> (String, Vec<Event>) {
        match self.seal(signal, source) {
            Ok(outcome) => (outcome.report, outcome.snapshot),
            Err(e) => {
                warn!(source = source.label(), error = %e, "Seal rejected");
                (e.report(), Vec::new())
            }
        }
    }

    /// Record a diagnostic pulse without touching the latch
    ///
    /// # Errors
    /// Same as [`seal`](Self::seal)
    pub fn pulse(&self, signal: &str) -> Result<SealOutcome, SealError> {
        let value = parse_signal(signal)?;
        let status = self.rule.classify(value);
        let signal = signal.trim();

        let event = self
            .ledger
            .append(PULSE_EVENT, format!("signal={signal}; status={status}"))?;
        let report = format!(
            "[PULSE] Diagnosis Complete\n\
             Signal: {signal} (ceiling {ceiling})\n\
             Status: {status}\n\
             Governance Status: ACTIVE",
            ceiling = self.rule.ceiling()
        );

        info!(signal, status = %status, "Pulse recorded");

        Ok(SealOutcome {
            report,
            status,
            signal: value,
            event,
            newly_sealed: false,
            snapshot: self.ledger.snapshot(),
        })
    }

    /// Copy of the current seal state
    #[must_use]
    pub fn state(&self) -> SealState {
        self.state.lock().clone()
    }

    /// Check if the latch is set
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.state.lock().is_sealed()
    }

    /// Report of the most recent successful seal
    #[must_use]
    pub fn last_report(&self) -> Option<String> {
        self.state.lock().last_report.clone()
    }

    fn seal_report(
        &self,
        source: TriggerSource,
        signal: &str,
        status: HealthStatus,
        newly_sealed: bool,
    ) -> String {
        let headline = if newly_sealed {
            "[SEALED] Sovereign Seal Engaged"
        } else {
            "[SEALED] Seal Reaffirmed"
        };
        let mut report = format!(
            "{headline}\n\
             Trigger: {source}\n\
             Signal: {signal} (ceiling {ceiling})\n\
             Status: {status}\n\
             Governance Status: ACTIVE",
            ceiling = self.rule.ceiling()
        );
        if !status.is_optimal() {
            report.push_str("\nNote: sealed while the signal is above the ceiling");
        }
        report
    }
}

fn decision_details(source: TriggerSource, signal: &str, status: HealthStatus) -> String {
    format!("source={source}; signal={signal}; status={status}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn action() -> (TempDir, SealAction) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(EventLedger::new(dir.path().join("vault.csv")));
        (dir, SealAction::new(ledger, HealthRule::new(92.6)))
    }

    #[test]
    fn trigger_labels_parse() {
        assert_eq!("manual".parse::<TriggerSource>().unwrap(), TriggerSource::Manual);
        assert_eq!(
            "AUTO-REFLEX".parse::<TriggerSource>().unwrap(),
            TriggerSource::Automatic
        );
        assert_eq!(" auto ".parse::<TriggerSource>().unwrap(), TriggerSource::Automatic);
        assert!(matches!(
            "cron".parse::<TriggerSource>(),
            Err(SealError::UnknownTrigger(_))
        ));
    }

    #[test]
    fn optimal_manual_seal() {
        let (_dir, action) = action();
        let outcome = action.seal("92.6", TriggerSource::Manual).unwrap();

        assert_eq!(outcome.status, HealthStatus::Optimal);
        assert!(outcome.newly_sealed);
        assert_eq!(outcome.event.event_type(), MANUAL_SEAL_EVENT);
        assert_eq!(
            outcome.event.details(),
            "source=Manual; signal=92.6; status=Optimal"
        );
        assert_eq!(outcome.snapshot.len(), 1);
        assert!(outcome.report.contains("Trigger: Manual"));
        assert!(action.is_sealed());
        assert_eq!(action.last_report(), Some(outcome.report));
    }

    #[test]
    fn stress_still_latches() {
        let (_dir, action) = action();
        let outcome = action.seal("95.0", TriggerSource::Automatic).unwrap();

        assert_eq!(outcome.status, HealthStatus::Stress);
        assert_eq!(outcome.event.event_type(), AUTO_SEAL_EVENT);
        assert!(outcome.report.contains("above the ceiling"));
        assert!(action.is_sealed());
        assert_eq!(action.state().sealed_by, Some(TriggerSource::Automatic));
    }

    #[test]
    fn invalid_signal_changes_nothing() {
        let (_dir, action) = action();
        let err = action.seal("abc", TriggerSource::Manual).unwrap_err();

        assert!(matches!(err, SealError::InvalidSignal { .. }));
        assert!(action.ledger().is_empty());
        assert!(!action.is_sealed());
        assert_eq!(action.last_report(), None);
    }

    #[test]
    fn second_seal_reaffirms() {
        let (_dir, action) = action();
        let first = action.seal("90", TriggerSource::Manual).unwrap();
        let second = action.seal("99", TriggerSource::Manual).unwrap();

        assert!(first.newly_sealed);
        assert!(!second.newly_sealed);
        assert!(second.report.starts_with("[SEALED] Seal Reaffirmed"));
        assert_eq!(second.snapshot.len(), 2);
        assert_eq!(action.state().sealed_at, Some(first.event.timestamp()));
    }

    #[test]
    fn seal_view_flattens_errors() {
        let (_dir, action) = action();

        let (report, snapshot) = action.seal_view("abc", TriggerSource::Manual);
        assert!(report.starts_with("[ERROR] Invalid Signal"));
        assert!(snapshot.is_empty());

        let (report, snapshot) = action.seal_view("92.6", TriggerSource::Manual);
        assert!(report.starts_with("[SEALED]"));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn pulse_records_without_latching() {
        let (_dir, action) = action();
        let outcome = action.pulse("95").unwrap();

        assert_eq!(outcome.event.event_type(), PULSE_EVENT);
        assert_eq!(outcome.event.details(), "signal=95; status=Stress");
        assert!(!outcome.newly_sealed);
        assert!(!action.is_sealed());
    }

    #[test]
    fn persistence_failure_does_not_latch() {
        let dir = tempfile::tempdir().unwrap();
        // Directory as ledger path: every append fails
        let ledger = Arc::new(EventLedger::new(dir.path()));
        let action = SealAction::new(ledger, HealthRule::default());

        let err = action.seal("92.6", TriggerSource::Manual).unwrap_err();
        assert!(err.is_persistence());
        assert!(!action.is_sealed());
        assert!(action.ledger().is_empty());
    }
}

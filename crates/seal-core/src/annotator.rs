//! Motif annotation and journal rendering
//!
//! Pure read-side projections over ledger data. Motif tags are presentation
//! only and carry no domain invariant.

use crate::seal::{AUTO_SEAL_EVENT, MANUAL_SEAL_EVENT, PULSE_EVENT};
use seal_ledger::{Event, EventLedger, LedgerError};
use std::collections::{BTreeMap, BTreeSet};

/// Tag returned for event types missing from the table
pub const UNCLASSIFIED_TAG: &str = "#unclassified";

/// Journal text for a ledger with no events
pub const EMPTY_JOURNAL: &str = "The ledger is silent. No events have been recorded yet.";

const BUILTIN_MOTIFS: &[(&str, &[&str])] = &[
    (MANUAL_SEAL_EVENT, &["#sovereignty", "#human-trigger", "#seal"]),
    (AUTO_SEAL_EVENT, &["#autonomy", "#reflex", "#seal"]),
    (PULSE_EVENT, &["#heartbeat", "#diagnosis"]),
];

/// Static mapping from event type to display tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifTable {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl MotifTable {
    /// Table with no entries
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Table with the built-in seal and pulse motifs
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN_MOTIFS
            .iter()
            .fold(Self::empty(), |table, (event_type, tags)| {
                table.with_motif(*event_type, tags.iter().copied())
            })
    }

    /// Add tags for an event type, merging with any existing ones
    ///
    /// Tags without a leading `#` get one.
    #[must_use]
    pub fn with_motif<I, S>(mut self, event_type: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.entries.entry(event_type.into()).or_default();
        entry.extend(
            tags.into_iter()
                .map(|t| normalize_tag(t.as_ref()))
                .filter(|t| t.len() > 1),
        );
        self
    }

    /// Merge a configured `event_type -> tags` map over this table
    #[must_use]
    pub fn extended(self, extra: &BTreeMap<String, Vec<String>>) -> Self {
        extra
            .iter()
            .fold(self, |table, (event_type, tags)| {
                table.with_motif(event_type.clone(), tags)
            })
    }

    /// Tags registered for an event type
    #[must_use]
    pub fn tags(&self, event_type: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(event_type)
    }

    /// Number of event types with tags
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MotifTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_tag(tag: &str) -> String {
    let tag = tag.trim();
    if tag.starts_with('#') {
        tag.to_string()
    } else {
        format!("#{tag}")
    }
}

/// Read-side annotator over a motif table
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    motifs: MotifTable,
}

impl Annotator {
    /// Create an annotator
    #[inline]
    #[must_use]
    pub fn new(motifs: MotifTable) -> Self {
        Self { motifs }
    }

    /// Motif table in use
    #[inline]
    #[must_use]
    pub fn motifs(&self) -> &MotifTable {
        &self.motifs
    }

    /// Tags for an event type, `{"#unclassified"}` when unknown
    #[must_use]
    pub fn annotate(&self, event_type: &str) -> BTreeSet<String> {
        match self.motifs.tags(event_type) {
            Some(tags) if !tags.is_empty() => tags.clone(),
            _ => BTreeSet::from([UNCLASSIFIED_TAG.to_string()]),
        }
    }

    /// Render the `n` most recent durable events, newest first
    ///
    /// # Errors
    /// Propagates durable read failures; an empty ledger is not an error
    pub fn render_journal(&self, ledger: &EventLedger, n: usize) -> Result<String, LedgerError> {
        let events = ledger.tail(n, true)?;
        Ok(self.render_events(&events))
    }

    /// Render events in the order given
    #[must_use]
    pub fn render_events(&self, events: &[Event]) -> String {
        if events.is_empty() {
            return EMPTY_JOURNAL.to_string();
        }

        let mut journal = format!("Sovereign Journal ({} most recent)\n", events.len());
        for event in events {
            journal.push('\n');
            journal.push_str(&self.render_entry(event));
        }
        journal
    }

    /// Render one journal entry
    ///
    /// ```text
    /// [2025-12-17 09:30:05] SEAL_INITIATED #human-trigger #seal #sovereignty
    ///     source=Manual; signal=92.6; status=Optimal
    /// ```
    #[must_use]
    pub fn render_entry(&self, event: &Event) -> String {
        let tags = self.annotate(event.event_type());
        let mut entry = format!("[{}] {}", event.formatted_timestamp(), event.event_type());
        for tag in &tags {
            entry.push(' ');
            entry.push_str(tag);
        }
        // Every details line, blank ones included; empty details still get one
        for line in event.details().split('\n') {
            entry.push_str("\n    ");
            entry.push_str(line.strip_suffix('\r').unwrap_or(line));
        }
        entry.push('\n');
        entry
    }
}

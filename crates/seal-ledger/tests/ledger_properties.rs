//! Property tests for the dual-store ledger.
//!
//! These exercise the invariants that make the durable mirror trustworthy:
//! - Memory and disk hold the same events in the same order.
//! - Whatever goes in comes back out, including CSV-hostile text.
//! - Concurrent appenders never interleave or corrupt records.

use proptest::prelude::*;
use seal_ledger::{EventLedger, LedgerOptions};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn details_strategy() -> impl Strategy<Value = String> {
    // Printable text plus the characters CSV has to quote
    prop::collection::vec(
        prop_oneof![
            Just(",".to_string()),
            Just("\"".to_string()),
            Just("\n".to_string()),
            "[a-zA-Z0-9 =;.%-]{0,12}",
        ],
        0..6,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Tenet: N appends read back as exactly N records with identical fields.
    #[test]
    fn durable_round_trip_preserves_fields(
        entries in prop::collection::vec(("[A-Za-z_-]{1,16}", details_strategy()), 0..12)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = EventLedger::new(dir.path().join("vault.csv"));

        for (event_type, details) in &entries {
            ledger.append(event_type.clone(), details.clone()).unwrap();
        }

        let mut durable = ledger.read_durable().unwrap();
        durable.reverse();
        let memory = ledger.snapshot();

        prop_assert_eq!(durable.len(), entries.len());
        prop_assert_eq!(memory.len(), durable.len());
        for ((expected_type, expected_details), (mem, disk)) in
            entries.iter().zip(memory.iter().zip(durable.iter()))
        {
            prop_assert_eq!(disk.event_type(), expected_type.as_str());
            prop_assert_eq!(disk.details(), expected_details.as_str());
            prop_assert_eq!(mem, disk);
        }
    }
}

/// Tenet: a restarted process keeps appending to the same durable file.
#[test]
fn restarts_extend_the_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.csv");

    for run in 0..3 {
        let ledger = EventLedger::new(&path);
        ledger.append("Pulse", format!("run {run}")).unwrap();
        assert_eq!(ledger.snapshot().len(), 1, "memory is process-scoped");
    }

    let ledger = EventLedger::open(&path, LedgerOptions::new().with_recover(true)).unwrap();
    let details: Vec<_> = ledger
        .snapshot()
        .iter()
        .map(|e| e.details().to_string())
        .collect();
    assert_eq!(details, vec!["run 0", "run 1", "run 2"]);
}

/// Tenet: concurrent appenders produce whole, non-interleaved records.
#[test]
fn concurrent_appends_stay_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(EventLedger::new(dir.path().join("vault.csv")));

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for i in 0..25 {
                    ledger
                        .append("Pulse", format!("writer {writer}, beat {i}"))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let memory = ledger.snapshot();
    let mut durable = ledger.read_durable().unwrap();
    durable.reverse();

    assert_eq!(memory.len(), 100);
    assert_eq!(memory, durable);
}

/// Tenet: append order is timestamp order, even under contention.
///
/// Writers hammer the ledger across several second boundaries; no event may
/// carry an earlier timestamp than the one stored before it.
#[test]
fn concurrent_appends_keep_timestamps_monotonic() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(EventLedger::new(dir.path().join("vault.csv")));
    let deadline = Instant::now() + Duration::from_millis(2500);

    let handles: Vec<_> = (0..8)
        .map(|writer| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let mut beat = 0u64;
                while Instant::now() < deadline {
                    ledger
                        .append("Pulse", format!("writer {writer}, beat {beat}"))
                        .unwrap();
                    beat += 1;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let memory = ledger.snapshot();
    let inversions = memory
        .windows(2)
        .filter(|pair| pair[1].timestamp() < pair[0].timestamp())
        .count();
    assert_eq!(inversions, 0, "{} events", memory.len());

    let mut durable = ledger.read_durable().unwrap();
    durable.reverse();
    assert_eq!(memory, durable);
}

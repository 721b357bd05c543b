//! Testing utilities for the Sovereign Seal workspace
//!
//! Scratch ledgers, contexts, and scripted [`Sealer`] doubles for driving the
//! reflex loop.

#![allow(missing_docs)]

use parking_lot::Mutex;
use seal_core::{
    HealthRule, HealthStatus, SealAction, SealConfig, SealContext, SealError, SealOutcome,
    Sealer, TriggerSource,
};
use seal_ledger::{Event, EventLedger, LedgerError};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const TEST_LEDGER_FILE: &str = "memory_vault.csv";

/// Scratch directory plus the ledger path inside it
pub fn scratch_ledger_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(TEST_LEDGER_FILE);
    (dir, path)
}

pub fn test_config(dir: &TempDir) -> SealConfig {
    SealConfig::new().with_ledger_path(dir.path().join(TEST_LEDGER_FILE))
}

pub fn setup_test_context() -> (TempDir, SealContext) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = SealContext::open(test_config(&dir)).unwrap();
    (dir, ctx)
}

pub fn setup_test_action() -> (TempDir, Arc<SealAction>) {
    let (dir, path) = scratch_ledger_path();
    let ledger = Arc::new(EventLedger::new(path));
    (dir, Arc::new(SealAction::new(ledger, HealthRule::default())))
}

/// Poll `cond` every few milliseconds until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

fn fake_outcome(signal: &str, source: TriggerSource) -> SealOutcome {
    SealOutcome {
        report: format!("[SEALED] test double ({source})"),
        status: HealthStatus::Optimal,
        signal: signal.trim().parse().unwrap_or_default(),
        event: Event::from_parts(
            chrono::Local::now().naive_local(),
            source.event_type(),
            format!("signal={}", signal.trim()),
        ),
        newly_sealed: true,
        snapshot: Vec::new(),
    }
}

/// Sealer that succeeds and latches after `latch_after` calls
#[derive(Debug, Default)]
pub struct CountingSealer {
    calls: AtomicUsize,
    latch_after: usize,
    sealed: AtomicBool,
    sources: Mutex<Vec<TriggerSource>>,
}

impl CountingSealer {
    /// Latches on the first call
    pub fn new() -> Self {
        Self::latching_after(1)
    }

    /// Stays unsealed until `n` calls have succeeded
    pub fn latching_after(n: usize) -> Self {
        Self {
            latch_after: n,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sources(&self) -> Vec<TriggerSource> {
        self.sources.lock().clone()
    }
}

impl Sealer for CountingSealer {
    fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    fn seal(&self, signal: &str, source: TriggerSource) -> Result<SealOutcome, SealError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.sources.lock().push(source);
        if n >= self.latch_after {
            self.sealed.store(true, Ordering::SeqCst);
        }
        Ok(fake_outcome(signal, source))
    }
}

/// Sealer whose first `failures` calls fail with a persistence error
#[derive(Debug)]
pub struct FailingSealer {
    remaining_failures: AtomicUsize,
    inner: CountingSealer,
}

impl FailingSealer {
    pub fn new(failures: usize) -> Self {
        Self {
            remaining_failures: AtomicUsize::new(failures),
            inner: CountingSealer::new(),
        }
    }

    /// Calls that reached the succeeding path
    pub fn successes(&self) -> usize {
        self.inner.calls()
    }
}

impl Sealer for FailingSealer {
    fn is_sealed(&self) -> bool {
        self.inner.is_sealed()
    }

    fn seal(&self, signal: &str, source: TriggerSource) -> Result<SealOutcome, SealError> {
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SealError::Ledger(LedgerError::Persistence {
                path: PathBuf::from(TEST_LEDGER_FILE),
                source: io::Error::other("disk full"),
            }));
        }
        self.inner.seal(signal, source)
    }
}

/// Sealer that panics on its first call, then behaves like [`CountingSealer`]
#[derive(Debug)]
pub struct PanickingSealer {
    panicked: AtomicBool,
    inner: CountingSealer,
}

impl PanickingSealer {
    pub fn new() -> Self {
        Self {
            panicked: AtomicBool::new(false),
            inner: CountingSealer::new(),
        }
    }

    pub fn successes(&self) -> usize {
        self.inner.calls()
    }
}

impl Default for PanickingSealer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sealer for PanickingSealer {
    fn is_sealed(&self) -> bool {
        self.inner.is_sealed()
    }

    fn seal(&self, signal: &str, source: TriggerSource) -> Result<SealOutcome, SealError> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("scripted sealer panic");
        }
        self.inner.seal(signal, source)
    }
}

/// Sealer that reports sealed from the start and counts any seal attempts
#[derive(Debug, Default)]
pub struct AlwaysSealed {
    attempts: AtomicUsize,
}

impl AlwaysSealed {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Sealer for AlwaysSealed {
    fn is_sealed(&self) -> bool {
        true
    }

    fn seal(&self, signal: &str, source: TriggerSource) -> Result<SealOutcome, SealError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(fake_outcome(signal, source))
    }
}

/// Wraps a real [`SealAction`] and holds each seal at a barrier
///
/// Lets a reflex tick and a manual seal reach the seal action at the same
/// moment. The latch check is not gated.
#[derive(Debug)]
pub struct GatedSealer {
    inner: Arc<SealAction>,
    gate: Arc<Barrier>,
    newly_sealed: Mutex<Vec<bool>>,
}

impl GatedSealer {
    pub fn new(inner: Arc<SealAction>, gate: Arc<Barrier>) -> Self {
        Self {
            inner,
            gate,
            newly_sealed: Mutex::new(Vec::new()),
        }
    }

    /// `newly_sealed` of every successful seal made through this wrapper
    pub fn newly_sealed(&self) -> Vec<bool> {
        self.newly_sealed.lock().clone()
    }
}

impl Sealer for GatedSealer {
    fn is_sealed(&self) -> bool {
        self.inner.is_sealed()
    }

    fn seal(&self, signal: &str, source: TriggerSource) -> Result<SealOutcome, SealError> {
        self.gate.wait();
        let outcome = self.inner.seal(signal, source)?;
        self.newly_sealed.lock().push(outcome.newly_sealed);
        Ok(outcome)
    }
}

//! Trait seams between the reflex loop and the seal action

use crate::error::SealError;
use crate::seal::{SealAction, SealOutcome, TriggerSource};

/// Anything the reflex loop can seal through
///
/// Implementations do blocking I/O in [`seal`](Sealer::seal); async callers
/// run it on the blocking pool.
pub trait Sealer: Send + Sync {
    /// Check if the latch is already set
    fn is_sealed(&self) -> bool;

    /// Perform one seal
    ///
    /// # Errors
    /// Implementation-defined; the reflex loop logs and continues
    fn seal(&self, signal: &str, source: TriggerSource) -> Result<SealOutcome, SealError>;
}

impl Sealer for SealAction {
    fn is_sealed(&self) -> bool {
        SealAction::is_sealed(self)
    }

    fn seal(&self, signal: &str, source: TriggerSource) -> Result<SealOutcome, SealError> {
        SealAction::seal(self, signal, source)
    }
}

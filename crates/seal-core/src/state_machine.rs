//! Seal lifecycle state machine
//!
//! Two phases, one way: `UNSEALED -> SEALED`. Once sealed, the phase is
//! terminal for the lifetime of the process.

use crate::error::StateMachineError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Seal lifecycle phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SealPhase {
    /// No successful seal yet
    #[default]
    Unsealed,
    /// Latched by the first successful seal
    Sealed,
}

impl SealPhase {
    /// Check if the latch has been set
    #[inline]
    #[must_use]
    pub fn is_sealed(self) -> bool {
        matches!(self, Self::Sealed)
    }

    /// Check if no further transitions are possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

impl Display for SealPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsealed => f.write_str("UNSEALED"),
            Self::Sealed => f.write_str("SEALED"),
        }
    }
}

/// Validates a phase transition.
///
/// # Errors
/// `StateMachineError::IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(from: SealPhase, to: SealPhase) -> Result<(), StateMachineError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateMachineError::IllegalTransition { from, to })
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: SealPhase) -> &'static [SealPhase] {
    match from {
        SealPhase::Unsealed => &[SealPhase::Sealed],
        SealPhase::Sealed => &[],
    }
}

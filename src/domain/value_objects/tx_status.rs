//! # Transaction Status
//!
//! Lifecycle state machine for a pending operation.
//!
//! # State Machine
//!
//! ```text
//! Built → Submitted ⟲ (gas bump) → Confirmed
//!   ↓         ↓  ↑
//!   │         ↓  └──── TimedOut ──→ Confirmed / Failed
//!   └───────→ Failed
//! ```
//!
//! # Examples
//!
//! ```
//! use blockdag_orchestrator::domain::value_objects::tx_status::TxStatus;
//!
//! let status = TxStatus::Built;
//! assert!(status.can_transition_to(TxStatus::Submitted));
//! assert!(!status.can_transition_to(TxStatus::Confirmed));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a pending operation.
///
/// # Terminal States
///
/// - [`Confirmed`](TxStatus::Confirmed) - receipt reported success
/// - [`Failed`](TxStatus::Failed) - rejected, exhausted or reverted
///
/// [`TimedOut`](TxStatus::TimedOut) is deliberately not terminal: the
/// transaction may still be mined and needs an explicit reconcile or bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TxStatus {
    /// Built and signable, never broadcast.
    #[default]
    Built = 0,

    /// Broadcast and awaiting a receipt.
    Submitted = 1,

    /// Included with a successful receipt (terminal).
    Confirmed = 2,

    /// Rejected, exhausted or reverted (terminal).
    Failed = 3,

    /// No receipt within the wait window.
    TimedOut = 4,
}

impl TxStatus {
    /// Returns true if this is a terminal status.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockdag_orchestrator::domain::value_objects::tx_status::TxStatus;
    ///
    /// assert!(TxStatus::Confirmed.is_terminal());
    /// assert!(TxStatus::Failed.is_terminal());
    /// assert!(!TxStatus::TimedOut.is_terminal());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    /// Returns true if this status can transition to the target status.
    ///
    /// - Built → Submitted, Failed
    /// - Submitted → Submitted (gas bump), Confirmed, Failed, TimedOut
    /// - TimedOut → Submitted (gas bump), Confirmed, Failed
    /// - Terminal states → (none)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Built, Self::Submitted)
                | (Self::Built, Self::Failed)
                | (Self::Submitted, Self::Submitted)
                | (Self::Submitted, Self::Confirmed)
                | (Self::Submitted, Self::Failed)
                | (Self::Submitted, Self::TimedOut)
                | (Self::TimedOut, Self::Submitted)
                | (Self::TimedOut, Self::Confirmed)
                | (Self::TimedOut, Self::Failed)
        )
    }

    /// Returns the valid next statuses from this status.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Built => vec![Self::Submitted, Self::Failed],
            Self::Submitted => vec![
                Self::Submitted,
                Self::Confirmed,
                Self::Failed,
                Self::TimedOut,
            ],
            Self::TimedOut => vec![Self::Submitted, Self::Confirmed, Self::Failed],
            Self::Confirmed | Self::Failed => vec![],
        }
    }

    /// Returns true if a transaction is on the wire and may still be mined.
    #[inline]
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::Submitted | Self::TimedOut)
    }

    /// Returns true if a repeated submit of the same operation id must
    /// return the existing entry instead of broadcasting again.
    #[inline]
    #[must_use]
    pub const fn short_circuits_submit(&self) -> bool {
        matches!(self, Self::Submitted | Self::Confirmed | Self::TimedOut)
    }

    /// Returns true if this status indicates success.
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Returns the numeric value of this status.
    #[inline]
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Built => "BUILT",
            Self::Submitted => "SUBMITTED",
            Self::Confirmed => "CONFIRMED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
        };
        write!(f, "{}", s)
    }
}

impl TryFrom<u8> for TxStatus {
    type Error = InvalidTxStatusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Built),
            1 => Ok(Self::Submitted),
            2 => Ok(Self::Confirmed),
            3 => Ok(Self::Failed),
            4 => Ok(Self::TimedOut),
            _ => Err(InvalidTxStatusError(value)),
        }
    }
}

/// Error returned when converting an invalid u8 to TxStatus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTxStatusError(pub u8);

impl fmt::Display for InvalidTxStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transaction status value: {}", self.0)
    }
}

impl std::error::Error for InvalidTxStatusError {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [TxStatus; 5] = [
        TxStatus::Built,
        TxStatus::Submitted,
        TxStatus::Confirmed,
        TxStatus::Failed,
        TxStatus::TimedOut,
    ];

    mod transitions {
        use super::*;

        #[test]
        fn built_can_be_submitted_or_failed() {
            assert!(TxStatus::Built.can_transition_to(TxStatus::Submitted));
            assert!(TxStatus::Built.can_transition_to(TxStatus::Failed));
            assert!(!TxStatus::Built.can_transition_to(TxStatus::Confirmed));
            assert!(!TxStatus::Built.can_transition_to(TxStatus::TimedOut));
        }

        #[test]
        fn submitted_can_resubmit() {
            assert!(TxStatus::Submitted.can_transition_to(TxStatus::Submitted));
        }

        #[test]
        fn timed_out_can_be_reconciled_or_bumped() {
            assert!(TxStatus::TimedOut.can_transition_to(TxStatus::Submitted));
            assert!(TxStatus::TimedOut.can_transition_to(TxStatus::Confirmed));
            assert!(TxStatus::TimedOut.can_transition_to(TxStatus::Failed));
            assert!(!TxStatus::TimedOut.can_transition_to(TxStatus::Built));
        }

        #[test]
        fn terminal_states_have_no_exit() {
            for from in [TxStatus::Confirmed, TxStatus::Failed] {
                for to in ALL {
                    assert!(!from.can_transition_to(to), "{from} -> {to}");
                }
            }
        }

        #[test]
        fn valid_transitions_agree_with_can_transition_to() {
            for from in ALL {
                for to in ALL {
                    assert_eq!(
                        from.valid_transitions().contains(&to),
                        from.can_transition_to(to)
                    );
                }
            }
        }
    }

    mod predicates {
        use super::*;

        #[test]
        fn short_circuit_statuses() {
            assert!(TxStatus::Submitted.short_circuits_submit());
            assert!(TxStatus::Confirmed.short_circuits_submit());
            assert!(TxStatus::TimedOut.short_circuits_submit());
            assert!(!TxStatus::Failed.short_circuits_submit());
            assert!(!TxStatus::Built.short_circuits_submit());
        }

        #[test]
        fn in_flight_statuses() {
            assert!(TxStatus::Submitted.is_in_flight());
            assert!(TxStatus::TimedOut.is_in_flight());
            assert!(!TxStatus::Confirmed.is_in_flight());
        }
    }

    mod conversions {
        use super::*;

        #[test]
        fn u8_round_trip() {
            for status in ALL {
                assert_eq!(TxStatus::try_from(status.as_u8()).unwrap(), status);
            }
            assert_eq!(TxStatus::try_from(9), Err(InvalidTxStatusError(9)));
        }

        #[test]
        fn serde_name_matches_display() {
            let json = serde_json::to_string(&TxStatus::TimedOut).unwrap();
            assert_eq!(json, "\"TIMED_OUT\"");
            assert_eq!(TxStatus::TimedOut.to_string(), "TIMED_OUT");
        }
    }
}

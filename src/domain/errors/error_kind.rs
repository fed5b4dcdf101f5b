//! # Error Kind
//!
//! Flat, serializable classification of every failure the orchestrator can
//! report.
//!
//! Layer-specific error enums ([`DomainError`](super::DomainError),
//! `ChainError`, `ApplicationError`) carry context; [`ErrorKind`] is what
//! survives into a [`RoutineResult`](crate::domain::entities::RoutineResult),
//! a ledger record or a failed [`PendingOperation`](crate::domain::entities::PendingOperation).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an orchestration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A contract with the same logical name is already registered.
    DuplicateName,
    /// An address failed hex or checksum validation.
    InvalidAddress,
    /// No contract is registered under the requested name.
    UnknownContract,
    /// The function does not exist on the contract interface.
    FunctionNotFound,
    /// Argument arity or types do not match the function signature.
    ArgumentTypeMismatch,
    /// Transferred value does not match the function's payability.
    InvalidValueForMutability,
    /// The function or contract cannot be called in a transaction.
    ReadOnlyFunction,
    /// Stale nonce retries were exhausted.
    NonceExhausted,
    /// The node or signer rejected the transaction.
    SubmissionRejected,
    /// The transaction or call reverted on chain.
    Reverted,
    /// A gas bump was requested in a state that does not allow it.
    InvalidStateForResubmission,
    /// The gas bump factor is not usable.
    InvalidGasBump,
    /// The RPC endpoint could not be reached (transient).
    RpcUnavailable,
    /// No receipt arrived within the wait window (non-terminal).
    ConfirmationTimeout,
    /// No operation is known under the requested id.
    UnknownOperation,
    /// An illegal lifecycle transition was attempted.
    InvalidStateTransition,
    /// The operation ledger could not be read or written.
    Ledger,
    /// Anything else, including a panicking routine step.
    Internal,
}

impl ErrorKind {
    /// Returns true if the failure is transient and may be retried with backoff.
    #[inline]
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RpcUnavailable)
    }

    /// Returns true if the failure came from synchronous input validation.
    #[inline]
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName
                | Self::InvalidAddress
                | Self::UnknownContract
                | Self::FunctionNotFound
                | Self::ArgumentTypeMismatch
                | Self::InvalidValueForMutability
                | Self::ReadOnlyFunction
                | Self::InvalidGasBump
        )
    }

    /// Returns the canonical name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateName => "DUPLICATE_NAME",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::UnknownContract => "UNKNOWN_CONTRACT",
            Self::FunctionNotFound => "FUNCTION_NOT_FOUND",
            Self::ArgumentTypeMismatch => "ARGUMENT_TYPE_MISMATCH",
            Self::InvalidValueForMutability => "INVALID_VALUE_FOR_MUTABILITY",
            Self::ReadOnlyFunction => "READ_ONLY_FUNCTION",
            Self::NonceExhausted => "NONCE_EXHAUSTED",
            Self::SubmissionRejected => "SUBMISSION_REJECTED",
            Self::Reverted => "REVERTED",
            Self::InvalidStateForResubmission => "INVALID_STATE_FOR_RESUBMISSION",
            Self::InvalidGasBump => "INVALID_GAS_BUMP",
            Self::RpcUnavailable => "RPC_UNAVAILABLE",
            Self::ConfirmationTimeout => "CONFIRMATION_TIMEOUT",
            Self::UnknownOperation => "UNKNOWN_OPERATION",
            Self::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            Self::Ledger => "LEDGER",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

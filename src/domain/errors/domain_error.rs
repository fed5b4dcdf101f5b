//! # Domain Errors
//!
//! Typed domain error definitions.
//!
//! This module provides the [`DomainError`] enum for representing
//! validation and lifecycle errors with numeric error codes.
//!
//! # Error Code Ranges
//!
//! - **1000-1999**: Validation errors (registry and builder input)
//! - **2000-2999**: State errors (operation lifecycle)
//!
//! # Examples
//!
//! ```
//! use blockdag_orchestrator::domain::errors::DomainError;
//!
//! let error = DomainError::UnknownContract("token".to_string());
//! assert_eq!(error.code(), 1003);
//! ```

use crate::domain::errors::ErrorKind;
use crate::domain::value_objects::tx_status::TxStatus;
use thiserror::Error;

/// Domain-level error with numeric error codes.
///
/// | Range | Category |
/// |-------|----------|
/// | 1000-1999 | Validation errors |
/// | 2000-2999 | State errors |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (1000-1999)
    // ========================================================================
    /// A contract with this logical name is already registered.
    #[error("duplicate contract name: {0}")]
    DuplicateName(String),

    /// The address is not valid hex or fails its EIP-55 checksum.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// No contract registered under this name.
    #[error("unknown contract: {0}")]
    UnknownContract(String),

    /// The function is not part of the contract interface.
    #[error("function not found: {contract}.{function}")]
    FunctionNotFound {
        /// Logical contract name.
        contract: String,
        /// Requested function name.
        function: String,
    },

    /// Arguments do not match any signature of the function.
    #[error("argument type mismatch for {function}: {message}")]
    ArgumentTypeMismatch {
        /// Requested function name.
        function: String,
        /// What did not match.
        message: String,
    },

    /// The transferred value is not allowed for the function's payability.
    #[error("invalid value for {function}: {message}")]
    InvalidValueForMutability {
        /// Requested function name.
        function: String,
        /// What was wrong with the value.
        message: String,
    },

    /// The function or contract cannot be used to build a transaction.
    #[error("read-only function: {0}")]
    ReadOnlyFunction(String),

    /// The gas bump factor is not a finite number greater than one.
    #[error("invalid gas bump factor: {0}")]
    InvalidGasBump(String),

    /// Operation id is empty or malformed.
    #[error("invalid operation id: {0}")]
    InvalidOperationId(String),

    // ========================================================================
    // State Errors (2000-2999)
    // ========================================================================
    /// Invalid lifecycle transition attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// The current status.
        from: TxStatus,
        /// The attempted target status.
        to: TxStatus,
    },

    /// Gas bump requested in a status that does not allow it.
    #[error("cannot resubmit operation {operation_id} in status {status}")]
    InvalidStateForResubmission {
        /// The operation id.
        operation_id: String,
        /// The status it was found in.
        status: TxStatus,
    },

    /// No operation known under this id.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl DomainError {
    /// Returns the numeric error code.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockdag_orchestrator::domain::errors::DomainError;
    ///
    /// assert_eq!(DomainError::DuplicateName("token".to_string()).code(), 1001);
    /// assert_eq!(DomainError::UnknownOperation("op".to_string()).code(), 2003);
    /// ```
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::DuplicateName(_) => 1001,
            Self::InvalidAddress(_) => 1002,
            Self::UnknownContract(_) => 1003,
            Self::FunctionNotFound { .. } => 1004,
            Self::ArgumentTypeMismatch { .. } => 1005,
            Self::InvalidValueForMutability { .. } => 1006,
            Self::ReadOnlyFunction(_) => 1007,
            Self::InvalidGasBump(_) => 1008,
            Self::InvalidOperationId(_) => 1009,

            Self::InvalidStateTransition { .. } => 2001,
            Self::InvalidStateForResubmission { .. } => 2002,
            Self::UnknownOperation(_) => 2003,
        }
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.code() {
            1000..=1999 => "validation",
            2000..=2999 => "state",
            _ => "unknown",
        }
    }

    /// Returns true if this is a validation error.
    #[inline]
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self.code(), 1000..=1999)
    }

    /// Returns true if this is a state error.
    #[inline]
    #[must_use]
    pub const fn is_state_error(&self) -> bool {
        matches!(self.code(), 2000..=2999)
    }

    /// Returns the flat classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::InvalidAddress(_) => ErrorKind::InvalidAddress,
            Self::UnknownContract(_) => ErrorKind::UnknownContract,
            Self::FunctionNotFound { .. } => ErrorKind::FunctionNotFound,
            Self::ArgumentTypeMismatch { .. } => ErrorKind::ArgumentTypeMismatch,
            Self::InvalidValueForMutability { .. } => ErrorKind::InvalidValueForMutability,
            Self::ReadOnlyFunction(_) => ErrorKind::ReadOnlyFunction,
            Self::InvalidGasBump(_) => ErrorKind::InvalidGasBump,
            Self::InvalidOperationId(_) => ErrorKind::Internal,
            Self::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            Self::InvalidStateForResubmission { .. } => ErrorKind::InvalidStateForResubmission,
            Self::UnknownOperation(_) => ErrorKind::UnknownOperation,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

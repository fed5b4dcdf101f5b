//! # Application Errors
//!
//! Error types for the application layer.
//!
//! These errors represent failures of services and use cases: validation
//! and lifecycle errors from the domain, chain access errors and ledger
//! errors. Every variant maps onto the flat [`ErrorKind`] taxonomy.

use crate::domain::errors::{DomainError, ErrorKind};
use crate::infrastructure::chain::ChainError;
use crate::infrastructure::persistence::LedgerError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain error.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Chain access error.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Ledger error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A read call returned values of an unexpected shape.
    #[error("unexpected output from {function}: {message}")]
    UnexpectedOutput {
        /// Function that was called.
        function: String,
        /// What did not match.
        message: String,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates an unexpected output error.
    #[must_use]
    pub fn unexpected_output(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedOutput {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the flat classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(e) => e.kind(),
            Self::Chain(e) => e.kind(),
            Self::Ledger(_) => ErrorKind::Ledger,
            Self::UnexpectedOutput { .. } | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if this error came from input validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind().is_validation()
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

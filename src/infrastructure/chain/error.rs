//! # Chain Errors
//!
//! Errors reported by a [`ChainClient`](super::ChainClient).
//!
//! Node answers are classified by message text, since JSON-RPC error codes
//! are not consistent across clients.

use crate::application::services::retry::Retryable;
use crate::domain::errors::ErrorKind;
use thiserror::Error;

/// Messages a node returns when the nonce was already consumed.
const STALE_NONCE_MARKERS: [&str; 3] = [
    "nonce too low",
    "replacement transaction underpriced",
    "nonce has already been used",
];

/// Messages a node returns when it already holds the exact transaction.
const ALREADY_KNOWN_MARKERS: [&str; 3] =
    ["already known", "known transaction", "already imported"];

/// Error talking to the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The endpoint could not be reached or timed out.
    #[error("rpc unavailable: {0}")]
    RpcUnavailable(String),

    /// The node refused the request.
    #[error("rejected by node: {0}")]
    Rejected(String),

    /// Execution reverted.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// No signer for the account or signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Calldata could not be encoded or a result decoded.
    #[error("abi codec error: {0}")]
    Codec(String),
}

impl ChainError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::RpcUnavailable(message.into())
    }

    /// Creates a rejection.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Creates a revert.
    #[must_use]
    pub fn reverted(message: impl Into<String>) -> Self {
        Self::Reverted(message.into())
    }

    /// Creates a signing error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing(message.into())
    }

    /// Creates a codec error.
    #[must_use]
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec(message.into())
    }

    /// Returns true if the node rejected the nonce as already consumed.
    #[must_use]
    pub fn is_stale_nonce(&self) -> bool {
        self.rejection_matches(&STALE_NONCE_MARKERS)
    }

    /// Returns true if the node already has this transaction in its pool.
    #[must_use]
    pub fn is_already_known(&self) -> bool {
        self.rejection_matches(&ALREADY_KNOWN_MARKERS)
    }

    fn rejection_matches(&self, markers: &[&str]) -> bool {
        match self {
            Self::Rejected(message) => {
                let message = message.to_ascii_lowercase();
                markers.iter().any(|m| message.contains(m))
            }
            _ => false,
        }
    }

    /// Returns the flat classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RpcUnavailable(_) => ErrorKind::RpcUnavailable,
            Self::Rejected(_) | Self::Signing(_) => ErrorKind::SubmissionRejected,
            Self::Reverted(_) => ErrorKind::Reverted,
            Self::Codec(_) => ErrorKind::Internal,
        }
    }
}

impl Retryable for ChainError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::RpcUnavailable(_))
    }
}

/// Result type for chain calls.
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_nonce_detection() {
        assert!(ChainError::rejected("nonce too low").is_stale_nonce());
        assert!(ChainError::rejected("Replacement transaction underpriced").is_stale_nonce());
        assert!(ChainError::rejected("Nonce has already been used").is_stale_nonce());
        assert!(!ChainError::rejected("insufficient funds for gas").is_stale_nonce());
        assert!(
            !ChainError::rejected("Transaction with the same hash was already imported.")
                .is_stale_nonce()
        );
        assert!(!ChainError::unavailable("nonce too low").is_stale_nonce());
    }

    #[test]
    fn already_known_detection() {
        assert!(ChainError::rejected("already known").is_already_known());
        assert!(ChainError::rejected("Known transaction: 0xabc").is_already_known());
        assert!(
            ChainError::rejected("Transaction with the same hash was already imported.")
                .is_already_known()
        );
        assert!(!ChainError::rejected("nonce too low").is_already_known());
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(ChainError::unavailable("connection refused").is_retryable());
        assert!(!ChainError::rejected("nonce too low").is_retryable());
        assert!(!ChainError::reverted("out of gas").is_retryable());
    }

    #[test]
    fn kinds() {
        assert_eq!(
            ChainError::unavailable("x").kind(),
            ErrorKind::RpcUnavailable
        );
        assert_eq!(
            ChainError::signing("no key").kind(),
            ErrorKind::SubmissionRejected
        );
        assert_eq!(ChainError::reverted("x").kind(), ErrorKind::Reverted);
    }
}

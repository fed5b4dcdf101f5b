//! # Identity Value Objects
//!
//! Type-safe identity wrappers for domain identifiers.
//!
//! - [`OperationId`] - caller-supplied idempotency key of an operation
//! - [`ContractName`] - logical name of a registered contract

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Idempotency key of a pending operation.
///
/// Chosen by the caller. Submitting twice under the same id never
/// broadcasts twice while the first attempt is in flight or confirmed.
///
/// # Examples
///
/// ```
/// use blockdag_orchestrator::domain::value_objects::ids::OperationId;
///
/// let id = OperationId::new("transfer-42");
/// assert_eq!(id.as_str(), "transfer-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Creates a new operation ID from a string.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the id of a daily routine step, `daily:<yyyy-mm-dd>:<step>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockdag_orchestrator::domain::value_objects::ids::OperationId;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    /// assert_eq!(OperationId::daily(day, "token_mining").as_str(), "daily:2026-03-01:token_mining");
    /// ```
    #[must_use]
    pub fn daily(day: NaiveDate, step: &str) -> Self {
        Self(format!("daily:{}:{}", day.format("%Y-%m-%d"), step))
    }

    /// Returns the operation ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the OperationId and returns the inner String.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OperationId {
    #[inline]
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OperationId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for OperationId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Logical contract name, e.g. `token` or `presale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractName(String);

impl ContractName {
    /// Creates a new contract name from a string.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContractName {
    #[inline]
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ContractName {
    #[inline]
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ContractName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContractName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

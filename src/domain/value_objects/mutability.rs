//! # Mutability
//!
//! Call surface a contract or function exposes.

use ethers::abi::StateMutability;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Widest call surface of a contract, or the surface of one function.
///
/// Ordered `Read < Write < Payable`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    /// View or pure; never part of a transaction.
    Read,
    /// State-changing, no value transfer.
    #[default]
    Write,
    /// State-changing and accepts value.
    Payable,
}

impl Mutability {
    /// Returns true if transactions may be built against this surface.
    #[inline]
    #[must_use]
    pub const fn is_transactable(&self) -> bool {
        !matches!(self, Self::Read)
    }

    /// Returns true if value may be transferred.
    #[inline]
    #[must_use]
    pub const fn is_payable(&self) -> bool {
        matches!(self, Self::Payable)
    }
}

impl From<StateMutability> for Mutability {
    fn from(value: StateMutability) -> Self {
        match value {
            StateMutability::Pure | StateMutability::View => Self::Read,
            StateMutability::NonPayable => Self::Write,
            StateMutability::Payable => Self::Payable,
        }
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Payable => "payable",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Mutability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "payable" => Ok(Self::Payable),
            other => Err(format!("unknown mutability: {other}")),
        }
    }
}

//! # Operation Ledger
//!
//! Port definition for the append-only log of operation state transitions.
//!
//! One [`LedgerRecord`] is appended per transition. Replaying the ledger
//! yields the latest state of every operation id, which is what keeps
//! submission idempotent across restarts.
//!
//! # Examples
//!
//! ```ignore
//! use blockdag_orchestrator::infrastructure::persistence::{OperationLedger, replay};
//!
//! ledger.append(LedgerRecord::from_operation(&op)).await?;
//! let latest = replay(ledger.records().await?);
//! ```

use crate::domain::entities::{PendingOperation, RestoredState};
use crate::domain::errors::ErrorKind;
use crate::domain::value_objects::{OperationId, Timestamp, TxStatus};
use async_trait::async_trait;
use ethers::types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Error type for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Failed to serialize a record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Failed to deserialize a stored record.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Storage could not be read or written.
    #[error("io error: {0}")]
    Io(String),
}

impl LedgerError {
    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a deserialization error.
    #[must_use]
    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self::Deserialization(msg.into())
    }

    /// Creates an io error.
    #[must_use]
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// One state transition of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Idempotency key.
    pub operation_id: OperationId,
    /// Status after the transition.
    pub status: TxStatus,
    /// When the transition happened.
    pub timestamp: Timestamp,
    /// Hash of the latest broadcast.
    pub submitted_hash: Option<H256>,
    /// Nonce once one was assigned.
    #[serde(default)]
    pub nonce: Option<U256>,
    /// Gas price of the latest broadcast.
    #[serde(default)]
    pub gas_price: Option<U256>,
    /// Hashes replaced by gas bumps, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_hashes: Vec<H256>,
    /// Failure classification.
    #[serde(default)]
    pub error_kind: Option<ErrorKind>,
}

impl LedgerRecord {
    /// Captures the current state of an operation.
    #[must_use]
    pub fn from_operation(op: &PendingOperation) -> Self {
        Self {
            operation_id: op.operation_id().clone(),
            status: op.status(),
            timestamp: op.updated_at(),
            submitted_hash: op.submitted_hash(),
            nonce: op.submitted_hash().map(|_| op.nonce()),
            gas_price: op.submitted_hash().map(|_| op.gas_price()),
            previous_hashes: op.previous_hashes().to_vec(),
            error_kind: op.error_kind(),
        }
    }

    /// The state to overlay onto a rebuilt operation.
    #[must_use]
    pub fn restored_state(&self) -> RestoredState {
        RestoredState {
            status: self.status,
            submitted_hash: self.submitted_hash,
            nonce: self.nonce,
            gas_price: self.gas_price,
            previous_hashes: self.previous_hashes.clone(),
            error_kind: self.error_kind,
        }
    }
}

impl fmt::Display for LedgerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} at {}", self.operation_id, self.status, self.timestamp)
    }
}

/// Reduces a record stream to the latest record per operation id.
#[must_use]
pub fn replay(records: impl IntoIterator<Item = LedgerRecord>) -> HashMap<OperationId, LedgerRecord> {
    let mut latest = HashMap::new();
    for record in records {
        latest.insert(record.operation_id.clone(), record);
    }
    latest
}

/// Append-only storage of transition records.
///
/// Records can only be added, never modified or deleted.
#[async_trait]
pub trait OperationLedger: Send + Sync + fmt::Debug {
    /// Appends a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    async fn append(&self, record: LedgerRecord) -> LedgerResult<()>;

    /// Returns every record in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if records cannot be read.
    async fn records(&self) -> LedgerResult<Vec<LedgerRecord>>;

    /// Returns the records of one operation in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if records cannot be read.
    async fn records_for(&self, operation_id: &OperationId) -> LedgerResult<Vec<LedgerRecord>> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .filter(|r| &r.operation_id == operation_id)
            .collect())
    }
}

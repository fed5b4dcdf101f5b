//! # Pending Operation Aggregate
//!
//! A contract call on its way to the chain, keyed by a caller-supplied
//! idempotency key.
//!
//! Created in [`TxStatus::Built`] by the transaction builder and owned by
//! the orchestrator from then on. Every status change goes through
//! [`TxStatus::can_transition_to`], so a confirmed or failed operation can
//! never move again.
//!
//! # Examples
//!
//! ```
//! use blockdag_orchestrator::domain::entities::{ContractRef, PendingOperation};
//! use blockdag_orchestrator::domain::value_objects::{OperationId, TxStatus, UnsignedTransaction};
//! use ethers::types::{Address, Bytes, H256, U256};
//!
//! let tx = UnsignedTransaction {
//!     from: Address::repeat_byte(1),
//!     to: Address::repeat_byte(2),
//!     data: Bytes::default(),
//!     value: U256::zero(),
//!     gas_limit: U256::from(150_000u64),
//!     gas_price: U256::from(20_000_000_000u64),
//!     nonce: U256::from(7u64),
//!     chain_id: 1043,
//! };
//! let contract = ContractRef { name: "token".into(), address: tx.to };
//! let mut op = PendingOperation::new(OperationId::new("mine-1"), contract, "mine", vec![], tx);
//!
//! op.mark_submitted(U256::from(7u64), H256::repeat_byte(9)).unwrap();
//! assert_eq!(op.status(), TxStatus::Submitted);
//! assert_eq!(op.attempt_count(), 1);
//! ```

use crate::domain::entities::contract_descriptor::ContractRef;
use crate::domain::errors::{DomainError, DomainResult, ErrorKind};
use crate::domain::value_objects::{
    OperationId, Receipt, Timestamp, TxStatus, UnsignedTransaction,
};
use ethers::abi::Token;
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Why an operation ended up failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    /// Classification.
    pub kind: ErrorKind,
    /// Underlying reason as reported by the node or signer.
    pub reason: String,
}

/// Persisted state of an operation, as replayed from the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoredState {
    /// Last recorded status.
    pub status: TxStatus,
    /// Hash of the latest broadcast.
    pub submitted_hash: Option<H256>,
    /// Nonce the transaction was broadcast with.
    pub nonce: Option<U256>,
    /// Gas price of the latest broadcast.
    pub gas_price: Option<U256>,
    /// Hashes replaced by gas bumps, oldest first.
    pub previous_hashes: Vec<H256>,
    /// Failure classification.
    pub error_kind: Option<ErrorKind>,
}

/// A contract call tracked through its lifecycle.
///
/// # Invariants
///
/// - Status only moves along [`TxStatus::can_transition_to`]
/// - `attempt_count` counts successful broadcasts
/// - Hashes replaced by a gas bump stay in `previous_hashes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingOperation {
    operation_id: OperationId,
    contract: ContractRef,
    function_name: String,
    #[serde(serialize_with = "serialize_tokens")]
    arguments: Vec<Token>,
    tx: UnsignedTransaction,
    status: TxStatus,
    submitted_hash: Option<H256>,
    previous_hashes: Vec<H256>,
    attempt_count: u32,
    failure: Option<OperationFailure>,
    block_number: Option<u64>,
    gas_used: Option<U256>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

fn serialize_tokens<S: Serializer>(tokens: &[Token], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(tokens.iter().map(ToString::to_string))
}

impl PendingOperation {
    /// Creates an operation in status `Built`.
    #[must_use]
    pub fn new(
        operation_id: OperationId,
        contract: ContractRef,
        function_name: impl Into<String>,
        arguments: Vec<Token>,
        tx: UnsignedTransaction,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            operation_id,
            contract,
            function_name: function_name.into(),
            arguments,
            tx,
            status: TxStatus::Built,
            submitted_hash: None,
            previous_hashes: Vec::new(),
            attempt_count: 0,
            failure: None,
            block_number: None,
            gas_used: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overlays a persisted ledger state onto a freshly built operation.
    ///
    /// Used when an operation id is found in a replayed ledger. Bypasses
    /// transition checks, the ledger being the source of truth.
    #[must_use]
    pub fn from_ledger(mut self, state: RestoredState) -> Self {
        self.status = state.status;
        self.submitted_hash = state.submitted_hash;
        if let Some(nonce) = state.nonce {
            self.tx.nonce = nonce;
        }
        if let Some(gas_price) = state.gas_price {
            self.tx.gas_price = gas_price;
        }
        self.previous_hashes = state.previous_hashes;
        self.failure = state.error_kind.map(|kind| OperationFailure {
            kind,
            reason: "restored from ledger".to_string(),
        });
        if self.submitted_hash.is_some() {
            let broadcasts = u32::try_from(self.previous_hashes.len())
                .unwrap_or(u32::MAX)
                .saturating_add(1);
            self.attempt_count = self.attempt_count.max(broadcasts);
        }
        self.updated_at = Timestamp::now();
        self
    }

    fn transition_to(&mut self, target: TxStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    // ========== Accessors ==========

    /// Returns the idempotency key.
    #[inline]
    #[must_use]
    pub fn operation_id(&self) -> &OperationId {
        &self.operation_id
    }

    /// Returns the target contract.
    #[inline]
    #[must_use]
    pub fn contract(&self) -> &ContractRef {
        &self.contract
    }

    /// Returns the called function name.
    #[inline]
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Returns the call arguments.
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[Token] {
        &self.arguments
    }

    /// Returns the transaction request as currently populated.
    #[inline]
    #[must_use]
    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.tx
    }

    /// Returns the signing account.
    #[inline]
    #[must_use]
    pub fn signer(&self) -> Address {
        self.tx.from
    }

    /// Returns the encoded calldata.
    #[inline]
    #[must_use]
    pub fn calldata(&self) -> &Bytes {
        &self.tx.data
    }

    /// Returns the value transferred, in wei.
    #[inline]
    #[must_use]
    pub fn value_transferred(&self) -> U256 {
        self.tx.value
    }

    /// Returns the gas limit.
    #[inline]
    #[must_use]
    pub fn gas_limit(&self) -> U256 {
        self.tx.gas_limit
    }

    /// Returns the gas price of the latest broadcast.
    #[inline]
    #[must_use]
    pub fn gas_price(&self) -> U256 {
        self.tx.gas_price
    }

    /// Returns the nonce.
    #[inline]
    #[must_use]
    pub fn nonce(&self) -> U256 {
        self.tx.nonce
    }

    /// Returns the chain id.
    #[inline]
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.tx.chain_id
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Returns the hash of the latest broadcast, if any.
    #[inline]
    #[must_use]
    pub fn submitted_hash(&self) -> Option<H256> {
        self.submitted_hash
    }

    /// Returns hashes replaced by gas bumps, oldest first.
    #[inline]
    #[must_use]
    pub fn previous_hashes(&self) -> &[H256] {
        &self.previous_hashes
    }

    /// Returns every broadcast hash, current first.
    #[must_use]
    pub fn all_hashes(&self) -> Vec<H256> {
        self.submitted_hash
            .into_iter()
            .chain(self.previous_hashes.iter().rev().copied())
            .collect()
    }

    /// Returns the number of successful broadcasts.
    #[inline]
    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Returns the failure, if failed.
    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&OperationFailure> {
        self.failure.as_ref()
    }

    /// Returns the failure kind, if failed.
    #[inline]
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    /// Returns the block the transaction was included in.
    #[inline]
    #[must_use]
    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }

    /// Returns the gas used by the mined transaction.
    #[inline]
    #[must_use]
    pub fn gas_used(&self) -> Option<U256> {
        self.gas_used
    }

    /// Returns when this operation was built.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when this operation last changed.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the operation is confirmed or failed.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns the request to sign with a different nonce.
    #[must_use]
    pub fn unsigned_with_nonce(&self, nonce: U256) -> UnsignedTransaction {
        UnsignedTransaction {
            nonce,
            ..self.tx.clone()
        }
    }

    /// Returns the request to sign with a different gas price.
    #[must_use]
    pub fn unsigned_with_gas_price(&self, gas_price: U256) -> UnsignedTransaction {
        UnsignedTransaction {
            gas_price,
            ..self.tx.clone()
        }
    }

    // ========== State Transitions ==========

    /// Records the first successful broadcast.
    ///
    /// Transitions: Built → Submitted
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidStateTransition`] if not `Built`.
    pub fn mark_submitted(&mut self, nonce: U256, hash: H256) -> DomainResult<()> {
        if self.status != TxStatus::Built {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: TxStatus::Submitted,
            });
        }
        self.transition_to(TxStatus::Submitted)?;
        self.tx.nonce = nonce;
        self.submitted_hash = Some(hash);
        self.attempt_count = self.attempt_count.saturating_add(1);
        Ok(())
    }

    /// Records a replacement broadcast at a higher gas price.
    ///
    /// Transitions: Submitted → Submitted, TimedOut → Submitted
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidStateForResubmission`] if no
    /// transaction is in flight.
    pub fn mark_resubmitted(&mut self, gas_price: U256, hash: H256) -> DomainResult<()> {
        if !self.status.is_in_flight() {
            return Err(DomainError::InvalidStateForResubmission {
                operation_id: self.operation_id.to_string(),
                status: self.status,
            });
        }
        self.transition_to(TxStatus::Submitted)?;
        if let Some(previous) = self.submitted_hash.replace(hash)
            && previous != hash
        {
            self.previous_hashes.push(previous);
        }
        self.tx.gas_price = gas_price;
        self.attempt_count = self.attempt_count.saturating_add(1);
        Ok(())
    }

    /// Applies a mined receipt: success confirms, revert fails.
    ///
    /// The receipt hash becomes the current hash, since a replaced
    /// transaction may be the one that landed.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidStateTransition`] if nothing is in flight.
    pub fn apply_receipt(&mut self, receipt: &Receipt) -> DomainResult<()> {
        let target = if receipt.success {
            TxStatus::Confirmed
        } else {
            TxStatus::Failed
        };
        self.transition_to(target)?;
        if self.submitted_hash != Some(receipt.tx_hash) {
            if let Some(current) = self.submitted_hash.replace(receipt.tx_hash) {
                self.previous_hashes.push(current);
            }
            self.previous_hashes.retain(|h| *h != receipt.tx_hash);
        }
        self.block_number = receipt.block_number;
        self.gas_used = receipt.gas_used;
        if !receipt.success {
            self.failure = Some(OperationFailure {
                kind: ErrorKind::Reverted,
                reason: format!("transaction {:?} reverted", receipt.tx_hash),
            });
        }
        Ok(())
    }

    /// Marks the operation failed.
    ///
    /// Transitions: Built/Submitted/TimedOut → Failed
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidStateTransition`] if already terminal.
    pub fn mark_failed(&mut self, kind: ErrorKind, reason: impl Into<String>) -> DomainResult<()> {
        self.transition_to(TxStatus::Failed)?;
        self.failure = Some(OperationFailure {
            kind,
            reason: reason.into(),
        });
        Ok(())
    }

    /// Marks the wait for a receipt as elapsed.
    ///
    /// Transitions: Submitted → TimedOut. A no-op when already timed out.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidStateTransition`] from any other status.
    pub fn mark_timed_out(&mut self) -> DomainResult<()> {
        if self.status == TxStatus::TimedOut {
            return Ok(());
        }
        self.transition_to(TxStatus::TimedOut)
    }
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Operation({}: {}.{} nonce={} status={})",
            self.operation_id, self.contract.name, self.function_name, self.tx.nonce, self.status
        )
    }
}

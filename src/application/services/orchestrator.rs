//! # Transaction Orchestrator
//!
//! Drives [`PendingOperation`]s from `Built` to a terminal status.
//!
//! # Guarantees
//!
//! - **Idempotency**: an operation id that is submitted, confirmed or timed
//!   out is never broadcast again by [`submit`](TransactionOrchestrator::submit).
//!   Ledger replay extends this across restarts.
//! - **Nonce ordering**: nonce assignment, signing and broadcast for one
//!   account run under that account's lock. Confirmation waits never hold it.
//! - **Durability**: every transition is appended to the
//!   [`OperationLedger`] before the caller sees it.
//!
//! # Examples
//!
//! ```ignore
//! let orchestrator = TransactionOrchestrator::new(chain, ledger, OrchestratorConfig::default());
//! orchestrator.restore().await?;
//!
//! let op = builder.build(&token, "mine", vec![], BuildOptions::new("mine-1")).await?;
//! let op = orchestrator.submit(op).await?;
//! let op = orchestrator.await_confirmation(&op, Duration::from_secs(120)).await?;
//! ```

use crate::application::error::ApplicationResult;
use crate::application::services::nonce_manager::NonceManager;
use crate::application::services::retry::{RetryPolicy, retry_chain};
use crate::domain::entities::PendingOperation;
use crate::domain::errors::{DomainError, ErrorKind};
use crate::domain::value_objects::{
    OperationId, Receipt, TxStatus, UnsignedTransaction, bump_gas_price,
};
use crate::infrastructure::chain::{ChainClient, ChainError, ChainResult};
use crate::infrastructure::persistence::{LedgerRecord, OperationLedger, replay};
use ethers::types::{H256, U256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, instrument, warn};

/// Orchestrator tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Broadcast attempts with a fresh nonce before giving up.
    pub max_nonce_attempts: u32,
    /// Interval between receipt polls.
    pub poll_interval: Duration,
    /// Default confirmation window for callers that do not pick one.
    pub confirmation_timeout: Duration,
    /// Backoff for transient RPC failures.
    pub retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_nonce_attempts: 3,
            poll_interval: Duration::from_secs(2),
            confirmation_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

/// Lifecycle engine for pending operations.
#[derive(Debug)]
pub struct TransactionOrchestrator {
    chain: Arc<dyn ChainClient>,
    ledger: Arc<dyn OperationLedger>,
    config: OrchestratorConfig,
    nonces: NonceManager,
    operations: RwLock<HashMap<OperationId, PendingOperation>>,
    restored: RwLock<HashMap<OperationId, LedgerRecord>>,
}

impl TransactionOrchestrator {
    /// Creates an orchestrator with no known operations.
    #[must_use]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        ledger: Arc<dyn OperationLedger>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            chain,
            ledger,
            config,
            nonces: NonceManager::new(),
            operations: RwLock::new(HashMap::new()),
            restored: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Replays the ledger so ids submitted by a previous run short-circuit.
    ///
    /// Returns the number of operation ids found.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if the records cannot be read.
    pub async fn restore(&self) -> ApplicationResult<usize> {
        let latest = replay(self.ledger.records().await?);
        let count = latest.len();
        let in_flight = latest.values().filter(|r| r.status.is_in_flight()).count();
        *self.restored.write().await = latest;
        info!(operations = count, in_flight, "restored operation ledger");
        Ok(count)
    }

    /// Returns the snapshot of one operation.
    pub async fn get(&self, operation_id: &OperationId) -> Option<PendingOperation> {
        self.operations.read().await.get(operation_id).cloned()
    }

    /// Returns snapshots of every operation, oldest first.
    pub async fn operations(&self) -> Vec<PendingOperation> {
        let mut ops: Vec<_> = self.operations.read().await.values().cloned().collect();
        ops.sort_by_key(|op| (op.created_at(), op.operation_id().clone()));
        ops
    }

    /// Signs and broadcasts a built operation.
    ///
    /// An id already submitted, confirmed or timed out returns the
    /// existing entry unchanged. A failed id may be submitted again.
    /// Broadcast failures are recorded on the returned operation rather
    /// than returned as errors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if `op` is not `Built`, or a
    /// ledger error if the transition cannot be persisted.
    #[instrument(skip(self, op), fields(operation_id = %op.operation_id()))]
    pub async fn submit(&self, op: PendingOperation) -> ApplicationResult<PendingOperation> {
        if let Some(existing) = self.existing(&op).await {
            debug!(status = %existing.status(), "already submitted, returning existing entry");
            return Ok(existing);
        }
        if op.status() != TxStatus::Built {
            return Err(DomainError::InvalidStateTransition {
                from: op.status(),
                to: TxStatus::Submitted,
            }
            .into());
        }

        let mut account = self.nonces.lock(op.signer()).await;

        // A concurrent caller may have won the lock with the same id.
        if let Some(existing) = self.existing(&op).await {
            return Ok(existing);
        }

        let mut op = op;
        let mut nonce = account.assign(op.nonce());
        let mut attempt = 0u32;

        loop {
            attempt = attempt.saturating_add(1);
            let tx = op.unsigned_with_nonce(nonce);

            match self.sign_and_broadcast(&tx).await {
                Ok(hash) => {
                    op.mark_submitted(nonce, hash)?;
                    account.advance_past(nonce);
                    info!(nonce = %nonce, tx_hash = ?hash, attempt, "transaction submitted");
                    break;
                }
                Err(err) if err.is_stale_nonce() => {
                    if attempt >= self.config.max_nonce_attempts {
                        warn!(nonce = %nonce, attempt, error = %err, "nonce attempts exhausted");
                        op.mark_failed(
                            ErrorKind::NonceExhausted,
                            format!("{} after {} attempts", err, attempt),
                        )?;
                        break;
                    }
                    let next = nonce.saturating_add(U256::one());
                    nonce = match self.pending_nonce(&tx).await {
                        Ok(fresh) if fresh > next => fresh,
                        Ok(_) => next,
                        Err(e) => {
                            warn!(error = %e, "could not refresh nonce, stepping past stale one");
                            next
                        }
                    };
                    warn!(stale = %tx.nonce, retry_with = %nonce, attempt, "stale nonce, retrying");
                }
                Err(err) => {
                    let kind = match err {
                        ChainError::RpcUnavailable(_) => ErrorKind::RpcUnavailable,
                        _ => ErrorKind::SubmissionRejected,
                    };
                    warn!(nonce = %nonce, kind = %kind, error = %err, "submission failed");
                    op.mark_failed(kind, err.to_string())?;
                    break;
                }
            }
        }

        self.operations
            .write()
            .await
            .insert(op.operation_id().clone(), op.clone());
        self.record(&op).await?;
        drop(account);

        Ok(op)
    }

    /// Polls for a receipt until the operation confirms, reverts or
    /// `timeout` elapses.
    ///
    /// Every hash the operation has broadcast is checked, current first.
    /// A zero timeout marks the operation timed out without polling.
    /// Terminal operations are returned as they are.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the operation was never
    /// submitted, or a ledger error.
    #[instrument(skip(self, op), fields(operation_id = %op.operation_id()))]
    pub async fn await_confirmation(
        &self,
        op: &PendingOperation,
        timeout: Duration,
    ) -> ApplicationResult<PendingOperation> {
        let mut current = self.snapshot_or(op).await;
        if current.status() == TxStatus::Built {
            return Err(DomainError::InvalidStateTransition {
                from: TxStatus::Built,
                to: TxStatus::Confirmed,
            }
            .into());
        }
        if current.is_terminal() {
            return Ok(current);
        }
        if timeout.is_zero() {
            return self.time_out(current).await;
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(receipt) = self.find_receipt(&current).await {
                return self.settle(current, &receipt).await;
            }

            let now = Instant::now();
            if now >= deadline {
                return self.time_out(current).await;
            }
            sleep(self.config.poll_interval.min(deadline - now)).await;

            // Picks up hashes added by a concurrent gas bump.
            current = self.snapshot_or(&current).await;
            if current.is_terminal() {
                return Ok(current);
            }
        }
    }

    /// Checks once for a receipt of an in-flight operation.
    ///
    /// Without a receipt the operation is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOperation` for an unknown id, or a ledger error.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, operation_id: &OperationId) -> ApplicationResult<PendingOperation> {
        let current = self
            .get(operation_id)
            .await
            .ok_or_else(|| DomainError::UnknownOperation(operation_id.to_string()))?;
        if !current.status().is_in_flight() {
            return Ok(current);
        }
        match self.find_receipt(&current).await {
            Some(receipt) => self.settle(current, &receipt).await,
            None => Ok(current),
        }
    }

    /// Replaces an in-flight transaction with the same nonce and a higher
    /// gas price.
    ///
    /// A rejected replacement leaves the operation as it was; the original
    /// transaction is still pending.
    ///
    /// # Errors
    ///
    /// - `InvalidStateForResubmission` unless submitted or timed out
    /// - `InvalidGasBump` for a factor that is not a finite number above one
    /// - the chain error if signing or broadcast fails
    #[instrument(skip(self, op), fields(operation_id = %op.operation_id()))]
    pub async fn resubmit_with_higher_gas(
        &self,
        op: &PendingOperation,
        bump_factor: f64,
    ) -> ApplicationResult<PendingOperation> {
        let current = self.snapshot_or(op).await;
        if !current.status().is_in_flight() {
            return Err(DomainError::InvalidStateForResubmission {
                operation_id: current.operation_id().to_string(),
                status: current.status(),
            }
            .into());
        }
        let gas_price = bump_gas_price(current.gas_price(), bump_factor)?;

        let account = self.nonces.lock(current.signer()).await;
        let tx = current.unsigned_with_gas_price(gas_price);
        let hash = self.sign_and_broadcast(&tx).await.inspect_err(|e| {
            warn!(error = %e, gas_price = %gas_price, "replacement rejected");
        })?;

        let updated = {
            let mut ops = self.operations.write().await;
            let entry = ops
                .entry(current.operation_id().clone())
                .or_insert_with(|| current.clone());
            entry.mark_resubmitted(gas_price, hash)?;
            entry.clone()
        };
        self.record(&updated).await?;
        drop(account);

        info!(
            nonce = %updated.nonce(),
            tx_hash = ?hash,
            gas_price = %gas_price,
            attempt = updated.attempt_count(),
            "transaction resubmitted with higher gas"
        );
        Ok(updated)
    }

    // ========== Internals ==========

    /// Entry that makes a new submission of `op` unnecessary.
    async fn existing(&self, op: &PendingOperation) -> Option<PendingOperation> {
        let current = self.resolve(op).await?;
        current.status().short_circuits_submit().then_some(current)
    }

    /// Tracked state of `op`, falling back to its replayed ledger record.
    ///
    /// A restored operation is tracked from then on.
    async fn resolve(&self, op: &PendingOperation) -> Option<PendingOperation> {
        let id = op.operation_id();
        if let Some(tracked) = self.get(id).await {
            return Some(tracked);
        }

        let record = self.restored.read().await.get(id).cloned()?;
        let restored = op.clone().from_ledger(record.restored_state());
        info!(operation_id = %id, status = %record.status, "operation found in ledger");
        Some(
            self.operations
                .write()
                .await
                .entry(id.clone())
                .or_insert(restored)
                .clone(),
        )
    }

    async fn snapshot_or(&self, op: &PendingOperation) -> PendingOperation {
        self.resolve(op).await.unwrap_or_else(|| op.clone())
    }

    async fn sign_and_broadcast(&self, tx: &UnsignedTransaction) -> ChainResult<H256> {
        let signed = self.chain.sign(tx).await?;
        match retry_chain(&self.config.retry, "eth_sendRawTransaction", || {
            self.chain.broadcast(&signed)
        })
        .await
        {
            Ok(hash) => Ok(hash),
            Err(err) if err.is_already_known() => {
                debug!(tx_hash = ?signed.hash, "node already knows transaction");
                Ok(signed.hash)
            }
            Err(err) => Err(err),
        }
    }

    async fn pending_nonce(&self, tx: &UnsignedTransaction) -> ChainResult<U256> {
        retry_chain(&self.config.retry, "eth_getTransactionCount", || {
            self.chain.get_nonce(tx.from)
        })
        .await
    }

    async fn find_receipt(&self, op: &PendingOperation) -> Option<Receipt> {
        for hash in op.all_hashes() {
            match self.chain.get_receipt(hash).await {
                Ok(Some(receipt)) => return Some(receipt),
                Ok(None) => {}
                Err(e) => warn!(tx_hash = ?hash, error = %e, "receipt query failed"),
            }
        }
        None
    }

    async fn settle(
        &self,
        current: PendingOperation,
        receipt: &Receipt,
    ) -> ApplicationResult<PendingOperation> {
        let (settled, changed) = {
            let mut ops = self.operations.write().await;
            let entry = ops
                .entry(current.operation_id().clone())
                .or_insert(current);
            if entry.is_terminal() {
                (entry.clone(), false)
            } else {
                entry.apply_receipt(receipt)?;
                (entry.clone(), true)
            }
        };
        if !changed {
            return Ok(settled);
        }
        self.record(&settled).await?;

        if receipt.success {
            info!(
                tx_hash = ?receipt.tx_hash,
                block = ?receipt.block_number,
                "transaction confirmed"
            );
        } else {
            warn!(tx_hash = ?receipt.tx_hash, "transaction reverted");
        }
        Ok(settled)
    }

    async fn time_out(&self, current: PendingOperation) -> ApplicationResult<PendingOperation> {
        let (timed_out, changed) = {
            let mut ops = self.operations.write().await;
            let entry = ops
                .entry(current.operation_id().clone())
                .or_insert(current);
            match entry.status() {
                TxStatus::Submitted => {
                    entry.mark_timed_out()?;
                    (entry.clone(), true)
                }
                _ => (entry.clone(), false),
            }
        };
        if changed {
            self.record(&timed_out).await?;
            warn!(
                tx_hash = ?timed_out.submitted_hash(),
                "no receipt within the confirmation window"
            );
        }
        Ok(timed_out)
    }

    async fn record(&self, op: &PendingOperation) -> ApplicationResult<()> {
        self.ledger
            .append(LedgerRecord::from_operation(op))
            .await
            .inspect_err(|e| {
                error!(operation_id = %op.operation_id(), status = %op.status(), error = %e, "ledger append failed");
            })?;
        Ok(())
    }
}

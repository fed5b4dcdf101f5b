//! # In-Memory Ledger
//!
//! [`OperationLedger`] held in memory, for tests and ephemeral runs.

use crate::infrastructure::persistence::ledger::{LedgerRecord, LedgerResult, OperationLedger};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`OperationLedger`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    storage: Arc<RwLock<Vec<LedgerRecord>>>,
}

impl InMemoryLedger {
    /// Creates a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage
            .try_read()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    /// Returns true if no record was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OperationLedger for InMemoryLedger {
    async fn append(&self, record: LedgerRecord) -> LedgerResult<()> {
        self.storage.write().await.push(record);
        Ok(())
    }

    async fn records(&self) -> LedgerResult<Vec<LedgerRecord>> {
        Ok(self.storage.read().await.clone())
    }
}

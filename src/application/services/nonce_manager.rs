//! # Nonce Manager
//!
//! One critical section per signing account.
//!
//! The orchestrator holds an account's guard across nonce assignment,
//! signing and broadcast, so two submissions for the same account can
//! never pick the same nonce. Different accounts do not contend.

use ethers::types::{Address, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Nonce tracked for one account.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccountNonce {
    next: Option<U256>,
}

impl AccountNonce {
    /// Next nonce this process expects to use, if any was used yet.
    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<U256> {
        self.next
    }

    /// Picks the nonce for a submission: never below the tracked one.
    #[must_use]
    pub fn assign(&self, requested: U256) -> U256 {
        match self.next {
            Some(next) if next > requested => next,
            _ => requested,
        }
    }

    /// Records that `used` was accepted by the node.
    pub fn advance_past(&mut self, used: U256) {
        let candidate = used.saturating_add(U256::one());
        if self.next.is_none_or(|next| candidate > next) {
            self.next = Some(candidate);
        }
    }
}

/// Per-account locks.
#[derive(Debug, Default)]
pub struct NonceManager {
    accounts: Mutex<HashMap<Address, Arc<Mutex<AccountNonce>>>>,
}

impl NonceManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `account`.
    pub async fn lock(&self, account: Address) -> OwnedMutexGuard<AccountNonce> {
        let slot = {
            let mut accounts = self.accounts.lock().await;
            Arc::clone(accounts.entry(account).or_default())
        };
        slot.lock_owned().await
    }

    /// Returns the tracked next nonce of `account` without waiting for
    /// in-flight submissions.
    pub async fn peek(&self, account: Address) -> Option<U256> {
        let slot = self.accounts.lock().await.get(&account).cloned()?;
        slot.try_lock().ok().and_then(|state| state.next())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn assign_never_goes_below_tracked() {
        let mut state = AccountNonce::default();
        assert_eq!(state.assign(U256::from(4u64)), U256::from(4u64));

        state.advance_past(U256::from(4u64));
        assert_eq!(state.assign(U256::from(2u64)), U256::from(5u64));
        assert_eq!(state.assign(U256::from(9u64)), U256::from(9u64));
    }

    #[test]
    fn advance_is_monotonic() {
        let mut state = AccountNonce::default();
        state.advance_past(U256::from(7u64));
        state.advance_past(U256::from(3u64));
        assert_eq!(state.next(), Some(U256::from(8u64)));
    }

    #[tokio::test]
    async fn same_account_is_serialized() {
        let manager = Arc::new(NonceManager::new());
        let account = Address::repeat_byte(1);

        let guard = manager.lock(account).await;
        let contender = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                let mut state = manager.lock(account).await;
                state.advance_past(U256::from(1u64));
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        drop(guard);
        contender.await.unwrap();

        assert_eq!(manager.peek(account).await, Some(U256::from(2u64)));
    }

    #[tokio::test]
    async fn accounts_do_not_contend() {
        let manager = NonceManager::new();
        let _first = manager.lock(Address::repeat_byte(1)).await;
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            manager.lock(Address::repeat_byte(2)),
        )
        .await;
        assert!(second.is_ok());
    }
}

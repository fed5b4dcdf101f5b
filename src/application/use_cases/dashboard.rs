//! # Dashboard Use Case
//!
//! Read-only snapshot of one account across the BlockDAG contracts.
//!
//! Sections are read concurrently. A section that fails is left empty and
//! recorded in [`Dashboard::errors`]; the other sections are unaffected.

use crate::application::dto::{
    AccountInfo, DailySpending, GlobalMiningStats, Miner, PresaleStats, PurchaseInfo, TokenStats,
    UserMiningStats, WalletInfo,
};
use crate::application::error::ApplicationResult;
use crate::application::use_cases::contract_operations::ContractOperations;
use crate::domain::errors::ErrorKind;
use crate::domain::value_objects::Timestamp;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Node-level figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Chain id the client signs for.
    pub chain_id: u64,
    /// Latest block.
    pub block_number: u64,
    /// Native balance of the account, in wei.
    pub native_balance: U256,
}

/// A section that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionError {
    /// Section name.
    pub section: String,
    /// Failure classification.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
}

impl fmt::Display for SectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.section, self.kind, self.message)
    }
}

/// Snapshot of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Account the snapshot is for.
    pub account: Address,
    /// When the snapshot was taken.
    pub collected_at: Timestamp,
    /// Chain id, block and native balance.
    pub network: Option<NetworkInfo>,
    /// Token balances.
    pub account_info: Option<AccountInfo>,
    /// Token-wide figures.
    pub token_stats: Option<TokenStats>,
    /// Mining figures of the account.
    pub mining_stats: Option<UserMiningStats>,
    /// Hardware miners of the account.
    pub miners: Option<Vec<Miner>>,
    /// Miner counts across all users.
    pub global_mining: Option<GlobalMiningStats>,
    /// Presale progress.
    pub presale_stats: Option<PresaleStats>,
    /// Presale purchase of the account.
    pub purchase_info: Option<PurchaseInfo>,
    /// Wallet registration.
    pub wallet_info: Option<WalletInfo>,
    /// Daily spending window.
    pub daily_spending: Option<DailySpending>,
    /// Sections that failed.
    pub errors: Vec<SectionError>,
}

impl Dashboard {
    /// Reads every section for `account`.
    pub async fn collect(operations: &ContractOperations, account: Address) -> Self {
        let (
            network,
            account_info,
            token_stats,
            mining_stats,
            miners,
            global_mining,
            presale_stats,
            purchase_info,
            wallet_info,
            daily_spending,
        ) = tokio::join!(
            Self::network(operations, account),
            operations.account_info(account),
            operations.token_stats(),
            operations.user_mining_stats(account),
            operations.user_miners(account),
            operations.global_mining_stats(),
            operations.presale_stats(),
            operations.purchase_info(account),
            operations.wallet_info(account),
            operations.daily_spending(account),
        );

        let mut errors = Vec::new();
        let dashboard = Self {
            account,
            collected_at: Timestamp::now(),
            network: section(&mut errors, "network", network),
            account_info: section(&mut errors, "account_info", account_info),
            token_stats: section(&mut errors, "token_stats", token_stats),
            mining_stats: section(&mut errors, "mining_stats", mining_stats),
            miners: section(&mut errors, "miners", miners),
            global_mining: section(&mut errors, "global_mining", global_mining),
            presale_stats: section(&mut errors, "presale_stats", presale_stats),
            purchase_info: section(&mut errors, "purchase_info", purchase_info),
            wallet_info: section(&mut errors, "wallet_info", wallet_info),
            daily_spending: section(&mut errors, "daily_spending", daily_spending),
            errors,
        };
        debug!(
            account = ?account,
            failed_sections = dashboard.errors.len(),
            "dashboard collected"
        );
        dashboard
    }

    /// Returns true if every section was read.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    async fn network(
        operations: &ContractOperations,
        account: Address,
    ) -> ApplicationResult<NetworkInfo> {
        Ok(NetworkInfo {
            chain_id: operations.chain().chain_id(),
            block_number: operations.block_number().await?,
            native_balance: operations.native_balance(account).await?,
        })
    }
}

fn section<T>(
    errors: &mut Vec<SectionError>,
    name: &str,
    result: ApplicationResult<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(section = name, error = %e, "dashboard section failed");
            errors.push(SectionError {
                section: name.to_string(),
                kind: e.kind(),
                message: e.to_string(),
            });
            None
        }
    }
}

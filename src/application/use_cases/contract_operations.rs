//! # Contract Operations Use Case
//!
//! Typed calls against the BlockDAG contracts.
//!
//! Every write runs the same pipeline: resolve the contract, build the
//! call, submit it under the caller's operation id and wait for a receipt.
//! Reads go straight to the chain client with retry on transient failures.

use crate::application::dto::{
    AccountInfo, DailySpending, GlobalMiningStats, Miner, PresaleStats, PurchaseInfo, TokenStats,
    UserMiningStats, WalletInfo,
};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::{
    BuildOptions, ContractRegistry, RetryPolicy, TransactionBuilder, TransactionOrchestrator,
    retry_chain,
};
use crate::domain::entities::PendingOperation;
use crate::domain::value_objects::{OperationId, TxStatus};
use crate::infrastructure::chain::ChainClient;
use ethers::abi::Token;
use ethers::types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Logical name of the BDAG token contract.
pub const TOKEN: &str = "token";
/// Logical name of the mining contract.
pub const MINING: &str = "mining";
/// Logical name of the presale contract.
pub const PRESALE: &str = "presale";
/// Logical name of the wallet contract.
pub const WALLET: &str = "wallet";

/// Typed front end over builder and orchestrator.
#[derive(Debug, Clone)]
pub struct ContractOperations {
    registry: Arc<ContractRegistry>,
    chain: Arc<dyn ChainClient>,
    builder: Arc<TransactionBuilder>,
    orchestrator: Arc<TransactionOrchestrator>,
    confirmation_timeout: Duration,
    retry: RetryPolicy,
}

impl ContractOperations {
    /// Creates the use case, waiting as long as the orchestrator's
    /// configured confirmation timeout.
    #[must_use]
    pub fn new(
        registry: Arc<ContractRegistry>,
        chain: Arc<dyn ChainClient>,
        builder: Arc<TransactionBuilder>,
        orchestrator: Arc<TransactionOrchestrator>,
    ) -> Self {
        let config = orchestrator.config();
        let confirmation_timeout = config.confirmation_timeout;
        let retry = config.retry.clone();
        Self {
            registry,
            chain,
            builder,
            orchestrator,
            confirmation_timeout,
            retry,
        }
    }

    /// Overrides the confirmation timeout.
    #[must_use]
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Returns the signing account.
    #[inline]
    #[must_use]
    pub fn account(&self) -> Address {
        self.builder.signer()
    }

    /// Returns the chain client.
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    /// Returns the orchestrator.
    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &Arc<TransactionOrchestrator> {
        &self.orchestrator
    }

    // ========== Generic ==========

    /// Builds, submits and awaits one state-changing call.
    ///
    /// The returned operation is confirmed, failed or timed out. Failures
    /// during broadcast or confirmation are carried on the operation.
    ///
    /// # Errors
    ///
    /// Returns registry and builder validation errors, `RpcUnavailable` if
    /// quotes cannot be fetched, or a ledger error.
    #[instrument(skip(self, arguments, options), fields(operation_id = %options.operation_id))]
    pub async fn execute(
        &self,
        contract: &str,
        function: &str,
        arguments: Vec<Token>,
        options: BuildOptions,
    ) -> ApplicationResult<PendingOperation> {
        let descriptor = self.registry.resolve(contract)?;
        let built = self
            .builder
            .build(&descriptor, function, arguments, options)
            .await?;
        let submitted = self.orchestrator.submit(built).await?;
        if submitted.is_terminal() {
            return Ok(submitted);
        }
        self.orchestrator
            .await_confirmation(&submitted, self.confirmation_timeout)
            .await
    }

    /// Replaces every timed-out operation with a higher gas price and
    /// waits for it again.
    ///
    /// Each operation is reconciled first; one whose transaction landed in
    /// the meantime is returned settled and never rebroadcast. Returns one
    /// entry per timed-out operation; a rejected replacement is reported
    /// as its error and leaves the operation timed out.
    pub async fn resubmit_timed_out(
        &self,
        bump_factor: f64,
    ) -> Vec<(OperationId, ApplicationResult<PendingOperation>)> {
        let stuck: Vec<_> = self
            .orchestrator
            .operations()
            .await
            .into_iter()
            .filter(|op| op.status() == TxStatus::TimedOut)
            .map(|op| op.operation_id().clone())
            .collect();

        let mut outcomes = Vec::with_capacity(stuck.len());
        for id in stuck {
            let outcome = self.replace_if_still_stuck(&id, bump_factor).await;
            if let Err(e) = &outcome {
                warn!(operation_id = %id, error = %e, "replacement failed");
            }
            outcomes.push((id, outcome));
        }
        outcomes
    }

    async fn replace_if_still_stuck(
        &self,
        id: &OperationId,
        bump_factor: f64,
    ) -> ApplicationResult<PendingOperation> {
        let current = self.orchestrator.reconcile(id).await?;
        if current.status() != TxStatus::TimedOut {
            info!(operation_id = %id, status = %current.status(), "landed before replacement");
            return Ok(current);
        }
        let replaced = self
            .orchestrator
            .resubmit_with_higher_gas(&current, bump_factor)
            .await?;
        self.orchestrator
            .await_confirmation(&replaced, self.confirmation_timeout)
            .await
    }

    /// Calls a read-only function.
    ///
    /// # Errors
    ///
    /// Returns `UnknownContract` for an unregistered name, or the chain
    /// error once retries are spent.
    pub async fn read(
        &self,
        contract: &str,
        function: &str,
        arguments: &[Token],
    ) -> ApplicationResult<Vec<Token>> {
        let descriptor = self.registry.resolve(contract)?;
        let outputs = retry_chain(&self.retry, function, || {
            self.chain.call_read(&descriptor, function, arguments)
        })
        .await?;
        debug!(contract, function, outputs = outputs.len(), "read call returned");
        Ok(outputs)
    }

    async fn read_one(
        &self,
        contract: &str,
        function: &str,
        arguments: &[Token],
    ) -> ApplicationResult<Token> {
        self.read(contract, function, arguments)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApplicationError::unexpected_output(function, "no values returned"))
    }

    async fn read_uint(
        &self,
        contract: &str,
        function: &str,
        arguments: &[Token],
    ) -> ApplicationResult<U256> {
        match self.read_one(contract, function, arguments).await? {
            Token::Uint(value) => Ok(value),
            other => Err(ApplicationError::unexpected_output(
                function,
                format!("expected uint, found {}", other),
            )),
        }
    }

    async fn read_bool(
        &self,
        contract: &str,
        function: &str,
        arguments: &[Token],
    ) -> ApplicationResult<bool> {
        match self.read_one(contract, function, arguments).await? {
            Token::Bool(value) => Ok(value),
            other => Err(ApplicationError::unexpected_output(
                function,
                format!("expected bool, found {}", other),
            )),
        }
    }

    fn simple(operation_id: impl Into<OperationId>) -> BuildOptions {
        BuildOptions::new(operation_id)
    }

    // ========== Network ==========

    /// Native balance of `account`, in wei.
    pub async fn native_balance(&self, account: Address) -> ApplicationResult<U256> {
        let balance = retry_chain(&self.retry, "eth_getBalance", || {
            self.chain.get_balance(account)
        })
        .await?;
        Ok(balance)
    }

    /// Latest block number.
    pub async fn block_number(&self) -> ApplicationResult<u64> {
        let block = retry_chain(&self.retry, "eth_blockNumber", || {
            self.chain.get_block_number()
        })
        .await?;
        Ok(block)
    }

    // ========== Token ==========

    /// Transfers `amount` tokens to `to`.
    pub async fn transfer(
        &self,
        operation_id: impl Into<OperationId>,
        to: Address,
        amount: U256,
    ) -> ApplicationResult<PendingOperation> {
        let args = vec![Token::Address(to), Token::Uint(amount)];
        self.execute(TOKEN, "transfer", args, Self::simple(operation_id))
            .await
    }

    /// Approves `spender` for `amount` tokens.
    pub async fn approve(
        &self,
        operation_id: impl Into<OperationId>,
        spender: Address,
        amount: U256,
    ) -> ApplicationResult<PendingOperation> {
        let args = vec![Token::Address(spender), Token::Uint(amount)];
        self.execute(TOKEN, "approve", args, Self::simple(operation_id))
            .await
    }

    /// Stakes `amount` tokens.
    pub async fn stake(
        &self,
        operation_id: impl Into<OperationId>,
        amount: U256,
    ) -> ApplicationResult<PendingOperation> {
        self.execute(TOKEN, "stake", vec![Token::Uint(amount)], Self::simple(operation_id))
            .await
    }

    /// Unstakes `amount` tokens.
    pub async fn unstake(
        &self,
        operation_id: impl Into<OperationId>,
        amount: U256,
    ) -> ApplicationResult<PendingOperation> {
        self.execute(TOKEN, "unstake", vec![Token::Uint(amount)], Self::simple(operation_id))
            .await
    }

    /// Claims accrued staking rewards.
    pub async fn claim_staking_rewards(
        &self,
        operation_id: impl Into<OperationId>,
    ) -> ApplicationResult<PendingOperation> {
        self.execute(TOKEN, "claimStakingRewards", vec![], Self::simple(operation_id))
            .await
    }

    /// Runs the daily token mining call.
    pub async fn mine(
        &self,
        operation_id: impl Into<OperationId>,
    ) -> ApplicationResult<PendingOperation> {
        self.execute(TOKEN, "mine", vec![], Self::simple(operation_id))
            .await
    }

    /// Token balance of `account`.
    pub async fn balance_of(&self, account: Address) -> ApplicationResult<U256> {
        self.read_uint(TOKEN, "balanceOf", &[Token::Address(account)])
            .await
    }

    /// Seconds until `account` may call `mine()` again.
    pub async fn time_until_next_mining(&self, account: Address) -> ApplicationResult<U256> {
        self.read_uint(TOKEN, "getTimeUntilNextMining", &[Token::Address(account)])
            .await
    }

    /// Balances and mining schedule of `account`.
    pub async fn account_info(&self, account: Address) -> ApplicationResult<AccountInfo> {
        let outputs = self
            .read(TOKEN, "getAccountInfo", &[Token::Address(account)])
            .await?;
        AccountInfo::from_tokens(&outputs)
    }

    /// Total token supply.
    pub async fn total_supply(&self) -> ApplicationResult<U256> {
        self.read_uint(TOKEN, "totalSupply", &[]).await
    }

    /// Staking APY, in percent.
    pub async fn staking_apy(&self) -> ApplicationResult<U256> {
        self.read_uint(TOKEN, "stakingAPY", &[]).await
    }

    /// Reward paid per `mine()` call.
    pub async fn mining_reward_rate(&self) -> ApplicationResult<U256> {
        self.read_uint(TOKEN, "miningRewardRate", &[]).await
    }

    /// Supply, APY and mining reward rate in one view.
    pub async fn token_stats(&self) -> ApplicationResult<TokenStats> {
        Ok(TokenStats {
            total_supply: self.total_supply().await?,
            staking_apy: self.staking_apy().await?,
            mining_reward_rate: self.mining_reward_rate().await?,
        })
    }

    // ========== Mining ==========

    /// Runs the daily mobile mining call.
    pub async fn perform_mobile_mining(
        &self,
        operation_id: impl Into<OperationId>,
    ) -> ApplicationResult<PendingOperation> {
        self.execute(MINING, "performMobileMining", vec![], Self::simple(operation_id))
            .await
    }

    /// Buys a hardware miner of `miner_type`, paying `value`.
    pub async fn purchase_hardware_miner(
        &self,
        operation_id: impl Into<OperationId>,
        miner_type: u8,
        value: U256,
    ) -> ApplicationResult<PendingOperation> {
        let args = vec![Token::Uint(U256::from(miner_type))];
        let options = Self::simple(operation_id).with_value(value);
        self.execute(MINING, "purchaseHardwareMiner", args, options)
            .await
    }

    /// Claims the rewards of one hardware miner.
    pub async fn claim_mining_rewards(
        &self,
        operation_id: impl Into<OperationId>,
        miner_id: U256,
    ) -> ApplicationResult<PendingOperation> {
        let args = vec![Token::Uint(miner_id)];
        self.execute(MINING, "claimMiningRewards", args, Self::simple(operation_id))
            .await
    }

    /// Whether `account` may mobile-mine today.
    pub async fn can_mine_today(&self, account: Address) -> ApplicationResult<bool> {
        self.read_bool(MINING, "canMineToday", &[Token::Address(account)])
            .await
    }

    /// Mining figures of `account`.
    pub async fn user_mining_stats(&self, account: Address) -> ApplicationResult<UserMiningStats> {
        let outputs = self
            .read(MINING, "getUserMiningStats", &[Token::Address(account)])
            .await?;
        UserMiningStats::from_tokens(&outputs)
    }

    /// Hardware miners owned by `account`.
    pub async fn user_miners(&self, account: Address) -> ApplicationResult<Vec<Miner>> {
        let outputs = self
            .read(MINING, "getUserMiners", &[Token::Address(account)])
            .await?;
        Miner::list_from_tokens(&outputs)
    }

    /// Miner counts across all users.
    pub async fn global_mining_stats(&self) -> ApplicationResult<GlobalMiningStats> {
        let outputs = self.read(MINING, "getMiningStats", &[]).await?;
        GlobalMiningStats::from_tokens(&outputs)
    }

    // ========== Presale ==========

    /// Buys presale tokens for `value`, crediting `referrer` if given.
    pub async fn buy_tokens(
        &self,
        operation_id: impl Into<OperationId>,
        value: U256,
        referrer: Option<Address>,
    ) -> ApplicationResult<PendingOperation> {
        let options = Self::simple(operation_id).with_value(value);
        match referrer {
            Some(referrer) => {
                let args = vec![Token::Address(referrer)];
                self.execute(PRESALE, "buyTokensWithReferral", args, options)
                    .await
            }
            None => self.execute(PRESALE, "buyTokens", vec![], options).await,
        }
    }

    /// Claims purchased presale tokens.
    pub async fn claim_presale_tokens(
        &self,
        operation_id: impl Into<OperationId>,
    ) -> ApplicationResult<PendingOperation> {
        self.execute(PRESALE, "claimTokens", vec![], Self::simple(operation_id))
            .await
    }

    /// Whether presale claims are open.
    pub async fn claim_enabled(&self) -> ApplicationResult<bool> {
        self.read_bool(PRESALE, "claimEnabled", &[]).await
    }

    /// Presale progress.
    pub async fn presale_stats(&self) -> ApplicationResult<PresaleStats> {
        let outputs = self.read(PRESALE, "getPresaleStats", &[]).await?;
        PresaleStats::from_tokens(&outputs)
    }

    /// Presale purchase of `account`.
    pub async fn purchase_info(&self, account: Address) -> ApplicationResult<PurchaseInfo> {
        let outputs = self
            .read(PRESALE, "getPurchaseInfo", &[Token::Address(account)])
            .await?;
        PurchaseInfo::from_tokens(&outputs)
    }

    // ========== Wallet ==========

    /// Links the signing account to a Telegram user.
    pub async fn connect_wallet(
        &self,
        operation_id: impl Into<OperationId>,
        telegram_user_id: U256,
    ) -> ApplicationResult<PendingOperation> {
        let args = vec![Token::Uint(telegram_user_id)];
        self.execute(WALLET, "connectWallet", args, Self::simple(operation_id))
            .await
    }

    /// Sends tokens through the wallet contract, tagged with `tx_type`.
    pub async fn send_tokens(
        &self,
        operation_id: impl Into<OperationId>,
        to: Address,
        amount: U256,
        tx_type: &str,
    ) -> ApplicationResult<PendingOperation> {
        let args = vec![
            Token::Address(to),
            Token::Uint(amount),
            Token::String(tx_type.to_string()),
        ];
        self.execute(WALLET, "sendTokens", args, Self::simple(operation_id))
            .await
    }

    /// Sets the daily spending limit of the signing account.
    pub async fn set_daily_limit(
        &self,
        operation_id: impl Into<OperationId>,
        limit: U256,
    ) -> ApplicationResult<PendingOperation> {
        let args = vec![Token::Uint(limit)];
        self.execute(WALLET, "setDailyLimit", args, Self::simple(operation_id))
            .await
    }

    /// Freezes `account`. Operator only.
    pub async fn freeze_wallet(
        &self,
        operation_id: impl Into<OperationId>,
        account: Address,
    ) -> ApplicationResult<PendingOperation> {
        let args = vec![Token::Address(account)];
        self.execute(WALLET, "freezeWallet", args, Self::simple(operation_id))
            .await
    }

    /// Unfreezes `account`. Operator only.
    pub async fn unfreeze_wallet(
        &self,
        operation_id: impl Into<OperationId>,
        account: Address,
    ) -> ApplicationResult<PendingOperation> {
        let args = vec![Token::Address(account)];
        self.execute(WALLET, "unfreezeWallet", args, Self::simple(operation_id))
            .await
    }

    /// Wallet registration of `account`.
    pub async fn wallet_info(&self, account: Address) -> ApplicationResult<WalletInfo> {
        let outputs = self
            .read(WALLET, "getWalletInfo", &[Token::Address(account)])
            .await?;
        WalletInfo::from_tokens(&outputs)
    }

    /// Daily spending window of `account`.
    pub async fn daily_spending(&self, account: Address) -> ApplicationResult<DailySpending> {
        let outputs = self
            .read(WALLET, "getDailySpendingInfo", &[Token::Address(account)])
            .await?;
        DailySpending::from_tokens(&outputs)
    }
}

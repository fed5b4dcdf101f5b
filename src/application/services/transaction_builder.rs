//! # Transaction Builder
//!
//! Turns a contract call into a [`PendingOperation`] in status `Built`.
//!
//! Everything that can be checked locally is checked before the first
//! network call: function lookup, overload resolution, argument types,
//! read-only surfaces and value rules. Only then are the gas price and
//! nonce fetched, with retries on transient failures.

use crate::application::error::ApplicationResult;
use crate::application::services::retry::{RetryPolicy, retry_chain};
use crate::domain::entities::{ContractDescriptor, PendingOperation};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Mutability, OperationId, UnsignedTransaction};
use crate::infrastructure::chain::ChainClient;
use ethers::abi::{Function, Token};
use ethers::types::{Address, Bytes, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Gas limit used when neither the caller nor the table names one.
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

/// Known per-function gas limits of the BlockDAG contracts.
const BLOCKDAG_GAS_LIMITS: [(&str, u64); 13] = [
    ("stake", 200_000),
    ("unstake", 200_000),
    ("claimStakingRewards", 150_000),
    ("mine", 150_000),
    ("performMobileMining", 200_000),
    ("purchaseHardwareMiner", 300_000),
    ("claimMiningRewards", 200_000),
    ("buyTokens", 300_000),
    ("buyTokensWithReferral", 300_000),
    ("claimTokens", 200_000),
    ("connectWallet", 150_000),
    ("sendTokens", 200_000),
    ("setDailyLimit", 100_000),
];

/// Gas limits by function name, plus an optional fixed gas price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasTable {
    default_limit: U256,
    limits: HashMap<String, U256>,
    fixed_price: Option<U256>,
}

impl Default for GasTable {
    fn default() -> Self {
        let limits = BLOCKDAG_GAS_LIMITS
            .iter()
            .map(|(name, limit)| ((*name).to_string(), U256::from(*limit)))
            .collect();
        Self {
            default_limit: U256::from(DEFAULT_GAS_LIMIT),
            limits,
            fixed_price: None,
        }
    }
}

impl GasTable {
    /// Creates an empty table with the given fallback limit.
    #[must_use]
    pub fn new(default_limit: U256) -> Self {
        Self {
            default_limit,
            limits: HashMap::new(),
            fixed_price: None,
        }
    }

    /// Replaces the fallback limit, keeping per-function entries.
    #[must_use]
    pub fn with_default_limit(mut self, default_limit: U256) -> Self {
        self.default_limit = default_limit;
        self
    }

    /// Sets the limit for one function.
    #[must_use]
    pub fn with_limit(mut self, function_name: impl Into<String>, limit: U256) -> Self {
        self.limits.insert(function_name.into(), limit);
        self
    }

    /// Uses a fixed gas price instead of asking the node.
    #[must_use]
    pub fn with_fixed_price(mut self, price: U256) -> Self {
        self.fixed_price = Some(price);
        self
    }

    /// Returns the limit for `function_name`.
    #[must_use]
    pub fn limit_for(&self, function_name: &str) -> U256 {
        self.limits
            .get(function_name)
            .copied()
            .unwrap_or(self.default_limit)
    }

    /// Returns the fallback limit.
    #[inline]
    #[must_use]
    pub fn default_limit(&self) -> U256 {
        self.default_limit
    }

    /// Returns the fixed gas price, if configured.
    #[inline]
    #[must_use]
    pub fn fixed_price(&self) -> Option<U256> {
        self.fixed_price
    }
}

/// Per-call options. Anything left unset is defaulted by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Idempotency key.
    pub operation_id: OperationId,
    /// Value transferred in wei.
    pub value: U256,
    /// Gas limit override.
    pub gas_limit: Option<U256>,
    /// Gas price override.
    pub gas_price: Option<U256>,
    /// Nonce override.
    pub nonce: Option<U256>,
}

impl BuildOptions {
    /// Options with no value and every field defaulted.
    #[must_use]
    pub fn new(operation_id: impl Into<OperationId>) -> Self {
        Self {
            operation_id: operation_id.into(),
            value: U256::zero(),
            gas_limit: None,
            gas_price: None,
            nonce: None,
        }
    }

    /// Sets the value transferred.
    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Sets the gas limit.
    #[must_use]
    pub fn with_gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Sets the gas price.
    #[must_use]
    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Sets the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }
}

/// Builds unsigned transactions for one signing account.
#[derive(Debug)]
pub struct TransactionBuilder {
    chain: Arc<dyn ChainClient>,
    signer: Address,
    gas: GasTable,
    retry: RetryPolicy,
}

impl TransactionBuilder {
    /// Creates a builder with the default gas table and retry policy.
    #[must_use]
    pub fn new(chain: Arc<dyn ChainClient>, signer: Address) -> Self {
        Self {
            chain,
            signer,
            gas: GasTable::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the gas table.
    #[must_use]
    pub fn with_gas_table(mut self, gas: GasTable) -> Self {
        self.gas = gas;
        self
    }

    /// Replaces the retry policy used for gas price and nonce quotes.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the signing account.
    #[inline]
    #[must_use]
    pub fn signer(&self) -> Address {
        self.signer
    }

    /// Returns the gas table.
    #[inline]
    #[must_use]
    pub fn gas_table(&self) -> &GasTable {
        &self.gas
    }

    /// Checks a call without touching the network.
    ///
    /// # Errors
    ///
    /// - [`DomainError::ReadOnlyFunction`] for view/pure functions or any
    ///   function of a contract registered as read-only
    /// - [`DomainError::FunctionNotFound`] / [`DomainError::ArgumentTypeMismatch`]
    ///   from overload resolution
    /// - [`DomainError::InvalidValueForMutability`] if `value` breaks the
    ///   function's payability
    pub fn validate<'a>(
        contract: &'a ContractDescriptor,
        function_name: &str,
        arguments: &[Token],
        value: U256,
    ) -> DomainResult<&'a Function> {
        if !contract.mutability().is_transactable() {
            return Err(DomainError::ReadOnlyFunction(format!(
                "{}.{}",
                contract.name(),
                function_name
            )));
        }

        let function = contract.resolve_function(function_name, arguments)?;
        let surface = Mutability::from(function.state_mutability);

        match surface {
            Mutability::Read => Err(DomainError::ReadOnlyFunction(format!(
                "{}.{}",
                contract.name(),
                function_name
            ))),
            Mutability::Payable if contract.mutability() < Mutability::Payable => {
                Err(DomainError::InvalidValueForMutability {
                    function: function_name.to_string(),
                    message: format!("contract {} is not registered as payable", contract.name()),
                })
            }
            Mutability::Payable if value.is_zero() => Err(DomainError::InvalidValueForMutability {
                function: function_name.to_string(),
                message: "payable function requires a value greater than zero".to_string(),
            }),
            Mutability::Write if !value.is_zero() => Err(DomainError::InvalidValueForMutability {
                function: function_name.to_string(),
                message: format!("non-payable function cannot receive {} wei", value),
            }),
            _ => Ok(function),
        }
    }

    /// Builds a call, defaulting gas limit, gas price and nonce.
    ///
    /// # Errors
    ///
    /// Returns any [`validate`](Self::validate) error before touching the
    /// network, then `RpcUnavailable` if the quotes cannot be fetched.
    pub async fn build(
        &self,
        contract: &ContractDescriptor,
        function_name: &str,
        arguments: Vec<Token>,
        options: BuildOptions,
    ) -> ApplicationResult<PendingOperation> {
        let function = Self::validate(contract, function_name, &arguments, options.value)?;
        let calldata =
            function
                .encode_input(&arguments)
                .map_err(|e| DomainError::ArgumentTypeMismatch {
                    function: function_name.to_string(),
                    message: e.to_string(),
                })?;

        let gas_limit = options
            .gas_limit
            .unwrap_or_else(|| self.gas.limit_for(function_name));

        let gas_price = match options.gas_price.or(self.gas.fixed_price) {
            Some(price) => price,
            None => retry_chain(&self.retry, "eth_gasPrice", || self.chain.get_gas_price()).await?,
        };

        let nonce = match options.nonce {
            Some(nonce) => nonce,
            None => {
                retry_chain(&self.retry, "eth_getTransactionCount", || {
                    self.chain.get_nonce(self.signer)
                })
                .await?
            }
        };

        let tx = UnsignedTransaction {
            from: self.signer,
            to: contract.address(),
            data: Bytes::from(calldata),
            value: options.value,
            gas_limit,
            gas_price,
            nonce,
            chain_id: self.chain.chain_id(),
        };

        debug!(
            operation_id = %options.operation_id,
            contract = %contract.name(),
            function = function_name,
            nonce = %nonce,
            gas_limit = %gas_limit,
            "built transaction"
        );

        Ok(PendingOperation::new(
            options.operation_id,
            contract.to_ref(),
            function.name.clone(),
            arguments,
            tx,
        ))
    }
}

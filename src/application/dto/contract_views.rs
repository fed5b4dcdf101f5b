//! # Contract Views
//!
//! Typed read models decoded from the outputs of BlockDAG view functions.
//!
//! Every decoder checks the shape of the returned values and fails with
//! [`ApplicationError::UnexpectedOutput`] instead of guessing.

use crate::application::error::{ApplicationError, ApplicationResult};
use ethers::abi::Token;
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positional access to decoded outputs.
#[derive(Debug, Clone, Copy)]
pub struct Outputs<'a> {
    function: &'a str,
    tokens: &'a [Token],
}

impl<'a> Outputs<'a> {
    /// Wraps the outputs of `function`, requiring at least `expected` values.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` if fewer values were returned.
    pub fn new(function: &'a str, tokens: &'a [Token], expected: usize) -> ApplicationResult<Self> {
        if tokens.len() < expected {
            return Err(ApplicationError::unexpected_output(
                function,
                format!("expected {} values, got {}", expected, tokens.len()),
            ));
        }
        Ok(Self { function, tokens })
    }

    fn get(&self, index: usize) -> ApplicationResult<&'a Token> {
        self.tokens.get(index).ok_or_else(|| {
            ApplicationError::unexpected_output(self.function, format!("no value at {}", index))
        })
    }

    /// Unsigned integer at `index`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a missing or non-integer value.
    pub fn uint(&self, index: usize) -> ApplicationResult<U256> {
        match self.get(index)? {
            Token::Uint(value) | Token::Int(value) => Ok(*value),
            other => Err(self.mismatch(index, "uint", other)),
        }
    }

    /// Boolean at `index`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a missing or non-boolean value.
    pub fn boolean(&self, index: usize) -> ApplicationResult<bool> {
        match self.get(index)? {
            Token::Bool(value) => Ok(*value),
            other => Err(self.mismatch(index, "bool", other)),
        }
    }

    /// Small enum-like integer at `index`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` if the value does not fit a `u8`.
    pub fn small(&self, index: usize) -> ApplicationResult<u8> {
        let value = self.uint(index)?;
        u8::try_from(value.low_u64())
            .ok()
            .filter(|_| value <= U256::from(u8::MAX))
            .ok_or_else(|| {
                ApplicationError::unexpected_output(
                    self.function,
                    format!("value {} at {} does not fit u8", value, index),
                )
            })
    }

    /// Array at `index`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a missing or non-array value.
    pub fn array(&self, index: usize) -> ApplicationResult<&'a [Token]> {
        match self.get(index)? {
            Token::Array(items) | Token::FixedArray(items) => Ok(items),
            other => Err(self.mismatch(index, "array", other)),
        }
    }

    fn mismatch(&self, index: usize, expected: &str, found: &Token) -> ApplicationError {
        ApplicationError::unexpected_output(
            self.function,
            format!("expected {} at {}, found {}", expected, index, found),
        )
    }
}

/// Token balances and mining schedule of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Liquid balance.
    pub balance: U256,
    /// Amount staked.
    pub staked: U256,
    /// Unclaimed staking rewards.
    pub pending_rewards: U256,
    /// Seconds until `mine()` is allowed again.
    pub next_mining_time: U256,
}

impl AccountInfo {
    /// Decodes `getAccountInfo` outputs.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a shape mismatch.
    pub fn from_tokens(tokens: &[Token]) -> ApplicationResult<Self> {
        let out = Outputs::new("getAccountInfo", tokens, 4)?;
        Ok(Self {
            balance: out.uint(0)?,
            staked: out.uint(1)?,
            pending_rewards: out.uint(2)?,
            next_mining_time: out.uint(3)?,
        })
    }
}

/// Token-wide figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    /// Total supply.
    pub total_supply: U256,
    /// Staking APY, in percent.
    pub staking_apy: U256,
    /// Reward per `mine()` call.
    pub mining_reward_rate: U256,
}

/// Mining figures of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMiningStats {
    /// Total mined by the account.
    pub total_mined: U256,
    /// Hardware miners still active.
    pub active_miners: U256,
    /// Consecutive days of mobile mining.
    pub mobile_streak: U256,
    /// Whether mobile mining is available now.
    pub can_mobile_mine: bool,
    /// Timestamp of the next mobile mining window.
    pub next_mobile_time: U256,
}

impl UserMiningStats {
    /// Decodes `getUserMiningStats` outputs.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a shape mismatch.
    pub fn from_tokens(tokens: &[Token]) -> ApplicationResult<Self> {
        let out = Outputs::new("getUserMiningStats", tokens, 5)?;
        Ok(Self {
            total_mined: out.uint(0)?,
            active_miners: out.uint(1)?,
            mobile_streak: out.uint(2)?,
            can_mobile_mine: out.boolean(3)?,
            next_mobile_time: out.uint(4)?,
        })
    }
}

/// One hardware miner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Miner {
    /// Miner model index.
    pub miner_type: u8,
    /// Reward accrued per day.
    pub daily_reward: U256,
    /// Last reward claim.
    pub last_claim: U256,
    /// Whether the miner still produces.
    pub active: bool,
    /// Purchase timestamp.
    pub purchase_time: U256,
    /// Total produced.
    pub total_mined: U256,
}

impl Miner {
    /// Decodes every miner of a `getUserMiners` result.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a shape mismatch.
    pub fn list_from_tokens(tokens: &[Token]) -> ApplicationResult<Vec<Self>> {
        let out = Outputs::new("getUserMiners", tokens, 1)?;
        out.array(0)?
            .iter()
            .map(|item| match item {
                Token::Tuple(fields) => {
                    let miner = Outputs::new("getUserMiners", fields, 6)?;
                    Ok(Self {
                        miner_type: miner.small(0)?,
                        daily_reward: miner.uint(1)?,
                        last_claim: miner.uint(2)?,
                        active: miner.boolean(3)?,
                        purchase_time: miner.uint(4)?,
                        total_mined: miner.uint(5)?,
                    })
                }
                other => Err(ApplicationError::unexpected_output(
                    "getUserMiners",
                    format!("expected tuple, found {}", other),
                )),
            })
            .collect()
    }
}

/// Miner counts across all users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalMiningStats {
    /// Hardware miners sold.
    pub total_hardware_miners: U256,
    /// X10 miners sold.
    pub x10_miners: U256,
    /// X30 miners sold.
    pub x30_miners: U256,
    /// X100 miners sold.
    pub x100_miners: U256,
    /// Contract balance.
    pub contract_balance: U256,
}

impl GlobalMiningStats {
    /// Decodes `getMiningStats` outputs.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a shape mismatch.
    pub fn from_tokens(tokens: &[Token]) -> ApplicationResult<Self> {
        let out = Outputs::new("getMiningStats", tokens, 5)?;
        Ok(Self {
            total_hardware_miners: out.uint(0)?,
            x10_miners: out.uint(1)?,
            x30_miners: out.uint(2)?,
            x100_miners: out.uint(3)?,
            contract_balance: out.uint(4)?,
        })
    }
}

/// Presale progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresaleStats {
    /// Native currency raised.
    pub total_raised: U256,
    /// Tokens sold.
    pub tokens_sold: U256,
    /// Current price.
    pub price: U256,
    /// Whether purchases are open.
    pub active: bool,
    /// Whether purchased tokens can be claimed.
    pub claim_enabled: bool,
    /// Seconds left in the presale.
    pub time_left: U256,
}

impl PresaleStats {
    /// Decodes `getPresaleStats` outputs.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a shape mismatch.
    pub fn from_tokens(tokens: &[Token]) -> ApplicationResult<Self> {
        let out = Outputs::new("getPresaleStats", tokens, 6)?;
        Ok(Self {
            total_raised: out.uint(0)?,
            tokens_sold: out.uint(1)?,
            price: out.uint(2)?,
            active: out.boolean(3)?,
            claim_enabled: out.boolean(4)?,
            time_left: out.uint(5)?,
        })
    }
}

/// Presale purchase of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseInfo {
    /// Native currency spent.
    pub eth_spent: U256,
    /// Tokens allocated.
    pub tokens_allocated: U256,
    /// Whether the allocation was claimed.
    pub has_claimed: bool,
    /// Payment method index.
    pub payment_method: u8,
}

impl PurchaseInfo {
    /// Decodes `getPurchaseInfo` outputs.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a shape mismatch.
    pub fn from_tokens(tokens: &[Token]) -> ApplicationResult<Self> {
        let out = Outputs::new("getPurchaseInfo", tokens, 4)?;
        Ok(Self {
            eth_spent: out.uint(0)?,
            tokens_allocated: out.uint(1)?,
            has_claimed: out.boolean(2)?,
            payment_method: out.small(3)?,
        })
    }

    /// Returns true if tokens are allocated and not yet claimed.
    #[must_use]
    pub fn has_unclaimed_tokens(&self) -> bool {
        !self.tokens_allocated.is_zero() && !self.has_claimed
    }
}

/// Wallet contract registration of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    /// Linked to a Telegram user.
    pub connected: bool,
    /// Frozen by an operator.
    pub frozen: bool,
    /// Linked Telegram user id.
    pub telegram_id: U256,
    /// When the link was made.
    pub connection_time: U256,
}

impl WalletInfo {
    /// Decodes `getWalletInfo` outputs.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a shape mismatch.
    pub fn from_tokens(tokens: &[Token]) -> ApplicationResult<Self> {
        let out = Outputs::new("getWalletInfo", tokens, 4)?;
        Ok(Self {
            connected: out.boolean(0)?,
            frozen: out.boolean(1)?,
            telegram_id: out.uint(2)?,
            connection_time: out.uint(3)?,
        })
    }
}

/// Daily spending window of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySpending {
    /// Configured limit.
    pub limit: U256,
    /// Spent in the current window.
    pub spent: U256,
    /// Left in the current window.
    pub remaining: U256,
    /// When the window resets.
    pub reset_time: U256,
}

impl DailySpending {
    /// Decodes `getDailySpendingInfo` outputs.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` on a shape mismatch.
    pub fn from_tokens(tokens: &[Token]) -> ApplicationResult<Self> {
        let out = Outputs::new("getDailySpendingInfo", tokens, 4)?;
        Ok(Self {
            limit: out.uint(0)?,
            spent: out.uint(1)?,
            remaining: out.uint(2)?,
            reset_time: out.uint(3)?,
        })
    }
}

impl fmt::Display for PurchaseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocated={} claimed={}",
            self.tokens_allocated, self.has_claimed
        )
    }
}

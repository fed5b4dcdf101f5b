//! # Chain Client Port
//!
//! Everything the orchestrator needs from a node and a signer.

use crate::domain::entities::ContractDescriptor;
use crate::domain::value_objects::{Receipt, SignedTransaction, UnsignedTransaction};
use crate::infrastructure::chain::error::ChainResult;
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, H256, U256};
use std::fmt;

/// Node and signer access.
///
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait ChainClient: Send + Sync + fmt::Debug {
    /// Chain id transactions are signed for.
    fn chain_id(&self) -> u64;

    /// Current gas price quote, in wei.
    async fn get_gas_price(&self) -> ChainResult<U256>;

    /// Next nonce for `address`, counting pending transactions.
    async fn get_nonce(&self, address: Address) -> ChainResult<U256>;

    /// Native balance of `address`, in wei.
    async fn get_balance(&self, address: Address) -> ChainResult<U256>;

    /// Latest block number.
    async fn get_block_number(&self) -> ChainResult<u64>;

    /// Signs `tx` with the signer configured for `tx.from`.
    async fn sign(&self, tx: &UnsignedTransaction) -> ChainResult<SignedTransaction>;

    /// Broadcasts a signed transaction, returning its hash.
    async fn broadcast(&self, tx: &SignedTransaction) -> ChainResult<H256>;

    /// Receipt for `hash`, or `None` while not mined.
    async fn get_receipt(&self, hash: H256) -> ChainResult<Option<Receipt>>;

    /// Executes a read-only call and decodes its outputs.
    async fn call_read(
        &self,
        contract: &ContractDescriptor,
        function: &str,
        args: &[Token],
    ) -> ChainResult<Vec<Token>>;
}

//! # Ethers Chain Client
//!
//! [`ChainClient`] over an ethers-rs HTTP provider and a local wallet.
//!
//! # Examples
//!
//! ```ignore
//! use blockdag_orchestrator::infrastructure::chain::EthersChainClient;
//!
//! let client = EthersChainClient::new("https://rpc.primordial.bdagscan.com", 1043, 10_000)?
//!     .with_private_key(&std::env::var("BDAG_PRIVATE_KEY")?)?;
//! let block = client.get_block_number().await?;
//! ```

use crate::domain::entities::ContractDescriptor;
use crate::domain::value_objects::{Receipt, SignedTransaction, UnsignedTransaction};
use crate::infrastructure::chain::client::ChainClient;
use crate::infrastructure::chain::error::{ChainError, ChainResult};
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::prelude::*;
use ethers::providers::RpcError;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::keccak256;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// HTTP provider type alias.
pub type HttpProvider = Provider<Http>;

/// JSON-RPC error code some nodes use for reverted calls.
const REVERT_ERROR_CODE: i64 = 3;

/// Chain client backed by ethers-rs.
#[derive(Clone)]
pub struct EthersChainClient {
    provider: Arc<HttpProvider>,
    wallet: Option<LocalWallet>,
    chain_id: u64,
    rpc_url: String,
    request_timeout: Duration,
}

impl EthersChainClient {
    /// Creates a read-only client.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::RpcUnavailable` if the URL cannot be parsed.
    pub fn new(rpc_url: impl Into<String>, chain_id: u64, timeout_ms: u64) -> ChainResult<Self> {
        let rpc_url = rpc_url.into();
        let provider = Provider::<Http>::try_from(rpc_url.as_str())
            .map_err(|e| ChainError::unavailable(format!("failed to create provider: {}", e)))?
            .interval(Duration::from_millis(100));

        Ok(Self {
            provider: Arc::new(provider),
            wallet: None,
            chain_id,
            rpc_url,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Attaches a signing wallet, bound to this client's chain id.
    #[must_use]
    pub fn with_wallet(mut self, wallet: LocalWallet) -> Self {
        self.wallet = Some(wallet.with_chain_id(self.chain_id));
        self
    }

    /// Attaches a signing wallet from a hex private key.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::Signing` if the key is malformed.
    pub fn with_private_key(self, private_key: &str) -> ChainResult<Self> {
        let wallet: LocalWallet = private_key
            .trim()
            .trim_start_matches("0x")
            .parse()
            .map_err(|e| ChainError::signing(format!("invalid private key: {}", e)))?;
        Ok(self.with_wallet(wallet))
    }

    /// Returns the signing account, if a wallet is attached.
    #[must_use]
    pub fn signer_address(&self) -> Option<Address> {
        self.wallet.as_ref().map(|w| w.address())
    }

    /// Returns the RPC URL.
    #[inline]
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Asks the node for its chain id.
    ///
    /// # Errors
    ///
    /// Returns the classified provider error.
    pub async fn fetch_chain_id(&self) -> ChainResult<u64> {
        let id = self.rpc("eth_chainId", self.provider.get_chainid()).await?;
        Ok(id.as_u64())
    }

    async fn rpc<T, F>(&self, method: &str, call: F) -> ChainResult<T>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(classify_provider_error(method, err)),
            Err(_) => Err(ChainError::unavailable(format!(
                "{}: no answer within {:?}",
                method, self.request_timeout
            ))),
        }
    }
}

/// Maps a provider error onto the chain error taxonomy.
///
/// A JSON-RPC error object means the node answered and refused; anything
/// else is a transport problem.
fn classify_provider_error(method: &str, err: ProviderError) -> ChainError {
    if let Some(response) = RpcError::as_error_response(&err) {
        let message = response.message.clone();
        if response.code == REVERT_ERROR_CODE || message.to_ascii_lowercase().contains("revert") {
            return ChainError::reverted(message);
        }
        return ChainError::rejected(message);
    }
    ChainError::unavailable(format!("{}: {}", method, err))
}

fn to_typed(tx: &UnsignedTransaction) -> TypedTransaction {
    TransactionRequest::new()
        .from(tx.from)
        .to(tx.to)
        .data(tx.data.clone())
        .value(tx.value)
        .gas(tx.gas_limit)
        .gas_price(tx.gas_price)
        .nonce(tx.nonce)
        .chain_id(tx.chain_id)
        .into()
}

#[async_trait]
impl ChainClient for EthersChainClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn get_gas_price(&self) -> ChainResult<U256> {
        self.rpc("eth_gasPrice", self.provider.get_gas_price()).await
    }

    async fn get_nonce(&self, address: Address) -> ChainResult<U256> {
        let pending: BlockId = BlockNumber::Pending.into();
        self.rpc(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address, Some(pending)),
        )
        .await
    }

    async fn get_balance(&self, address: Address) -> ChainResult<U256> {
        self.rpc("eth_getBalance", self.provider.get_balance(address, None))
            .await
    }

    async fn get_block_number(&self) -> ChainResult<u64> {
        let block = self
            .rpc("eth_blockNumber", self.provider.get_block_number())
            .await?;
        Ok(block.as_u64())
    }

    async fn sign(&self, tx: &UnsignedTransaction) -> ChainResult<SignedTransaction> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or_else(|| ChainError::signing("no wallet configured"))?;
        if wallet.address() != tx.from {
            return Err(ChainError::signing(format!(
                "no key for account {:?}",
                tx.from
            )));
        }

        let typed = to_typed(tx);
        let signature = wallet
            .sign_transaction(&typed)
            .await
            .map_err(|e| ChainError::signing(e.to_string()))?;
        let raw = typed.rlp_signed(&signature);
        let hash = H256::from(keccak256(&raw));
        debug!(tx_hash = ?hash, nonce = %tx.nonce, "signed transaction");

        Ok(SignedTransaction { raw, hash })
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> ChainResult<H256> {
        self.rpc("eth_sendRawTransaction", async {
            self.provider
                .send_raw_transaction(tx.raw.clone())
                .await
                .map(|pending| *pending)
        })
        .await
    }

    async fn get_receipt(&self, hash: H256) -> ChainResult<Option<Receipt>> {
        let receipt = self
            .rpc(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(hash),
            )
            .await?;

        Ok(receipt.map(|r| Receipt {
            tx_hash: r.transaction_hash,
            // Pre-byzantium receipts carry no status.
            success: r.status.is_none_or(|s| !s.is_zero()),
            block_number: r.block_number.map(|b| b.as_u64()),
            gas_used: r.gas_used,
        }))
    }

    async fn call_read(
        &self,
        contract: &ContractDescriptor,
        function: &str,
        args: &[Token],
    ) -> ChainResult<Vec<Token>> {
        let function = contract
            .resolve_function(function, args)
            .map_err(|e| ChainError::codec(e.to_string()))?;
        let data = function
            .encode_input(args)
            .map_err(|e| ChainError::codec(e.to_string()))?;

        let mut request = TransactionRequest::new()
            .to(contract.address())
            .data(data);
        if let Some(from) = self.signer_address() {
            request = request.from(from);
        }
        let typed: TypedTransaction = request.into();

        let output = self.rpc("eth_call", self.provider.call(&typed, None)).await?;
        function
            .decode_output(&output)
            .map_err(|e| ChainError::codec(e.to_string()))
    }
}

impl std::fmt::Debug for EthersChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthersChainClient")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("signer", &self.signer_address())
            .finish()
    }
}

//! # Configuration
//!
//! Application configuration loading and management.
//!
//! # Configuration Sources
//!
//! Configuration is loaded in the following order (later sources override earlier):
//! 1. Default values (BlockDAG primordial testnet)
//! 2. Configuration file (if exists)
//! 3. Environment variables (prefixed with `BDAG_`)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BDAG_CONFIG_FILE` | TOML file to read | `config.toml` |
//! | `BDAG_RPC_URL` | JSON-RPC endpoint | `https://rpc.primordial.bdagscan.com` |
//! | `BDAG_CHAIN_ID` | Chain id | `1043` |
//! | `BDAG_PRIVATE_KEY` | Signing key, hex | none |
//! | `BDAG_LEDGER_PATH` | Operation ledger file | `data/operations.jsonl` |
//! | `BDAG_ABI_DIR` | Directory of ABI files | `abi` |
//! | `BDAG_LOG_LEVEL` | Log level | `info` |
//! | `BDAG_LOG_FORMAT` | Log format (json/pretty) | `json` |
//! | `BDAG_TOKEN_ADDRESS` | Token contract | primordial deployment |
//! | `BDAG_PRESALE_ADDRESS` | Presale contract | primordial deployment |
//! | `BDAG_MINING_ADDRESS` | Mining contract | primordial deployment |
//! | `BDAG_WALLET_ADDRESS` | Wallet contract | primordial deployment |
//!
//! # Examples
//!
//! ```no_run
//! use blockdag_orchestrator::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! config.validate()?;
//! println!("rpc: {} (chain {})", config.chain.rpc_url, config.chain.chain_id);
//! # Ok::<(), blockdag_orchestrator::config::ConfigError>(())
//! ```

use crate::application::services::{ContractEntry, GasTable, OrchestratorConfig, RetryPolicy};
use crate::domain::value_objects::{Mutability, parse_address};
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Chain Configuration
// ============================================================================

/// Node connection and signer.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Chain id transactions are signed for.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Block explorer base URL.
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Hex private key of the signing account.
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
            explorer_url: default_explorer_url(),
            request_timeout_ms: default_request_timeout_ms(),
            private_key: None,
        }
    }
}

impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("explorer_url", &self.explorer_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ChainConfig {
    /// Explorer link for a transaction hash.
    #[must_use]
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

// ============================================================================
// Contract Configuration
// ============================================================================

/// One deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Deployed address.
    pub address: String,

    /// ABI file, relative to the ABI directory. Defaults to `<name>.json`.
    #[serde(default)]
    pub abi: Option<PathBuf>,

    /// Widest call surface allowed.
    #[serde(default)]
    pub mutability: Mutability,
}

impl ContractConfig {
    fn new(address: &str, mutability: Mutability) -> Self {
        Self {
            address: address.to_string(),
            abi: None,
            mutability,
        }
    }
}

// ============================================================================
// Gas Configuration
// ============================================================================

/// Gas limits and pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasConfig {
    /// Limit for functions without an entry.
    #[serde(default = "default_gas_limit")]
    pub default_limit: u64,

    /// Fixed gas price in gwei; the node is asked when unset.
    #[serde(default)]
    pub fixed_price_gwei: Option<u64>,

    /// Per-function limits, on top of the built-in BlockDAG table.
    #[serde(default)]
    pub limits: BTreeMap<String, u64>,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            default_limit: default_gas_limit(),
            fixed_price_gwei: None,
            limits: BTreeMap::new(),
        }
    }
}

impl GasConfig {
    /// Builds the gas table.
    #[must_use]
    pub fn gas_table(&self) -> GasTable {
        let mut table = GasTable::default().with_default_limit(U256::from(self.default_limit));
        for (name, limit) in &self.limits {
            table = table.with_limit(name.clone(), U256::from(*limit));
        }
        if let Some(gwei) = self.fixed_price_gwei {
            table = table.with_fixed_price(U256::from(gwei) * U256::exp10(9));
        }
        table
    }
}

// ============================================================================
// Orchestrator Configuration
// ============================================================================

/// Submission, confirmation and routine pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    /// Broadcast attempts with a fresh nonce.
    #[serde(default = "default_max_nonce_attempts")]
    pub max_nonce_attempts: u32,

    /// Receipt poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Confirmation window in milliseconds.
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,

    /// Gas price multiplier for replacements of timed-out transactions.
    #[serde(default = "default_gas_bump_factor")]
    pub gas_bump_factor: f64,

    /// Pause between routine steps in milliseconds.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_nonce_attempts: default_max_nonce_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
            gas_bump_factor: default_gas_bump_factor(),
            step_delay_ms: default_step_delay_ms(),
        }
    }
}

impl OrchestratorSettings {
    /// Returns the pause between routine steps.
    #[must_use]
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

// ============================================================================
// Retry Configuration
// ============================================================================

/// Backoff for transient RPC failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Backoff cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Growth per attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Random spread, 0.0 to 1.0.
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl RetryConfig {
    /// Builds the retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            self.initial_delay_ms,
            self.max_delay_ms,
            self.backoff_multiplier,
            self.jitter_factor,
        )
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (structured logging).
    #[default]
    Json,
    /// Pretty format (human-readable).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include target (module path) in logs.
    #[serde(default = "default_true")]
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Json,
            include_target: true,
        }
    }
}

// ============================================================================
// Ledger Configuration
// ============================================================================

/// Operation ledger location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON lines file of status transitions.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Node connection and signer.
    #[serde(default)]
    pub chain: ChainConfig,

    /// Deployed contracts by logical name.
    #[serde(default = "default_contracts")]
    pub contracts: BTreeMap<String, ContractConfig>,

    /// Directory ABI files are read from.
    #[serde(default = "default_abi_dir")]
    pub abi_dir: PathBuf,

    /// Gas limits and pricing.
    #[serde(default)]
    pub gas: GasConfig,

    /// Submission and confirmation.
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,

    /// Transient failure backoff.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            contracts: default_contracts(),
            abi_dir: default_abi_dir(),
            gas: GasConfig::default(),
            orchestrator: OrchestratorSettings::default(),
            retry: RetryConfig::default(),
            log: LogConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the optional config file and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let config_path =
            std::env::var("BDAG_CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if Path::new(&config_path).exists() {
            config = Self::from_file(&config_path)?;
        }

        config.apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies `BDAG_*` overrides looked up through `var`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Chain configuration
        if let Some(url) = var("BDAG_RPC_URL") {
            self.chain.rpc_url = url;
        }
        if let Some(id) = var("BDAG_CHAIN_ID")
            && let Ok(id) = id.parse()
        {
            self.chain.chain_id = id;
        }
        if let Some(key) = var("BDAG_PRIVATE_KEY") {
            self.chain.private_key = Some(key);
        }

        // Contract addresses
        for (name, key) in [
            ("token", "BDAG_TOKEN_ADDRESS"),
            ("presale", "BDAG_PRESALE_ADDRESS"),
            ("mining", "BDAG_MINING_ADDRESS"),
            ("wallet", "BDAG_WALLET_ADDRESS"),
        ] {
            if let Some(address) = var(key)
                && let Some(contract) = self.contracts.get_mut(name)
            {
                contract.address = address;
            }
        }
        if let Some(dir) = var("BDAG_ABI_DIR") {
            self.abi_dir = PathBuf::from(dir);
        }

        // Ledger configuration
        if let Some(path) = var("BDAG_LEDGER_PATH") {
            self.ledger.path = PathBuf::from(path);
        }

        // Logging configuration
        if let Some(level) = var("BDAG_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = var("BDAG_LOG_FORMAT") {
            self.log.format = match format.to_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                _ => LogFormat::Json,
            };
        }
    }

    /// Registry entries for the configured contracts.
    #[must_use]
    pub fn contract_entries(&self) -> Vec<ContractEntry> {
        self.contracts
            .iter()
            .map(|(name, contract)| {
                ContractEntry::new(name.as_str(), &contract.address, contract.mutability)
            })
            .collect()
    }

    /// ABI file of `name`, relative to [`abi_dir`](Self::abi_dir).
    #[must_use]
    pub fn abi_path(&self, name: &str) -> PathBuf {
        self.contracts
            .get(name)
            .and_then(|c| c.abi.clone())
            .unwrap_or_else(|| PathBuf::from(format!("{name}.json")))
    }

    /// Orchestrator tuning with the configured retry policy.
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_nonce_attempts: self.orchestrator.max_nonce_attempts,
            poll_interval: Duration::from_millis(self.orchestrator.poll_interval_ms),
            confirmation_timeout: Duration::from_millis(self.orchestrator.confirmation_timeout_ms),
            retry: self.retry.policy(),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.chain.rpc_url.starts_with("http://") || self.chain.rpc_url.starts_with("https://"))
        {
            return Err(ConfigError::invalid(
                "chain.rpc_url",
                format!("'{}' is not an http(s) URL", self.chain.rpc_url),
            ));
        }
        if self.chain.chain_id == 0 {
            return Err(ConfigError::invalid("chain.chain_id", "must be non-zero"));
        }

        for (name, contract) in &self.contracts {
            parse_address(&contract.address).map_err(|e| {
                ConfigError::invalid(format!("contracts.{name}.address"), e.to_string())
            })?;
        }

        if self.gas.default_limit == 0 {
            return Err(ConfigError::invalid("gas.default_limit", "must be non-zero"));
        }
        if let Some((name, _)) = self.gas.limits.iter().find(|(_, limit)| **limit == 0) {
            return Err(ConfigError::invalid(
                format!("gas.limits.{name}"),
                "must be non-zero",
            ));
        }

        let orchestrator = &self.orchestrator;
        if orchestrator.max_nonce_attempts == 0 {
            return Err(ConfigError::invalid(
                "orchestrator.max_nonce_attempts",
                "must be at least 1",
            ));
        }
        if orchestrator.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "orchestrator.poll_interval_ms",
                "must be non-zero",
            ));
        }
        if !orchestrator.gas_bump_factor.is_finite() || orchestrator.gas_bump_factor <= 1.0 {
            return Err(ConfigError::invalid(
                "orchestrator.gas_bump_factor",
                format!("{} must be above 1.0", orchestrator.gas_bump_factor),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
        }
        if !(1.0..=10.0).contains(&self.retry.backoff_multiplier) {
            return Err(ConfigError::invalid(
                "retry.backoff_multiplier",
                "must be between 1.0 and 10.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(ConfigError::invalid(
                "retry.jitter_factor",
                "must be between 0.0 and 1.0",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "log.level",
                format!(
                    "invalid log level '{}', must be one of: {:?}",
                    self.log.level, valid_levels
                ),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Value Functions
// ============================================================================

fn default_rpc_url() -> String {
    "https://rpc.primordial.bdagscan.com".to_string()
}

fn default_chain_id() -> u64 {
    1043
}

fn default_explorer_url() -> String {
    "https://primordial.bdagscan.com".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_contracts() -> BTreeMap<String, ContractConfig> {
    BTreeMap::from([
        (
            "token".to_string(),
            ContractConfig::new("0x62a61cB53761B7C6B0A65f034BD92d839db2a1EB", Mutability::Write),
        ),
        (
            "presale".to_string(),
            ContractConfig::new("0xfa2d5f7239aa64eb9564b95d14ad2b2aefe11b03", Mutability::Payable),
        ),
        (
            "mining".to_string(),
            ContractConfig::new("0x45b74a182e44518cb1713f495c8cd8e8e393ba6c", Mutability::Payable),
        ),
        (
            "wallet".to_string(),
            ContractConfig::new("0xc6f25071cdd6e8cac62733bb776fadbb27ca113a", Mutability::Write),
        ),
    ])
}

fn default_abi_dir() -> PathBuf {
    PathBuf::from("abi")
}

fn default_gas_limit() -> u64 {
    300_000
}

fn default_max_nonce_attempts() -> u32 {
    3
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_confirmation_timeout_ms() -> u64 {
    120_000
}

fn default_gas_bump_factor() -> f64 {
    1.2
}

fn default_step_delay_ms() -> u64 {
    2_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter_factor() -> f64 {
    0.2
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("data/operations.jsonl")
}

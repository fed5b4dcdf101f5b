//! # BlockDAG Orchestrator
//!
//! Runs the daily routine for the configured signer, replaces any
//! transactions left unconfirmed, then logs a dashboard snapshot.

use anyhow::{Context, bail};
use blockdag_orchestrator::application::services::{
    ContractRegistry, TransactionBuilder, TransactionOrchestrator,
};
use blockdag_orchestrator::application::use_cases::{ContractOperations, DailyRoutine, Dashboard};
use blockdag_orchestrator::config::{AppConfig, LogConfig, LogFormat};
use blockdag_orchestrator::infrastructure::abi::FileAbiProvider;
use blockdag_orchestrator::infrastructure::chain::{ChainClient, EthersChainClient};
use blockdag_orchestrator::infrastructure::persistence::{FileLedger, OperationLedger};
use ethers::types::U256;
use ethers::utils::format_units;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.log);
    config.validate().context("validating configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_url = %config.chain.rpc_url,
        chain_id = config.chain.chain_id,
        "starting blockdag orchestrator"
    );

    let Some(private_key) = config.chain.private_key.as_deref() else {
        bail!("no signing key configured, set BDAG_PRIVATE_KEY");
    };
    let client = EthersChainClient::new(
        config.chain.rpc_url.as_str(),
        config.chain.chain_id,
        config.chain.request_timeout_ms,
    )?
    .with_private_key(private_key)?;
    let account = client
        .signer_address()
        .context("signing wallet was not attached")?;
    let chain: Arc<dyn ChainClient> = Arc::new(client);

    let mut abi = FileAbiProvider::new(config.abi_dir.clone());
    for name in config.contracts.keys() {
        abi = abi.with_path(name.as_str(), config.abi_path(name));
    }
    let registry = Arc::new(ContractRegistry::load(&abi, &config.contract_entries())?);

    let ledger: Arc<dyn OperationLedger> = Arc::new(FileLedger::new(config.ledger.path.clone()));
    let orchestrator = Arc::new(TransactionOrchestrator::new(
        chain.clone(),
        ledger,
        config.orchestrator_config(),
    ));
    let restored = orchestrator.restore().await?;

    let builder = Arc::new(
        TransactionBuilder::new(chain.clone(), account)
            .with_gas_table(config.gas.gas_table())
            .with_retry_policy(config.retry.policy()),
    );
    let operations = ContractOperations::new(registry, chain, builder, orchestrator);

    info!(account = ?account, restored, "orchestrator ready");

    let report = DailyRoutine::new(operations.clone(), config.orchestrator.step_delay())
        .run_today()
        .await;
    for result in &report.results {
        if result.success() {
            info!(%result, "daily step");
        } else {
            warn!(%result, "daily step");
        }
    }
    info!(
        date = %report.date,
        total = report.summary.total,
        succeeded = report.summary.succeeded,
        failed = report.summary.failed,
        skipped = report.summary.skipped,
        balance_before = %display_amount(report.balance_before),
        balance_after = %display_amount(report.balance_after),
        "daily routine finished"
    );

    for (operation_id, outcome) in operations
        .resubmit_timed_out(config.orchestrator.gas_bump_factor)
        .await
    {
        match outcome {
            Ok(op) => info!(%operation_id, status = %op.status(), "replacement settled"),
            Err(e) => error!(%operation_id, error = %e, "replacement failed"),
        }
    }

    let dashboard = Dashboard::collect(&operations, account).await;
    for section in &dashboard.errors {
        warn!(%section, "dashboard section unavailable");
    }
    info!(
        dashboard = %serde_json::to_string(&dashboard)?,
        "dashboard collected"
    );

    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(log.include_target);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn display_amount(amount: Option<U256>) -> String {
    match amount {
        Some(amount) => format_units(amount, 18).unwrap_or_else(|_| amount.to_string()),
        None => "unknown".to_string(),
    }
}

//! # Use Case Tests
//!
//! Scenarios for the contract operations, the daily routine and the
//! dashboard, run against the in-process mock chain.
//!
//! # Test Categories
//!
//! - **Operations**: typed writes and reads through the full pipeline
//! - **Daily Routine**: preconditions, skips, idempotent reruns
//! - **Dashboard**: complete and partial snapshots

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use ethers::abi::Token;
use ethers::types::{Address, U256};

use crate::application::services::tests::MockChainClient;
use crate::application::services::tests::fixtures::{builder, orchestrator_with, registry};
use crate::application::use_cases::contract_operations::ContractOperations;
use crate::application::use_cases::daily_routine::{
    DailyRoutine, MOBILE_MINING, PRESALE_CLAIM, STAKING_REWARDS, TOKEN_MINING,
};
use crate::application::use_cases::dashboard::Dashboard;
use crate::domain::errors::ErrorKind;
use crate::domain::value_objects::{OperationId, TxStatus, parse_address};
use crate::infrastructure::chain::{ChainClient, ChainError};
use crate::infrastructure::persistence::{InMemoryLedger, OperationLedger};

// ============================================================================
// Helpers
// ============================================================================

fn operations(chain: &Arc<MockChainClient>) -> (ContractOperations, Arc<InMemoryLedger>) {
    let ledger = Arc::new(InMemoryLedger::new());
    let client: Arc<dyn ChainClient> = chain.clone();
    let ops = ContractOperations::new(
        Arc::new(registry()),
        client,
        Arc::new(builder(chain)),
        orchestrator_with(chain, &ledger),
    );
    (ops, ledger)
}

fn uint(value: u64) -> Token {
    Token::Uint(U256::from(value))
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

/// Reads under which every daily step has work to do.
fn everything_due(chain: &MockChainClient) {
    chain.set_read("balanceOf", vec![uint(1_000)]);
    chain.set_read("canMineToday", vec![Token::Bool(true)]);
    chain.set_read("getTimeUntilNextMining", vec![uint(0)]);
    chain.set_read(
        "getPurchaseInfo",
        vec![uint(1), uint(500), Token::Bool(false), uint(0)],
    );
    chain.set_read("claimEnabled", vec![Token::Bool(true)]);
}

fn all_dashboard_reads(chain: &MockChainClient) {
    chain.set_read("getAccountInfo", vec![uint(1_000), uint(200), uint(7), uint(0)]);
    chain.set_read("totalSupply", vec![uint(1_000_000)]);
    chain.set_read("stakingAPY", vec![uint(12)]);
    chain.set_read("miningRewardRate", vec![uint(10)]);
    chain.set_read(
        "getUserMiningStats",
        vec![uint(50), uint(1), uint(3), Token::Bool(true), uint(0)],
    );
    chain.set_read(
        "getUserMiners",
        vec![Token::Array(vec![Token::Tuple(vec![
            uint(1),
            uint(20),
            uint(1_700_000_000),
            Token::Bool(true),
            uint(1_690_000_000),
            uint(400),
        ])])],
    );
    chain.set_read("getMiningStats", vec![uint(9), uint(5), uint(3), uint(1), uint(0)]);
    chain.set_read(
        "getPresaleStats",
        vec![uint(100), uint(5_000), uint(2), Token::Bool(true), Token::Bool(false), uint(3_600)],
    );
    chain.set_read(
        "getPurchaseInfo",
        vec![uint(1), uint(500), Token::Bool(false), uint(0)],
    );
    chain.set_read(
        "getWalletInfo",
        vec![Token::Bool(true), Token::Bool(false), uint(42), uint(1_700_000_000)],
    );
    chain.set_read("getDailySpendingInfo", vec![uint(100), uint(10), uint(90), uint(0)]);
}

// ============================================================================
// Contract Operations
// ============================================================================

mod contract_operations {
    use super::*;

    #[tokio::test]
    async fn transfer_runs_to_confirmation() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        let (ops, ledger) = operations(&chain);

        let op = ops
            .transfer("transfer-1", Address::repeat_byte(0x11), U256::from(100u64))
            .await
            .unwrap();

        assert_eq!(op.status(), TxStatus::Confirmed);
        assert_eq!(op.function_name(), "transfer");
        let sent = chain.broadcasts();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].to,
            parse_address("0x62a61cB53761B7C6B0A65f034BD92d839db2a1EB").unwrap()
        );
        assert_eq!(sent[0].gas_limit, U256::from(300_000u64));
        assert!(sent[0].value.is_zero());
        // Submitted then confirmed.
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn table_gas_limit_is_used_for_known_functions() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        let (ops, _) = operations(&chain);

        ops.set_daily_limit("limit-1", U256::from(5_000u64))
            .await
            .unwrap();

        assert_eq!(chain.broadcasts()[0].gas_limit, U256::from(100_000u64));
    }

    #[tokio::test]
    async fn payable_purchase_without_value_never_touches_the_network() {
        let chain = Arc::new(MockChainClient::new());
        let (ops, _) = operations(&chain);

        let err = ops
            .purchase_hardware_miner("miner-1", 2, U256::zero())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidValueForMutability);
        assert_eq!(chain.nonce_queries(), 0);
        assert_eq!(chain.gas_price_queries(), 0);
        assert_eq!(chain.broadcast_attempts(), 0);
    }

    #[tokio::test]
    async fn purchase_carries_its_value() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        let (ops, _) = operations(&chain);
        let price = U256::exp10(17);

        let op = ops.purchase_hardware_miner("miner-2", 1, price).await.unwrap();

        assert_eq!(op.status(), TxStatus::Confirmed);
        assert_eq!(op.value_transferred(), price);
        assert_eq!(chain.broadcasts()[0].gas_limit, U256::from(300_000u64));
    }

    #[tokio::test]
    async fn referral_purchase_picks_the_referral_function() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        let (ops, _) = operations(&chain);
        let value = U256::exp10(16);

        let plain = ops.buy_tokens("buy-1", value, None).await.unwrap();
        let referred = ops
            .buy_tokens("buy-2", value, Some(Address::repeat_byte(0x22)))
            .await
            .unwrap();

        assert_eq!(plain.function_name(), "buyTokens");
        assert_eq!(referred.function_name(), "buyTokensWithReferral");
        assert_eq!(referred.arguments(), &[Token::Address(Address::repeat_byte(0x22))]);
    }

    #[tokio::test]
    async fn send_tokens_encodes_the_tag() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        let (ops, _) = operations(&chain);

        let op = ops
            .send_tokens("send-1", Address::repeat_byte(0x33), U256::from(5u64), "p2p")
            .await
            .unwrap();

        assert_eq!(op.status(), TxStatus::Confirmed);
        assert_eq!(op.arguments()[2], Token::String("p2p".to_string()));
        assert_eq!(chain.broadcasts()[0].gas_limit, U256::from(200_000u64));
    }

    #[tokio::test]
    async fn repeated_id_is_broadcast_once() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        let (ops, _) = operations(&chain);

        let first = ops.mine("mine-1").await.unwrap();
        let second = ops.mine("mine-1").await.unwrap();

        assert_eq!(chain.broadcast_count(), 1);
        assert_eq!(first.submitted_hash(), second.submitted_hash());
        assert_eq!(second.status(), TxStatus::Confirmed);
    }

    #[tokio::test]
    async fn missing_receipt_times_out() {
        let chain = Arc::new(MockChainClient::new());
        let (ops, _) = operations(&chain);
        let ops = ops.with_confirmation_timeout(Duration::from_millis(20));

        let op = ops.claim_staking_rewards("stake-claim-1").await.unwrap();

        assert_eq!(op.status(), TxStatus::TimedOut);
        assert!(op.submitted_hash().is_some());
    }

    #[tokio::test]
    async fn timed_out_operations_are_replaced_with_more_gas() {
        let chain = Arc::new(MockChainClient::new());
        let (ops, _) = operations(&chain);
        let ops = ops.with_confirmation_timeout(Duration::from_millis(20));

        let stuck = ops.mine("mine-stuck").await.unwrap();
        assert_eq!(stuck.status(), TxStatus::TimedOut);

        chain.auto_receipt(true);
        let outcomes = ops.resubmit_timed_out(1.5).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0, OperationId::new("mine-stuck"));
        let replaced = outcomes[0].1.as_ref().unwrap();
        assert_eq!(replaced.status(), TxStatus::Confirmed);
        assert_eq!(replaced.nonce(), stuck.nonce());

        let sent = chain.broadcasts();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].gas_price > sent[0].gas_price);
    }

    #[tokio::test]
    async fn timed_out_operation_that_landed_is_not_replaced() {
        let chain = Arc::new(MockChainClient::new());
        let (ops, _) = operations(&chain);
        let ops = ops.with_confirmation_timeout(Duration::from_millis(20));

        let stuck = ops.mine("mine-late").await.unwrap();
        assert_eq!(stuck.status(), TxStatus::TimedOut);
        let hash = stuck.submitted_hash().unwrap();

        // Mined after the deadline passed.
        chain.set_receipt(hash, true);
        let outcomes = ops.resubmit_timed_out(1.5).await;

        assert_eq!(outcomes.len(), 1);
        let settled = outcomes[0].1.as_ref().unwrap();
        assert_eq!(settled.status(), TxStatus::Confirmed);
        assert_eq!(settled.submitted_hash(), Some(hash));
        assert_eq!(settled.gas_price(), stuck.gas_price());
        assert_eq!(chain.broadcast_count(), 1);
        assert_eq!(chain.broadcast_attempts(), 1);
    }

    #[tokio::test]
    async fn nothing_to_replace_without_timeouts() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        let (ops, _) = operations(&chain);
        ops.mine("mine-ok").await.unwrap();

        assert!(ops.resubmit_timed_out(1.2).await.is_empty());
        assert_eq!(chain.broadcast_count(), 1);
    }

    #[tokio::test]
    async fn revert_is_reported_on_the_operation() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(false);
        let (ops, _) = operations(&chain);

        let op = ops.stake("stake-1", U256::from(10u64)).await.unwrap();

        assert_eq!(op.status(), TxStatus::Failed);
        assert_eq!(op.error_kind(), Some(ErrorKind::Reverted));
    }

    #[tokio::test]
    async fn read_only_function_cannot_be_executed() {
        let chain = Arc::new(MockChainClient::new());
        let (ops, _) = operations(&chain);

        let err = ops
            .execute(
                "token",
                "balanceOf",
                vec![Token::Address(Address::zero())],
                crate::application::services::BuildOptions::new("bad-1"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ReadOnlyFunction);
        assert_eq!(chain.broadcast_attempts(), 0);
    }

    #[tokio::test]
    async fn unknown_contract_is_rejected() {
        let chain = Arc::new(MockChainClient::new());
        let (ops, _) = operations(&chain);

        let err = ops.read("nft", "ownerOf", &[]).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnknownContract);
    }

    #[tokio::test]
    async fn account_info_is_decoded() {
        let chain = Arc::new(MockChainClient::new());
        chain.set_read("getAccountInfo", vec![uint(10), uint(5), uint(1), uint(60)]);
        let (ops, _) = operations(&chain);

        let info = ops.account_info(chain.signer()).await.unwrap();

        assert_eq!(info.balance, U256::from(10u64));
        assert_eq!(info.next_mining_time, U256::from(60u64));
    }

    #[tokio::test]
    async fn malformed_read_is_internal() {
        let chain = Arc::new(MockChainClient::new());
        chain.set_read("balanceOf", vec![Token::Bool(true)]);
        let (ops, _) = operations(&chain);

        let err = ops.balance_of(chain.signer()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn transient_read_failures_are_retried() {
        let chain = Arc::new(MockChainClient::new());
        chain.set_read_error("totalSupply", ChainError::unavailable("connection reset"));
        let (ops, _) = operations(&chain);

        let err = ops.total_supply().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RpcUnavailable);
    }
}

// ============================================================================
// Daily Routine
// ============================================================================

mod daily_routine {
    use super::*;

    fn routine(chain: &Arc<MockChainClient>) -> DailyRoutine {
        let (ops, _) = operations(chain);
        DailyRoutine::new(ops, Duration::ZERO)
    }

    #[tokio::test]
    async fn every_due_step_executes() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        everything_due(&chain);

        let report = routine(&chain).run(day()).await;

        let names: Vec<_> = report.results.iter().map(|r| r.operation_name()).collect();
        assert_eq!(names, [MOBILE_MINING, TOKEN_MINING, STAKING_REWARDS, PRESALE_CLAIM]);
        assert!(report.results.iter().all(|r| r.success() && !r.is_skipped()));
        assert_eq!(report.summary.succeeded, 4);
        assert_eq!(chain.broadcast_count(), 4);
        assert_eq!(report.balance_before, Some(U256::from(1_000u64)));
        assert_eq!(report.balance_after, Some(U256::from(1_000u64)));
        assert_eq!(
            report.results[1].operation_id(),
            Some(&OperationId::new("daily:2026-03-01:token_mining"))
        );
    }

    #[tokio::test]
    async fn unmet_preconditions_skip_steps() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        everything_due(&chain);
        chain.set_read("canMineToday", vec![Token::Bool(false)]);
        chain.set_read("getTimeUntilNextMining", vec![uint(3 * 3600 + 25 * 60)]);
        chain.set_read(
            "getPurchaseInfo",
            vec![uint(1), uint(500), Token::Bool(true), uint(0)],
        );

        let report = routine(&chain).run(day()).await;

        assert_eq!(report.summary.skipped, 3);
        assert_eq!(report.summary.succeeded, 1);
        assert!(report.results[1].detail().unwrap().contains("3h 25m"));
        assert!(report.results[2].success() && !report.results[2].is_skipped());
        assert_eq!(chain.broadcast_count(), 1);
    }

    #[tokio::test]
    async fn closed_presale_claim_is_skipped() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        everything_due(&chain);
        chain.set_read("claimEnabled", vec![Token::Bool(false)]);

        let report = routine(&chain).run(day()).await;

        assert!(report.results[3].is_skipped());
        assert_eq!(chain.broadcast_count(), 3);
    }

    #[tokio::test]
    async fn rerun_on_the_same_day_broadcasts_nothing_new() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        everything_due(&chain);
        let routine = routine(&chain);

        routine.run(day()).await;
        let again = routine.run(day()).await;

        assert_eq!(chain.broadcast_count(), 4);
        assert!(again.summary.all_succeeded());
        assert!(
            again
                .results
                .iter()
                .all(|r| r.status() == Some(TxStatus::Confirmed))
        );
    }

    #[tokio::test]
    async fn next_day_runs_again() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        everything_due(&chain);
        let routine = routine(&chain);

        routine.run(day()).await;
        routine.run(day().succ_opt().unwrap()).await;

        assert_eq!(chain.broadcast_count(), 8);
    }

    #[tokio::test]
    async fn failing_step_does_not_stop_the_rest() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        everything_due(&chain);
        chain.set_read_error("canMineToday", ChainError::unavailable("connection refused"));

        let report = routine(&chain).run(day()).await;

        assert_eq!(report.results.len(), 4);
        assert!(!report.results[0].success());
        assert_eq!(report.results[0].error_kind(), Some(ErrorKind::RpcUnavailable));
        assert_eq!(
            report.results[0].operation_id(),
            Some(&OperationId::daily(day(), MOBILE_MINING))
        );
        assert!(report.results[1..].iter().all(|r| r.success()));
        assert_eq!(report.summary.failed, 1);
    }

    #[tokio::test]
    async fn reverted_step_is_failed() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(false);
        everything_due(&chain);

        let report = routine(&chain).run(day()).await;

        assert_eq!(report.summary.failed, 4);
        assert!(
            report
                .results
                .iter()
                .all(|r| r.error_kind() == Some(ErrorKind::Reverted))
        );
    }

    #[tokio::test]
    async fn unreadable_balance_is_absent() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        everything_due(&chain);
        chain.set_read_error("balanceOf", ChainError::reverted("paused"));

        let report = routine(&chain).run(day()).await;

        assert_eq!(report.balance_before, None);
        assert_eq!(report.balance_change(), None);
        assert_eq!(report.summary.succeeded, 4);
    }

    #[tokio::test]
    async fn results_are_persisted_per_step() {
        let chain = Arc::new(MockChainClient::new());
        chain.auto_receipt(true);
        everything_due(&chain);
        let (ops, ledger) = operations(&chain);

        DailyRoutine::new(ops, Duration::ZERO).run(day()).await;

        let records = ledger.records().await.unwrap();
        assert_eq!(records.len(), 8);
        assert!(
            records
                .iter()
                .all(|r| r.operation_id.as_str().starts_with("daily:2026-03-01:"))
        );
    }
}

// ============================================================================
// Dashboard
// ============================================================================

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn complete_snapshot() {
        let chain = Arc::new(MockChainClient::new());
        chain.set_balance(U256::exp10(18));
        all_dashboard_reads(&chain);
        let (ops, _) = operations(&chain);

        let dashboard = Dashboard::collect(&ops, chain.signer()).await;

        assert!(dashboard.is_complete(), "{:?}", dashboard.errors);
        let network = dashboard.network.unwrap();
        assert_eq!(network.chain_id, 1043);
        assert_eq!(network.block_number, 100);
        assert_eq!(network.native_balance, U256::exp10(18));
        assert_eq!(dashboard.token_stats.unwrap().staking_apy, U256::from(12u64));
        assert_eq!(dashboard.miners.unwrap().len(), 1);
        assert!(dashboard.purchase_info.unwrap().has_unclaimed_tokens());
        assert_eq!(dashboard.wallet_info.unwrap().telegram_id, U256::from(42u64));
    }

    #[tokio::test]
    async fn failed_section_does_not_abort_the_others() {
        let chain = Arc::new(MockChainClient::new());
        all_dashboard_reads(&chain);
        chain.set_read_error("getUserMiners", ChainError::reverted("out of gas"));
        chain.set_read("stakingAPY", vec![Token::Bool(false)]);
        let (ops, _) = operations(&chain);

        let dashboard = Dashboard::collect(&ops, chain.signer()).await;

        assert!(dashboard.miners.is_none());
        assert!(dashboard.token_stats.is_none());
        assert!(dashboard.account_info.is_some());
        assert!(dashboard.wallet_info.is_some());
        assert_eq!(dashboard.errors.len(), 2);

        let miners = dashboard
            .errors
            .iter()
            .find(|e| e.section == "miners")
            .unwrap();
        assert_eq!(miners.kind, ErrorKind::Reverted);
        let stats = dashboard
            .errors
            .iter()
            .find(|e| e.section == "token_stats")
            .unwrap();
        assert_eq!(stats.kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn snapshot_serializes() {
        let chain = Arc::new(MockChainClient::new());
        all_dashboard_reads(&chain);
        let (ops, _) = operations(&chain);

        let dashboard = Dashboard::collect(&ops, chain.signer()).await;
        let json = serde_json::to_value(&dashboard).unwrap();

        assert!(json.get("account_info").is_some());
        assert_eq!(json["errors"], serde_json::json!([]));
    }
}

//! # Daily Routine Use Case
//!
//! The once-a-day batch for one account: mobile mining, token mining,
//! staking reward claim and presale claim, in that order.
//!
//! Each step checks its on-chain precondition first and is skipped when it
//! does not hold. Operation ids are derived from the calendar day, so
//! running the routine twice on the same day never broadcasts a step twice.

use crate::application::error::ApplicationResult;
use crate::application::services::{OperationSequencer, RoutineStep, StepOutcome};
use crate::application::use_cases::contract_operations::ContractOperations;
use crate::domain::entities::{PendingOperation, RoutineResult, RoutineSummary};
use crate::domain::value_objects::OperationId;
use chrono::{NaiveDate, Utc};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Step name of the mobile mining call.
pub const MOBILE_MINING: &str = "mobile_mining";
/// Step name of the token mining call.
pub const TOKEN_MINING: &str = "token_mining";
/// Step name of the staking reward claim.
pub const STAKING_REWARDS: &str = "staking_rewards";
/// Step name of the presale claim.
pub const PRESALE_CLAIM: &str = "presale_claim";

/// Outcome of one daily run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    /// Day the operation ids were derived from.
    pub date: NaiveDate,
    /// Account the routine ran for.
    pub account: Address,
    /// Token balance before the first step, if it could be read.
    pub balance_before: Option<U256>,
    /// Token balance after the last step, if it could be read.
    pub balance_after: Option<U256>,
    /// One result per step, in order.
    pub results: Vec<RoutineResult>,
    /// Counts over `results`.
    pub summary: RoutineSummary,
}

impl DailyReport {
    /// Balance gained over the run, if both reads succeeded.
    #[must_use]
    pub fn balance_change(&self) -> Option<U256> {
        match (self.balance_before, self.balance_after) {
            (Some(before), Some(after)) => Some(after.saturating_sub(before)),
            _ => None,
        }
    }
}

/// Daily batch runner.
#[derive(Debug, Clone)]
pub struct DailyRoutine {
    operations: ContractOperations,
    sequencer: OperationSequencer,
}

impl DailyRoutine {
    /// Creates the routine, pausing `step_delay` between steps.
    #[must_use]
    pub fn new(operations: ContractOperations, step_delay: Duration) -> Self {
        Self {
            operations,
            sequencer: OperationSequencer::new().with_step_delay(step_delay),
        }
    }

    /// Runs the routine for the current UTC day.
    pub async fn run_today(&self) -> DailyReport {
        self.run(Utc::now().date_naive()).await
    }

    /// Runs the routine with operation ids derived from `day`.
    pub async fn run(&self, day: NaiveDate) -> DailyReport {
        let account = self.operations.account();
        info!(%day, account = ?account, "starting daily routine");

        let balance_before = self.balance(account).await;
        let results = self.sequencer.run("daily", self.steps(day)).await;
        let balance_after = self.balance(account).await;
        let summary = RoutineSummary::from_results(&results);

        DailyReport {
            date: day,
            account,
            balance_before,
            balance_after,
            results,
            summary,
        }
    }

    /// The routine's steps for `day`, in execution order.
    #[must_use]
    pub fn steps(&self, day: NaiveDate) -> Vec<RoutineStep> {
        vec![
            self.mobile_mining(day),
            self.token_mining(day),
            self.staking_rewards(day),
            self.presale_claim(day),
        ]
    }

    async fn balance(&self, account: Address) -> Option<U256> {
        self.operations
            .balance_of(account)
            .await
            .inspect_err(|e| warn!(error = %e, "could not read token balance"))
            .ok()
    }

    fn mobile_mining(&self, day: NaiveDate) -> RoutineStep {
        let ops = self.operations.clone();
        let id = OperationId::daily(day, MOBILE_MINING);
        let step_id = id.clone();
        RoutineStep::new(MOBILE_MINING, move || async move {
            if !ops.can_mine_today(ops.account()).await? {
                return Ok(StepOutcome::Skipped(
                    "mobile mining already done today".to_string(),
                ));
            }
            executed(ops.perform_mobile_mining(step_id).await)
        })
        .with_operation_id(id)
    }

    fn token_mining(&self, day: NaiveDate) -> RoutineStep {
        let ops = self.operations.clone();
        let id = OperationId::daily(day, TOKEN_MINING);
        let step_id = id.clone();
        RoutineStep::new(TOKEN_MINING, move || async move {
            let wait = ops.time_until_next_mining(ops.account()).await?;
            if !wait.is_zero() {
                return Ok(StepOutcome::Skipped(format!(
                    "next token mining in {}",
                    format_wait(wait)
                )));
            }
            executed(ops.mine(step_id).await)
        })
        .with_operation_id(id)
    }

    fn staking_rewards(&self, day: NaiveDate) -> RoutineStep {
        let ops = self.operations.clone();
        let id = OperationId::daily(day, STAKING_REWARDS);
        let step_id = id.clone();
        RoutineStep::new(STAKING_REWARDS, move || async move {
            executed(ops.claim_staking_rewards(step_id).await)
        })
        .with_operation_id(id)
    }

    fn presale_claim(&self, day: NaiveDate) -> RoutineStep {
        let ops = self.operations.clone();
        let id = OperationId::daily(day, PRESALE_CLAIM);
        let step_id = id.clone();
        RoutineStep::new(PRESALE_CLAIM, move || async move {
            let purchase = ops.purchase_info(ops.account()).await?;
            if !purchase.has_unclaimed_tokens() {
                return Ok(StepOutcome::Skipped(format!(
                    "nothing to claim ({})",
                    purchase
                )));
            }
            if !ops.claim_enabled().await? {
                return Ok(StepOutcome::Skipped("presale claims not open".to_string()));
            }
            executed(ops.claim_presale_tokens(step_id).await)
        })
        .with_operation_id(id)
    }
}

fn executed(result: ApplicationResult<PendingOperation>) -> ApplicationResult<StepOutcome> {
    result.map(StepOutcome::Executed)
}

/// Renders a wait in seconds as `<h>h <m>m`.
fn format_wait(seconds: U256) -> String {
    let seconds = if seconds > U256::from(u64::MAX) {
        u64::MAX
    } else {
        seconds.as_u64()
    };
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_is_rendered_in_hours_and_minutes() {
        assert_eq!(format_wait(U256::from(3 * 3600 + 25 * 60 + 7u64)), "3h 25m");
        assert_eq!(format_wait(U256::from(59u64)), "0h 0m");
    }

    #[test]
    fn huge_wait_saturates() {
        assert!(format_wait(U256::MAX).ends_with('m'));
    }

    #[test]
    fn balance_change_needs_both_reads() {
        let report = DailyReport {
            date: NaiveDate::default(),
            account: Address::zero(),
            balance_before: Some(U256::from(10u64)),
            balance_after: Some(U256::from(25u64)),
            results: vec![],
            summary: RoutineSummary::default(),
        };
        assert_eq!(report.balance_change(), Some(U256::from(15u64)));

        let partial = DailyReport {
            balance_after: None,
            ..report
        };
        assert_eq!(partial.balance_change(), None);
    }
}

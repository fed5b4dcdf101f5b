//! # Operation Sequencer
//!
//! Runs named steps strictly in order and reports one [`RoutineResult`]
//! per step.
//!
//! A step that errors, panics or ends in any status other than confirmed
//! is recorded as failed and the next step still runs. Nothing a step does
//! escapes [`OperationSequencer::run`]; transient errors are never retried
//! here.

use crate::application::error::ApplicationResult;
use crate::domain::entities::{PendingOperation, RoutineResult, RoutineSummary};
use crate::domain::errors::ErrorKind;
use crate::domain::value_objects::OperationId;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::time::Duration;
use tracing::{info, warn};

/// What a step did.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// An operation was submitted and awaited.
    Executed(PendingOperation),
    /// The step's precondition was not met.
    Skipped(String),
}

/// Boxed future returned by a step.
pub type StepFuture = Pin<Box<dyn Future<Output = ApplicationResult<StepOutcome>> + Send>>;

/// A named unit of work.
pub struct RoutineStep {
    name: String,
    operation_id: Option<OperationId>,
    thunk: Box<dyn FnOnce() -> StepFuture + Send>,
}

impl RoutineStep {
    /// Creates a step from an async closure.
    pub fn new<F, Fut>(name: impl Into<String>, thunk: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ApplicationResult<StepOutcome>> + Send + 'static,
    {
        Self {
            name: name.into(),
            operation_id: None,
            thunk: Box::new(move || Box::pin(thunk()) as StepFuture),
        }
    }

    /// Tags the step with the operation id it submits under, so errors
    /// can be traced to it.
    #[must_use]
    pub fn with_operation_id(mut self, operation_id: OperationId) -> Self {
        self.operation_id = Some(operation_id);
        self
    }

    /// Returns the step name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for RoutineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineStep")
            .field("name", &self.name)
            .field("operation_id", &self.operation_id)
            .finish_non_exhaustive()
    }
}

/// Sequential step runner.
#[derive(Debug, Clone, Default)]
pub struct OperationSequencer {
    step_delay: Duration,
}

impl OperationSequencer {
    /// Creates a sequencer without pacing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits `step_delay` between consecutive steps.
    #[must_use]
    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    /// Runs every step in order, returning exactly one result per step.
    pub async fn run(&self, routine_name: &str, steps: Vec<RoutineStep>) -> Vec<RoutineResult> {
        let total = steps.len();
        let mut results = Vec::with_capacity(total);
        info!(routine = routine_name, steps = total, "starting routine");

        for (index, step) in steps.into_iter().enumerate() {
            if index > 0 && !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            let result = Self::run_step(step).await;
            if result.success() {
                info!(routine = routine_name, step = index + 1, %result, "step finished");
            } else {
                warn!(routine = routine_name, step = index + 1, %result, "step failed");
            }
            results.push(result);
        }

        let summary = RoutineSummary::from_results(&results);
        info!(
            routine = routine_name,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "routine finished"
        );
        results
    }

    async fn run_step(step: RoutineStep) -> RoutineResult {
        let RoutineStep {
            name,
            operation_id,
            thunk,
        } = step;

        let outcome = match catch_unwind(AssertUnwindSafe(thunk)) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(payload) => Err(payload),
        };

        match outcome {
            Ok(Ok(StepOutcome::Executed(op))) => RoutineResult::from_operation(name, &op),
            Ok(Ok(StepOutcome::Skipped(reason))) => RoutineResult::skipped(name, reason),
            Ok(Err(e)) => RoutineResult::errored(name, operation_id, e.kind(), e.to_string()),
            Err(payload) => RoutineResult::errored(
                name,
                operation_id,
                ErrorKind::Internal,
                format!("step panicked: {}", panic_message(payload.as_ref())),
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

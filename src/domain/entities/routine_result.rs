//! # Routine Results
//!
//! Per-step outcome of a sequenced routine and the summary over a run.

use crate::domain::entities::PendingOperation;
use crate::domain::errors::ErrorKind;
use crate::domain::value_objects::{OperationId, TxStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one routine step. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineResult {
    operation_name: String,
    success: bool,
    skipped: bool,
    operation_id: Option<OperationId>,
    error_kind: Option<ErrorKind>,
    status: Option<TxStatus>,
    detail: Option<String>,
}

impl RoutineResult {
    /// Result of a step that executed an operation.
    ///
    /// Successful only if the operation is confirmed. A timed-out
    /// operation is reported with [`ErrorKind::ConfirmationTimeout`].
    #[must_use]
    pub fn from_operation(operation_name: impl Into<String>, op: &PendingOperation) -> Self {
        let status = op.status();
        let error_kind = match status {
            TxStatus::Confirmed => None,
            TxStatus::TimedOut => Some(ErrorKind::ConfirmationTimeout),
            _ => Some(op.error_kind().unwrap_or(ErrorKind::Internal)),
        };
        let detail = match status {
            TxStatus::Confirmed => op.submitted_hash().map(|h| format!("{h:?}")),
            TxStatus::TimedOut => Some("no receipt within the confirmation window".to_string()),
            _ => op.failure().map(|f| f.reason.clone()),
        };
        Self {
            operation_name: operation_name.into(),
            success: status.is_success(),
            skipped: false,
            operation_id: Some(op.operation_id().clone()),
            error_kind,
            status: Some(status),
            detail,
        }
    }

    /// Result of a step whose precondition was not met.
    #[must_use]
    pub fn skipped(operation_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            success: true,
            skipped: true,
            operation_id: None,
            error_kind: None,
            status: None,
            detail: Some(reason.into()),
        }
    }

    /// Result of a step that returned an error or panicked.
    #[must_use]
    pub fn errored(
        operation_name: impl Into<String>,
        operation_id: Option<OperationId>,
        error_kind: ErrorKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            operation_name: operation_name.into(),
            success: false,
            skipped: false,
            operation_id,
            error_kind: Some(error_kind),
            status: None,
            detail: Some(reason.into()),
        }
    }

    /// Returns the step name.
    #[inline]
    #[must_use]
    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// Returns true if the step confirmed or was skipped.
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    /// Returns true if the step was skipped.
    #[inline]
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Returns the operation id, if one was executed.
    #[inline]
    #[must_use]
    pub fn operation_id(&self) -> Option<&OperationId> {
        self.operation_id.as_ref()
    }

    /// Returns the failure classification.
    #[inline]
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// Returns the final operation status, if an operation ran.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<TxStatus> {
        self.status
    }

    /// Returns the skip reason, failure reason or confirmed hash.
    #[inline]
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for RoutineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match (self.success, self.skipped) {
            (true, true) => "skipped",
            (true, false) => "ok",
            (false, _) => "failed",
        };
        write!(f, "{}: {}", self.operation_name, outcome)?;
        if let Some(kind) = self.error_kind {
            write!(f, " [{}]", kind)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

/// Counts over the results of one routine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSummary {
    /// Number of steps.
    pub total: usize,
    /// Steps that confirmed.
    pub succeeded: usize,
    /// Steps that failed.
    pub failed: usize,
    /// Steps skipped on a precondition.
    pub skipped: usize,
}

impl RoutineSummary {
    /// Summarizes a result list.
    #[must_use]
    pub fn from_results(results: &[RoutineResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            match (r.success, r.skipped) {
                (true, true) => acc.skipped += 1,
                (true, false) => acc.succeeded += 1,
                (false, _) => acc.failed += 1,
            }
            acc
        })
    }

    /// Returns true if no step failed.
    #[inline]
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

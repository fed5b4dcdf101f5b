//! # Application Layer
//!
//! Services and use cases that move contract calls through their lifecycle.
//!
//! ## Services
//!
//! - [`ContractRegistry`]: logical contract names to descriptors
//! - [`TransactionBuilder`]: validated unsigned calls with gas and nonce filled in
//! - [`TransactionOrchestrator`]: idempotent submission, confirmation and gas bumps
//! - [`OperationSequencer`]: ordered routines that survive step failures
//!
//! ## Use Cases
//!
//! - [`ContractOperations`]: typed reads and writes on the BlockDAG contracts
//! - [`DailyRoutine`]: the once-a-day mining and claiming batch
//! - [`Dashboard`]: read-only account snapshot

pub mod dto;
pub mod error;
pub mod services;
pub mod use_cases;

pub use error::{ApplicationError, ApplicationResult};
pub use services::{
    BuildOptions, ContractEntry, ContractRegistry, GasTable, OperationSequencer,
    OrchestratorConfig, RetryPolicy, RoutineStep, StepOutcome, TransactionBuilder,
    TransactionOrchestrator,
};
pub use use_cases::{ContractOperations, DailyReport, DailyRoutine, Dashboard};

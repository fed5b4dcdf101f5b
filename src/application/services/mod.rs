//! # Application Services
//!
//! Services that drive contract calls through their lifecycle.
//!
//! - [`ContractRegistry`]: logical name → contract descriptor
//! - [`TransactionBuilder`]: validated, fully populated unsigned calls
//! - [`TransactionOrchestrator`]: submission, confirmation and gas bumps
//! - [`OperationSequencer`]: ordered routines that survive step failures

pub mod contract_registry;
pub mod nonce_manager;
pub mod orchestrator;
pub mod retry;
pub mod sequencer;
pub mod transaction_builder;


pub use contract_registry::{ContractEntry, ContractRegistry};
pub use nonce_manager::{AccountNonce, NonceManager};
pub use orchestrator::{OrchestratorConfig, TransactionOrchestrator};
pub use retry::{RetryError, RetryPolicy, Retryable, execute_with_retry, retry_chain};
pub use sequencer::{OperationSequencer, RoutineStep, StepFuture, StepOutcome};
pub use transaction_builder::{BuildOptions, DEFAULT_GAS_LIMIT, GasTable, TransactionBuilder};

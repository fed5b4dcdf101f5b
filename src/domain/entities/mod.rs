//! # Domain Entities
//!
//! ## Aggregates
//!
//! - [`PendingOperation`]: contract call with its transaction lifecycle
//!
//! ## Entities
//!
//! - [`ContractDescriptor`]: registered contract
//! - [`RoutineResult`]: outcome of one sequenced step

pub mod contract_descriptor;
pub mod pending_operation;
pub mod routine_result;

pub use contract_descriptor::{ContractDescriptor, ContractRef};
pub use pending_operation::{OperationFailure, PendingOperation, RestoredState};
pub use routine_result::{RoutineResult, RoutineSummary};

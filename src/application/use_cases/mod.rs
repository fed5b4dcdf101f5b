//! # Use Cases
//!
//! Workflows built on the application services.
//!
//! - [`ContractOperations`]: typed reads and writes on the BlockDAG contracts
//! - [`DailyRoutine`]: the once-a-day mining and claiming batch
//! - [`Dashboard`]: read-only snapshot of one account

pub mod contract_operations;
pub mod daily_routine;
pub mod dashboard;

#[cfg(test)]
mod tests;

pub use contract_operations::{ContractOperations, MINING, PRESALE, TOKEN, WALLET};
pub use daily_routine::{DailyReport, DailyRoutine};
pub use dashboard::{Dashboard, NetworkInfo, SectionError};

//! # Persistence Layer
//!
//! Operation ledger port and its implementations.

pub mod file_ledger;
pub mod in_memory;
pub mod ledger;

pub use file_ledger::FileLedger;
pub use in_memory::InMemoryLedger;
pub use ledger::{LedgerError, LedgerRecord, LedgerResult, OperationLedger, replay};

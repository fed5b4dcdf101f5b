//! # In-Memory Persistence
//!
//! Storage implementations that live only as long as the process.

pub mod ledger;

pub use ledger::InMemoryLedger;

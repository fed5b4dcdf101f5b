//! # Infrastructure Layer
//!
//! External adapters and implementations of application ports.
//!
//! ## Chain
//!
//! Node access and signing over ethers-rs.
//!
//! ## ABI
//!
//! File-backed contract interface loading.
//!
//! ## Persistence
//!
//! Operation ledger:
//! - JSON-lines file ledger
//! - In-memory ledger for tests

pub mod abi;
pub mod chain;
pub mod persistence;

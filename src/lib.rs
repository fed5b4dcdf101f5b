//! # BlockDAG Orchestrator
//!
//! Transaction lifecycle orchestration for BlockDAG smart-contract
//! operations: staking, mining, presale claims and wallet management on the
//! BlockDAG EVM-compatible chain.
//!
//! ## Architecture
//!
//! This crate follows Domain-Driven Design with a layered architecture:
//!
//! - **Domain Layer** (`domain`): pending operations, the status machine, contract descriptors
//! - **Application Layer** (`application`): registry, builder, orchestrator, sequencer and use cases
//! - **Infrastructure Layer** (`infrastructure`): ethers chain client, ABI files, operation ledger
//!
//! ## Guarantees
//!
//! - Submitting twice under one operation id never broadcasts twice
//! - Nonces per signing account are assigned strictly in order
//! - Confirmed and failed operations never change again
//! - A routine reports one result per step whatever the steps do
//!
//! ## Example
//!
//! ```rust,ignore
//! use blockdag_orchestrator::application::{ContractOperations, DailyRoutine};
//!
//! let report = DailyRoutine::new(operations, step_delay).run_today().await;
//! println!("{} of {} steps succeeded", report.summary.succeeded, report.summary.total);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

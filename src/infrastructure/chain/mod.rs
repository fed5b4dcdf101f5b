//! # Chain Access
//!
//! Port and ethers-rs adapter for node access and transaction signing.
//!
//! - [`ChainClient`]: the port the application layer depends on
//! - [`EthersChainClient`]: HTTP provider plus local wallet
//! - [`ChainError`]: transport and node errors

pub mod client;
pub mod error;
pub mod ethers_client;


pub use client::ChainClient;
pub use error::{ChainError, ChainResult};
pub use ethers_client::EthersChainClient;

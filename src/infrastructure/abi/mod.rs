//! # ABI Providers
//!
//! Sources of contract interfaces, keyed by logical contract name.

pub mod file_provider;

pub use file_provider::{AbiError, AbiProvider, AbiResult, FileAbiProvider, StaticAbiProvider, parse_abi};

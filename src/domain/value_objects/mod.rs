//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`OperationId`]: caller-supplied idempotency key
//! - [`ContractName`]: logical contract name
//!
//! ## Chain Types
//!
//! - [`parse_address`]: EIP-55 aware address parsing
//! - [`UnsignedTransaction`], [`SignedTransaction`], [`Receipt`]
//! - [`Mutability`]: read, write or payable call surface
//!
//! ## State Types
//!
//! - [`TxStatus`]: operation lifecycle state machine
//! - [`Timestamp`]: UTC instant

pub mod address;
pub mod ids;
pub mod mutability;
pub mod timestamp;
pub mod transaction;
pub mod tx_status;

pub use address::{checksum, parse_address};
pub use ids::{ContractName, OperationId};
pub use mutability::Mutability;
pub use timestamp::Timestamp;
pub use transaction::{Receipt, SignedTransaction, UnsignedTransaction, bump_gas_price};
pub use tx_status::{InvalidTxStatusError, TxStatus};

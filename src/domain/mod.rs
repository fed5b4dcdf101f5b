//! # Domain Layer
//!
//! Core types of transaction orchestration.
//!
//! This layer contains:
//! - **Entities**: the pending operation aggregate, contract descriptors and routine results
//! - **Value Objects**: identifiers, addresses, transaction shapes and the status machine
//! - **Errors**: domain error types and the flat error taxonomy

pub mod entities;
pub mod errors;
pub mod value_objects;

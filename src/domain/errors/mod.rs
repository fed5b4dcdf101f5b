//! # Domain Errors
//!
//! Typed error types for domain operations.
//!
//! Error codes are organized by category:
//! - 1000-1999: Validation errors
//! - 2000-2999: State errors
//!
//! Every error maps onto the flat [`ErrorKind`] taxonomy.
//!
//! # Examples
//!
//! ```
//! use blockdag_orchestrator::domain::errors::{DomainError, DomainResult, ErrorKind};
//!
//! fn require_contract(name: &str) -> DomainResult<()> {
//!     if name.is_empty() {
//!         return Err(DomainError::UnknownContract(name.to_string()));
//!     }
//!     Ok(())
//! }
//!
//! let err = require_contract("").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::UnknownContract);
//! ```

pub mod domain_error;
pub mod error_kind;

pub use domain_error::{DomainError, DomainResult};
pub use error_kind::ErrorKind;

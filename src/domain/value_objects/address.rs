//! # Addresses
//!
//! EIP-55 aware parsing of 20-byte account and contract addresses.
//!
//! Mixed-case input must match its checksum exactly. All-lowercase and
//! all-uppercase hex carry no checksum and are accepted as-is.
//!
//! # Examples
//!
//! ```
//! use blockdag_orchestrator::domain::value_objects::address::{checksum, parse_address};
//!
//! let addr = parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
//! assert_eq!(checksum(&addr), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
//!
//! assert!(parse_address("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use ethers::types::Address;
use ethers::utils::to_checksum;

/// Parses a hex address, validating its EIP-55 checksum when mixed case.
///
/// # Errors
///
/// Returns [`DomainError::InvalidAddress`] if the input is not 40 hex
/// digits (optionally `0x`-prefixed) or a mixed-case checksum mismatches.
pub fn parse_address(input: &str) -> DomainResult<Address> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DomainError::InvalidAddress(input.to_string()));
    }

    let address: Address = body
        .parse()
        .map_err(|_| DomainError::InvalidAddress(input.to_string()))?;

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && checksum(&address)[2..] != *body {
        return Err(DomainError::InvalidAddress(input.to_string()));
    }

    Ok(address)
}

/// Returns the EIP-55 checksummed, `0x`-prefixed form of an address.
#[must_use]
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // Vectors from EIP-55.
    const CHECKSUMMED: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn accepts_valid_checksums() {
        for input in CHECKSUMMED {
            let addr = parse_address(input).unwrap();
            assert_eq!(checksum(&addr), input);
        }
    }

    #[test]
    fn accepts_single_case_hex() {
        let lower = parse_address("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359").unwrap();
        let upper = parse_address("0xFB6916095CA1DF60BB79CE92CE3EA74C37C5D359").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(checksum(&lower), CHECKSUMMED[1]);
    }

    #[test]
    fn accepts_missing_prefix() {
        assert!(parse_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_ok());
    }

    #[test]
    fn rejects_bad_checksum() {
        let err = parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD").unwrap_err();
        assert!(matches!(err, DomainError::InvalidAddress(_)));
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("0xzzAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
        assert!(parse_address("").is_err());
    }
}

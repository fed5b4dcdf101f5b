//! # Transactions
//!
//! Chain-facing transaction shapes: the unsigned request handed to the
//! signer, the signed payload handed to the node and the receipt summary
//! returned by it.

use crate::domain::errors::{DomainError, DomainResult};
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

/// Legacy (gas price) transaction request, fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Signing account.
    pub from: Address,
    /// Contract address.
    pub to: Address,
    /// ABI-encoded call data.
    pub data: Bytes,
    /// Value transferred in wei.
    pub value: U256,
    /// Gas limit.
    pub gas_limit: U256,
    /// Gas price in wei.
    pub gas_price: U256,
    /// Account nonce.
    pub nonce: U256,
    /// Chain id for replay protection.
    pub chain_id: u64,
}

/// RLP-encoded signed transaction and its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Raw bytes accepted by `eth_sendRawTransaction`.
    pub raw: Bytes,
    /// Keccak hash of `raw`.
    pub hash: H256,
}

/// Summary of a mined transaction's receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hash the receipt belongs to.
    pub tx_hash: H256,
    /// False when execution reverted.
    pub success: bool,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// Gas consumed.
    pub gas_used: Option<U256>,
}

/// Precision used to turn a float bump factor into integer arithmetic.
const BUMP_PRECISION: u64 = 1_000;

/// Computes a replacement gas price.
///
/// The result is always strictly greater than `current`.
///
/// # Errors
///
/// Returns [`DomainError::InvalidGasBump`] if `factor` is not a finite
/// number greater than one or the result overflows.
///
/// # Examples
///
/// ```
/// use blockdag_orchestrator::domain::value_objects::transaction::bump_gas_price;
/// use ethers::types::U256;
///
/// let bumped = bump_gas_price(U256::from(20_000_000_000u64), 1.2).unwrap();
/// assert_eq!(bumped, U256::from(24_000_000_000u64));
/// assert!(bump_gas_price(U256::from(1u64), 1.0).is_err());
/// ```
pub fn bump_gas_price(current: U256, factor: f64) -> DomainResult<U256> {
    if !factor.is_finite() || factor <= 1.0 {
        return Err(DomainError::InvalidGasBump(factor.to_string()));
    }

    // Saturating float to integer cast.
    let scaled = (factor * BUMP_PRECISION as f64).round() as u128;
    let bumped = current
        .checked_mul(U256::from(scaled))
        .map(|v| v / U256::from(BUMP_PRECISION))
        .ok_or_else(|| DomainError::InvalidGasBump(factor.to_string()))?;

    if bumped > current {
        Ok(bumped)
    } else {
        current
            .checked_add(U256::one())
            .ok_or_else(|| DomainError::InvalidGasBump(factor.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod gas_bump {
        use super::*;

        #[test]
        fn multiplies_price() {
            let bumped = bump_gas_price(U256::from(1_000u64), 1.5).unwrap();
            assert_eq!(bumped, U256::from(1_500u64));
        }

        #[test]
        fn always_strictly_increases() {
            assert_eq!(
                bump_gas_price(U256::from(1u64), 1.0001).unwrap(),
                U256::from(2u64)
            );
            assert_eq!(bump_gas_price(U256::zero(), 2.0).unwrap(), U256::one());
        }

        #[test]
        fn rejects_non_increasing_factors() {
            for factor in [1.0, 0.5, -2.0, f64::NAN, f64::INFINITY] {
                let err = bump_gas_price(U256::from(10u64), factor).unwrap_err();
                assert!(matches!(err, DomainError::InvalidGasBump(_)));
            }
        }

        #[test]
        fn rejects_overflow() {
            assert!(bump_gas_price(U256::MAX, 2.0).is_err());
        }
    }
}

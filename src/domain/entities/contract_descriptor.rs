//! # Contract Descriptor
//!
//! Registered contract: logical name, address, interface and the widest
//! call surface it may be used for.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{ContractName, Mutability, checksum};
use ethers::abi::{Abi, Function, Token};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered contract. Immutable once created.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    name: ContractName,
    address: Address,
    interface: Abi,
    mutability: Mutability,
}

impl ContractDescriptor {
    /// Creates a descriptor from an already validated address.
    #[must_use]
    pub fn new(
        name: impl Into<ContractName>,
        address: Address,
        interface: Abi,
        mutability: Mutability,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            interface,
            mutability,
        }
    }

    /// Returns the logical name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &ContractName {
        &self.name
    }

    /// Returns the contract address.
    #[inline]
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the contract interface.
    #[inline]
    #[must_use]
    pub fn interface(&self) -> &Abi {
        &self.interface
    }

    /// Returns the registered call surface.
    #[inline]
    #[must_use]
    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    /// Returns every overload of `function_name`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::FunctionNotFound`] if the interface has no
    /// function with that name.
    pub fn functions(&self, function_name: &str) -> DomainResult<&[Function]> {
        self.interface
            .functions_by_name(function_name)
            .map(Vec::as_slice)
            .map_err(|_| DomainError::FunctionNotFound {
                contract: self.name.to_string(),
                function: function_name.to_string(),
            })
    }

    /// Resolves the overload of `function_name` that accepts `arguments`.
    ///
    /// The first overload whose parameter list type-checks wins.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::FunctionNotFound`] if no function has that
    /// name and [`DomainError::ArgumentTypeMismatch`] if none accepts the
    /// arguments.
    pub fn resolve_function(&self, function_name: &str, arguments: &[Token]) -> DomainResult<&Function> {
        let overloads = self.functions(function_name)?;
        overloads
            .iter()
            .find(|f| {
                let kinds: Vec<_> = f.inputs.iter().map(|p| p.kind.clone()).collect();
                Token::types_check(arguments, &kinds)
            })
            .ok_or_else(|| {
                let expected: Vec<String> = overloads.iter().map(signature).collect();
                DomainError::ArgumentTypeMismatch {
                    function: function_name.to_string(),
                    message: format!(
                        "{} argument(s) given, expected one of {}",
                        arguments.len(),
                        expected.join(" | ")
                    ),
                }
            })
    }

    /// Serializable reference to this contract.
    #[must_use]
    pub fn to_ref(&self) -> ContractRef {
        ContractRef {
            name: self.name.clone(),
            address: self.address,
        }
    }
}

fn signature(function: &Function) -> String {
    let inputs: Vec<String> = function.inputs.iter().map(|p| p.kind.to_string()).collect();
    format!("{}({})", function.name, inputs.join(","))
}

impl fmt::Display for ContractDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({})",
            self.name,
            checksum(&self.address),
            self.mutability
        )
    }
}

/// Name and address of a contract, as carried by operation snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractRef {
    /// Logical name.
    pub name: ContractName,
    /// Contract address.
    pub address: Address,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn erc20_abi() -> Abi {
        serde_json::from_str(
            r#"[
                {"type":"function","name":"transfer","stateMutability":"nonpayable",
                 "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
                 "outputs":[{"name":"","type":"bool"}]},
                {"type":"function","name":"balanceOf","stateMutability":"view",
                 "inputs":[{"name":"owner","type":"address"}],
                 "outputs":[{"name":"","type":"uint256"}]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn finds_functions_by_name() {
        let descriptor =
            ContractDescriptor::new("token", Address::zero(), erc20_abi(), Mutability::Write);
        assert_eq!(descriptor.functions("transfer").unwrap().len(), 1);
    }

    #[test]
    fn missing_function_is_reported() {
        let descriptor =
            ContractDescriptor::new("token", Address::zero(), erc20_abi(), Mutability::Write);
        let err = descriptor.functions("burn").unwrap_err();
        assert_eq!(
            err,
            DomainError::FunctionNotFound {
                contract: "token".to_string(),
                function: "burn".to_string(),
            }
        );
    }

    mod resolve_function {
        use super::*;
        use ethers::types::U256;

        #[test]
        fn accepts_matching_arguments() {
            let descriptor =
                ContractDescriptor::new("token", Address::zero(), erc20_abi(), Mutability::Write);
            let args = [
                Token::Address(Address::repeat_byte(3)),
                Token::Uint(U256::from(100u64)),
            ];
            let function = descriptor.resolve_function("transfer", &args).unwrap();
            assert_eq!(function.name, "transfer");
        }

        #[test]
        fn rejects_wrong_arity() {
            let descriptor =
                ContractDescriptor::new("token", Address::zero(), erc20_abi(), Mutability::Write);
            let err = descriptor
                .resolve_function("transfer", &[Token::Uint(U256::one())])
                .unwrap_err();
            match err {
                DomainError::ArgumentTypeMismatch { function, message } => {
                    assert_eq!(function, "transfer");
                    assert!(message.contains("transfer(address,uint256)"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn rejects_wrong_types() {
            let descriptor =
                ContractDescriptor::new("token", Address::zero(), erc20_abi(), Mutability::Write);
            let args = [Token::Bool(true), Token::Uint(U256::one())];
            assert!(matches!(
                descriptor.resolve_function("transfer", &args),
                Err(DomainError::ArgumentTypeMismatch { .. })
            ));
        }
    }

    #[test]
    fn to_ref_keeps_name_and_address() {
        let address = Address::repeat_byte(0x11);
        let abi: Abi = serde_json::from_str("[]").unwrap();
        let descriptor = ContractDescriptor::new("mining", address, abi, Mutability::Read);
        let contract_ref = descriptor.to_ref();
        assert_eq!(contract_ref.name.as_str(), "mining");
        assert_eq!(contract_ref.address, address);
    }
}

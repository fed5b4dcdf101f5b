//! # Contract Registry
//!
//! Logical name → [`ContractDescriptor`] mapping.
//!
//! Registration needs `&mut self`; once built the registry is shared
//! behind an `Arc` and only looked up.
//!
//! # Examples
//!
//! ```
//! use blockdag_orchestrator::application::services::ContractRegistry;
//! use blockdag_orchestrator::domain::value_objects::Mutability;
//! use ethers::abi::Abi;
//!
//! let mut registry = ContractRegistry::new();
//! let abi: Abi = serde_json::from_str("[]").unwrap();
//! registry
//!     .register("token", "0x62a61cB53761B7C6B0A65f034BD92d839db2a1EB", abi, Mutability::Write)
//!     .unwrap();
//! assert!(registry.resolve("token").is_ok());
//! assert!(registry.resolve("nft").is_err());
//! ```

use crate::domain::entities::ContractDescriptor;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{ContractName, Mutability, parse_address};
use crate::infrastructure::abi::AbiProvider;
use ethers::abi::Abi;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// One contract to register from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractEntry {
    /// Logical name.
    pub name: String,
    /// Hex address, checksummed or single-case.
    pub address: String,
    /// Widest call surface allowed.
    pub mutability: Mutability,
}

impl ContractEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>, mutability: Mutability) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            mutability,
        }
    }
}

/// Registry of known contracts.
#[derive(Debug, Default, Clone)]
pub struct ContractRegistry {
    contracts: HashMap<ContractName, Arc<ContractDescriptor>>,
}

impl ContractRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every entry, loading interfaces through `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownContract`] if the provider has no
    /// interface for an entry, plus any [`register`](Self::register) error.
    pub fn load(provider: &dyn AbiProvider, entries: &[ContractEntry]) -> DomainResult<Self> {
        let mut registry = Self::new();
        for entry in entries {
            let name = ContractName::new(entry.name.as_str());
            let abi = provider.load(&name).map_err(|e| {
                warn!(contract = %name, error = %e, "no interface for contract");
                DomainError::UnknownContract(entry.name.clone())
            })?;
            registry.register(entry.name.as_str(), &entry.address, abi, entry.mutability)?;
        }
        Ok(registry)
    }

    /// Registers a contract.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DuplicateName`] if the name is taken and
    /// [`DomainError::InvalidAddress`] if the address fails validation.
    pub fn register(
        &mut self,
        name: impl Into<ContractName>,
        address: &str,
        interface: Abi,
        mutability: Mutability,
    ) -> DomainResult<Arc<ContractDescriptor>> {
        let name = name.into();
        if self.contracts.contains_key(&name) {
            return Err(DomainError::DuplicateName(name.to_string()));
        }
        let address = parse_address(address)?;

        let descriptor = Arc::new(ContractDescriptor::new(
            name.clone(),
            address,
            interface,
            mutability,
        ));
        debug!(contract = %descriptor, "registered contract");
        self.contracts.insert(name, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Looks up a contract by name.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownContract`] if nothing is registered
    /// under `name`.
    pub fn resolve(&self, name: &str) -> DomainResult<Arc<ContractDescriptor>> {
        self.contracts
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::UnknownContract(name.to_string()))
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&ContractName> {
        let mut names: Vec<_> = self.contracts.keys().collect();
        names.sort();
        names
    }

    /// Returns the number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::abi::StaticAbiProvider;

    const TOKEN: &str = "0x62a61cB53761B7C6B0A65f034BD92d839db2a1EB";
    const MINING: &str = "0x45b74a182e44518cb1713f495c8cd8e8e393ba6c";

    fn empty_abi() -> Abi {
        serde_json::from_str("[]").unwrap()
    }

    #[test]
    fn register_and_resolve() {
        let mut registry = ContractRegistry::new();
        let registered = registry
            .register("token", TOKEN, empty_abi(), Mutability::Write)
            .unwrap();
        let resolved = registry.resolve("token").unwrap();
        assert_eq!(resolved.address(), registered.address());
        assert_eq!(resolved.mutability(), Mutability::Write);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = ContractRegistry::new();
        registry
            .register("token", TOKEN, empty_abi(), Mutability::Write)
            .unwrap();
        let err = registry
            .register("token", MINING, empty_abi(), Mutability::Write)
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateName("token".to_string()));
        assert_eq!(registry.resolve("token").unwrap().address(), parse_address(TOKEN).unwrap());
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let mut registry = ContractRegistry::new();
        let err = registry
            .register(
                "token",
                "0x62A61cB53761B7C6B0A65f034BD92d839db2a1EB",
                empty_abi(),
                Mutability::Write,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidAddress(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn lowercase_address_is_accepted() {
        let mut registry = ContractRegistry::new();
        assert!(
            registry
                .register("mining", MINING, empty_abi(), Mutability::Write)
                .is_ok()
        );
    }

    #[test]
    fn unknown_name_fails() {
        let registry = ContractRegistry::new();
        assert_eq!(
            registry.resolve("nft").unwrap_err(),
            DomainError::UnknownContract("nft".to_string())
        );
    }

    mod load {
        use super::*;

        #[test]
        fn registers_every_entry() {
            let provider = StaticAbiProvider::new()
                .with_abi("token", empty_abi())
                .with_abi("mining", empty_abi());
            let entries = [
                ContractEntry::new("token", TOKEN, Mutability::Write),
                ContractEntry::new("mining", MINING, Mutability::Payable),
            ];
            let registry = ContractRegistry::load(&provider, &entries).unwrap();
            assert_eq!(registry.names().len(), 2);
            assert!(registry.contains("mining"));
        }

        #[test]
        fn missing_interface_is_unknown_contract() {
            let provider = StaticAbiProvider::new().with_abi("token", empty_abi());
            let entries = [
                ContractEntry::new("token", TOKEN, Mutability::Write),
                ContractEntry::new("presale", MINING, Mutability::Payable),
            ];
            let err = ContractRegistry::load(&provider, &entries).unwrap_err();
            assert_eq!(err, DomainError::UnknownContract("presale".to_string()));
        }
    }
}

//! # File ABI Provider
//!
//! Loads contract interfaces from JSON files.
//!
//! Both a bare ABI array and a compiler artifact of the form
//! `{"abi": [...], ...}` are accepted.

use crate::domain::value_objects::ContractName;
use ethers::abi::Abi;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error loading an interface.
#[derive(Debug, Error)]
pub enum AbiError {
    /// No interface known for this name.
    #[error("no ABI configured for {0}")]
    NotConfigured(String),

    /// The file could not be read.
    #[error("failed to read ABI file {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        message: String,
    },

    /// The file is not a valid ABI.
    #[error("invalid ABI in {source_name}: {message}")]
    Parse {
        /// File path or provider name.
        source_name: String,
        /// Underlying error.
        message: String,
    },
}

/// Result type for ABI loading.
pub type AbiResult<T> = Result<T, AbiError>;

/// Source of contract interfaces.
pub trait AbiProvider: Send + Sync + fmt::Debug {
    /// Loads the interface of the contract registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns an [`AbiError`] if the interface is missing or malformed.
    fn load(&self, name: &ContractName) -> AbiResult<Abi>;
}

/// Parses a bare ABI array or an `{"abi": [...]}` artifact.
///
/// # Errors
///
/// Returns [`AbiError::Parse`] if neither shape matches.
pub fn parse_abi(source_name: &str, json: &str) -> AbiResult<Abi> {
    let parse_error = |message: String| AbiError::Parse {
        source_name: source_name.to_string(),
        message,
    };

    let mut value: Value = serde_json::from_str(json).map_err(|e| parse_error(e.to_string()))?;
    if let Value::Object(map) = &mut value
        && let Some(abi) = map.remove("abi")
    {
        value = abi;
    }
    if !value.is_array() {
        return Err(parse_error("expected an ABI array".to_string()));
    }
    serde_json::from_value(value).map_err(|e| parse_error(e.to_string()))
}

/// Reads `<dir>/<name>.json`, or an explicitly configured path per name.
#[derive(Debug, Clone, Default)]
pub struct FileAbiProvider {
    dir: PathBuf,
    paths: HashMap<ContractName, PathBuf>,
}

impl FileAbiProvider {
    /// Creates a provider rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            paths: HashMap::new(),
        }
    }

    /// Overrides the file used for one contract. Relative paths resolve
    /// against the provider directory.
    #[must_use]
    pub fn with_path(mut self, name: impl Into<ContractName>, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(name.into(), path.into());
        self
    }

    /// Returns the file the interface of `name` is read from.
    #[must_use]
    pub fn path_for(&self, name: &ContractName) -> PathBuf {
        match self.paths.get(name) {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.dir.join(path),
            None => self.dir.join(format!("{}.json", name)),
        }
    }

    fn read(path: &Path) -> AbiResult<String> {
        std::fs::read_to_string(path).map_err(|e| AbiError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl AbiProvider for FileAbiProvider {
    fn load(&self, name: &ContractName) -> AbiResult<Abi> {
        let path = self.path_for(name);
        let json = Self::read(&path)?;
        parse_abi(&path.display().to_string(), &json)
    }
}

/// Interfaces held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticAbiProvider {
    interfaces: HashMap<ContractName, Abi>,
}

impl StaticAbiProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interface.
    #[must_use]
    pub fn with_abi(mut self, name: impl Into<ContractName>, abi: Abi) -> Self {
        self.interfaces.insert(name.into(), abi);
        self
    }
}

impl AbiProvider for StaticAbiProvider {
    fn load(&self, name: &ContractName) -> AbiResult<Abi> {
        self.interfaces
            .get(name)
            .cloned()
            .ok_or_else(|| AbiError::NotConfigured(name.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const ABI: &str = r#"[{"type":"function","name":"mine","stateMutability":"nonpayable","inputs":[],"outputs":[]}]"#;

    #[test]
    fn parses_bare_array() {
        let abi = parse_abi("inline", ABI).unwrap();
        assert!(abi.function("mine").is_ok());
    }

    #[test]
    fn parses_artifact() {
        let artifact = format!(r#"{{"contractName":"Token","abi":{}}}"#, ABI);
        let abi = parse_abi("inline", &artifact).unwrap();
        assert!(abi.function("mine").is_ok());
    }

    #[test]
    fn rejects_non_abi_json() {
        assert!(matches!(
            parse_abi("inline", r#"{"name":"x"}"#),
            Err(AbiError::Parse { .. })
        ));
        assert!(matches!(
            parse_abi("inline", "not json"),
            Err(AbiError::Parse { .. })
        ));
    }

    #[test]
    fn loads_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("token.json")).unwrap();
        file.write_all(ABI.as_bytes()).unwrap();

        let provider = FileAbiProvider::new(dir.path());
        let abi = provider.load(&ContractName::new("token")).unwrap();
        assert!(abi.function("mine").is_ok());
    }

    #[test]
    fn explicit_path_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BDAGToken.json"), ABI).unwrap();

        let provider = FileAbiProvider::new(dir.path()).with_path("token", "BDAGToken.json");
        assert!(provider.load(&ContractName::new("token")).is_ok());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileAbiProvider::new(dir.path());
        assert!(matches!(
            provider.load(&ContractName::new("presale")),
            Err(AbiError::Io { .. })
        ));
    }

    #[test]
    fn static_provider_reports_missing_names() {
        let provider = StaticAbiProvider::new().with_abi("token", parse_abi("inline", ABI).unwrap());
        assert!(provider.load(&ContractName::new("token")).is_ok());
        assert!(matches!(
            provider.load(&ContractName::new("wallet")),
            Err(AbiError::NotConfigured(_))
        ));
    }
}

//! Resolved toolchain configuration
//!
//! `ToolConfig` is the validated, read-only result of loading a
//! configuration document. Compiler and network entries are keyed by name
//! and can only be looked up, never modified.
//!
//! # Examples
//!
//! ```rust
//! use toolchain_config::{ConfigResolver, Format, NetworkId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigResolver::new().load_str(
//!     r#"
//!     [compilers.solc]
//!     version = "^0.8.0"
//!
//!     [networks.development]
//!     host = "127.0.0.1"
//!     port = 8545
//!     network_id = "*"
//!     "#,
//!     Format::Toml,
//! )?;
//!
//! let network = config.resolve_network("development")?;
//! assert_eq!(network.network_id, NetworkId::Any);
//! println!("Endpoint: {}", network.endpoint());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compiler::CompilerSpec;
use crate::error::{ConfigError, Result};
use crate::network::NetworkProfile;

/// Options controlling how a document is loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Reject repeated network or compiler names instead of letting the
    /// later declaration win
    pub strict: bool,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Validated toolchain configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolConfig {
    compilers: BTreeMap<String, CompilerSpec>,
    networks: BTreeMap<String, NetworkProfile>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    extensions: BTreeMap<String, serde_json::Value>,
}

impl ToolConfig {
    pub(crate) fn new(
        compilers: BTreeMap<String, CompilerSpec>,
        networks: BTreeMap<String, NetworkProfile>,
        extensions: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            compilers,
            networks,
            extensions,
        }
    }

    /// Look up a network profile by name
    ///
    /// The profile is returned exactly as declared; nothing is merged in from
    /// other profiles.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownNetwork` if no profile has that name.
    pub fn resolve_network(&self, name: &str) -> Result<&NetworkProfile> {
        let profile = self
            .networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))?;
        debug!(
            network = %name,
            endpoint = %profile.endpoint(),
            network_id = %profile.network_id,
            "Resolved network profile"
        );
        Ok(profile)
    }

    /// Look up a compiler entry by name
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownCompiler` if no compiler has that name.
    pub fn resolve_compiler(&self, name: &str) -> Result<&CompilerSpec> {
        let spec = self
            .compilers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCompiler(name.to_string()))?;
        debug!(compiler = %name, "Resolved compiler spec");
        Ok(spec)
    }

    pub fn compilers(&self) -> &BTreeMap<String, CompilerSpec> {
        &self.compilers
    }

    pub fn networks(&self) -> &BTreeMap<String, NetworkProfile> {
        &self.networks
    }

    /// Top-level sections this crate does not interpret
    pub fn extensions(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extensions
    }

    pub fn network_names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    /// Get configuration as JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse_requirement;
    use crate::network::NetworkId;

    fn sample() -> ToolConfig {
        let mut compilers = BTreeMap::new();
        compilers.insert(
            "solc".to_string(),
            CompilerSpec::new("solc", Some(parse_requirement("^0.8.0").unwrap())),
        );
        let mut networks = BTreeMap::new();
        networks.insert(
            "development".to_string(),
            NetworkProfile::new("development", "127.0.0.1", 8545, NetworkId::Any),
        );
        ToolConfig::new(compilers, networks, BTreeMap::new())
    }

    #[test]
    fn test_resolve_network() {
        let config = sample();
        let profile = config.resolve_network("development").unwrap();
        assert_eq!(profile.host, "127.0.0.1");
        assert_eq!(profile.port, 8545);
        assert_eq!(profile.network_id, NetworkId::Any);
    }

    #[test]
    fn test_resolve_unknown_network() {
        let config = sample();
        match config.resolve_network("nonexistent") {
            Err(ConfigError::UnknownNetwork(name)) => assert_eq!(name, "nonexistent"),
            other => panic!("expected UnknownNetwork, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_unknown_compiler() {
        let config = sample();
        assert!(matches!(
            config.resolve_compiler("vyper"),
            Err(ConfigError::UnknownCompiler(_))
        ));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let config = sample();
        let first = config.resolve_network("development").unwrap().clone();
        let second = config.resolve_network("development").unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_config_has_no_networks() {
        let config = ToolConfig::default();
        assert_eq!(config.network_names().count(), 0);
        assert!(config.resolve_network("development").is_err());
    }

    #[test]
    fn test_to_json() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["compilers"]["solc"]["version"], "^0.8.0");
        assert_eq!(value["networks"]["development"]["port"], 8545);
        assert_eq!(value["networks"]["development"]["network_id"], "*");
        assert!(value.get("extensions").is_none());
    }

    #[test]
    fn test_load_options_deserialize() {
        let options: LoadOptions = toml::from_str("strict = true").unwrap();
        assert_eq!(options, LoadOptions::strict());
        let defaults: LoadOptions = toml::from_str("").unwrap();
        assert!(!defaults.strict);
    }
}

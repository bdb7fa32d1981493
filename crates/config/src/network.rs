//! Network profiles and chain identifiers
//!
//! A profile names one deployment target: where the node listens and which
//! chain id it is expected to report. The identifier is either a concrete
//! chain id or the wildcard `"*"`, which accepts whatever the node reports.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv6Addr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Literal used in documents for "accept any chain id".
pub const WILDCARD: &str = "*";

/// Chain identifier of a network profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkId {
    /// A specific chain id (always positive)
    Concrete(u64),
    /// Accept any chain id
    Any,
}

impl NetworkId {
    /// Parse the textual form: `"*"` or a positive integer written in plain digits
    pub fn parse(s: &str) -> Option<Self> {
        if s == WILDCARD {
            return Some(NetworkId::Any);
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match s.parse::<u64>() {
            Ok(0) | Err(_) => None,
            Ok(id) => Some(NetworkId::Concrete(id)),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, NetworkId::Any)
    }

    /// Concrete chain id, if any
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            NetworkId::Concrete(id) => Some(*id),
            NetworkId::Any => None,
        }
    }

    /// Whether a node reporting `chain_id` satisfies this identifier
    pub fn accepts(&self, chain_id: u64) -> bool {
        match self {
            NetworkId::Concrete(id) => *id == chain_id,
            NetworkId::Any => true,
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkId::Concrete(id) => write!(f, "{}", id),
            NetworkId::Any => write!(f, "{}", WILDCARD),
        }
    }
}

impl Serialize for NetworkId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            NetworkId::Concrete(id) => serializer.serialize_u64(*id),
            NetworkId::Any => serializer.serialize_str(WILDCARD),
        }
    }
}

impl<'de> Deserialize<'de> for NetworkId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        let parsed = match Repr::deserialize(deserializer)? {
            Repr::Number(id) => NetworkId::parse(&id.to_string()),
            Repr::Text(text) => NetworkId::parse(&text),
        };
        parsed.ok_or_else(|| {
            serde::de::Error::custom("network_id must be a positive integer or \"*\"")
        })
    }
}

/// Transport scheme used to reach the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Ws,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Ws => "ws",
        }
    }
}

/// Concrete connection target handed to a compiler or deployer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// URL form, e.g. `http://127.0.0.1:8545`
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            write!(f, "{}://[{}]:{}", self.scheme.as_str(), self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
        }
    }
}

/// A validated, named network entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkProfile {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub network_id: NetworkId,
    /// Connect over websockets instead of HTTP
    pub websockets: bool,
    /// Entry keys this crate does not interpret, kept for the consuming tool
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl NetworkProfile {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16, network_id: NetworkId) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            network_id,
            websockets: false,
            extensions: BTreeMap::new(),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            scheme: if self.websockets { Scheme::Ws } else { Scheme::Http },
            host: self.host.clone(),
            port: self.port,
        }
    }

    /// Chain id for consumers that cannot work with a wildcard profile
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::WildcardNetworkId` if the profile accepts any chain.
    pub fn require_chain_id(&self) -> Result<u64, ConfigError> {
        self.network_id
            .chain_id()
            .ok_or_else(|| ConfigError::WildcardNetworkId(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_id_parse() {
        assert_eq!(NetworkId::parse("*"), Some(NetworkId::Any));
        assert_eq!(NetworkId::parse("5777"), Some(NetworkId::Concrete(5777)));
        assert_eq!(NetworkId::parse(" 1 "), None);
        assert_eq!(NetworkId::parse("+5"), None);
        assert_eq!(NetworkId::parse("1e3"), None);
        assert_eq!(NetworkId::parse("0"), None);
        assert_eq!(NetworkId::parse("-1"), None);
        assert_eq!(NetworkId::parse("any"), None);
        assert_eq!(NetworkId::parse(""), None);
    }

    #[test]
    fn test_network_id_accepts() {
        assert!(NetworkId::Any.accepts(1));
        assert!(NetworkId::Any.accepts(1337));
        assert!(NetworkId::Concrete(1337).accepts(1337));
        assert!(!NetworkId::Concrete(1337).accepts(1));
    }

    #[test]
    fn test_network_id_display() {
        assert_eq!(NetworkId::Any.to_string(), "*");
        assert_eq!(NetworkId::Concrete(42).to_string(), "42");
    }

    #[test]
    fn test_network_id_serde() {
        assert_eq!(serde_json::to_string(&NetworkId::Any).unwrap(), "\"*\"");
        assert_eq!(serde_json::to_string(&NetworkId::Concrete(5)).unwrap(), "5");

        let any: NetworkId = serde_json::from_str("\"*\"").unwrap();
        assert_eq!(any, NetworkId::Any);
        let text: NetworkId = serde_json::from_str("\"11155111\"").unwrap();
        assert_eq!(text, NetworkId::Concrete(11155111));
        assert!(serde_json::from_str::<NetworkId>("0").is_err());
        assert!(serde_json::from_str::<NetworkId>("\"mainnet\"").is_err());
    }

    #[test]
    fn test_endpoint_http() {
        let profile = NetworkProfile::new("development", "127.0.0.1", 8545, NetworkId::Any);
        assert_eq!(profile.endpoint().url(), "http://127.0.0.1:8545");
    }

    #[test]
    fn test_endpoint_websockets() {
        let mut profile = NetworkProfile::new("development", "localhost", 8546, NetworkId::Any);
        profile.websockets = true;
        assert_eq!(profile.endpoint().url(), "ws://localhost:8546");
    }

    #[test]
    fn test_endpoint_ipv6_is_bracketed() {
        let profile = NetworkProfile::new("local6", "::1", 8545, NetworkId::Concrete(1337));
        assert_eq!(profile.endpoint().to_string(), "http://[::1]:8545");
    }

    #[test]
    fn test_require_chain_id() {
        let concrete = NetworkProfile::new("sepolia", "10.0.0.2", 8545, NetworkId::Concrete(11155111));
        assert_eq!(concrete.require_chain_id().unwrap(), 11155111);

        let wildcard = NetworkProfile::new("development", "127.0.0.1", 8545, NetworkId::Any);
        match wildcard.require_chain_id() {
            Err(ConfigError::WildcardNetworkId(name)) => assert_eq!(name, "development"),
            other => panic!("expected WildcardNetworkId, got {:?}", other),
        }
    }
}

//! Supported networks
//!
//! A fixed table of symbolic name → chain id, plus the subset of chains whose
//! change notifications the session reacts to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain ID constants
pub mod chains {
    pub const MAINNET: u64 = 1;
    pub const HOLESKY: u64 = 17000;
    pub const SEPOLIA: u64 = 11155111;
}

/// Name reported for chain ids missing from the registry
pub const UNKNOWN_NETWORK: &str = "unknown";

/// A network as reported by the provider: symbolic name plus chain id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub chain_id: u64,
}

impl Network {
    pub fn new(name: impl Into<String>, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            chain_id,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}

/// Registry of known networks and the notification allow-list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Networks {
    /// Known networks, in display order
    pub known: Vec<Network>,
    /// Names of networks whose change notifications are acted on
    pub watched: Vec<String>,
}

impl Networks {
    /// Look up a network by chain id, falling back to [`UNKNOWN_NETWORK`]
    pub fn resolve(&self, chain_id: u64) -> Network {
        self.known
            .iter()
            .find(|n| n.chain_id == chain_id)
            .cloned()
            .unwrap_or_else(|| Network::new(UNKNOWN_NETWORK, chain_id))
    }

    /// Look up a chain id by (case-insensitive) name
    pub fn chain_id(&self, name: &str) -> Option<u64> {
        self.known
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
            .map(|n| n.chain_id)
    }

    /// Whether change notifications for this chain should be processed
    pub fn is_watched(&self, chain_id: u64) -> bool {
        self.watched
            .iter()
            .filter_map(|name| self.chain_id(name))
            .any(|id| id == chain_id)
    }

    /// Networks in the allow-list, resolved to chain ids
    pub fn watched_networks(&self) -> Vec<Network> {
        self.watched
            .iter()
            .filter_map(|name| self.chain_id(name).map(|id| self.resolve(id)))
            .collect()
    }
}

impl Default for Networks {
    fn default() -> Self {
        Self {
            known: vec![
                Network::new("mainnet", chains::MAINNET),
                Network::new("holesky", chains::HOLESKY),
                Network::new("sepolia", chains::SEPOLIA),
            ],
            watched: vec!["holesky".to_string(), "sepolia".to_string()],
        }
    }
}

//! RPC endpoint configuration for the injected wallet
//!
//! Supports multiple configuration methods following Ethereum ecosystem conventions:
//! 1. Per-chain env vars (ETH_RPC_URL, HOLESKY_RPC_URL, SEPOLIA_RPC_URL) - highest priority
//! 2. Provider API keys (ALCHEMY_API_KEY, INFURA_API_KEY) - builds URLs automatically
//! 3. Public RPC fallbacks - for testing only
//!
//! # Examples
//!
//! ```bash
//! # Option 1: Per-chain URLs
//! export SEPOLIA_RPC_URL="https://eth-sepolia.g.alchemy.com/v2/YOUR_KEY"
//!
//! # Option 2: Single provider API key
//! export ALCHEMY_API_KEY="YOUR_KEY"
//!
//! # Option 3: No env vars - uses public RPCs (rate limited, for testing only)
//! ```

use crate::network::chains;
use std::collections::HashMap;

/// RPC configuration for multiple chains
#[derive(Debug, Clone, Default)]
pub struct RpcConfig {
    /// RPC URLs indexed by chain ID
    urls: HashMap<u64, String>,
}

/// Environment variable names
mod env_vars {
    // Per-chain URLs (highest priority)
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
    pub const HOLESKY_RPC_URL: &str = "HOLESKY_RPC_URL";
    pub const SEPOLIA_RPC_URL: &str = "SEPOLIA_RPC_URL";

    // Provider API keys
    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
    pub const INFURA_API_KEY: &str = "INFURA_API_KEY";
}

/// Public RPC endpoints (rate limited, for testing only)
mod public_rpcs {
    pub const MAINNET: &str = "https://eth.llamarpc.com";
    pub const HOLESKY: &str = "https://ethereum-holesky-rpc.publicnode.com";
    pub const SEPOLIA: &str = "https://ethereum-sepolia-rpc.publicnode.com";
}

impl RpcConfig {
    /// Create RPC config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create RPC config from an arbitrary variable lookup
    ///
    /// Priority:
    /// 1. Per-chain vars
    /// 2. ALCHEMY_API_KEY - builds URLs for all chains
    /// 3. INFURA_API_KEY - builds URLs for all chains
    /// 4. Public RPC fallbacks for anything still missing
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut urls = HashMap::new();

        let per_chain = [
            (env_vars::ETH_RPC_URL, chains::MAINNET),
            (env_vars::HOLESKY_RPC_URL, chains::HOLESKY),
            (env_vars::SEPOLIA_RPC_URL, chains::SEPOLIA),
        ];
        for (var, chain_id) in per_chain {
            if let Some(url) = lookup(var) {
                tracing::debug!(chain_id, "Using {} for chain", var);
                urls.insert(chain_id, url);
            }
        }

        if urls.is_empty() {
            if let Some(key) = lookup(env_vars::ALCHEMY_API_KEY) {
                tracing::info!("Building RPC URLs from ALCHEMY_API_KEY");
                urls.insert(
                    chains::MAINNET,
                    format!("https://eth-mainnet.g.alchemy.com/v2/{}", key),
                );
                urls.insert(
                    chains::HOLESKY,
                    format!("https://eth-holesky.g.alchemy.com/v2/{}", key),
                );
                urls.insert(
                    chains::SEPOLIA,
                    format!("https://eth-sepolia.g.alchemy.com/v2/{}", key),
                );
            }
        }

        if urls.is_empty() {
            if let Some(key) = lookup(env_vars::INFURA_API_KEY) {
                tracing::info!("Building RPC URLs from INFURA_API_KEY");
                urls.insert(
                    chains::MAINNET,
                    format!("https://mainnet.infura.io/v3/{}", key),
                );
                urls.insert(
                    chains::HOLESKY,
                    format!("https://holesky.infura.io/v3/{}", key),
                );
                urls.insert(
                    chains::SEPOLIA,
                    format!("https://sepolia.infura.io/v3/{}", key),
                );
            }
        }

        if !urls.contains_key(&chains::SEPOLIA) {
            tracing::warn!("No RPC configured for Sepolia, using public RPC (rate limited)");
        }
        urls.entry(chains::MAINNET)
            .or_insert_with(|| public_rpcs::MAINNET.to_string());
        urls.entry(chains::HOLESKY)
            .or_insert_with(|| public_rpcs::HOLESKY.to_string());
        urls.entry(chains::SEPOLIA)
            .or_insert_with(|| public_rpcs::SEPOLIA.to_string());

        Self { urls }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<u64, String>) -> Self {
        Self { urls }
    }

    /// Get RPC URL for a chain
    pub fn get(&self, chain_id: u64) -> Option<&str> {
        self.urls.get(&chain_id).map(|s| s.as_str())
    }

    /// Check if a chain is configured
    pub fn has_chain(&self, chain_id: u64) -> bool {
        self.urls.contains_key(&chain_id)
    }

    /// All configured chain IDs, ascending
    #[cfg(test)]
    pub(crate) fn chains(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.urls.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_public_rpc_fallbacks() {
        let config = RpcConfig::from_lookup(lookup_from(&[]));

        assert_eq!(config.get(chains::MAINNET), Some(public_rpcs::MAINNET));
        assert_eq!(config.get(chains::HOLESKY), Some(public_rpcs::HOLESKY));
        assert_eq!(config.get(chains::SEPOLIA), Some(public_rpcs::SEPOLIA));
        assert_eq!(
            config.chains(),
            vec![chains::MAINNET, chains::HOLESKY, chains::SEPOLIA]
        );
    }

    #[test]
    fn test_per_chain_var_wins_over_api_key() {
        let config = RpcConfig::from_lookup(lookup_from(&[
            (env_vars::SEPOLIA_RPC_URL, "https://custom.sepolia"),
            (env_vars::ALCHEMY_API_KEY, "key"),
        ]));

        assert_eq!(config.get(chains::SEPOLIA), Some("https://custom.sepolia"));
        // Alchemy is skipped once any per-chain URL is set
        assert_eq!(config.get(chains::HOLESKY), Some(public_rpcs::HOLESKY));
    }

    #[test]
    fn test_alchemy_key_builds_all_chains() {
        let config = RpcConfig::from_lookup(lookup_from(&[(env_vars::ALCHEMY_API_KEY, "abc")]));

        assert_eq!(
            config.get(chains::HOLESKY),
            Some("https://eth-holesky.g.alchemy.com/v2/abc")
        );
        assert_eq!(
            config.get(chains::SEPOLIA),
            Some("https://eth-sepolia.g.alchemy.com/v2/abc")
        );
    }

    #[test]
    fn test_get_returns_url() {
        let mut urls = HashMap::new();
        urls.insert(1, "https://custom.rpc".to_string());
        let config = RpcConfig::with_urls(urls);

        assert_eq!(config.get(1), Some("https://custom.rpc"));
        assert_eq!(config.get(999), None);
        assert!(!config.has_chain(999));
    }
}

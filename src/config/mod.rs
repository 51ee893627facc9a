//! Configuration for the wallet session

pub mod rpc;

use crate::network::Networks;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Environment variable holding the injected wallet's private key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Transaction confirmation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Give up waiting for a receipt after this many seconds
    pub timeout_secs: u64,
    /// Interval between receipt lookups (milliseconds)
    pub poll_interval_ms: u64,
}

impl ConfirmationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            poll_interval_ms: 2_000,
        }
    }
}

/// Settings for the locally injected wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSettings {
    /// Environment variable the private key is read from
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
    /// Grant account access requests without asking
    #[serde(default = "default_true")]
    pub auto_approve: bool,
    /// Network the wallet starts on
    #[serde(default = "default_chain")]
    pub chain: String,
}

fn default_private_key_env() -> String {
    PRIVATE_KEY_ENV.to_string()
}

fn default_true() -> bool {
    true
}

fn default_chain() -> String {
    "sepolia".to_string()
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            private_key_env: default_private_key_env(),
            auto_approve: true,
            chain: default_chain(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Known networks and the notification allow-list
    #[serde(default)]
    pub networks: Networks,
    /// Value of the self-transfer, in ether
    #[serde(default = "default_transfer_value")]
    pub transfer_value: String,
    /// Confirmation wait settings
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    /// Injected wallet settings
    #[serde(default)]
    pub wallet: WalletSettings,
    /// Path to the activity log file (JSONL)
    #[serde(default)]
    pub activity_log_path: Option<String>,
}

fn default_transfer_value() -> String {
    "0.01".to_string()
}

impl Config {
    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        crate::units::parse_ether(&self.transfer_value)
            .map_err(|e| Error::Config(format!("transfer_value: {}", e)))?;

        if let Some(unknown) = self
            .networks
            .watched
            .iter()
            .find(|name| self.networks.chain_id(name).is_none())
        {
            return Err(Error::Config(format!(
                "Watched network '{}' is not in the known networks",
                unknown
            )));
        }

        if self.networks.chain_id(&self.wallet.chain).is_none() {
            return Err(Error::Config(format!(
                "Wallet chain '{}' is not in the known networks",
                self.wallet.chain
            )));
        }

        if self.confirmation.timeout_secs == 0 {
            return Err(Error::Config(
                "confirmation.timeout_secs must be positive".to_string(),
            ));
        }

        if self.confirmation.poll_interval_ms == 0 {
            return Err(Error::Config(
                "confirmation.poll_interval_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            networks: Networks::default(),
            transfer_value: default_transfer_value(),
            confirmation: ConfirmationConfig::default(),
            wallet: WalletSettings::default(),
            activity_log_path: None,
        }
    }
}

//! Wallet Session
//!
//! A minimal wallet front-end that:
//! - Connects to an injected wallet provider
//! - Tracks the connected account, active network and native balance
//! - Follows network and account changes reported by the wallet
//! - Switches chains and sends a fixed-value self-transfer
//!
//! # Security Model
//!
//! - Chain access and signing are delegated to the wallet provider
//! - The bundled RPC wallet keeps its private key inside the wallet module
//! - Keys are never logged or serialized

pub mod activity;
pub mod config;
pub mod network;
pub mod notice;
pub mod provider;
pub mod session;
pub mod ui;
pub mod units;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{Config, RpcConfig, PRIVATE_KEY_ENV};
pub use error::{Error, Result};
pub use network::{Network, Networks};
pub use notice::{Notice, Notifier};
pub use provider::{LocalEnvironment, RpcWallet, Transport, WalletEnvironment, WalletProvider};
pub use session::{NetworkUpdate, Notification, SessionState, Snapshot, WalletSession};

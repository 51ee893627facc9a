//! Wallet provider boundary
//!
//! The session never talks to a chain directly. Everything goes through an
//! injected [`Transport`] (the wallet itself, EIP-1193 shaped) wrapped in a
//! [`WalletProvider`] connection handle.
//!
//! - [`WalletEnvironment`]: where a transport may or may not be injected
//! - [`Transport`]: account access, chain queries, chain switch, sending
//! - [`WalletProvider`]: typed connection handle with a `network` event channel
//! - [`RpcWallet`]: alloy-backed transport signing with a local key

mod handle;
#[cfg(test)]
pub(crate) mod mock;
mod rpc;

pub use handle::WalletProvider;
pub use rpc::{LocalEnvironment, RpcWallet};

use crate::Result;
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of event channels; slow listeners past this see `Lagged`
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Events fired by the wallet itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The wallet moved to another chain (`chainChanged`)
    ChainChanged(u64),
    /// The set of exposed accounts changed (`accountsChanged`)
    AccountsChanged(Vec<Address>),
}

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    /// False when the transaction reverted
    pub success: bool,
}

/// The injected wallet transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ask the user for account access (`eth_requestAccounts`)
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Accounts already authorized (`eth_accounts`); empty when none
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Current chain id (`eth_chainId`)
    async fn chain_id(&self) -> Result<u64>;

    /// Native balance in wei (`eth_getBalance`)
    async fn balance(&self, account: Address) -> Result<U256>;

    /// Move the wallet to another chain (`wallet_switchEthereumChain`)
    async fn switch_chain(&self, chain_id: u64) -> Result<()>;

    /// Sign and broadcast a transaction, returning its hash
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    /// Receipt for a transaction, `None` while still pending
    async fn receipt(&self, hash: TxHash) -> Result<Option<TransferReceipt>>;

    /// Subscribe to wallet events; dropping the receiver unsubscribes
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    /// Number of live wallet event subscriptions
    #[cfg(test)]
    fn listener_count(&self) -> usize;
}

/// Execution environment that may carry an injected wallet
pub trait WalletEnvironment: Send + Sync {
    /// The injected transport, if a wallet is installed
    fn injected(&self) -> Option<Arc<dyn Transport>>;
}

impl WalletEnvironment for Option<Arc<dyn Transport>> {
    fn injected(&self) -> Option<Arc<dyn Transport>> {
        self.clone()
    }
}

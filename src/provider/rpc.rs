//! Alloy-backed wallet transport
//!
//! Plays the part of an injected browser wallet for the terminal front-end:
//! it holds a local [`SecureWallet`], talks JSON-RPC to one endpoint per chain,
//! and "switches chains" by moving to another configured endpoint.
//!
//! SECURITY NOTE:
//! - Signing happens through alloy's `EthereumWallet`; the key never leaves
//!   the wallet module
//! - Only the public address is logged

use super::{Transport, TransferReceipt, WalletEnvironment, WalletEvent, EVENT_CHANNEL_CAPACITY};
use crate::config::RpcConfig;
use crate::wallet::SecureWallet;
use crate::{Error, Result};
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Wallet transport over per-chain JSON-RPC endpoints
pub struct RpcWallet {
    signer: SecureWallet,
    rpc: RpcConfig,
    chain_id: AtomicU64,
    authorized: AtomicBool,
    auto_approve: bool,
    events: broadcast::Sender<WalletEvent>,
}

impl RpcWallet {
    /// Create a wallet starting on `chain_id`
    ///
    /// With `auto_approve` the account counts as already authorized and access
    /// requests are granted; without it every access request is declined.
    pub fn new(
        signer: SecureWallet,
        rpc: RpcConfig,
        chain_id: u64,
        auto_approve: bool,
    ) -> Result<Self> {
        if !rpc.has_chain(chain_id) {
            return Err(Error::UnsupportedChain(chain_id));
        }
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            address = %signer.address(),
            chain_id,
            auto_approve,
            "Injected RPC wallet"
        );

        Ok(Self {
            signer,
            rpc,
            chain_id: AtomicU64::new(chain_id),
            authorized: AtomicBool::new(auto_approve),
            auto_approve,
            events,
        })
    }

    /// Chain the wallet is currently pointed at
    pub fn current_chain(&self) -> u64 {
        self.chain_id.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> Result<url::Url> {
        let chain_id = self.current_chain();
        let rpc_url = self
            .rpc
            .get(chain_id)
            .ok_or(Error::UnsupportedChain(chain_id))?;

        rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL for chain {}: {}", chain_id, e)))
    }

    fn read_provider(&self) -> Result<impl Provider> {
        Ok(ProviderBuilder::new().connect_http(self.endpoint()?))
    }
}

#[async_trait]
impl Transport for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if !self.auto_approve {
            return Err(Error::Rejected("Account access declined".to_string()));
        }
        self.authorized.store(true, Ordering::SeqCst);
        Ok(vec![self.signer.address()])
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        if self.authorized.load(Ordering::SeqCst) {
            Ok(vec![self.signer.address()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn chain_id(&self) -> Result<u64> {
        self.read_provider()?
            .get_chain_id()
            .await
            .map_err(|e| Error::Provider(format!("Failed to get chain id: {}", e)))
    }

    async fn balance(&self, account: Address) -> Result<U256> {
        self.read_provider()?
            .get_balance(account)
            .await
            .map_err(|e| Error::Provider(format!("Failed to get balance: {}", e)))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        if !self.rpc.has_chain(chain_id) {
            return Err(Error::UnsupportedChain(chain_id));
        }

        let previous = self.chain_id.swap(chain_id, Ordering::SeqCst);
        if previous != chain_id {
            tracing::debug!(from = previous, to = chain_id, "Wallet switched chain");
            let _ = self.events.send(WalletEvent::ChainChanged(chain_id));
        }
        Ok(())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let provider = ProviderBuilder::new()
            .wallet(self.signer.wallet().clone())
            .connect_http(self.endpoint()?);

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| Error::Transfer(format!("Failed to send transaction: {}", e)))?;

        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<TransferReceipt>> {
        let receipt = self
            .read_provider()?
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| Error::Provider(format!("Failed to get receipt: {}", e)))?;

        Ok(receipt.map(|r| TransferReceipt {
            hash,
            block_number: ReceiptResponse::block_number(&r),
            success: ReceiptResponse::status(&r),
        }))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }
}

/// Environment for the terminal front-end: an RPC wallet is "installed" when
/// a private key was configured
#[derive(Clone, Default)]
pub struct LocalEnvironment {
    wallet: Option<Arc<RpcWallet>>,
}

impl LocalEnvironment {
    pub fn new(wallet: Option<RpcWallet>) -> Self {
        Self {
            wallet: wallet.map(Arc::new),
        }
    }
}

impl WalletEnvironment for LocalEnvironment {
    fn injected(&self) -> Option<Arc<dyn Transport>> {
        self.wallet
            .clone()
            .map(|wallet| wallet as Arc<dyn Transport>)
    }
}

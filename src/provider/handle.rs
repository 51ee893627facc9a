//! Connection handle over an injected transport

use super::{Transport, TransferReceipt, WalletEvent, EVENT_CHANNEL_CAPACITY};
use crate::config::ConfirmationConfig;
use crate::network::{Network, Networks};
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Typed connection to a wallet transport
///
/// Remembers the last chain id it observed and fires a `network` event on the
/// provider-level channel whenever a later query reports a different one.
pub struct WalletProvider {
    transport: Arc<dyn Transport>,
    networks: Networks,
    last_chain: Mutex<Option<u64>>,
    network_events: broadcast::Sender<Network>,
}

impl WalletProvider {
    /// Wrap an injected transport
    pub fn new(transport: Arc<dyn Transport>, networks: Networks) -> Self {
        let (network_events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            networks,
            last_chain: Mutex::new(None),
            network_events,
        }
    }

    /// Request account access from the wallet (may prompt the user)
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        let accounts = self.transport.request_accounts().await?;
        tracing::debug!(count = accounts.len(), "Account access granted");
        Ok(accounts)
    }

    /// Address of the first authorized account
    pub async fn signer_address(&self) -> Result<Address> {
        self.transport
            .accounts()
            .await?
            .first()
            .copied()
            .ok_or(Error::NotConnected)
    }

    /// Whether any account is already authorized
    pub async fn has_authorized_account(&self) -> Result<bool> {
        Ok(!self.transport.accounts().await?.is_empty())
    }

    /// Fetch the current network
    pub async fn get_network(&self) -> Result<Network> {
        let chain_id = self.transport.chain_id().await?;
        let network = self.networks.resolve(chain_id);

        let previous = {
            let mut last = self
                .last_chain
                .lock()
                .map_err(|_| Error::Provider("network tracker poisoned".to_string()))?;
            last.replace(chain_id)
        };

        if let Some(previous) = previous.filter(|p| *p != chain_id) {
            tracing::debug!(from = previous, to = chain_id, "Provider network changed");
            // No receivers is fine
            let _ = self.network_events.send(network.clone());
        }

        Ok(network)
    }

    /// Native balance of an account in wei
    pub async fn get_balance(&self, account: Address) -> Result<U256> {
        self.transport.balance(account).await
    }

    /// Ask the wallet to switch chains
    pub async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        self.transport.switch_chain(chain_id).await
    }

    /// Sign and broadcast a transaction
    pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        self.transport.send_transaction(tx).await
    }

    /// Poll for a receipt until mined or the timeout elapses
    ///
    /// A reverted receipt is reported as [`Error::Transfer`].
    pub async fn wait_for_confirmation(
        &self,
        hash: TxHash,
        confirmation: &ConfirmationConfig,
    ) -> Result<TransferReceipt> {
        let poll = async {
            loop {
                if let Some(receipt) = self.transport.receipt(hash).await? {
                    return Ok::<_, Error>(receipt);
                }
                tokio::time::sleep(confirmation.poll_interval()).await;
            }
        };

        let receipt = tokio::time::timeout(confirmation.timeout(), poll)
            .await
            .map_err(|_| {
                Error::Transfer(format!(
                    "Transaction {} not confirmed within {}s",
                    hash, confirmation.timeout_secs
                ))
            })??;

        if !receipt.success {
            return Err(Error::Transfer(format!("Transaction {} reverted", hash)));
        }

        Ok(receipt)
    }

    /// Subscribe to provider-level `network` events
    pub fn subscribe_network(&self) -> broadcast::Receiver<Network> {
        self.network_events.subscribe()
    }

    /// Subscribe to the wallet's own `chainChanged` / `accountsChanged` events
    pub fn subscribe_wallet(&self) -> broadcast::Receiver<WalletEvent> {
        self.transport.subscribe()
    }

    /// Number of live provider-level `network` subscriptions
    #[cfg(test)]
    pub(crate) fn network_listener_count(&self) -> usize {
        self.network_events.receiver_count()
    }
}

impl std::fmt::Debug for WalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletProvider")
            .field("last_chain", &self.last_chain)
            .field("network_listeners", &self.network_events.receiver_count())
            .finish()
    }
}

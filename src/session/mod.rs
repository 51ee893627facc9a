//! Wallet session
//!
//! Owns the connection to the injected wallet and keeps account, network and
//! balance in sync with it.
//!
//! # Lifecycle
//!
//! - `initialize()` on start-up picks up an already injected wallet
//! - `connect()` asks for account access
//! - `disconnect()` forgets everything (wallet permissions are untouched)
//! - `teardown()` (or drop) releases event subscriptions
//!
//! Event subscriptions live inside [`ProviderHandle`]; replacing or dropping
//! the handle is what unsubscribes, so listeners cannot leak across reconnects.
//!
//! All mutating operations take `&mut self`. Notifications are pulled with
//! [`WalletSession::next_notification`] and fed back through
//! [`WalletSession::dispatch`], so they never interleave with an operation.

mod state;

pub use state::{NetworkUpdate, Notification, SessionState, Snapshot};

use crate::activity::{ActivityEntry, ActivityLog};
use crate::config::{Config, ConfirmationConfig};
use crate::network::{Network, Networks};
use crate::notice::{Notice, Notifier};
use crate::provider::{WalletEnvironment, WalletEvent, WalletProvider};
use crate::units::{format_ether, parse_ether};
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A provider together with its live event subscriptions
struct ProviderHandle {
    provider: WalletProvider,
    network_rx: broadcast::Receiver<Network>,
    wallet_rx: broadcast::Receiver<WalletEvent>,
}

impl ProviderHandle {
    /// Subscribe to both channels of `provider`
    fn attach(provider: WalletProvider) -> Self {
        let network_rx = provider.subscribe_network();
        let wallet_rx = provider.subscribe_wallet();
        Self {
            provider,
            network_rx,
            wallet_rx,
        }
    }
}

/// Stateful connection to a wallet provider
pub struct WalletSession<E: WalletEnvironment> {
    id: Uuid,
    env: E,
    networks: Networks,
    transfer_value: U256,
    confirmation: ConfirmationConfig,
    notifier: Arc<dyn Notifier>,
    activity: Option<ActivityLog>,
    handle: Option<ProviderHandle>,
    state: SessionState,
}

impl<E: WalletEnvironment> WalletSession<E> {
    /// Create a disconnected session
    pub fn new(env: E, config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let transfer_value = parse_ether(&config.transfer_value)?;
        Ok(Self {
            id: Uuid::new_v4(),
            env,
            networks: config.networks.clone(),
            transfer_value,
            confirmation: config.confirmation.clone(),
            notifier,
            activity: config.activity_log_path.as_ref().map(ActivityLog::new),
            handle: None,
            state: SessionState::Disconnected,
        })
    }

    /// Record operations to an activity log
    pub fn with_activity_log(mut self, log: ActivityLog) -> Self {
        self.activity = Some(log);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Whether a provider handle is currently held
    pub fn has_provider(&self) -> bool {
        self.handle.is_some()
    }

    pub fn networks(&self) -> &Networks {
        &self.networks
    }

    /// Value sent by [`Self::send_transfer`], in wei
    pub fn transfer_value(&self) -> U256 {
        self.transfer_value
    }

    /// Pick up a wallet that is already injected
    ///
    /// Returns `Ok(false)` when no wallet is installed. When one is, any
    /// previous handle is torn down before the new one subscribes, so repeated
    /// calls keep exactly one subscription per channel. If the wallet has no
    /// authorized account yet the handle is kept and the session stays
    /// disconnected.
    ///
    /// The subscriptions live as long as the session holds the handle:
    /// [`Self::teardown`] releases them, and so does dropping the session.
    pub async fn initialize(&mut self) -> Result<bool> {
        let Some(transport) = self.env.injected() else {
            debug!(session_id = %self.id, "No wallet provider injected");
            return Ok(false);
        };

        let provider = WalletProvider::new(transport, self.networks.clone());
        let snapshot = match Self::fetch_authorized(&provider).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(session_id = %self.id, error = %e, "Error initializing wallet session");
                return Err(e);
            }
        };

        self.install(provider);
        match snapshot {
            Some(snapshot) => {
                info!(
                    session_id = %self.id,
                    account = %snapshot.account,
                    network = %snapshot.network,
                    balance = %snapshot.balance,
                    "Wallet already connected"
                );
                self.state = SessionState::Connected(snapshot);
            }
            None => {
                debug!(session_id = %self.id, "Wallet present but no account authorized");
                self.state = SessionState::Disconnected;
            }
        }

        Ok(true)
    }

    /// Request account access and populate the session
    ///
    /// Leaves the session untouched on any failure.
    pub async fn connect(&mut self) -> Result<()> {
        let Some(transport) = self.env.injected() else {
            warn!(session_id = %self.id, "Connect requested but no wallet is installed");
            self.notifier.notify(&Notice::WalletNotInstalled);
            self.record(ActivityEntry::new(self.id, "connect", "error").error(Error::NotInstalled));
            return Err(Error::NotInstalled);
        };

        let provider = WalletProvider::new(transport, self.networks.clone());
        let result = async {
            provider.request_accounts().await?;
            Self::fetch_snapshot(&provider).await
        }
        .await;

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(session_id = %self.id, error = %e, "Error connecting to wallet");
                self.record(ActivityEntry::new(self.id, "connect", "error").error(&e));
                return Err(e);
            }
        };

        info!(
            session_id = %self.id,
            account = %snapshot.account,
            network = %snapshot.network,
            balance = %snapshot.balance,
            "Wallet connected"
        );
        self.record(
            ActivityEntry::new(self.id, "connect", "success")
                .account(snapshot.account)
                .chain_id(snapshot.network.chain_id),
        );

        self.install(provider);
        self.state = SessionState::Connected(snapshot);
        Ok(())
    }

    /// Forget the connection
    ///
    /// Wallet-side permissions are not revoked.
    pub fn disconnect(&mut self) {
        self.teardown();
        if let SessionState::Connected(snapshot) = std::mem::take(&mut self.state) {
            info!(session_id = %self.id, account = %snapshot.account, "Wallet disconnected");
            self.record(ActivityEntry::new(self.id, "disconnect", "success").account(snapshot.account));
        }
    }

    /// Ask the wallet to move to `chain_id` and refresh network and balance
    ///
    /// The new handle replaces the old one only once both the switch and the
    /// refresh succeeded; otherwise the previous handle and state are kept.
    pub async fn switch_network(&mut self, chain_id: u64) -> Result<()> {
        let Some(handle) = self.handle.as_ref() else {
            warn!(session_id = %self.id, chain_id, "Switch requested without a provider");
            return Err(Error::NotConnected);
        };

        if let Err(e) = handle.provider.switch_chain(chain_id).await {
            error!(session_id = %self.id, chain_id, error = %e, "Error switching network");
            self.record(
                ActivityEntry::new(self.id, "switch_network", "error")
                    .chain_id(chain_id)
                    .error(&e),
            );
            return Err(e);
        }

        // The old handle may be stale after a chain switch
        let Some(transport) = self.env.injected() else {
            error!(session_id = %self.id, "Wallet disappeared during network switch");
            return Err(Error::NotInstalled);
        };
        let provider = WalletProvider::new(transport, self.networks.clone());
        let account = self.state.account();

        let refreshed = async {
            let network = provider.get_network().await?;
            let balance = match account {
                Some(account) => Some(format_ether(provider.get_balance(account).await?)),
                None => None,
            };
            Ok::<_, Error>((network, balance))
        }
        .await;

        let (network, balance) = match refreshed {
            Ok(refreshed) => refreshed,
            Err(e) => {
                error!(
                    session_id = %self.id,
                    chain_id,
                    error = %e,
                    "Error refreshing after network switch; keeping previous provider"
                );
                self.record(
                    ActivityEntry::new(self.id, "switch_network", "error")
                        .chain_id(chain_id)
                        .error(&e),
                );
                return Err(e);
            }
        };

        if network.chain_id != chain_id {
            warn!(
                session_id = %self.id,
                requested = chain_id,
                actual = network.chain_id,
                "Provider reports a different chain than requested"
            );
        }

        info!(session_id = %self.id, network = %network, "Switched network");
        self.record(
            ActivityEntry::new(self.id, "switch_network", "success").chain_id(network.chain_id),
        );

        self.install(provider);
        if let (SessionState::Connected(snapshot), Some(balance)) = (&mut self.state, balance) {
            snapshot.network = network;
            snapshot.balance = balance;
        }
        Ok(())
    }

    /// React to a network change notification
    ///
    /// Chains outside the watched allow-list, and the chain already shown,
    /// are ignored. Otherwise the network is fetched again and only committed
    /// when it matches the notified chain id.
    pub async fn handle_network_notification(&mut self, chain_id: u64) -> Result<NetworkUpdate> {
        if !self.networks.is_watched(chain_id) {
            debug!(session_id = %self.id, chain_id, "Ignoring notification for unwatched chain");
            return Ok(NetworkUpdate::Ignored);
        }

        let (Some(handle), Some(account)) = (self.handle.as_ref(), self.state.account()) else {
            debug!(session_id = %self.id, chain_id, "Ignoring network notification while disconnected");
            return Ok(NetworkUpdate::Ignored);
        };

        // Our own reads make the provider echo `network` for a change already applied
        if self.state.network().map(|n| n.chain_id) == Some(chain_id) {
            debug!(session_id = %self.id, chain_id, "Network already current");
            return Ok(NetworkUpdate::Ignored);
        }

        let fetched = async {
            let network = handle.provider.get_network().await?;
            if network.chain_id != chain_id {
                return Ok::<_, Error>(Err(network.chain_id));
            }
            let balance = handle.provider.get_balance(account).await?;
            Ok(Ok((network, balance)))
        }
        .await;

        let (network, balance) = match fetched {
            Ok(Ok(update)) => update,
            Ok(Err(actual)) => {
                warn!(
                    session_id = %self.id,
                    expected = chain_id,
                    actual,
                    "Network changed unexpectedly; discarding update"
                );
                return Ok(NetworkUpdate::Discarded {
                    expected: chain_id,
                    actual,
                });
            }
            Err(e) => {
                error!(session_id = %self.id, chain_id, error = %e, "Error updating network");
                return Err(e);
            }
        };

        info!(session_id = %self.id, network = %network, "Network updated");
        self.record(ActivityEntry::new(self.id, "network_changed", "success").chain_id(chain_id));

        if let SessionState::Connected(snapshot) = &mut self.state {
            snapshot.network = network.clone();
            snapshot.balance = format_ether(balance);
        }
        Ok(NetworkUpdate::Applied(network))
    }

    /// React to the wallet exposing a different set of accounts
    ///
    /// An empty list means access was revoked: the session becomes
    /// disconnected but keeps listening. Otherwise the first account is
    /// loaded.
    pub async fn handle_accounts_changed(&mut self, accounts: &[Address]) -> Result<()> {
        let Some(handle) = self.handle.as_ref() else {
            return Ok(());
        };

        let Some(&account) = accounts.first() else {
            if let SessionState::Connected(snapshot) = std::mem::take(&mut self.state) {
                info!(session_id = %self.id, account = %snapshot.account, "Wallet revoked account access");
                self.record(
                    ActivityEntry::new(self.id, "accounts_changed", "revoked")
                        .account(snapshot.account),
                );
            }
            return Ok(());
        };

        if self.state.account() == Some(account) {
            return Ok(());
        }

        let fetched = async {
            let network = handle.provider.get_network().await?;
            let balance = handle.provider.get_balance(account).await?;
            Ok::<_, Error>(Snapshot {
                account,
                network,
                balance: format_ether(balance),
            })
        }
        .await;

        match fetched {
            Ok(snapshot) => {
                info!(session_id = %self.id, account = %snapshot.account, "Active account changed");
                self.record(
                    ActivityEntry::new(self.id, "accounts_changed", "success")
                        .account(snapshot.account)
                        .chain_id(snapshot.network.chain_id),
                );
                self.state = SessionState::Connected(snapshot);
                Ok(())
            }
            Err(e) => {
                error!(session_id = %self.id, error = %e, "Error loading changed account");
                Err(e)
            }
        }
    }

    /// Send the fixed transfer value from the connected account to itself
    ///
    /// Waits for the receipt and notifies the user either way.
    pub async fn send_transfer(&mut self) -> Result<TxHash> {
        let (Some(handle), Some(account)) = (self.handle.as_ref(), self.state.account()) else {
            warn!(session_id = %self.id, "Transfer requested while disconnected");
            return Err(Error::NotConnected);
        };

        let tx = TransactionRequest::default()
            .from(account)
            .to(account)
            .value(self.transfer_value);

        let confirmation = &self.confirmation;
        let session_id = self.id;
        let result = async {
            let hash = handle.provider.send_transaction(tx).await?;
            info!(session_id = %session_id, %hash, "Transaction submitted, waiting for confirmation");
            handle.provider.wait_for_confirmation(hash, confirmation).await
        }
        .await;

        match result {
            Ok(receipt) => {
                info!(
                    session_id = %self.id,
                    hash = %receipt.hash,
                    block = ?receipt.block_number,
                    value = %format_ether(self.transfer_value),
                    "Transaction successful"
                );
                self.notifier
                    .notify(&Notice::TransferConfirmed { hash: receipt.hash });
                self.record(
                    ActivityEntry::new(self.id, "transfer", "success")
                        .account(account)
                        .tx_hash(receipt.hash),
                );
                Ok(receipt.hash)
            }
            Err(e) => {
                error!(session_id = %self.id, error = %e, "Transaction failed");
                self.notifier.notify(&Notice::TransferFailed {
                    reason: e.to_string(),
                });
                self.record(
                    ActivityEntry::new(self.id, "transfer", "error")
                        .account(account)
                        .error(&e),
                );
                Err(e)
            }
        }
    }

    /// Wait for the next event from either subscription
    ///
    /// Never resolves while no provider is held. Returns `None` when the
    /// wallet closed its event channel, after dropping the handle.
    pub async fn next_notification(&mut self) -> Option<Notification> {
        let Some(handle) = self.handle.as_mut() else {
            return std::future::pending().await;
        };

        let closed = loop {
            let ProviderHandle {
                network_rx,
                wallet_rx,
                ..
            } = &mut *handle;

            tokio::select! {
                event = network_rx.recv() => match event {
                    Ok(network) => return Some(Notification::Network(network.chain_id)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dropped provider network events");
                    }
                    Err(RecvError::Closed) => break "network",
                },
                event = wallet_rx.recv() => match event {
                    Ok(WalletEvent::ChainChanged(chain_id)) => {
                        return Some(Notification::ChainChanged(chain_id))
                    }
                    Ok(WalletEvent::AccountsChanged(accounts)) => {
                        return Some(Notification::AccountsChanged(accounts))
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dropped wallet events");
                    }
                    Err(RecvError::Closed) => break "wallet",
                },
            }
        };

        warn!(session_id = %self.id, channel = closed, "Event channel closed; releasing provider");
        self.teardown();
        None
    }

    /// Route a notification to its handler
    pub async fn dispatch(&mut self, notification: Notification) -> Result<()> {
        match notification {
            Notification::Network(chain_id) | Notification::ChainChanged(chain_id) => {
                self.handle_network_notification(chain_id).await.map(|_| ())
            }
            Notification::AccountsChanged(accounts) => {
                self.handle_accounts_changed(&accounts).await
            }
        }
    }

    /// Release the provider handle and its event subscriptions
    pub fn teardown(&mut self) {
        if self.handle.take().is_some() {
            debug!(session_id = %self.id, "Detached provider listeners");
        }
    }

    /// Replace the current handle; the old subscriptions are dropped first
    fn install(&mut self, provider: WalletProvider) {
        self.teardown();
        self.handle = Some(ProviderHandle::attach(provider));
    }

    async fn fetch_snapshot(provider: &WalletProvider) -> Result<Snapshot> {
        let account = provider.signer_address().await?;
        let network = provider.get_network().await?;
        let balance = provider.get_balance(account).await?;
        Ok(Snapshot {
            account,
            network,
            balance: format_ether(balance),
        })
    }

    /// Snapshot if an account is already authorized
    async fn fetch_authorized(provider: &WalletProvider) -> Result<Option<Snapshot>> {
        if !provider.has_authorized_account().await? {
            return Ok(None);
        }
        Self::fetch_snapshot(provider).await.map(Some)
    }

    fn record(&self, entry: ActivityEntry) {
        if let Some(log) = &self.activity {
            log.record(entry);
        }
    }

    #[cfg(test)]
    fn network_listener_count(&self) -> usize {
        self.handle
            .as_ref()
            .map(|h| h.provider.network_listener_count())
            .unwrap_or(0)
    }
}

impl<E: WalletEnvironment> std::fmt::Debug for WalletSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("has_provider", &self.handle.is_some())
            .finish()
    }
}

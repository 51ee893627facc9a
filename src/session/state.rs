//! Session state types

use crate::network::Network;
use alloy::primitives::Address;
use serde::Serialize;

/// One consistent view of the connected wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub account: Address,
    pub network: Network,
    /// Native balance formatted in ether
    pub balance: String,
}

/// Connection state; account, network and balance exist together or not at all
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected(Snapshot),
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected(_))
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            SessionState::Connected(snapshot) => Some(snapshot),
            SessionState::Disconnected => None,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.snapshot().map(|s| s.account)
    }

    pub fn network(&self) -> Option<&Network> {
        self.snapshot().map(|s| &s.network)
    }

    pub fn balance(&self) -> Option<&str> {
        self.snapshot().map(|s| s.balance.as_str())
    }
}

/// Event delivered to the session owner by [`super::WalletSession::next_notification`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Provider-level `network` event
    Network(u64),
    /// Wallet-level `chainChanged` event
    ChainChanged(u64),
    /// Wallet-level `accountsChanged` event
    AccountsChanged(Vec<Address>),
}

/// What a network notification did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkUpdate {
    /// Chain not watched, or nothing connected to update
    Ignored,
    /// Network and balance refreshed
    Applied(Network),
    /// Fresh read disagreed with the notification; state kept
    Discarded { expected: u64, actual: u64 },
}

//! In-memory wallet transport for tests

use super::{Transport, TransferReceipt, WalletEvent, EVENT_CHANNEL_CAPACITY};
use crate::network::chains;
use crate::{Error, Result};
use alloy::primitives::{address, keccak256, Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

pub const TEST_ACCOUNT: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

struct MockState {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: u64,
    /// Chain reported by `chain_id()` regardless of switches, when set
    reported_chain: Option<u64>,
    supported_chains: Vec<u64>,
    balances: HashMap<u64, U256>,
    reject_accounts: bool,
    reject_switch: bool,
    fail_chain_queries: bool,
    revert: bool,
    withhold_receipts: bool,
    sent: Vec<TransactionRequest>,
    receipts: HashMap<TxHash, TransferReceipt>,
}

/// Scriptable wallet transport
pub struct MockTransport {
    state: Mutex<MockState>,
    events: broadcast::Sender<WalletEvent>,
}

impl MockTransport {
    /// Wallet on `chain_id` with one account that has not been authorized yet
    pub fn new(chain_id: u64) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let mut balances = HashMap::new();
        balances.insert(chains::MAINNET, U256::from(3_000_000_000_000_000_000u128));
        balances.insert(chains::HOLESKY, U256::from(1_500_000_000_000_000_000u128));
        balances.insert(chains::SEPOLIA, U256::from(2_000_000_000_000_000_000u128));

        Arc::new(Self {
            state: Mutex::new(MockState {
                accounts: vec![TEST_ACCOUNT],
                authorized: false,
                chain_id,
                reported_chain: None,
                supported_chains: vec![chains::MAINNET, chains::HOLESKY, chains::SEPOLIA],
                balances,
                reject_accounts: false,
                reject_switch: false,
                fail_chain_queries: false,
                revert: false,
                withhold_receipts: false,
                sent: Vec::new(),
                receipts: HashMap::new(),
            }),
            events,
        })
    }

    /// Wallet on `chain_id` whose account is already authorized
    pub fn connected(chain_id: u64) -> Arc<Self> {
        let mock = Self::new(chain_id);
        mock.lock().authorized = true;
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn account(&self) -> Address {
        self.lock().accounts[0]
    }

    /// Change chain silently, as if the wallet moved without telling anyone
    pub fn set_chain_id(&self, chain_id: u64) {
        self.lock().chain_id = chain_id;
    }

    /// Make `chain_id()` report this chain no matter what
    pub fn report_chain(&self, chain_id: u64) {
        self.lock().reported_chain = Some(chain_id);
    }

    pub fn set_balance(&self, chain_id: u64, wei: U256) {
        self.lock().balances.insert(chain_id, wei);
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.lock().accounts = accounts;
    }

    pub fn reject_account_requests(&self) {
        self.lock().reject_accounts = true;
    }

    pub fn reject_switches(&self) {
        self.lock().reject_switch = true;
    }

    pub fn fail_chain_queries(&self, fail: bool) {
        self.lock().fail_chain_queries = fail;
    }

    pub fn revert_transactions(&self) {
        self.lock().revert = true;
    }

    pub fn withhold_receipts(&self) {
        self.lock().withhold_receipts = true;
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.lock().sent.clone()
    }

    /// Fire a wallet event to all subscribers
    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let mut state = self.lock();
        if state.reject_accounts {
            return Err(Error::Rejected("User rejected the request".to_string()));
        }
        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        let state = self.lock();
        Ok(if state.authorized {
            state.accounts.clone()
        } else {
            Vec::new()
        })
    }

    async fn chain_id(&self) -> Result<u64> {
        let state = self.lock();
        if state.fail_chain_queries {
            return Err(Error::Provider("connection reset".to_string()));
        }
        Ok(state.reported_chain.unwrap_or(state.chain_id))
    }

    async fn balance(&self, _account: Address) -> Result<U256> {
        let state = self.lock();
        Ok(state
            .balances
            .get(&state.chain_id)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        {
            let mut state = self.lock();
            if state.reject_switch {
                return Err(Error::Rejected("User rejected the request".to_string()));
            }
            if !state.supported_chains.contains(&chain_id) {
                return Err(Error::UnsupportedChain(chain_id));
            }
            state.chain_id = chain_id;
        }
        self.emit(WalletEvent::ChainChanged(chain_id));
        Ok(())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let mut state = self.lock();
        let nonce = state.sent.len() as u64;
        let hash = keccak256(nonce.to_be_bytes());
        state.sent.push(tx);
        if !state.withhold_receipts {
            let success = !state.revert;
            state.receipts.insert(
                hash,
                TransferReceipt {
                    hash,
                    block_number: Some(100 + nonce),
                    success,
                },
            );
        }
        Ok(hash)
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<TransferReceipt>> {
        Ok(self.lock().receipts.get(&hash).cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }
}

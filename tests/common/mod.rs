//! Shared utilities for integration tests: a scriptable in-memory wallet.
#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::{SolInterface, SolValue};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Notify};

use wallet_session::config::{ContractDeployment, SessionConfig};
use wallet_session::contract::abi::IStakingToken;
use wallet_session::provider::types::{METHOD_NOT_FOUND_CODE, UNRECOGNIZED_CHAIN_CODE};
use wallet_session::provider::{
    Eip1193Provider, InjectionSlot, ProviderEvent, ProviderRpcError, SharedProvider,
};
use wallet_session::session::SessionManager;
use wallet_session::types::ChainId;

pub const MAINNET_CONTRACT: &str = "0x1111111111111111111111111111111111111111";
pub const TESTNET_CONTRACT: &str = "0x2222222222222222222222222222222222222222";

/// Seconds-since-epoch the mock chain reports for new stakes.
pub const CHAIN_NOW: u64 = 1_700_000_000;
pub const LOCK_PERIOD_SECS: u64 = 604_800;

pub fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}

/// Defaults plus a deployment on each BSC network.
pub fn test_config() -> SessionConfig {
    let mut config = SessionConfig::default();
    config.contracts = vec![
        ContractDeployment {
            chain_id: 56,
            address: MAINNET_CONTRACT.to_string(),
        },
        ContractDeployment {
            chain_id: 97,
            address: TESTNET_CONTRACT.to_string(),
        },
    ];
    config
}

/// Mutable wallet and chain state behind the mock provider.
pub struct WalletState {
    pub accounts: Vec<Address>,
    pub chain_id: u64,
    /// Chains the wallet can switch to without adding them first.
    pub known_chains: HashSet<u64>,
    pub reject_connect: bool,
    pub reject_switch: bool,
    pub reject_transactions: bool,
    /// Emit `chainChanged` when a switch succeeds.
    pub emit_chain_changed: bool,
    pub balances: HashMap<Address, U256>,
    pub total_supply: U256,
    pub stakes: HashMap<Address, (U256, U256, U256)>,
    /// Read methods that revert (`"totalSupply"`, ...).
    pub failing_reads: HashSet<&'static str>,
    /// Receipt polls answered with `null` before a transaction mines.
    pub pending_receipt_polls: usize,
    pub revert_on_chain: bool,
    receipts: HashMap<B256, usize>,
    tx_count: u64,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            accounts: vec![account(0xaa)],
            chain_id: 56,
            known_chains: [56, 97].into_iter().collect(),
            reject_connect: false,
            reject_switch: false,
            reject_transactions: false,
            emit_chain_changed: true,
            balances: HashMap::from([(account(0xaa), tokens(1_000))]),
            total_supply: tokens(1_000_000),
            stakes: HashMap::new(),
            failing_reads: HashSet::new(),
            pending_receipt_polls: 0,
            revert_on_chain: false,
            receipts: HashMap::new(),
            tx_count: 0,
        }
    }
}

/// Scriptable EIP-1193 provider with ABI-level token and staking state.
pub struct MockWallet {
    pub state: Mutex<WalletState>,
    events: broadcast::Sender<ProviderEvent>,
    handshake_gate: Mutex<Option<Arc<Notify>>>,
    log: Mutex<Vec<(String, Value)>>,
}

impl MockWallet {
    pub fn new() -> Arc<Self> {
        Self::with_state(WalletState::default())
    }

    pub fn with_state(state: WalletState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            events: broadcast::channel(16).0,
            handshake_gate: Mutex::new(None),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn configure(&self, f: impl FnOnce(&mut WalletState)) {
        f(&mut self.state.lock().unwrap());
    }

    /// Hold `eth_requestAccounts` until the returned gate is notified.
    pub fn gate_handshake(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.handshake_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// Change accounts the way a user would in the wallet UI.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts.clone();
        self.emit(ProviderEvent::AccountsChanged(accounts));
    }

    pub fn set_chain(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
        self.emit(ProviderEvent::ChainChanged(ChainId(chain_id)));
    }

    pub fn count(&self, method: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|(m, _)| m == method).count()
    }

    pub fn total_requests(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// `to` of every `eth_call`, in order.
    pub fn call_targets(&self) -> Vec<Address> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == "eth_call")
            .filter_map(|(_, params)| params[0]["to"].as_str()?.parse().ok())
            .collect()
    }

    fn read(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let data = calldata(params)?;
        let call = IStakingToken::IStakingTokenCalls::abi_decode(&data)
            .map_err(|e| ProviderRpcError::internal(e.to_string()))?;
        let state = self.state.lock().unwrap();

        let (name, encoded) = match call {
            IStakingToken::IStakingTokenCalls::balanceOf(c) => (
                "balanceOf",
                state
                    .balances
                    .get(&c.account)
                    .copied()
                    .unwrap_or_default()
                    .abi_encode(),
            ),
            IStakingToken::IStakingTokenCalls::totalSupply(_) => {
                ("totalSupply", state.total_supply.abi_encode())
            }
            IStakingToken::IStakingTokenCalls::stakes(c) => (
                "stakes",
                state
                    .stakes
                    .get(&c.account)
                    .copied()
                    .unwrap_or_default()
                    .abi_encode_params(),
            ),
            _ => return Err(ProviderRpcError::internal("not a view function")),
        };

        if state.failing_reads.contains(name) {
            return Err(ProviderRpcError::new(3, "execution reverted"));
        }
        Ok(json!(Bytes::from(encoded)))
    }

    fn send(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let from: Address = params[0]["from"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ProviderRpcError::internal("missing from"))?;
        let data = calldata(params)?;
        let call = IStakingToken::IStakingTokenCalls::abi_decode(&data)
            .map_err(|e| ProviderRpcError::internal(e.to_string()))?;

        let mut state = self.state.lock().unwrap();
        if state.reject_transactions {
            return Err(ProviderRpcError::user_rejected());
        }

        match call {
            IStakingToken::IStakingTokenCalls::stake(c) => {
                debit(&mut state, from, c.amount)?;
                let entry = state.stakes.entry(from).or_default();
                entry.0 += c.amount;
                entry.1 = U256::from(CHAIN_NOW);
                entry.2 = U256::from(LOCK_PERIOD_SECS);
            }
            IStakingToken::IStakingTokenCalls::unstake(_) => {
                let (amount, timestamp, lock) = state.stakes.get(&from).copied().unwrap_or_default();
                if amount.is_zero() {
                    return Err(ProviderRpcError::internal("execution reverted: no stake"));
                }
                if U256::from(CHAIN_NOW) < timestamp + lock {
                    return Err(ProviderRpcError::internal(
                        "execution reverted: tokens are still locked",
                    ));
                }
                state.stakes.remove(&from);
                *state.balances.entry(from).or_default() += amount;
            }
            IStakingToken::IStakingTokenCalls::transfer(c) => {
                debit(&mut state, from, c.amount)?;
                *state.balances.entry(c.to).or_default() += c.amount;
            }
            _ => return Err(ProviderRpcError::internal("not a state-changing function")),
        }

        state.tx_count += 1;
        let hash = B256::from(U256::from(state.tx_count));
        let pending = state.pending_receipt_polls;
        state.receipts.insert(hash, pending);
        Ok(json!(hash))
    }

    fn receipt(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let hash: B256 = params[0]
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ProviderRpcError::internal("missing hash"))?;
        let mut state = self.state.lock().unwrap();
        let status = if state.revert_on_chain { "0x0" } else { "0x1" };
        match state.receipts.get_mut(&hash) {
            None => Ok(Value::Null),
            Some(0) => Ok(json!({ "status": status, "blockNumber": "0x2a" })),
            Some(remaining) => {
                *remaining -= 1;
                Ok(Value::Null)
            }
        }
    }

    fn switch(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let target = requested_chain(params)?;
        let mut state = self.state.lock().unwrap();
        if state.reject_switch {
            return Err(ProviderRpcError::user_rejected());
        }
        if !state.known_chains.contains(&target) {
            return Err(ProviderRpcError::new(
                UNRECOGNIZED_CHAIN_CODE,
                "Unrecognized chain ID. Try adding the chain first.",
            ));
        }
        state.chain_id = target;
        let emit = state.emit_chain_changed;
        drop(state);
        if emit {
            self.emit(ProviderEvent::ChainChanged(ChainId(target)));
        }
        Ok(Value::Null)
    }
}

#[async_trait]
impl Eip1193Provider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        self.log
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));

        match method {
            "eth_requestAccounts" => {
                let gate = self.handshake_gate.lock().unwrap().clone();
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                let state = self.state.lock().unwrap();
                if state.reject_connect {
                    return Err(ProviderRpcError::user_rejected());
                }
                Ok(json!(state.accounts))
            }
            "eth_accounts" => Ok(json!(self.state.lock().unwrap().accounts)),
            "eth_chainId" => Ok(json!(ChainId(self.state.lock().unwrap().chain_id).to_hex())),
            "wallet_switchEthereumChain" => self.switch(&params),
            "wallet_addEthereumChain" => {
                let chain = requested_chain(&params)?;
                self.state.lock().unwrap().known_chains.insert(chain);
                Ok(Value::Null)
            }
            "eth_call" => self.read(&params),
            "eth_sendTransaction" => self.send(&params),
            "eth_getTransactionReceipt" => self.receipt(&params),
            _ => Err(ProviderRpcError::new(
                METHOD_NOT_FOUND_CODE,
                format!("{} not supported", method),
            )),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

fn calldata(params: &Value) -> Result<Bytes, ProviderRpcError> {
    params[0]["data"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ProviderRpcError::internal("missing data"))
}

fn requested_chain(params: &Value) -> Result<u64, ProviderRpcError> {
    params[0]["chainId"]
        .as_str()
        .and_then(|s| ChainId::from_hex(s).ok())
        .map(|c| c.0)
        .ok_or_else(|| ProviderRpcError::internal("missing chainId"))
}

fn debit(state: &mut WalletState, from: Address, amount: U256) -> Result<(), ProviderRpcError> {
    let balance = state.balances.entry(from).or_default();
    if *balance < amount {
        return Err(ProviderRpcError::internal(
            "execution reverted: transfer amount exceeds balance",
        ));
    }
    *balance -= amount;
    Ok(())
}

/// A session whose host already has `wallet` injected.
pub fn session_with(wallet: &Arc<MockWallet>, config: &SessionConfig) -> Arc<SessionManager> {
    let provider: SharedProvider = wallet.clone();
    let env = Arc::new(InjectionSlot::with_provider(provider));
    Arc::new(SessionManager::new(env, config))
}

/// Wait (in virtual time when paused) until `predicate` holds.
pub async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, predicate: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), rx.wait_for(predicate))
        .await
        .expect("condition not reached in time")
        .expect("sender dropped")
        .clone()
}

/// Poll `f` until it returns true.
pub async fn eventually<F, Fut>(mut f: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if f().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never became true");
}

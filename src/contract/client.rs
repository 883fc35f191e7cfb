//! Contract client bound to the active session.
//!
//! # Responsibilities
//! - Resolve the contract binding from session state on every call
//! - Serve typed reads and track them in a published [`ReadState`]
//! - Submit writes, wait until mined, then refresh reads
//!
//! # Consistency
//! Cached reads are tagged with the binding they were read under. A refresh
//! whose binding went stale while in flight is discarded, so the published
//! state never mixes values from two accounts or chains.

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::sol_types::SolCall;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::contract::abi::IStakingToken;
use crate::contract::binding::{BindingKey, ContractBinding, ContractRegistry};
use crate::contract::stake::StakeRecord;
use crate::contract::state::{ReadState, RefreshReport};
use crate::contract::transaction::wait_until_mined;
use crate::contract::units::TokenAmount;
use crate::observability::metrics;
use crate::provider::{rpc, ProviderRpcError};
use crate::session::SessionManager;
use crate::types::{WalletError, WalletResult};

pub struct ContractClient {
    session: Arc<SessionManager>,
    registry: ContractRegistry,
    receipt_poll_interval: Duration,
    state: watch::Sender<ReadState>,
    in_flight: AtomicUsize,
}

impl ContractClient {
    pub fn new(
        session: Arc<SessionManager>,
        registry: ContractRegistry,
        receipt_poll_interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ReadState::default());
        Self {
            session,
            registry,
            receipt_poll_interval,
            state,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn from_config(session: Arc<SessionManager>, config: &SessionConfig) -> Self {
        Self::new(
            session,
            ContractRegistry::from_config(config),
            Duration::from_millis(config.transactions.receipt_poll_interval_ms),
        )
    }

    /// Binding for the current account and chain.
    pub fn binding(&self) -> WalletResult<ContractBinding> {
        ContractBinding::resolve(self.session.signer(), &self.registry)
    }

    pub fn read_state(&self) -> ReadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadState> {
        self.state.subscribe()
    }

    pub async fn get_balance(&self, account: Address) -> WalletResult<TokenAmount> {
        self.read("balanceOf", IStakingToken::balanceOfCall { account })
            .await
            .map(TokenAmount::from_base_units)
    }

    pub async fn get_total_supply(&self) -> WalletResult<TokenAmount> {
        self.read("totalSupply", IStakingToken::totalSupplyCall {})
            .await
            .map(TokenAmount::from_base_units)
    }

    pub async fn get_stake_record(&self, account: Address) -> WalletResult<StakeRecord> {
        let raw = self
            .read("stakes", IStakingToken::stakesCall { account })
            .await?;
        StakeRecord::from_raw(raw.amount, raw.timestamp, raw.lockPeriod)
    }

    /// Re-read balance, total supply and stake for the bound account.
    ///
    /// The three reads run concurrently and fail independently; successes are
    /// merged into the read state even when a sibling read fails.
    pub async fn refresh(&self) -> RefreshReport {
        let binding = match self.binding() {
            Ok(binding) => binding,
            Err(e) => {
                self.invalidate(Some(e.to_string()));
                return RefreshReport::unavailable(e);
            }
        };
        let key = binding.key();
        self.bind_to(key);

        let _loading = self.begin_loading();
        let (balance, total_supply, stake) = futures_util::future::join3(
            self.get_balance(binding.account),
            self.get_total_supply(),
            self.get_stake_record(binding.account),
        )
        .await;
        let report = RefreshReport {
            balance,
            total_supply,
            stake,
        };

        let current = self.binding().ok().map(|b| b.key());
        if current != Some(key) {
            tracing::debug!(
                account = %key.account,
                chain_id = %key.chain_id,
                "Discarding refresh for stale binding"
            );
            return report;
        }

        self.state.send_modify(|state| {
            if state.key() == Some(key) {
                report.apply_to(state);
            }
        });
        for error in report.errors() {
            tracing::warn!(error = %error, "Contract read failed");
        }
        report
    }

    /// Stake `amount` tokens and wait until the transaction is mined.
    pub async fn stake(&self, amount: TokenAmount) -> WalletResult<TxHash> {
        self.submit(
            "stake",
            IStakingToken::stakeCall {
                amount: amount.base_units(),
            },
        )
        .await
    }

    /// Withdraw the stake. Lock status is enforced by the contract only.
    pub async fn unstake(&self) -> WalletResult<TxHash> {
        self.submit("unstake", IStakingToken::unstakeCall {}).await
    }

    pub async fn transfer(&self, to: Address, amount: TokenAmount) -> WalletResult<TxHash> {
        self.submit(
            "transfer",
            IStakingToken::transferCall {
                to,
                amount: amount.base_units(),
            },
        )
        .await
    }

    /// Drop cached reads; `error` explains why, if anything went wrong.
    pub fn invalidate(&self, error: Option<String>) {
        self.state.send_modify(|state| state.reset(None, error));
    }

    /// Follow session changes: reload on a new account or chain, invalidate
    /// on disconnect. The task ends when the client is dropped.
    pub fn spawn_binding_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let client: Weak<Self> = Arc::downgrade(self);
        let mut session = self.session.subscribe();

        tokio::spawn(async move {
            let mut last = None;
            loop {
                let current = session
                    .borrow_and_update()
                    .connection()
                    .map(|c| (c.account, c.chain_id));

                if current != last {
                    let Some(client) = client.upgrade() else {
                        break;
                    };
                    last = current;
                    match current {
                        Some((account, chain_id)) => {
                            tracing::debug!(%account, %chain_id, "Session binding changed");
                            client.refresh().await;
                        }
                        None => client.invalidate(None),
                    }
                }

                if session.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    async fn read<C>(&self, method: &'static str, call: C) -> WalletResult<C::Return>
    where
        C: SolCall + Send,
    {
        let data = Bytes::from(call.abi_encode());
        let binding = self.binding()?;

        let result = rpc::call(binding.provider.as_ref(), binding.account, binding.address, data)
            .await
            .map_err(|e| WalletError::CallFailed(format!("{}: {}", method, e.message)))
            .and_then(|raw| {
                C::abi_decode_returns(&raw).map_err(|e| {
                    WalletError::CallFailed(format!("{}: undecodable result: {}", method, e))
                })
            });

        metrics::record_contract_read(method, if result.is_ok() { "ok" } else { "error" });
        result
    }

    async fn submit<C>(&self, method: &'static str, call: C) -> WalletResult<TxHash>
    where
        C: SolCall + Send,
    {
        let data = Bytes::from(call.abi_encode());
        let binding = self.binding()?;
        let provider = binding.provider.as_ref();

        let outcome = {
            let _loading = self.begin_loading();
            match rpc::send_transaction(provider, binding.account, binding.address, data).await {
                Ok(tx_hash) => {
                    tracing::info!(
                        method,
                        tx_hash = %tx_hash,
                        chain_id = %binding.chain_id,
                        "Transaction submitted"
                    );
                    wait_until_mined(provider, tx_hash, self.receipt_poll_interval)
                        .await
                        .map(|_| tx_hash)
                }
                Err(e) => Err(submit_error(e)),
            }
        };

        match outcome {
            Ok(tx_hash) => {
                metrics::record_transaction(method, "ok");
                self.refresh().await;
                Ok(tx_hash)
            }
            Err(e) => {
                metrics::record_transaction(method, e.kind());
                tracing::warn!(method, error = %e, "Transaction failed");
                Err(e)
            }
        }
    }

    /// Tag the read state with `key`, dropping values read under another binding.
    fn bind_to(&self, key: BindingKey) {
        self.state.send_if_modified(|state| {
            if state.key() == Some(key) {
                return false;
            }
            state.reset(Some(key), None);
            true
        });
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.state.send_modify(|state| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            state.is_loading = true;
        });
        LoadingGuard { client: self }
    }
}

/// Keeps `is_loading` set while any read batch or write is in flight.
struct LoadingGuard<'a> {
    client: &'a ContractClient,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let in_flight = &self.client.in_flight;
        self.client.state.send_modify(|state| {
            let remaining = in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            state.is_loading = remaining > 0;
        });
    }
}

fn submit_error(e: ProviderRpcError) -> WalletError {
    if e.is_user_rejection() {
        WalletError::UserRejected(e.message)
    } else {
        WalletError::TransactionFailed(e.message)
    }
}

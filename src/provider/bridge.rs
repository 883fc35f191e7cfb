//! JSON-RPC bridge provider.
//!
//! Stands in for a browser-injected wallet when running natively: requests are
//! forwarded to a node with unlocked accounts (Anvil, Hardhat) and the push
//! events are synthesized by polling `eth_accounts` and `eth_chainId`.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::config::schema::BridgeConfig;
use crate::provider::rpc;
use crate::provider::types::{
    Eip1193Provider, ProviderEvent, ProviderRpcError, METHOD_NOT_FOUND_CODE,
};
use crate::types::{ChainId, WalletError, WalletResult};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ProviderRpcError>,
}

/// Provider that forwards to a JSON-RPC node over HTTP.
pub struct RpcBridgeProvider {
    client: reqwest::Client,
    url: url::Url,
    next_id: AtomicU64,
    events: broadcast::Sender<ProviderEvent>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl RpcBridgeProvider {
    /// Create a bridge to `config.rpc_url`. No request is made until first use.
    pub fn new(config: &BridgeConfig) -> WalletResult<Arc<Self>> {
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            WalletError::Provider(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| WalletError::Provider(format!("HTTP client error: {}", e)))?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(rpc_url = %url, "RPC bridge provider created");

        Ok(Arc::new(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
            events,
            poller: Mutex::new(None),
        }))
    }

    /// Start synthesizing `accountsChanged` / `chainChanged` events.
    pub fn start_event_polling(self: &Arc<Self>, poll_interval: Duration) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(poll_events(weak, poll_interval));
        let previous = self
            .poller
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderRpcError::internal(format!("transport error: {}", e)))?;
        let decoded: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderRpcError::internal(format!("invalid JSON-RPC response: {}", e)))?;

        match (decoded.error, decoded.result) {
            (Some(error), _) => Err(error),
            (None, Some(result)) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl Eip1193Provider for RpcBridgeProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        match self.send(method, params.clone()).await {
            // Plain nodes have no prompt; their unlocked accounts are the authorization.
            Err(e) if e.code == METHOD_NOT_FOUND_CODE && method == "eth_requestAccounts" => {
                self.send("eth_accounts", params).await
            }
            other => other,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

impl Drop for RpcBridgeProvider {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

async fn poll_events(bridge: Weak<RpcBridgeProvider>, poll_interval: Duration) {
    let mut ticker = interval(poll_interval);
    let mut last_accounts: Option<Vec<Address>> = None;
    let mut last_chain: Option<ChainId> = None;

    loop {
        ticker.tick().await;
        let Some(bridge) = bridge.upgrade() else {
            break;
        };

        match rpc::accounts(bridge.as_ref()).await {
            Ok(accounts) => {
                if last_accounts.as_ref().is_some_and(|prev| *prev != accounts) {
                    let _ = bridge.events.send(ProviderEvent::AccountsChanged(accounts.clone()));
                }
                last_accounts = Some(accounts);
            }
            Err(e) => tracing::debug!(error = %e, "Bridge account poll failed"),
        }

        match rpc::chain_id(bridge.as_ref()).await {
            Ok(chain_id) => {
                if last_chain.is_some_and(|prev| prev != chain_id) {
                    let _ = bridge.events.send(ProviderEvent::ChainChanged(chain_id));
                }
                last_chain = Some(chain_id);
            }
            Err(e) => tracing::debug!(error = %e, "Bridge chain poll failed"),
        }
    }
}

//! Injected-provider protocol types (EIP-1193).

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::NetworkConfig;
use crate::types::ChainId;

/// The user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// The wallet does not know the requested chain.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// The method is not supported by the provider.
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;
/// Internal JSON-RPC error; also used for undecodable responses.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Error returned by a provider request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("provider error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED_CODE, "User rejected the request.")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR_CODE, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_CODE
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == UNRECOGNIZED_CHAIN_CODE
    }
}

/// Notification pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// `accountsChanged`; an empty list means the wallet revoked access.
    AccountsChanged(Vec<Address>),
    /// `chainChanged`.
    ChainChanged(ChainId),
}

impl ProviderEvent {
    pub const ACCOUNTS_CHANGED: &'static str = "accountsChanged";
    pub const CHAIN_CHANGED: &'static str = "chainChanged";

    /// Decode a raw event as emitted on the wire. Unknown names and malformed
    /// payloads yield `None`.
    pub fn from_raw(name: &str, payload: &Value) -> Option<Self> {
        match name {
            Self::ACCOUNTS_CHANGED => serde_json::from_value::<Vec<Address>>(payload.clone())
                .ok()
                .map(ProviderEvent::AccountsChanged),
            Self::CHAIN_CHANGED => payload
                .as_str()
                .and_then(|raw| ChainId::from_hex(raw).ok())
                .map(ProviderEvent::ChainChanged),
            _ => None,
        }
    }

    /// Label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderEvent::AccountsChanged(_) => Self::ACCOUNTS_CHANGED,
            ProviderEvent::ChainChanged(_) => Self::CHAIN_CHANGED,
        }
    }
}

/// A wallet's in-page RPC transport.
///
/// `subscribe` registers a listener; dropping the receiver unregisters it.
/// Events must be delivered in emission order.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError>;

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Shared handle to a provider.
pub type SharedProvider = Arc<dyn Eip1193Provider>;

/// Payload of `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrencyParameter,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrencyParameter {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl From<&NetworkConfig> for AddEthereumChainParameter {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            chain_id: ChainId(network.chain_id).to_hex(),
            chain_name: network.name.clone(),
            native_currency: NativeCurrencyParameter {
                name: network.native_currency.name.clone(),
                symbol: network.native_currency.symbol.clone(),
                decimals: network.native_currency.decimals,
            },
            rpc_urls: network.rpc_urls.clone(),
            block_explorer_urls: network.block_explorer_urls.clone(),
        }
    }
}

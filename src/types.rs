//! Chain identifiers and the shared error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Hex form used on the provider wire (`0x38` for 56).
    pub fn to_hex(self) -> String {
        format!("0x{:x}", self.0)
    }

    /// Parse a provider-supplied chain id. Accepts `0x`-prefixed hex or plain decimal.
    pub fn from_hex(value: &str) -> WalletResult<Self> {
        let trimmed = value.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };

        match parsed {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(WalletError::InvalidResponse(format!(
                "invalid chain id '{}'",
                value
            ))),
        }
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors surfaced by the session manager and the contract client.
///
/// Every variant is recoverable by retrying the operation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// Bounded discovery found no injected provider.
    #[error("No injected wallet provider found")]
    ProviderUnavailable,

    /// Discovery was exhausted while connecting.
    #[error("Wallet not detected. Please install a browser wallet")]
    WalletNotInstalled,

    /// The user dismissed or denied a wallet prompt.
    #[error("Request rejected in wallet: {0}")]
    UserRejected(String),

    /// Connected, but to a chain outside the supported set.
    #[error("Unsupported chain {0}")]
    UnsupportedChain(ChainId),

    /// Switching (or adding) a network failed.
    #[error("Network switch failed: {0}")]
    NetworkSwitchFailed(String),

    /// No contract is bound for the current session.
    #[error("Contract unavailable: {0}")]
    ContractUnavailable(String),

    /// A read call failed.
    #[error("Contract call failed: {0}")]
    CallFailed(String),

    /// A write call was rejected, reverted or never mined.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The operation needs a connected session.
    #[error("Wallet not connected")]
    NotConnected,

    /// The provider returned no accounts during a handshake.
    #[error("No authorized account available")]
    NoAuthorizedAccount,

    /// Any other provider failure during the handshake.
    #[error("Provider error: {0}")]
    Provider(String),

    /// A decimal token amount could not be parsed.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The provider answered with a payload we could not decode.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl WalletError {
    /// Stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WalletError::ProviderUnavailable => "provider_unavailable",
            WalletError::WalletNotInstalled => "wallet_not_installed",
            WalletError::UserRejected(_) => "user_rejected",
            WalletError::UnsupportedChain(_) => "unsupported_chain",
            WalletError::NetworkSwitchFailed(_) => "network_switch_failed",
            WalletError::ContractUnavailable(_) => "contract_unavailable",
            WalletError::CallFailed(_) => "call_failed",
            WalletError::TransactionFailed(_) => "transaction_failed",
            WalletError::NotConnected => "not_connected",
            WalletError::NoAuthorizedAccount => "no_authorized_account",
            WalletError::Provider(_) => "provider",
            WalletError::InvalidAmount(_) => "invalid_amount",
            WalletError::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

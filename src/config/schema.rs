//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

use crate::settings::AppSettings;

/// Root configuration for the wallet session.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Injected provider discovery polling.
    pub discovery: DiscoveryConfig,

    /// Networks the application supports, with their add-network parameters.
    pub networks: Vec<NetworkConfig>,

    /// Network requested when a connect lands on an unsupported chain.
    pub preferred_chain_id: u64,

    /// Attempt a switch to `preferred_chain_id` after connecting to an unsupported chain.
    pub auto_switch_unsupported: bool,

    /// Contract deployments, one per chain.
    pub contracts: Vec<ContractDeployment>,

    /// Transaction settlement settings.
    pub transactions: TransactionConfig,

    /// JSON-RPC bridge used by the command line binary.
    pub bridge: BridgeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Application settings (conversion rates).
    pub settings: AppSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            networks: vec![NetworkConfig::bsc_mainnet(), NetworkConfig::bsc_testnet()],
            preferred_chain_id: 56,
            auto_switch_unsupported: true,
            contracts: Vec::new(),
            transactions: TransactionConfig::default(),
            bridge: BridgeConfig::default(),
            observability: ObservabilityConfig::default(),
            settings: AppSettings::default(),
        }
    }
}

/// Provider discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Delay between lookups in milliseconds.
    pub poll_interval_ms: u64,

    /// Total lookups, including the immediate one, before giving up.
    pub max_attempts: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            max_attempts: 10,
        }
    }
}

/// Public parameters of a network, as sent in `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Numeric chain id.
    pub chain_id: u64,

    /// Human-readable network name.
    pub name: String,

    /// Native currency descriptor.
    pub native_currency: NativeCurrency,

    /// RPC endpoints.
    pub rpc_urls: Vec<String>,

    /// Block explorers.
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

impl NetworkConfig {
    /// BNB Smart Chain mainnet.
    pub fn bsc_mainnet() -> Self {
        Self {
            chain_id: 56,
            name: "Binance Smart Chain".to_string(),
            native_currency: NativeCurrency::bnb(),
            rpc_urls: vec!["https://bsc-dataseed.binance.org/".to_string()],
            block_explorer_urls: vec!["https://bscscan.com/".to_string()],
        }
    }

    /// BNB Smart Chain testnet.
    pub fn bsc_testnet() -> Self {
        Self {
            chain_id: 97,
            name: "BSC Testnet".to_string(),
            native_currency: NativeCurrency {
                name: "tBNB".to_string(),
                symbol: "tBNB".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://data-seed-prebsc-1-s1.binance.org:8545/".to_string()],
            block_explorer_urls: vec!["https://testnet.bscscan.com/".to_string()],
        }
    }
}

/// Native currency of a network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    fn bnb() -> Self {
        Self {
            name: "BNB".to_string(),
            symbol: "BNB".to_string(),
            decimals: 18,
        }
    }
}

/// Address of the token contract on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractDeployment {
    pub chain_id: u64,

    /// Hex contract address.
    pub address: String,
}

/// Transaction settlement configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Receipt polling cadence while waiting for a transaction to be mined.
    pub receipt_poll_interval_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            receipt_poll_interval_ms: 1000,
        }
    }
}

/// JSON-RPC bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Node endpoint standing in for the injected wallet.
    pub rpc_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How often accounts and chain are polled to synthesize events.
    pub event_poll_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            request_timeout_secs: 30,
            event_poll_interval_ms: 2000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

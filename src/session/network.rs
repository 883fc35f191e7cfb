//! Supported networks and display helpers.

use alloy::primitives::Address;
use std::collections::BTreeMap;

use crate::config::{NetworkConfig, SessionConfig};
use crate::provider::AddEthereumChainParameter;
use crate::types::ChainId;

/// The configured network set. A chain is supported iff it is listed here.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: BTreeMap<ChainId, NetworkConfig>,
    preferred: ChainId,
}

impl NetworkRegistry {
    pub fn new(networks: Vec<NetworkConfig>, preferred: ChainId) -> Self {
        Self {
            networks: networks
                .into_iter()
                .map(|n| (ChainId(n.chain_id), n))
                .collect(),
            preferred,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.networks.clone(), ChainId(config.preferred_chain_id))
    }

    pub fn is_supported(&self, chain_id: ChainId) -> bool {
        self.networks.contains_key(&chain_id)
    }

    pub fn get(&self, chain_id: ChainId) -> Option<&NetworkConfig> {
        self.networks.get(&chain_id)
    }

    /// Target of the automatic switch after connecting to an unsupported chain.
    pub fn preferred(&self) -> ChainId {
        self.preferred
    }

    pub fn supported_chains(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.networks.keys().copied()
    }

    pub fn add_chain_params(&self, chain_id: ChainId) -> Option<AddEthereumChainParameter> {
        self.get(chain_id).map(AddEthereumChainParameter::from)
    }

    /// Display name, `Chain <id>` for networks we have no parameters for.
    pub fn network_name(&self, chain_id: ChainId) -> String {
        self.get(chain_id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| format!("Chain {}", chain_id))
    }

    /// Block explorer page for an address on `chain_id`.
    pub fn explorer_address_url(&self, chain_id: ChainId, address: Address) -> Option<String> {
        let base = self.get(chain_id)?.block_explorer_urls.first()?;
        Some(format!("{}/address/{}", base.trim_end_matches('/'), address))
    }
}

/// `0x1234...abcd` form of an address.
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

//! Per-chain contract addresses and the binding resolved from session state.

use alloy::primitives::Address;
use std::collections::HashMap;
use std::fmt;

use crate::config::SessionConfig;
use crate::provider::SharedProvider;
use crate::session::Signer;
use crate::types::{ChainId, WalletError, WalletResult};

/// Contract address per chain.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    addresses: HashMap<ChainId, Address>,
}

impl ContractRegistry {
    pub fn new(deployments: impl IntoIterator<Item = (ChainId, Address)>) -> Self {
        Self {
            addresses: deployments.into_iter().collect(),
        }
    }

    /// Build from configuration; addresses are expected to be validated already.
    pub fn from_config(config: &SessionConfig) -> Self {
        let mut addresses = HashMap::new();
        for deployment in &config.contracts {
            match deployment.address.parse::<Address>() {
                Ok(address) => {
                    addresses.insert(ChainId(deployment.chain_id), address);
                }
                Err(e) => tracing::warn!(
                    chain_id = deployment.chain_id,
                    address = %deployment.address,
                    error = %e,
                    "Ignoring invalid contract address"
                ),
            }
        }
        Self { addresses }
    }

    pub fn address_for(&self, chain_id: ChainId) -> Option<Address> {
        self.addresses.get(&chain_id).copied()
    }
}

/// Identity of a binding; cached reads are only valid for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub account: Address,
    pub chain_id: ChainId,
    pub contract: Address,
}

/// Contract bound to the current signer. Resolve it per call.
#[derive(Clone)]
pub struct ContractBinding {
    pub provider: SharedProvider,
    pub account: Address,
    pub chain_id: ChainId,
    pub address: Address,
}

impl ContractBinding {
    pub fn resolve(signer: Option<Signer>, registry: &ContractRegistry) -> WalletResult<Self> {
        let signer = signer
            .ok_or_else(|| WalletError::ContractUnavailable("wallet not connected".to_string()))?;
        let address = registry.address_for(signer.chain_id).ok_or_else(|| {
            WalletError::ContractUnavailable(format!(
                "contract not deployed on chain {}",
                signer.chain_id
            ))
        })?;

        Ok(Self {
            provider: signer.provider,
            account: signer.account,
            chain_id: signer.chain_id,
            address,
        })
    }

    pub fn key(&self) -> BindingKey {
        BindingKey {
            account: self.account,
            chain_id: self.chain_id,
            contract: self.address,
        }
    }
}

impl fmt::Debug for ContractBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractBinding")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("address", &self.address)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContractDeployment;
    use alloy::primitives::address;

    #[test]
    fn test_registry_from_config() {
        let mut config = SessionConfig::default();
        config.contracts = vec![
            ContractDeployment {
                chain_id: 56,
                address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            },
            ContractDeployment {
                chain_id: 97,
                address: "garbage".to_string(),
            },
        ];
        let registry = ContractRegistry::from_config(&config);
        assert_eq!(
            registry.address_for(ChainId(56)),
            Some(address!("5FbDB2315678afecb367f032d93F642f64180aa3"))
        );
        assert!(registry.address_for(ChainId(97)).is_none());
    }

    #[test]
    fn test_resolve_without_signer() {
        let registry = ContractRegistry::default();
        let err = ContractBinding::resolve(None, &registry).unwrap_err();
        assert_eq!(
            err,
            WalletError::ContractUnavailable("wallet not connected".to_string())
        );
    }
}

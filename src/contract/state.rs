//! Read-state snapshot published to observers.

use alloy::primitives::Address;
use serde::Serialize;

use crate::contract::binding::BindingKey;
use crate::contract::stake::StakeRecord;
use crate::contract::units::TokenAmount;
use crate::types::{ChainId, WalletError, WalletResult};

/// Last known contract reads for the bound account.
///
/// Values are pulled, not pushed: they go stale until the next refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReadState {
    /// Bound contract; `None` means the contract is unavailable.
    pub contract: Option<Address>,
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub balance: Option<TokenAmount>,
    pub total_supply: Option<TokenAmount>,
    pub stake: Option<StakeRecord>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ReadState {
    pub(crate) fn key(&self) -> Option<BindingKey> {
        Some(BindingKey {
            account: self.account?,
            chain_id: self.chain_id?,
            contract: self.contract?,
        })
    }

    /// Forget every cached value and bind to `key` (or to nothing).
    pub(crate) fn reset(&mut self, key: Option<BindingKey>, error: Option<String>) {
        *self = ReadState {
            contract: key.map(|k| k.contract),
            account: key.map(|k| k.account),
            chain_id: key.map(|k| k.chain_id),
            is_loading: self.is_loading,
            error,
            ..ReadState::default()
        };
    }
}

/// Outcome of one batch refresh. Each read is independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub balance: WalletResult<TokenAmount>,
    pub total_supply: WalletResult<TokenAmount>,
    pub stake: WalletResult<StakeRecord>,
}

impl RefreshReport {
    pub(crate) fn unavailable(error: WalletError) -> Self {
        Self {
            balance: Err(error.clone()),
            total_supply: Err(error.clone()),
            stake: Err(error),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.balance.is_ok() && self.total_supply.is_ok() && self.stake.is_ok()
    }

    pub fn errors(&self) -> Vec<&WalletError> {
        [
            self.balance.as_ref().err(),
            self.total_supply.as_ref().err(),
            self.stake.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Merge successful reads into `state`, recording the first failure.
    pub(crate) fn apply_to(&self, state: &mut ReadState) {
        if let Ok(balance) = &self.balance {
            state.balance = Some(*balance);
        }
        if let Ok(total_supply) = &self.total_supply {
            state.total_supply = Some(*total_supply);
        }
        if let Ok(stake) = &self.stake {
            state.stake = Some(*stake);
        }
        state.error = self.errors().first().map(|e| e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_refresh_keeps_successes() {
        let report = RefreshReport {
            balance: Ok(TokenAmount::from_whole(3)),
            total_supply: Err(WalletError::CallFailed("execution reverted".into())),
            stake: Ok(StakeRecord {
                amount: TokenAmount::ZERO,
                timestamp: 0,
                lock_period_secs: 0,
            }),
        };
        assert!(!report.is_complete());
        assert_eq!(report.errors().len(), 1);

        let mut state = ReadState {
            total_supply: Some(TokenAmount::from_whole(1_000)),
            ..ReadState::default()
        };
        report.apply_to(&mut state);
        assert_eq!(state.balance, Some(TokenAmount::from_whole(3)));
        assert_eq!(state.total_supply, Some(TokenAmount::from_whole(1_000)));
        assert!(state.stake.is_some());
        assert_eq!(
            state.error.as_deref(),
            Some("Contract call failed: execution reverted")
        );
    }

    #[test]
    fn test_reset_keeps_loading_flag() {
        let mut state = ReadState {
            balance: Some(TokenAmount::from_whole(1)),
            is_loading: true,
            ..ReadState::default()
        };
        state.reset(None, Some("gone".into()));
        assert!(state.balance.is_none());
        assert!(state.is_loading);
        assert!(state.key().is_none());
        assert_eq!(state.error.as_deref(), Some("gone"));
    }
}

//! On-chain staking position.

use alloy::primitives::U256;
use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::contract::units::TokenAmount;
use crate::types::{WalletError, WalletResult};

const SECONDS_PER_DAY: u64 = 86_400;

/// Snapshot of the active account's stake.
///
/// Lock status is derived on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StakeRecord {
    pub amount: TokenAmount,
    /// Unix seconds when the stake was opened or last modified.
    pub timestamp: u64,
    pub lock_period_secs: u64,
}

impl StakeRecord {
    /// Build from the raw `stakes(address)` words.
    pub fn from_raw(amount: U256, timestamp: U256, lock_period: U256) -> WalletResult<Self> {
        let to_secs = |value: U256, field: &str| {
            u64::try_from(value).map_err(|_| {
                WalletError::CallFailed(format!("stake {} out of range: {}", field, value))
            })
        };
        Ok(Self {
            amount: TokenAmount::from_base_units(amount),
            timestamp: to_secs(timestamp, "timestamp")?,
            lock_period_secs: to_secs(lock_period, "lock period")?,
        })
    }

    pub fn has_stake(&self) -> bool {
        !self.amount.is_zero()
    }

    /// Unix seconds from which unstaking is permitted.
    pub fn unlock_at(&self) -> u64 {
        self.timestamp.saturating_add(self.lock_period_secs)
    }

    pub fn is_locked_at(&self, now: u64) -> bool {
        now < self.unlock_at()
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked_at(unix_now())
    }

    pub fn remaining_lock_at(&self, now: u64) -> Duration {
        Duration::from_secs(self.unlock_at().saturating_sub(now))
    }

    pub fn lock_period_days(&self) -> u64 {
        self.lock_period_secs / SECONDS_PER_DAY
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

//! Application settings consumed by UI code when computing derived values.
//!
//! Neither the session nor the contract client reads these.

use serde::{Deserialize, Serialize};

use crate::contract::units::TokenAmount;

/// Rates and staking parameters shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppSettings {
    /// Tokens received per deposited USDT.
    pub usdt_to_token_rate: u64,

    /// Tokens required per withdrawn USDT.
    pub token_to_usdt_rate: u64,

    /// Advertised daily profit in basis points (100 = 1%).
    pub daily_profit_bps: u64,

    /// Advertised staking lock, in days.
    pub staking_lock_days: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            usdt_to_token_rate: 250,
            token_to_usdt_rate: 300,
            daily_profit_bps: 100,
            staking_lock_days: 7,
        }
    }
}

impl AppSettings {
    /// Tokens credited for a USDT deposit.
    pub fn usdt_to_tokens(&self, usdt: TokenAmount) -> Option<TokenAmount> {
        usdt.scale(self.usdt_to_token_rate, 1)
    }

    /// USDT paid out for a token withdrawal, rounded down.
    pub fn tokens_to_usdt(&self, tokens: TokenAmount) -> Option<TokenAmount> {
        tokens.scale(1, self.token_to_usdt_rate)
    }

    pub fn estimated_daily_earnings(&self, staked: TokenAmount) -> Option<TokenAmount> {
        staked.scale(self.daily_profit_bps, 10_000)
    }
}

//! Base-unit ⇄ decimal conversion for token amounts.
//!
//! Amounts cross the contract boundary as integer base units with 18 implied
//! decimals. Parsing and formatting are done on the integer directly so no
//! floating point ever touches a balance.

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::types::{WalletError, WalletResult};

/// Decimal places of the token.
pub const TOKEN_DECIMALS: usize = 18;

fn unit() -> U256 {
    U256::from(1_000_000_000_000_000_000u128)
}

/// Token amount stored in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub fn from_base_units(units: U256) -> Self {
        Self(units)
    }

    /// Whole tokens, without a fractional part.
    pub fn from_whole(tokens: u64) -> Self {
        Self(U256::from(tokens) * unit())
    }

    pub fn base_units(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a non-negative decimal string such as `12.5` or `.25`.
    pub fn parse_decimal(value: &str) -> WalletResult<Self> {
        let trimmed = value.trim();
        let invalid = |reason: &str| WalletError::InvalidAmount(format!("'{}': {}", value, reason));

        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty amount"));
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected digits"));
        }
        if frac.len() > TOKEN_DECIMALS {
            return Err(invalid("too many decimal places"));
        }

        let whole_units = if whole.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(whole, 10).map_err(|_| invalid("out of range"))?
        };
        let frac_units = if frac.is_empty() {
            U256::ZERO
        } else {
            let padded = format!("{:0<width$}", frac, width = TOKEN_DECIMALS);
            U256::from_str_radix(&padded, 10).map_err(|_| invalid("out of range"))?
        };

        whole_units
            .checked_mul(unit())
            .and_then(|units| units.checked_add(frac_units))
            .map(Self)
            .ok_or_else(|| invalid("out of range"))
    }

    /// Multiply by `numerator / denominator`, rounding down.
    pub fn scale(&self, numerator: u64, denominator: u64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        self.0
            .checked_mul(U256::from(numerator))
            .map(|v| Self(v / U256::from(denominator)))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / unit();
        let frac = self.0 % unit();
        if frac.is_zero() {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:0>width$}", frac.to_string(), width = TOKEN_DECIMALS);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for TokenAmount {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_decimal(&raw).map_err(serde::de::Error::custom)
    }
}

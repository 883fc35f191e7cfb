//! Token/staking contract client.
//!
//! # Data Flow
//! ```text
//! SessionManager::signer() (account, chain, provider)
//!     → binding.rs (per-chain address lookup, resolved per call)
//!     → client.rs reads: eth_call → abi decode → ReadState (watch)
//!     → client.rs writes: eth_sendTransaction → transaction.rs receipt poll
//!                         → refresh()
//! ```
//!
//! # Design Decisions
//! - No binding is cached; a chain or account change retargets the next call
//! - Amounts are `TokenAmount` base units; decimals only at the edges
//! - Lock status is derived, never stored; the contract enforces it

pub mod abi;
pub mod binding;
pub mod client;
pub mod stake;
pub mod state;
pub mod transaction;
pub mod units;

pub use binding::{BindingKey, ContractBinding, ContractRegistry};
pub use client::ContractClient;
pub use stake::StakeRecord;
pub use state::{ReadState, RefreshReport};
pub use units::{TokenAmount, TOKEN_DECIMALS};

//! Client-side wallet session management for EVM dapps.
//!
//! Three subsystems, bottom up:
//! - [`provider`]: discover the injected EIP-1193 provider and speak to it
//! - [`session`]: connection state machine, account/chain tracking, network switching
//! - [`contract`]: typed reads and mined-or-failed writes against the token contract

pub mod config;
pub mod contract;
pub mod observability;
pub mod provider;
pub mod resilience;
pub mod session;
pub mod settings;
pub mod types;

pub use config::SessionConfig;
pub use contract::{ContractClient, ReadState, StakeRecord, TokenAmount};
pub use session::{Connection, ConnectionState, SessionManager, SessionSnapshot};
pub use types::{ChainId, WalletError, WalletResult};

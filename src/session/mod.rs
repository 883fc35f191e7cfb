//! Wallet session subsystem.
//!
//! # Data Flow
//! ```text
//! connect() / auto_reconnect()
//!     → provider discovery (bounded poll)
//!     → handshake: subscribe events, request accounts, read chain
//!     → Connected { account, chain_id, supported }
//!     → unsupported chain: background switch to the preferred network
//!
//! Provider pushes (accountsChanged / chainChanged)
//!     → one listener task per connection, events applied in order
//!     → watch channel → observers (contract client, UI)
//! ```
//!
//! # Design Decisions
//! - Tagged state: account and chain exist only while Connected
//! - One handshake at a time; concurrent connect() calls join it
//! - Network switches never change connection status

pub mod manager;
pub mod network;
pub mod state;

pub use manager::SessionManager;
pub use network::{short_address, NetworkRegistry};
pub use state::{
    Connection, ConnectionState, ConnectionStatus, SessionSnapshot, SessionView, Signer,
};

//! Session state machine types.
//!
//! # States
//! ```text
//! Disconnected → Connecting: connect() or silent reconnect
//! Connecting → Connected: accounts and chain read
//! Connecting → Failed: discovery exhausted, prompt rejected, provider error
//! Connecting → Disconnected: silent reconnect failed, or disconnect() mid-handshake
//! Failed → Connecting: connect() retried
//! Connected → Disconnected: disconnect() or accountsChanged([])
//! any → Disconnected: disconnect()
//! ```
//!
//! Account and chain only exist inside `Connected`, so a half-populated
//! session cannot be represented.

use alloy::primitives::Address;
use serde::Serialize;
use std::fmt;

use crate::provider::SharedProvider;
use crate::types::{ChainId, WalletError};

/// Active account and network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub account: Address,
    pub chain_id: ChainId,
    /// Whether `chain_id` is one of the configured networks.
    pub supported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Connection),
    Failed {
        reason: WalletError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// What observers see of the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    /// Last failure; cleared by every successful transition.
    pub last_error: Option<WalletError>,
}

impl SessionSnapshot {
    pub fn status(&self) -> ConnectionStatus {
        match self.state {
            ConnectionState::Disconnected => ConnectionStatus::Disconnected,
            ConnectionState::Connecting => ConnectionStatus::Connecting,
            ConnectionState::Connected(_) => ConnectionStatus::Connected,
            ConnectionState::Failed { .. } => ConnectionStatus::Failed,
        }
    }

    pub fn connection(&self) -> Option<Connection> {
        match self.state {
            ConnectionState::Connected(connection) => Some(connection),
            _ => None,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.connection().map(|c| c.account)
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.connection().map(|c| c.chain_id)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Flat, serializable view for UI layers and the CLI.
    pub fn view(&self) -> SessionView {
        let connection = self.connection();
        SessionView {
            status: self.status(),
            account: connection.map(|c| c.account),
            chain_id: connection.map(|c| c.chain_id),
            supported_chain: connection.map(|c| c.supported),
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub status: ConnectionStatus,
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub supported_chain: Option<bool>,
    pub last_error: Option<String>,
}

/// Provider and account authorized to sign, resolved from one consistent
/// session state. Never cache it across account or chain changes.
#[derive(Clone)]
pub struct Signer {
    pub provider: SharedProvider,
    pub account: Address,
    pub chain_id: ChainId,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

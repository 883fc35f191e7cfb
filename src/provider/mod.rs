//! Injected wallet provider subsystem.
//!
//! # Data Flow
//! ```text
//! Host environment (InjectionSlot, possibly attached late)
//!     → discovery.rs (bounded poll: now, then every interval)
//!     → SharedProvider (EIP-1193 request + event subscription)
//!     → rpc.rs (typed eth_* / wallet_* wrappers)
//! ```
//!
//! # Design Decisions
//! - The provider is a trait object so the host decides the transport
//! - Events arrive on a broadcast channel; dropping the receiver unsubscribes
//! - bridge.rs provides a JSON-RPC node transport for native use

pub mod bridge;
pub mod discovery;
pub mod rpc;
pub mod types;

pub use bridge::RpcBridgeProvider;
pub use discovery::{discover_provider, InjectedEnvironment, InjectionSlot};
pub use types::{
    AddEthereumChainParameter, Eip1193Provider, ProviderEvent, ProviderRpcError, SharedProvider,
};

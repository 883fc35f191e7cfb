//! Injected provider discovery.
//!
//! Wallet extensions may attach their provider after the application starts,
//! so a missing provider is polled for a bounded window before giving up.
//! Discovery only observes the host; it never installs anything.

use std::sync::RwLock;

use crate::provider::types::SharedProvider;
use crate::resilience::BoundedPoll;
use crate::types::{WalletError, WalletResult};

/// The host environment a wallet injects its provider into.
pub trait InjectedEnvironment: Send + Sync {
    /// The provider currently attached, if any.
    fn injected_provider(&self) -> Option<SharedProvider>;
}

/// A host slot a wallet can attach to at any time.
#[derive(Default)]
pub struct InjectionSlot {
    slot: RwLock<Option<SharedProvider>>,
}

impl InjectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(provider: SharedProvider) -> Self {
        Self {
            slot: RwLock::new(Some(provider)),
        }
    }

    /// Attach a provider (what a wallet extension does on page load).
    pub fn inject(&self, provider: SharedProvider) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(provider);
    }

    /// Detach the provider.
    pub fn remove(&self) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl InjectedEnvironment for InjectionSlot {
    fn injected_provider(&self) -> Option<SharedProvider> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Locate the injected provider, polling if it is not attached yet.
///
/// Returns `ProviderUnavailable` once the bounded window is exhausted.
pub async fn discover_provider(
    env: &dyn InjectedEnvironment,
    poll: &BoundedPoll,
) -> WalletResult<SharedProvider> {
    match poll.run(|| async move { env.injected_provider() }).await {
        Some(provider) => Ok(provider),
        None => {
            tracing::debug!(
                window_ms = poll.window().as_millis() as u64,
                "No injected provider found"
            );
            Err(WalletError::ProviderUnavailable)
        }
    }
}

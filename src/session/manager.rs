//! Wallet session manager.
//!
//! # Responsibilities
//! - Own the provider handle exclusively while connected
//! - Drive the connection state machine (see `state.rs`)
//! - Apply provider-pushed account/chain events in emission order
//! - Negotiate network switches, adding unknown networks first
//!
//! # Concurrency
//! State lives in a `watch` channel guarded together with the provider handle
//! by one mutex; the mutex is never held across an await. Each session gets
//! a generation number. `disconnect()` bumps it, so an event listener from an
//! older generation can never write into a newer session.
//!
//! At most one handshake is in flight. A disconnect orphans it rather than
//! cancelling the wallet prompt; the next `connect()` adopts the orphan
//! instead of opening a second prompt.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::observability::metrics;
use crate::provider::{
    discover_provider, rpc, Eip1193Provider, InjectedEnvironment, ProviderEvent, ProviderRpcError,
    SharedProvider,
};
use crate::resilience::BoundedPoll;
use crate::session::network::NetworkRegistry;
use crate::session::state::{Connection, ConnectionState, SessionSnapshot, Signer};
use crate::types::{ChainId, WalletError, WalletResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeMode {
    /// `eth_requestAccounts`; may prompt the user.
    Prompt,
    /// `eth_accounts`; never prompts, failures are not surfaced.
    Silent,
}

impl HandshakeMode {
    fn label(self) -> &'static str {
        match self {
            HandshakeMode::Prompt => "prompt",
            HandshakeMode::Silent => "silent",
        }
    }
}

enum Begin {
    Started,
    Joined,
    AlreadyConnected(Connection),
}

/// The handshake currently talking to the wallet.
struct PendingHandshake {
    /// Generation its result is delivered to; `None` once orphaned.
    owner: Option<u64>,
}

#[derive(Default)]
struct Inner {
    provider: Option<SharedProvider>,
    listener: Option<JoinHandle<()>>,
    generation: u64,
    pending: Option<PendingHandshake>,
}

impl Inner {
    /// Release the in-flight handshake, returning the generation that still
    /// wants its result.
    fn take_handshake_owner(&mut self) -> Option<u64> {
        let owner = self.pending.take().and_then(|pending| pending.owner);
        owner.filter(|owner| *owner == self.generation)
    }
}

/// Releases the in-flight handshake if `connect_with` is dropped mid-await.
struct HandshakeGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for HandshakeGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.shared.lock();
        if inner.take_handshake_owner().is_some() {
            self.shared.state.send_modify(|s| {
                s.state = ConnectionState::Disconnected;
                s.last_error = None;
            });
        }
        tracing::debug!("Handshake abandoned");
    }
}

/// The error a connection on an unsupported chain carries in `last_error`.
fn unsupported_chain_error(state: &ConnectionState) -> Option<WalletError> {
    match state {
        ConnectionState::Connected(c) if !c.supported => {
            Some(WalletError::UnsupportedChain(c.chain_id))
        }
        _ => None,
    }
}

struct Shared {
    env: Arc<dyn InjectedEnvironment>,
    networks: NetworkRegistry,
    discovery: BoundedPoll,
    auto_switch_unsupported: bool,
    state: watch::Sender<SessionSnapshot>,
    inner: Mutex<Inner>,
}

/// Process-wide wallet session.
///
/// Construct one per application; UI code observes it through
/// [`SessionManager::subscribe`] and mutates it only through its operations.
pub struct SessionManager {
    shared: Arc<Shared>,
}

impl SessionManager {
    pub fn new(env: Arc<dyn InjectedEnvironment>, config: &SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                env,
                networks: NetworkRegistry::from_config(config),
                discovery: BoundedPoll::from(&config.discovery),
                auto_switch_unsupported: config.auto_switch_unsupported,
                state,
                inner: Mutex::new(Inner::default()),
            }),
        }
    }

    /// Connect to the injected wallet, prompting for account access.
    ///
    /// A call made while another is `Connecting` joins that attempt instead of
    /// starting a second handshake, as does a call made after a disconnect
    /// while the wallet is still answering the earlier prompt. Connecting to an
    /// unsupported chain still succeeds; `Connection::supported` is false,
    /// `last_error` holds `UnsupportedChain` and a switch to the preferred
    /// network is attempted in the background.
    pub async fn connect(&self) -> WalletResult<Connection> {
        Arc::clone(&self.shared)
            .connect_with(HandshakeMode::Prompt)
            .await
    }

    /// Re-establish a previously authorized session without prompting.
    ///
    /// Intended to run once at startup; every failure is logged and swallowed.
    pub async fn auto_reconnect(&self) -> Option<Connection> {
        let shared = &self.shared;
        let provider = match discover_provider(shared.env.as_ref(), &shared.discovery).await {
            Ok(provider) => provider,
            Err(e) => {
                tracing::debug!(error = %e, "Silent reconnect skipped");
                return None;
            }
        };

        match rpc::accounts(provider.as_ref()).await {
            Ok(accounts) if !accounts.is_empty() => {}
            Ok(_) => {
                tracing::debug!("Silent reconnect skipped: no previously authorized account");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Silent reconnect skipped: eth_accounts failed");
                return None;
            }
        }

        match Arc::clone(shared).connect_with(HandshakeMode::Silent).await {
            Ok(connection) => Some(connection),
            Err(e) => {
                tracing::debug!(error = %e, "Silent reconnect failed");
                None
            }
        }
    }

    /// Drop the provider handle and return to `Disconnected`. Idempotent.
    pub fn disconnect(&self) {
        let mut inner = self.shared.lock();
        self.shared.disconnect_locked(&mut inner);
        tracing::info!("Wallet disconnected");
    }

    /// Ask the wallet to switch to `target`.
    ///
    /// The new chain is taken from the wallet's `chainChanged` event, not from
    /// the request's success. Failures are recorded in `last_error` and never
    /// change the connection state.
    pub async fn switch_network(&self, target: ChainId) -> WalletResult<()> {
        self.shared.switch_network(target).await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.state.subscribe()
    }

    /// The current signer, resolved from one consistent state.
    pub fn signer(&self) -> Option<Signer> {
        let inner = self.shared.lock();
        let snapshot = self.shared.state.borrow();
        match (&inner.provider, &snapshot.state) {
            (Some(provider), ConnectionState::Connected(connection)) => Some(Signer {
                provider: Arc::clone(provider),
                account: connection.account,
                chain_id: connection.chain_id,
            }),
            _ => None,
        }
    }

    pub fn networks(&self) -> &NetworkRegistry {
        &self.shared.networks
    }

    /// Tear down the event subscription and release the provider.
    pub fn shutdown(&self) {
        let mut inner = self.shared.lock();
        self.shared.disconnect_locked(&mut inner);
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn connect_with(self: Arc<Self>, mode: HandshakeMode) -> WalletResult<Connection> {
        match self.begin_connect() {
            Begin::Started => {}
            Begin::Joined => return self.await_settled().await,
            Begin::AlreadyConnected(connection) => return Ok(connection),
        }

        tracing::info!(mode = mode.label(), "Connecting wallet");

        let mut guard = HandshakeGuard {
            shared: &*self,
            armed: true,
        };
        let outcome = self.handshake(mode).await;
        guard.armed = false;
        drop(guard);

        match outcome {
            Ok((provider, events, connection)) => {
                self.finish_connect(mode, provider, events, connection)
            }
            Err(e) => Err(self.fail_connect(mode, e)),
        }
    }

    fn begin_connect(&self) -> Begin {
        let mut inner = self.lock();
        let current = self.state.borrow().state.clone();
        match current {
            ConnectionState::Connecting => Begin::Joined,
            ConnectionState::Connected(connection) => Begin::AlreadyConnected(connection),
            ConnectionState::Disconnected | ConnectionState::Failed { .. } => {
                inner.generation += 1;
                let generation = inner.generation;
                self.state.send_modify(|s| {
                    s.state = ConnectionState::Connecting;
                    s.last_error = None;
                });
                match &mut inner.pending {
                    Some(pending) => {
                        tracing::debug!("Adopting handshake still awaiting the wallet");
                        pending.owner = Some(generation);
                        Begin::Joined
                    }
                    None => {
                        inner.pending = Some(PendingHandshake {
                            owner: Some(generation),
                        });
                        Begin::Started
                    }
                }
            }
        }
    }

    async fn await_settled(&self) -> WalletResult<Connection> {
        let mut rx = self.state.subscribe();
        let settled = rx
            .wait_for(|s| !matches!(s.state, ConnectionState::Connecting))
            .await
            .map(|s| s.state.clone());

        match settled {
            Ok(ConnectionState::Connected(connection)) => Ok(connection),
            Ok(ConnectionState::Failed { reason }) => Err(reason),
            _ => Err(WalletError::NotConnected),
        }
    }

    async fn handshake(
        &self,
        mode: HandshakeMode,
    ) -> WalletResult<(SharedProvider, broadcast::Receiver<ProviderEvent>, Connection)> {
        let provider = discover_provider(self.env.as_ref(), &self.discovery)
            .await
            .map_err(|_| WalletError::WalletNotInstalled)?;

        // Subscribe before reading state so nothing emitted mid-handshake is lost.
        let events = provider.subscribe();

        let accounts = match mode {
            HandshakeMode::Prompt => rpc::request_accounts(provider.as_ref()).await,
            HandshakeMode::Silent => rpc::accounts(provider.as_ref()).await,
        }
        .map_err(handshake_error)?;
        let account = *accounts.first().ok_or(WalletError::NoAuthorizedAccount)?;

        let chain_id = rpc::chain_id(provider.as_ref())
            .await
            .map_err(handshake_error)?;

        let connection = Connection {
            account,
            chain_id,
            supported: self.networks.is_supported(chain_id),
        };
        Ok((provider, events, connection))
    }

    fn finish_connect(
        self: &Arc<Self>,
        mode: HandshakeMode,
        provider: SharedProvider,
        events: broadcast::Receiver<ProviderEvent>,
        connection: Connection,
    ) -> WalletResult<Connection> {
        {
            let mut inner = self.lock();
            let Some(generation) = inner.take_handshake_owner() else {
                tracing::debug!("Handshake superseded by disconnect, discarding");
                metrics::record_connect(mode.label(), "superseded");
                return Err(WalletError::NotConnected);
            };

            if let Some(previous) = inner.listener.take() {
                previous.abort();
            }
            inner.provider = Some(provider);
            inner.listener = Some(tokio::spawn(listen(
                Arc::downgrade(self),
                generation,
                events,
            )));
            self.state.send_modify(|s| {
                s.state = ConnectionState::Connected(connection);
                s.last_error = unsupported_chain_error(&s.state);
            });
        }

        tracing::info!(
            account = %connection.account,
            chain_id = %connection.chain_id,
            supported = connection.supported,
            mode = mode.label(),
            "Wallet connected"
        );
        metrics::record_connect(mode.label(), "connected");
        metrics::record_connected(true);

        if !connection.supported && self.auto_switch_unsupported {
            let target = self.networks.preferred();
            tracing::warn!(
                chain_id = %connection.chain_id,
                target = %target,
                "Connected to unsupported chain, requesting switch"
            );
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                if let Err(e) = shared.switch_network(target).await {
                    tracing::warn!(error = %e, "Automatic network switch failed");
                }
            });
        }

        Ok(connection)
    }

    fn fail_connect(&self, mode: HandshakeMode, error: WalletError) -> WalletError {
        let mut inner = self.lock();
        if inner.take_handshake_owner().is_some() {
            self.state.send_modify(|s| match mode {
                HandshakeMode::Prompt => {
                    s.state = ConnectionState::Failed {
                        reason: error.clone(),
                    };
                    s.last_error = Some(error.clone());
                }
                HandshakeMode::Silent => {
                    s.state = ConnectionState::Disconnected;
                    s.last_error = None;
                }
            });
        }
        drop(inner);

        match mode {
            HandshakeMode::Prompt => tracing::warn!(error = %error, "Wallet connection failed"),
            HandshakeMode::Silent => tracing::debug!(error = %error, "Silent handshake failed"),
        }
        metrics::record_connect(mode.label(), error.kind());
        error
    }

    fn disconnect_locked(&self, inner: &mut Inner) {
        inner.generation += 1;
        inner.provider = None;
        if let Some(pending) = &mut inner.pending {
            pending.owner = None;
        }
        if let Some(listener) = inner.listener.take() {
            listener.abort();
        }
        self.state.send_if_modified(|s| {
            let changed = s.state != ConnectionState::Disconnected || s.last_error.is_some();
            s.state = ConnectionState::Disconnected;
            s.last_error = None;
            changed
        });
        metrics::record_connected(false);
    }

    async fn switch_network(&self, target: ChainId) -> WalletResult<()> {
        let (provider, current, generation) = {
            let inner = self.lock();
            let snapshot = self.state.borrow();
            match (&inner.provider, &snapshot.state) {
                (Some(provider), ConnectionState::Connected(connection)) => {
                    (Arc::clone(provider), connection.chain_id, inner.generation)
                }
                _ => return Err(WalletError::NotConnected),
            }
        };

        if current == target {
            return Ok(());
        }

        tracing::info!(from = %current, to = %target, "Requesting network switch");
        let result = self.negotiate_switch(provider.as_ref(), target).await;

        let inner = self.lock();
        if inner.generation == generation {
            self.state.send_modify(|s| {
                s.last_error = match &result {
                    Ok(()) => unsupported_chain_error(&s.state),
                    Err(e) => Some(e.clone()),
                }
            });
        }
        drop(inner);

        match &result {
            Ok(()) => {
                tracing::info!(chain_id = %target, "Network switch accepted");
                metrics::record_network_switch("accepted");
            }
            Err(e) => {
                tracing::warn!(chain_id = %target, error = %e, "Network switch failed");
                metrics::record_network_switch(e.kind());
            }
        }
        result
    }

    async fn negotiate_switch(
        &self,
        provider: &dyn Eip1193Provider,
        target: ChainId,
    ) -> WalletResult<()> {
        match rpc::switch_chain(provider, target).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unrecognized_chain() => {
                let params = self.networks.add_chain_params(target).ok_or_else(|| {
                    WalletError::NetworkSwitchFailed(format!(
                        "chain {} is unknown to the wallet and has no network parameters",
                        target
                    ))
                })?;
                tracing::info!(chain_id = %target, name = %params.chain_name, "Adding network to wallet");
                rpc::add_chain(provider, &params).await.map_err(switch_error)?;
                rpc::switch_chain(provider, target).await.map_err(switch_error)
            }
            Err(e) => Err(switch_error(e)),
        }
    }

    fn apply_event(&self, generation: u64, event: ProviderEvent) {
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }
        metrics::record_provider_event(event.name());

        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first().copied() {
                None => {
                    tracing::info!("Wallet revoked account access, disconnecting");
                    self.disconnect_locked(&mut inner);
                }
                Some(account) => {
                    let changed = self.state.send_if_modified(|s| match &mut s.state {
                        ConnectionState::Connected(c) if c.account != account => {
                            c.account = account;
                            true
                        }
                        _ => false,
                    });
                    if changed {
                        tracing::info!(account = %account, "Active account changed");
                    }
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                let supported = self.networks.is_supported(chain_id);
                let changed = self.state.send_if_modified(|s| match &mut s.state {
                    ConnectionState::Connected(c) if c.chain_id != chain_id => {
                        c.chain_id = chain_id;
                        c.supported = supported;
                        if !supported {
                            s.last_error = Some(WalletError::UnsupportedChain(chain_id));
                        } else if matches!(s.last_error, Some(WalletError::UnsupportedChain(_))) {
                            s.last_error = None;
                        }
                        true
                    }
                    _ => false,
                });
                if changed {
                    tracing::info!(chain_id = %chain_id, supported, "Active chain changed");
                }
            }
        }
    }

    /// Re-read accounts and chain after the event channel overflowed.
    async fn resync(&self, generation: u64) {
        let provider = match &self.lock().provider {
            Some(provider) => Arc::clone(provider),
            None => return,
        };

        match rpc::accounts(provider.as_ref()).await {
            Ok(accounts) => self.apply_event(generation, ProviderEvent::AccountsChanged(accounts)),
            Err(e) => tracing::warn!(error = %e, "Resync failed to read accounts"),
        }
        match rpc::chain_id(provider.as_ref()).await {
            Ok(chain_id) => self.apply_event(generation, ProviderEvent::ChainChanged(chain_id)),
            Err(e) => tracing::warn!(error = %e, "Resync failed to read chain"),
        }
    }
}

async fn listen(
    shared: Weak<Shared>,
    generation: u64,
    mut events: broadcast::Receiver<ProviderEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                tracing::debug!(event = event.name(), "Provider event");
                shared.apply_event(generation, event);
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Provider events dropped, resyncing");
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.resync(generation).await;
            }
            Err(RecvError::Closed) => {
                tracing::debug!("Provider event stream closed");
                break;
            }
        }
    }
}

fn handshake_error(e: ProviderRpcError) -> WalletError {
    if e.is_user_rejection() {
        WalletError::UserRejected(e.message)
    } else {
        WalletError::Provider(e.to_string())
    }
}

fn switch_error(e: ProviderRpcError) -> WalletError {
    if e.is_user_rejection() {
        WalletError::UserRejected(e.message)
    } else {
        WalletError::NetworkSwitchFailed(e.message)
    }
}

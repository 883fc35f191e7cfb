//! Wallet session command line.
//!
//! Drives a [`SessionManager`] and [`ContractClient`] against a JSON-RPC node
//! standing in for the injected wallet.
//!
//! ```text
//!   RPC node ◀── RpcBridgeProvider ◀── InjectionSlot ◀── SessionManager
//!                     │ (polled events)                      │ signer()
//!                     ▼                                      ▼
//!               accountsChanged / chainChanged         ContractClient
//! ```

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use wallet_session::config::loader::load_config;
use wallet_session::config::SessionConfig;
use wallet_session::contract::{ContractClient, TokenAmount};
use wallet_session::observability::{logging, metrics};
use wallet_session::provider::{InjectionSlot, RpcBridgeProvider};
use wallet_session::session::{short_address, SessionManager};
use wallet_session::types::{ChainId, WalletError, WalletResult};

#[derive(Parser)]
#[command(name = "wallet-session")]
#[command(about = "Wallet session and staking contract client", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `bridge.rpc_url`.
    #[arg(long)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the session after a silent reconnect
    Status,
    /// Connect, requesting account access
    Connect,
    /// Ask the wallet to switch networks
    Switch {
        #[arg(value_parser = ChainId::from_hex)]
        chain_id: ChainId,
    },
    /// Token balance of an address (defaults to the connected account)
    Balance { address: Option<Address> },
    /// Refresh and show balance, total supply and stake
    StakeInfo,
    /// Stake tokens and wait until mined
    Stake { amount: TokenAmount },
    /// Withdraw the stake and wait until mined
    Unstake,
    /// Transfer tokens and wait until mined
    Transfer { to: Address, amount: TokenAmount },
    /// Convert a USDT amount with the configured rates
    Quote { usdt: TokenAmount },
    /// Follow session and contract state until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(rpc_url) = cli.rpc_url {
        config.bridge.rpc_url = rpc_url;
    }

    logging::init_logging(&config.observability)?;
    tracing::debug!(
        rpc_url = %config.bridge.rpc_url,
        networks = config.networks.len(),
        contracts = config.contracts.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    if let Commands::Quote { usdt } = cli.command {
        return print_quote(&config, usdt);
    }

    let bridge = RpcBridgeProvider::new(&config.bridge)?;
    bridge.start_event_polling(Duration::from_millis(config.bridge.event_poll_interval_ms));
    let env = Arc::new(InjectionSlot::with_provider(bridge));

    let session = Arc::new(SessionManager::new(env, &config));
    let contract = Arc::new(ContractClient::from_config(Arc::clone(&session), &config));
    session.auto_reconnect().await;

    let result = run(cli.command, &config, &session, &contract).await;
    session.shutdown();
    result
}

async fn run(
    command: Commands,
    config: &SessionConfig,
    session: &Arc<SessionManager>,
    contract: &Arc<ContractClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Status => print_session(session)?,
        Commands::Connect => {
            session.connect().await?;
            print_session(session)?;
        }
        Commands::Switch { chain_id } => {
            ensure_connected(session).await?;
            session.switch_network(chain_id).await?;
            print_json(&json!({
                "requested_chain_id": chain_id,
                "network": session.networks().network_name(chain_id),
            }))?;
        }
        Commands::Balance { address } => {
            // Reads are sent through the wallet, even for another address.
            let connected = ensure_connected(session).await?;
            let account = address.unwrap_or(connected);
            let balance = contract.get_balance(account).await?;
            print_json(&json!({
                "account": account,
                "short": short_address(&account),
                "balance": balance,
            }))?;
        }
        Commands::StakeInfo => {
            ensure_connected(session).await?;
            let report = contract.refresh().await;
            if let Err(e) = &report.stake {
                tracing::warn!(error = %e, "Stake record unavailable");
            }
            let now = unix_now();
            let state = contract.read_state();
            let stake = state.stake.map(|record| {
                json!({
                    "amount": record.amount,
                    "locked": record.is_locked_at(now),
                    "unlock_at": record.unlock_at(),
                    "remaining_secs": record.remaining_lock_at(now).as_secs(),
                    "lock_period_days": record.lock_period_days(),
                })
            });
            print_json(&json!({ "read_state": state, "stake": stake }))?;
        }
        Commands::Stake { amount } => {
            ensure_connected(session).await?;
            let tx_hash = contract.stake(amount).await?;
            print_transaction(session, contract, tx_hash)?;
        }
        Commands::Unstake => {
            ensure_connected(session).await?;
            let tx_hash = contract.unstake().await?;
            print_transaction(session, contract, tx_hash)?;
        }
        Commands::Transfer { to, amount } => {
            ensure_connected(session).await?;
            let tx_hash = contract.transfer(to, amount).await?;
            print_transaction(session, contract, tx_hash)?;
        }
        Commands::Quote { usdt } => print_quote(config, usdt)?,
        Commands::Watch => watch(session, contract).await?,
    }
    Ok(())
}

async fn ensure_connected(session: &SessionManager) -> WalletResult<Address> {
    if let Some(account) = session.snapshot().account() {
        return Ok(account);
    }
    Ok(session.connect().await?.account)
}

async fn watch(
    session: &Arc<SessionManager>,
    contract: &Arc<ContractClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_connected(session).await?;
    let watcher = contract.spawn_binding_watcher();
    let mut session_rx = session.subscribe();
    let mut contract_rx = contract.subscribe();
    print_session(session)?;

    loop {
        tokio::select! {
            changed = session_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = session_rx.borrow_and_update().view();
                print_json(&json!({ "session": view }))?;
            }
            changed = contract_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = contract_rx.borrow_and_update().clone();
                print_json(&json!({ "contract": state }))?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watch");
                break;
            }
        }
    }

    watcher.abort();
    Ok(())
}

fn print_session(session: &SessionManager) -> serde_json::Result<()> {
    let snapshot = session.snapshot();
    let network = snapshot
        .chain_id()
        .map(|chain_id| session.networks().network_name(chain_id));
    let explorer = snapshot.connection().and_then(|c| {
        session
            .networks()
            .explorer_address_url(c.chain_id, c.account)
    });
    print_json(&json!({
        "session": snapshot.view(),
        "network": network,
        "explorer": explorer,
    }))
}

fn print_transaction(
    session: &SessionManager,
    contract: &ContractClient,
    tx_hash: alloy::primitives::TxHash,
) -> serde_json::Result<()> {
    print_json(&json!({
        "tx_hash": tx_hash,
        "chain_id": session.snapshot().chain_id(),
        "read_state": contract.read_state(),
    }))
}

fn print_quote(config: &SessionConfig, usdt: TokenAmount) -> Result<(), Box<dyn std::error::Error>> {
    let settings = &config.settings;
    let tokens = settings
        .usdt_to_tokens(usdt)
        .ok_or_else(|| WalletError::InvalidAmount(format!("cannot convert {} USDT", usdt)))?;
    print_json(&json!({
        "usdt": usdt,
        "tokens": tokens,
        "estimated_daily_earnings": settings.estimated_daily_earnings(tokens),
        "staking_lock_days": settings.staking_lock_days,
    }))?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

//! Typed wrappers over the raw provider request surface.

use alloy::primitives::{Address, Bytes, TxHash};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::provider::types::{AddEthereumChainParameter, Eip1193Provider, ProviderRpcError};
use crate::types::ChainId;

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, ProviderRpcError> {
    serde_json::from_value(value)
        .map_err(|e| ProviderRpcError::internal(format!("malformed {} response: {}", method, e)))
}

/// `eth_requestAccounts`: may open a wallet prompt and suspend until answered.
pub async fn request_accounts(
    provider: &dyn Eip1193Provider,
) -> Result<Vec<Address>, ProviderRpcError> {
    let value = provider.request("eth_requestAccounts", json!([])).await?;
    decode("eth_requestAccounts", value)
}

/// `eth_accounts`: already-authorized accounts, never prompts.
pub async fn accounts(provider: &dyn Eip1193Provider) -> Result<Vec<Address>, ProviderRpcError> {
    let value = provider.request("eth_accounts", json!([])).await?;
    decode("eth_accounts", value)
}

pub async fn chain_id(provider: &dyn Eip1193Provider) -> Result<ChainId, ProviderRpcError> {
    let value = provider.request("eth_chainId", json!([])).await?;
    let raw: String = decode("eth_chainId", value)?;
    ChainId::from_hex(&raw).map_err(|e| ProviderRpcError::internal(e.to_string()))
}

pub async fn switch_chain(
    provider: &dyn Eip1193Provider,
    chain_id: ChainId,
) -> Result<(), ProviderRpcError> {
    provider
        .request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id.to_hex() }]),
        )
        .await?;
    Ok(())
}

pub async fn add_chain(
    provider: &dyn Eip1193Provider,
    params: &AddEthereumChainParameter,
) -> Result<(), ProviderRpcError> {
    provider
        .request("wallet_addEthereumChain", json!([params]))
        .await?;
    Ok(())
}

/// Read-only contract call against the latest block.
pub async fn call(
    provider: &dyn Eip1193Provider,
    from: Address,
    to: Address,
    data: Bytes,
) -> Result<Bytes, ProviderRpcError> {
    let value = provider
        .request(
            "eth_call",
            json!([{ "from": from, "to": to, "data": data }, "latest"]),
        )
        .await?;
    decode("eth_call", value)
}

/// Submit a state-changing call for the wallet to sign and broadcast.
pub async fn send_transaction(
    provider: &dyn Eip1193Provider,
    from: Address,
    to: Address,
    data: Bytes,
) -> Result<TxHash, ProviderRpcError> {
    let value = provider
        .request(
            "eth_sendTransaction",
            json!([{ "from": from, "to": to, "data": data }]),
        )
        .await?;
    decode("eth_sendTransaction", value)
}

/// Outcome recorded in a receipt's `status` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptStatus {
    Succeeded,
    Reverted,
    /// A status that is neither `0x1` nor `0x0`.
    Unrecognized(String),
}

/// The fields of a transaction receipt this crate cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub block_number: Option<u64>,
    pub status: ReceiptStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    status: Option<String>,
    block_number: Option<String>,
}

impl From<RawReceipt> for ReceiptSummary {
    fn from(receipt: RawReceipt) -> Self {
        let status = match receipt.status {
            // Pre-Byzantium receipts carry no status; treat them as mined.
            None => ReceiptStatus::Succeeded,
            Some(raw) => match parse_quantity(&raw) {
                Some(1) => ReceiptStatus::Succeeded,
                Some(0) => ReceiptStatus::Reverted,
                _ => ReceiptStatus::Unrecognized(raw),
            },
        };
        Self {
            block_number: receipt.block_number.as_deref().and_then(parse_quantity),
            status,
        }
    }
}

/// `eth_getTransactionReceipt`; `None` while the transaction is pending.
pub async fn transaction_receipt(
    provider: &dyn Eip1193Provider,
    tx_hash: TxHash,
) -> Result<Option<ReceiptSummary>, ProviderRpcError> {
    let value = provider
        .request("eth_getTransactionReceipt", json!([tx_hash]))
        .await?;
    let raw: Option<RawReceipt> = decode("eth_getTransactionReceipt", value)?;
    Ok(raw.map(ReceiptSummary::from))
}

fn parse_quantity(raw: &str) -> Option<u64> {
    u64::from_str_radix(raw.strip_prefix("0x")?, 16).ok()
}

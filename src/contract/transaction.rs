//! Receipt polling for submitted transactions.

use alloy::primitives::TxHash;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::provider::rpc::{self, ReceiptStatus};
use crate::provider::Eip1193Provider;
use crate::types::{WalletError, WalletResult};

/// Poll for a receipt until the transaction is mined.
///
/// There is no deadline: a transaction that never mines keeps the caller
/// waiting. Transient receipt lookup errors are logged and retried.
pub async fn wait_until_mined(
    provider: &dyn Eip1193Provider,
    tx_hash: TxHash,
    poll_interval: Duration,
) -> WalletResult<Option<u64>> {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let receipt = match rpc::transaction_receipt(provider, tx_hash).await {
            Ok(Some(receipt)) => receipt,
            Ok(None) => {
                tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                continue;
            }
            Err(e) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed");
                continue;
            }
        };

        match receipt.status {
            ReceiptStatus::Succeeded => {}
            ReceiptStatus::Reverted => {
                return Err(WalletError::TransactionFailed(format!(
                    "transaction {} reverted",
                    tx_hash
                )));
            }
            ReceiptStatus::Unrecognized(raw) => {
                return Err(WalletError::TransactionFailed(format!(
                    "transaction {} has unrecognized receipt status {:?}",
                    tx_hash, raw
                )));
            }
        }

        tracing::info!(
            tx_hash = %tx_hash,
            block_number = ?receipt.block_number,
            "Transaction mined"
        );
        return Ok(receipt.block_number);
    }
}

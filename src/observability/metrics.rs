//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_connect_total` (counter): handshakes by mode and outcome
//! - `wallet_session_connected` (gauge): 1=connected, 0=otherwise
//! - `wallet_provider_events_total` (counter): pushed events by kind
//! - `wallet_network_switch_total` (counter): switch requests by outcome
//! - `wallet_contract_reads_total` (counter): read calls by method and outcome
//! - `wallet_transactions_total` (counter): write calls by method and outcome
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connect(mode: &'static str, outcome: &'static str) {
    metrics::counter!("wallet_connect_total", "mode" => mode, "outcome" => outcome).increment(1);
}

pub fn record_connected(connected: bool) {
    metrics::gauge!("wallet_session_connected").set(if connected { 1.0 } else { 0.0 });
}

pub fn record_provider_event(kind: &'static str) {
    metrics::counter!("wallet_provider_events_total", "kind" => kind).increment(1);
}

pub fn record_network_switch(outcome: &'static str) {
    metrics::counter!("wallet_network_switch_total", "outcome" => outcome).increment(1);
}

pub fn record_contract_read(method: &'static str, outcome: &'static str) {
    metrics::counter!("wallet_contract_reads_total", "method" => method, "outcome" => outcome)
        .increment(1);
}

pub fn record_transaction(method: &'static str, outcome: &'static str) {
    metrics::counter!("wallet_transactions_total", "method" => method, "outcome" => outcome)
        .increment(1);
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Referential integrity (preferred chain is a configured network)
//! - Value ranges and parseable URLs/addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SessionConfig → Result<(), Vec<ValidationError>>

use alloy::primitives::Address;
use std::collections::HashSet;
use std::fmt;

use crate::config::schema::SessionConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SessionConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.discovery.poll_interval_ms == 0 {
        errors.push(ValidationError::new("discovery.poll_interval_ms", "must be > 0"));
    }
    if config.discovery.max_attempts == 0 {
        errors.push(ValidationError::new("discovery.max_attempts", "must be > 0"));
    }
    if config.transactions.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "transactions.receipt_poll_interval_ms",
            "must be > 0",
        ));
    }

    if config.networks.is_empty() {
        errors.push(ValidationError::new("networks", "at least one network is required"));
    }

    let mut seen_chains = HashSet::new();
    for (i, network) in config.networks.iter().enumerate() {
        let field = format!("networks[{}]", i);
        if network.chain_id == 0 {
            errors.push(ValidationError::new(format!("{}.chain_id", field), "must be > 0"));
        }
        if !seen_chains.insert(network.chain_id) {
            errors.push(ValidationError::new(
                format!("{}.chain_id", field),
                format!("duplicate chain id {}", network.chain_id),
            ));
        }
        if network.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        }
        if network.rpc_urls.is_empty() {
            errors.push(ValidationError::new(
                format!("{}.rpc_urls", field),
                "at least one RPC URL is required",
            ));
        }
        for url_str in network.rpc_urls.iter().chain(&network.block_explorer_urls) {
            if url::Url::parse(url_str).is_err() {
                errors.push(ValidationError::new(
                    field.clone(),
                    format!("invalid URL '{}'", url_str),
                ));
            }
        }
    }

    if !seen_chains.contains(&config.preferred_chain_id) {
        errors.push(ValidationError::new(
            "preferred_chain_id",
            format!("chain {} is not a configured network", config.preferred_chain_id),
        ));
    }

    let mut seen_deployments = HashSet::new();
    for (i, deployment) in config.contracts.iter().enumerate() {
        let field = format!("contracts[{}]", i);
        if !seen_deployments.insert(deployment.chain_id) {
            errors.push(ValidationError::new(
                format!("{}.chain_id", field),
                format!("duplicate deployment for chain {}", deployment.chain_id),
            ));
        }
        if deployment.address.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                format!("{}.address", field),
                format!("invalid address '{}'", deployment.address),
            ));
        }
    }

    if config.settings.usdt_to_token_rate == 0 {
        errors.push(ValidationError::new("settings.usdt_to_token_rate", "must be > 0"));
    }
    if config.settings.token_to_usdt_rate == 0 {
        errors.push(ValidationError::new("settings.token_to_usdt_rate", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

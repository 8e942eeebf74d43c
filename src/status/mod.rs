//! Deposit status lookup.
//!
//! # Data Flow
//! ```text
//! GET /api/v1/status/{address}
//!     → StatusLookup (selected by `status.backend`)
//!         disabled.rs → NotImplemented, never fabricated data
//!         chain.rs    → balance at confirmed depth via BlockchainClient
//!     → DepositStatus (JSON)
//! ```

pub mod chain;
pub mod disabled;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::blockchain::{BlockchainClient, BlockchainError};
use crate::config::{RotatorConfig, StatusBackend};

pub use chain::ChainStatusLookup;
pub use disabled::DisabledStatusLookup;

/// Errors returned by status lookups.
#[derive(Debug, Error)]
pub enum StatusError {
    /// The configured backend does not answer status queries.
    #[error("Deposit status lookup not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Confirmation count must be at least 1, got {0}")]
    InvalidConfirmations(u32),

    #[error(transparent)]
    Chain(#[from] BlockchainError),
}

/// Whether funds have arrived at an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositStatus {
    pub address: Address,
    pub required_confirmations: u32,
    pub latest_block: u64,
    /// Height at which the balance counts as confirmed; `None` while the
    /// chain is shorter than the required depth.
    pub confirmed_block: Option<u64>,
    pub confirmed_balance: U256,
    pub pending_balance: U256,
    pub received: bool,
}

/// Height whose state has `required` confirmations when `latest` is the tip.
///
/// The tip itself counts as one confirmation.
pub fn confirmed_height(latest: u64, required: u32) -> Option<u64> {
    latest.checked_sub(u64::from(required.saturating_sub(1)))
}

/// Answers "have funds arrived at this address?".
#[async_trait]
pub trait StatusLookup: Send + Sync {
    /// Backend name for logs and metrics.
    fn name(&self) -> &'static str;

    async fn deposit_status(
        &self,
        address: Address,
        required_confirmations: u32,
    ) -> Result<DepositStatus, StatusError>;
}

/// Build the lookup selected by configuration.
///
/// The chain backend reuses the caller's RPC client and fails without one.
pub fn build_status_lookup(
    config: &RotatorConfig,
    client: Option<BlockchainClient>,
) -> Result<Arc<dyn StatusLookup>, BlockchainError> {
    match (config.status.backend, client) {
        (StatusBackend::Disabled, _) => Ok(Arc::new(DisabledStatusLookup)),
        (StatusBackend::Chain, Some(client)) => Ok(Arc::new(ChainStatusLookup::new(client))),
        (StatusBackend::Chain, None) => Err(BlockchainError::NotAvailable(
            "status.backend = \"chain\" needs an RPC client".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmed_height() {
        assert_eq!(confirmed_height(100, 1), Some(100));
        assert_eq!(confirmed_height(100, 3), Some(98));
        assert_eq!(confirmed_height(1, 3), None);
        assert_eq!(confirmed_height(2, 3), Some(0));
    }

    #[test]
    fn test_error_display() {
        let err = StatusError::NotImplemented("status backend disabled");
        assert!(err.to_string().contains("not implemented"));
        assert_eq!(
            StatusError::InvalidConfirmations(0).to_string(),
            "Confirmation count must be at least 1, got 0"
        );
    }

    #[test]
    fn test_build_lookup() {
        let mut config = RotatorConfig::default();
        let lookup = build_status_lookup(&config, None).unwrap();
        assert_eq!(lookup.name(), "disabled");

        config.status.backend = StatusBackend::Chain;
        assert!(matches!(
            build_status_lookup(&config, None),
            Err(BlockchainError::NotAvailable(_))
        ));
    }
}

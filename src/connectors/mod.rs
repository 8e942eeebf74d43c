//! Wallet connectors.
//!
//! # Data Flow
//! ```text
//! CapabilityProbe (probe.rs)
//!     → inspects configuration + signing key environment
//!     → Vec<Arc<dyn WalletConnector>>
//!         evm.rs → alloy signer + BlockchainClient
//! ```
//!
//! A derived deposit address is only ever handed to a connector as a string;
//! connectors never see rotation internals.

pub mod evm;
pub mod probe;

use alloy::primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::blockchain::BlockchainError;

pub use evm::EvmConnector;
pub use probe::{CapabilityProbe, ConfiguredProbe, ConnectorCapability};

/// Ledger model a connector talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    /// EVM-style account chains.
    Evm,
    /// Non-EVM account-based ledgers.
    AccountLedger,
    /// UTXO ledgers.
    Utxo,
}

impl ChainFamily {
    pub const ALL: [ChainFamily; 3] =
        [ChainFamily::Evm, ChainFamily::AccountLedger, ChainFamily::Utxo];
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainFamily::Evm => "evm",
            ChainFamily::AccountLedger => "account_ledger",
            ChainFamily::Utxo => "utxo",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Capability missing (no RPC endpoint, no signer, unsupported family).
    #[error("Connector unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Chain(#[from] BlockchainError),
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Account exposed by a connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub family: ChainFamily,
    pub address: String,
    pub chain_id: Option<u64>,
}

/// Common contract every wallet adapter implements.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    fn family(&self) -> ChainFamily;

    /// Human-readable adapter name.
    fn name(&self) -> &'static str;

    async fn connect(&self) -> ConnectorResult<ConnectedAccount>;

    /// Sign arbitrary bytes, returning the encoded signature.
    async fn sign_message(&self, message: &[u8]) -> ConnectorResult<Vec<u8>>;

    /// Transfer `amount` base units to `to`, returning the transaction id.
    async fn send(&self, to: &str, amount: U256) -> ConnectorResult<String>;

    async fn get_balance(&self, address: &str) -> ConnectorResult<U256>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_spelling() {
        assert_eq!(ChainFamily::AccountLedger.to_string(), "account_ledger");
        assert_eq!(serde_json::to_string(&ChainFamily::Utxo).unwrap(), "\"utxo\"");
    }
}

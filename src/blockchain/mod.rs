//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key)      Config (RPC URLs, chain id)
//!     → wallet.rs (key loading, signing)       → client.rs (RPC with timeouts + failover)
//!                     ↘                      ↙
//!                  transaction.rs (build, sign, broadcast, confirm)
//! ```
//!
//! Used by the status lookup (balances at confirmed depth) and by the EVM
//! wallet connector. Derived deposit addresses have no keys; the wallet here
//! is the operator's own signer.
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when blockchain unreachable

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use transaction::TxBuilder;
pub use types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainId, ConfirmationStatus};
pub use wallet::Wallet;

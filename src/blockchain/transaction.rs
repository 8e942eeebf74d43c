//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build native-token transfers with gas price protection
//! - Sign locally and broadcast through the RPC client
//! - Monitor confirmations

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;

/// Gas for a plain value transfer.
const TRANSFER_GAS: u64 = 21_000;

/// Builds and submits transactions from the operator wallet.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Wallet,
}

impl TxBuilder {
    pub fn new(client: BlockchainClient, wallet: Wallet) -> Self {
        Self { client, wallet }
    }

    /// Build a transfer request, syncing the nonce and checking gas price.
    pub async fn build_transfer(
        &self,
        to: Address,
        value: U256,
    ) -> BlockchainResult<TransactionRequest> {
        let chain_nonce = self.client.get_transaction_count(self.wallet.address()).await?;
        self.wallet.set_nonce(chain_nonce);

        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;

        let config = self.client.config();
        if gas_price_gwei > u128::from(config.max_gas_price_gwei) {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: config.max_gas_price_gwei,
            });
        }
        let adjusted_gas_price = (gas_price as f64 * config.gas_price_multiplier) as u128;

        Ok(TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(to)
            .with_value(value)
            .with_nonce(self.wallet.get_and_increment_nonce())
            .with_gas_price(adjusted_gas_price)
            .with_chain_id(self.wallet.chain_id())
            .with_gas_limit(TRANSFER_GAS))
    }

    /// Sign and broadcast a native-token transfer, returning its hash.
    pub async fn send_transfer(&self, to: Address, value: U256) -> BlockchainResult<TxHash> {
        let request = self.build_transfer(to, value).await?;
        let envelope = request
            .build(&self.wallet.network_wallet())
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Failed to sign transaction: {}", e)))?;

        let tx_hash = self.client.send_raw_transaction(envelope.encoded_2718()).await?;
        tracing::info!(tx_hash = %tx_hash, to = %to, value = %value, "Transfer broadcast");
        Ok(tx_hash)
    }

    /// Poll until `tx_hash` has the configured number of confirmations.
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout_secs: u64,
    ) -> BlockchainResult<ConfirmationStatus> {
        let required = self.client.confirmation_blocks();

        let result = timeout(Duration::from_secs(timeout_secs), async {
            let mut ticker = interval(Duration::from_secs(2));
            loop {
                ticker.tick().await;

                let Some(receipt) = self.client.get_transaction_receipt(tx_hash).await? else {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                };
                if !receipt.status() {
                    return Ok(ConfirmationStatus::Failed("Transaction reverted".to_string()));
                }

                let current_block = self.client.get_block_number().await?;
                let tx_block = receipt.block_number.unwrap_or(current_block);
                let status = confirmation_status(current_block, tx_block, required);
                if let ConfirmationStatus::Confirmed { .. } = status {
                    return Ok(status);
                }
                tracing::debug!(tx_hash = %tx_hash, ?status, "Waiting for confirmations");
            }
        })
        .await;

        result.unwrap_or(Err(BlockchainError::ConfirmationTimeout(required)))
    }
}

/// Classify a mined transaction by depth. The inclusion block counts as one.
pub fn confirmation_status(current_block: u64, tx_block: u64, required: u32) -> ConfirmationStatus {
    let confirmations = current_block.saturating_sub(tx_block).saturating_add(1);
    let confirmations = u32::try_from(confirmations).unwrap_or(u32::MAX);
    if confirmations >= required {
        ConfirmationStatus::Confirmed {
            block_number: tx_block,
        }
    } else {
        ConfirmationStatus::Confirming {
            current: confirmations,
            required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_depth() {
        assert_eq!(
            confirmation_status(100, 100, 1),
            ConfirmationStatus::Confirmed { block_number: 100 }
        );
        assert_eq!(
            confirmation_status(101, 100, 3),
            ConfirmationStatus::Confirming {
                current: 2,
                required: 3
            }
        );
        assert_eq!(
            confirmation_status(102, 100, 3),
            ConfirmationStatus::Confirmed { block_number: 100 }
        );
        // Reorged view where the node is behind the receipt.
        assert!(matches!(
            confirmation_status(99, 100, 2),
            ConfirmationStatus::Confirming { current: 1, .. }
        ));
    }
}

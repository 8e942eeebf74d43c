//! Chain-backed deposit status.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::blockchain::BlockchainClient;
use crate::status::{confirmed_height, DepositStatus, StatusError, StatusLookup};

/// Reads balances from the configured RPC endpoints.
#[derive(Debug, Clone)]
pub struct ChainStatusLookup {
    client: BlockchainClient,
}

impl ChainStatusLookup {
    pub fn new(client: BlockchainClient) -> Self {
        Self { client }
    }
}

/// Assemble a status from balances read at the tip and at confirmed depth.
pub fn classify(
    address: Address,
    required_confirmations: u32,
    latest_block: u64,
    confirmed_block: Option<u64>,
    confirmed_balance: U256,
    pending_balance: U256,
) -> DepositStatus {
    DepositStatus {
        address,
        required_confirmations,
        latest_block,
        confirmed_block,
        received: confirmed_block.is_some() && !confirmed_balance.is_zero(),
        confirmed_balance,
        pending_balance,
    }
}

#[async_trait]
impl StatusLookup for ChainStatusLookup {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn deposit_status(
        &self,
        address: Address,
        required_confirmations: u32,
    ) -> Result<DepositStatus, StatusError> {
        if required_confirmations == 0 {
            return Err(StatusError::InvalidConfirmations(0));
        }

        let latest_block = self.client.get_block_number().await?;
        let pending_balance = self.client.get_balance_at(address, latest_block).await?;
        let confirmed_block = confirmed_height(latest_block, required_confirmations);
        let confirmed_balance = match confirmed_block {
            Some(height) => self.client.get_balance_at(address, height).await?,
            None => U256::ZERO,
        };

        let status = classify(
            address,
            required_confirmations,
            latest_block,
            confirmed_block,
            confirmed_balance,
            pending_balance,
        );
        tracing::debug!(
            address = %address,
            latest_block,
            received = status.received,
            "Deposit status resolved"
        );
        Ok(status)
    }
}

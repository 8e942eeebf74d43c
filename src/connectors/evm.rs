//! EVM wallet connector backed by a local signer.

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::blockchain::types::parse_address;
use crate::blockchain::{BlockchainClient, BlockchainError, ConfirmationStatus, TxBuilder, Wallet};
use crate::connectors::{
    ChainFamily, ConnectedAccount, ConnectorError, ConnectorResult, WalletConnector,
};

/// Upper bound on waiting for a sent transfer to reach confirmation depth.
const CONFIRMATION_TIMEOUT_SECS: u64 = 180;

/// Connector for EVM chains.
///
/// Without an RPC client it can still connect and sign; sending and balance
/// queries then report the connector as unavailable.
#[derive(Debug, Clone)]
pub struct EvmConnector {
    wallet: Wallet,
    client: Option<BlockchainClient>,
}

impl EvmConnector {
    pub fn new(wallet: Wallet, client: Option<BlockchainClient>) -> Self {
        Self { wallet, client }
    }

    fn client(&self) -> ConnectorResult<&BlockchainClient> {
        self.client
            .as_ref()
            .ok_or_else(|| ConnectorError::Unavailable("no RPC endpoint configured".to_string()))
    }
}

#[async_trait]
impl WalletConnector for EvmConnector {
    fn family(&self) -> ChainFamily {
        ChainFamily::Evm
    }

    fn name(&self) -> &'static str {
        "evm-local-signer"
    }

    async fn connect(&self) -> ConnectorResult<ConnectedAccount> {
        if let Some(client) = &self.client {
            client.verify_chain_id().await?;
        }
        Ok(ConnectedAccount {
            family: ChainFamily::Evm,
            address: self.wallet.address().to_string(),
            chain_id: Some(self.wallet.chain_id()),
        })
    }

    async fn sign_message(&self, message: &[u8]) -> ConnectorResult<Vec<u8>> {
        let signature = self.wallet.sign_message(message).await?;
        Ok(signature.as_bytes().to_vec())
    }

    async fn send(&self, to: &str, amount: U256) -> ConnectorResult<String> {
        let to = parse_address(to)?;
        let builder = TxBuilder::new(self.client()?.clone(), self.wallet.clone());
        let tx_hash = builder.send_transfer(to, amount).await?;

        match builder.wait_for_confirmation(tx_hash, CONFIRMATION_TIMEOUT_SECS).await? {
            ConfirmationStatus::Confirmed { block_number } => {
                tracing::info!(tx_hash = %tx_hash, block_number, "Transfer confirmed");
                Ok(tx_hash.to_string())
            }
            status => Err(BlockchainError::Rpc(format!(
                "transaction {} did not confirm: {:?}",
                tx_hash, status
            ))
            .into()),
        }
    }

    async fn get_balance(&self, address: &str) -> ConnectorResult<U256> {
        let address = parse_address(address)?;
        Ok(self.client()?.get_balance(address).await?)
    }
}

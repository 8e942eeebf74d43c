//! Capability probing.
//!
//! Decides which wallet connectors can be offered, replacing per-chain
//! detection branches with one polymorphic list.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blockchain::wallet::PRIVATE_KEY_ENV_VAR;
use crate::blockchain::{BlockchainClient, Wallet};
use crate::connectors::{ChainFamily, EvmConnector, WalletConnector};

/// Availability of one chain family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorCapability {
    pub family: ChainFamily,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,
}

/// Source of the connectors usable in the current context.
pub trait CapabilityProbe: Send + Sync {
    fn probe(&self) -> Vec<Arc<dyn WalletConnector>>;

    /// One entry per chain family, available or not.
    fn capabilities(&self) -> Vec<ConnectorCapability> {
        let connectors = self.probe();
        ChainFamily::ALL
            .iter()
            .map(|family| {
                let found = connectors.iter().find(|c| c.family() == *family);
                ConnectorCapability {
                    family: *family,
                    available: found.is_some(),
                    connector: found.map(|c| c.name().to_string()),
                }
            })
            .collect()
    }
}

/// Probe driven by configuration and the signing-key environment variable.
#[derive(Debug, Clone)]
pub struct ConfiguredProbe {
    chain_id: u64,
    client: Option<BlockchainClient>,
    signer_key: Option<String>,
}

impl ConfiguredProbe {
    pub fn new(
        chain_id: u64,
        client: Option<BlockchainClient>,
        signer_key: Option<String>,
    ) -> Self {
        Self {
            chain_id,
            client,
            signer_key,
        }
    }

    /// Read the signing key from `ROTATOR_SIGNER_PRIVATE_KEY`, if set.
    pub fn from_env(chain_id: u64, client: Option<BlockchainClient>) -> Self {
        Self::new(chain_id, client, std::env::var(PRIVATE_KEY_ENV_VAR).ok())
    }
}

impl CapabilityProbe for ConfiguredProbe {
    fn probe(&self) -> Vec<Arc<dyn WalletConnector>> {
        let mut connectors: Vec<Arc<dyn WalletConnector>> = Vec::new();

        if let Some(key) = &self.signer_key {
            match Wallet::from_private_key(key, self.chain_id) {
                Ok(wallet) => {
                    connectors.push(Arc::new(EvmConnector::new(wallet, self.client.clone())))
                }
                Err(e) => tracing::warn!(error = %e, "Signing key present but unusable"),
            }
        }

        connectors
    }
}

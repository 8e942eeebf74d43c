//! Status backend used when no chain indexer is configured.

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::status::{DepositStatus, StatusError, StatusLookup};

/// Refuses every lookup with an explicit error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStatusLookup;

#[async_trait]
impl StatusLookup for DisabledStatusLookup {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn deposit_status(
        &self,
        address: Address,
        _required_confirmations: u32,
    ) -> Result<DepositStatus, StatusError> {
        tracing::debug!(address = %address, "Status lookup refused: backend disabled");
        Err(StatusError::NotImplemented(
            "set status.backend = \"chain\" to query an RPC endpoint",
        ))
    }
}

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAddress {
    pub address: String,
    pub bucket: String,
    pub bucket_started_at: String,
    pub bucket_expires_at: String,
    pub seconds_remaining: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextAddress {
    pub address: String,
    pub bucket: String,
    pub activates_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeEntry {
    pub boundary: String,
    pub bucket: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRange {
    pub interval_minutes: u32,
    pub count: usize,
    pub entries: Vec<RangeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositStatus {
    pub address: String,
    pub required_confirmations: u32,
    pub latest_block: u64,
    pub confirmed_block: Option<u64>,
    /// Hex quantity, e.g. `0x0`.
    pub confirmed_balance: String,
    pub pending_balance: String,
    pub received: bool,
}

/// Error body returned by the service for every non-2xx response.
#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Failure of an SDK call.
#[derive(Debug)]
pub enum ClientError {
    Transport(reqwest::Error),
    /// The service answered with a non-success status.
    Api { status: u16, message: String },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "transport error: {}", e),
            ClientError::Api { status, message } => {
                write!(f, "rotator returned {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e)
    }
}

pub struct RotatorClient {
    client: Client,
    base_url: String,
}

impl RotatorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Address in force now, or at `at` (RFC 3339) when given.
    pub async fn current_address(&self, at: Option<&str>) -> Result<CurrentAddress, ClientError> {
        let mut req = self.client.get(format!("{}/api/v1/address/current", self.base_url));
        if let Some(at) = at {
            req = req.query(&[("at", at)]);
        }
        decode(req.send().await?).await
    }

    pub async fn next_address(&self, at: Option<&str>) -> Result<NextAddress, ClientError> {
        let mut req = self.client.get(format!("{}/api/v1/address/next", self.base_url));
        if let Some(at) = at {
            req = req.query(&[("at", at)]);
        }
        decode(req.send().await?).await
    }

    /// Addresses for every boundary in `[start, end)`.
    pub async fn range(
        &self,
        start: &str,
        end: &str,
        interval_minutes: Option<i64>,
    ) -> Result<AddressRange, ClientError> {
        let mut req = self
            .client
            .get(format!("{}/api/v1/address/range", self.base_url))
            .query(&[("start", start), ("end", end)]);
        if let Some(minutes) = interval_minutes {
            req = req.query(&[("interval_minutes", minutes)]);
        }
        decode(req.send().await?).await
    }

    pub async fn validate(&self, address: &str, bucket: &str) -> Result<bool, ClientError> {
        #[derive(Deserialize)]
        struct Valid {
            valid: bool,
        }

        let resp = self
            .client
            .post(format!("{}/api/v1/address/validate", self.base_url))
            .json(&serde_json::json!({ "address": address, "bucket": bucket }))
            .send()
            .await?;
        let body: Valid = decode(resp).await?;
        Ok(body.valid)
    }

    pub async fn status(
        &self,
        address: &str,
        confirmations: Option<u32>,
    ) -> Result<DepositStatus, ClientError> {
        let mut req = self
            .client
            .get(format!("{}/api/v1/status/{}", self.base_url, address));
        if let Some(confirmations) = confirmations {
            req = req.query(&[("confirmations", confirmations)]);
        }
        decode(req.send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await?;
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp.json().await?)
}

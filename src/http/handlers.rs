//! Request handlers.
//!
//! Handlers read the current rotation service from `AppState` once per
//! request so a concurrent config reload never mixes two configurations in
//! one response.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blockchain::types::parse_address;
use crate::connectors::ConnectorCapability;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::rotation::service::RangeEntry;
use crate::rotation::{CurrentAddress, DerivedAddress, TimeBucket};
use crate::status::DepositStatus;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub operator_identity: String,
    pub interval_minutes: u32,
    /// Present only when an RPC client is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_healthy: Option<bool>,
}

/// Optional evaluation instant; defaults to now.
#[derive(Debug, Deserialize)]
pub struct AtQuery {
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NextAddressResponse {
    pub address: DerivedAddress,
    pub bucket: TimeBucket,
    pub activates_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval_minutes: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RangeResponse {
    pub interval_minutes: u32,
    pub count: usize,
    pub entries: Vec<RangeEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub address: String,
    pub bucket: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub confirmations: Option<u32>,
}

/// Liveness plus, with an RPC client, node reachability.
///
/// Address serving never depends on the node, so an unreachable node
/// degrades the status without failing the request.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let rpc_healthy = match &state.rpc {
        Some(client) => Some(client.is_healthy().await),
        None => None,
    };
    let rotation = state.rotation.load();
    Json(HealthResponse {
        status: if rpc_healthy == Some(false) { "degraded" } else { "ok" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        operator_identity: rotation.identity().to_string(),
        interval_minutes: rotation.interval().minutes(),
        rpc_healthy,
    })
}

pub async fn current_address(
    State(state): State<AppState>,
    query: Result<Query<AtQuery>, QueryRejection>,
) -> Result<Json<CurrentAddress>, ApiError> {
    let Query(query) = query?;
    let now = query.at.unwrap_or_else(Utc::now);
    let current = state.rotation.load().current_address(now);
    metrics::record_addresses_derived("current", 1);
    Ok(Json(current))
}

pub async fn next_address(
    State(state): State<AppState>,
    query: Result<Query<AtQuery>, QueryRejection>,
) -> Result<Json<NextAddressResponse>, ApiError> {
    let Query(query) = query?;
    let now = query.at.unwrap_or_else(Utc::now);
    let rotation = state.rotation.load();
    let activates_at = rotation.interval().next_boundary(now);
    metrics::record_addresses_derived("next", 1);
    Ok(Json(NextAddressResponse {
        address: rotation.next_address(now),
        bucket: rotation.interval().bucket_for(activates_at),
        activates_at,
    }))
}

pub async fn address_range(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<RangeResponse>, ApiError> {
    let Query(query) = query?;
    let rotation = state.rotation.load();
    let range = match query.interval_minutes {
        Some(minutes) => rotation.addresses_for_range(query.start, query.end, minutes)?,
        None => rotation.addresses_for_range_default(query.start, query.end),
    };

    let count = range.len();
    if count > state.http.max_range_entries {
        return Err(ApiError::BadRequest(format!(
            "range covers {} buckets, limit is {}",
            count, state.http.max_range_entries
        )));
    }

    let entries: Vec<RangeEntry> = range.iter().collect();
    metrics::record_addresses_derived("range", entries.len() as u64);
    Ok(Json(RangeResponse {
        interval_minutes: range.interval().minutes(),
        count: entries.len(),
        entries,
    }))
}

pub async fn validate_address(
    State(state): State<AppState>,
    request: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let Json(request) = request?;
    let bucket = TimeBucket::parse(&request.bucket)?;
    let valid = state.rotation.load().validate(&request.address, &bucket);
    metrics::record_addresses_derived("validate", 1);
    tracing::debug!(bucket = %bucket, valid, "Address validated");
    Ok(Json(ValidateResponse { valid }))
}

pub async fn deposit_status(
    State(state): State<AppState>,
    address: Result<Path<String>, PathRejection>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<Json<DepositStatus>, ApiError> {
    let (Path(address), Query(query)) = (address?, query?);
    let address = parse_address(&address).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let confirmations = query.confirmations.unwrap_or(state.default_confirmations);
    // Checked here so every backend rejects it the same way.
    if confirmations == 0 {
        return Err(ApiError::BadRequest("confirmations must be at least 1".to_string()));
    }

    match state.status.deposit_status(address, confirmations).await {
        Ok(status) => {
            metrics::record_status_lookup(if status.received { "received" } else { "waiting" });
            Ok(Json(status))
        }
        Err(e) => {
            metrics::record_status_lookup("error");
            Err(e.into())
        }
    }
}

pub async fn connectors(State(state): State<AppState>) -> Json<Vec<ConnectorCapability>> {
    Json(state.probe.capabilities())
}

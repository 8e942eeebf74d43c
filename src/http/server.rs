//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Apply config reloads by swapping the rotation service
//! - Serve until the shutdown signal fires

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::blockchain::BlockchainClient;
use crate::config::{HttpConfig, RotatorConfig};
use crate::connectors::{CapabilityProbe, ConfiguredProbe};
use crate::http::handlers;
use crate::http::request::{request_id_of, MakeRequestUuidV4};
use crate::observability::metrics;
use crate::rotation::{AddressRotationService, RotationResult};
use crate::status::{DisabledStatusLookup, StatusLookup};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Replaced wholesale on config reload; never mutated in place.
    pub rotation: Arc<ArcSwap<AddressRotationService>>,
    pub status: Arc<dyn StatusLookup>,
    pub probe: Arc<dyn CapabilityProbe>,
    pub http: HttpConfig,
    pub default_confirmations: u32,
    /// Checked by `/health` when set.
    pub rpc: Option<BlockchainClient>,
}

/// HTTP server for the rotation API.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: RotatorConfig,
}

impl HttpServer {
    /// Server with the status backend disabled and connectors probed from the environment.
    pub fn new(config: RotatorConfig) -> RotationResult<Self> {
        let probe = ConfiguredProbe::from_env(config.blockchain.chain_id, None);
        Self::with_collaborators(config, Arc::new(DisabledStatusLookup), Arc::new(probe))
    }

    /// Server with explicit external collaborators.
    ///
    /// Fails if the rotation settings are invalid.
    pub fn with_collaborators(
        config: RotatorConfig,
        status: Arc<dyn StatusLookup>,
        probe: Arc<dyn CapabilityProbe>,
    ) -> RotationResult<Self> {
        let rotation = AddressRotationService::new(config.rotation_config()?);

        let state = AppState {
            rotation: Arc::new(ArcSwap::from_pointee(rotation)),
            status,
            probe,
            http: config.http.clone(),
            default_confirmations: config.status.default_confirmations,
            rpc: None,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Report reachability of `client` on `/health`.
    pub fn with_rpc_client(mut self, client: BlockchainClient) -> Self {
        self.state.rpc = Some(client);
        self.router = Self::build_router(&self.config, self.state.clone());
        self
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RotatorConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/v1/address/current", get(handlers::current_address))
            .route("/api/v1/address/next", get(handlers::next_address))
            .route("/api/v1/address/range", get(handlers::address_range))
            .route("/api/v1/address/validate", post(handlers::validate_address))
            .route("/api/v1/status/{address}", get(handlers::deposit_status))
            .route("/api/v1/connectors", get(handlers::connectors))
            .with_state(state);

        api.layer(middleware::from_fn(track_metrics)).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id_of(request),
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(config.http.request_timeout_secs))),
        )
    }

    /// Application router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &RotatorConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, applying configs received on `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RotatorConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let rotation = self.state.rotation.clone();
        tokio::spawn(apply_config_updates(rotation, config_updates));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Swap in a new rotation service for every valid config received.
///
/// Only the rotation settings take effect without a restart.
async fn apply_config_updates(
    rotation: Arc<ArcSwap<AddressRotationService>>,
    mut updates: mpsc::UnboundedReceiver<RotatorConfig>,
) {
    while let Some(config) = updates.recv().await {
        match config.rotation_config() {
            Ok(rotation_config) => {
                if rotation_config == *rotation.load().config() {
                    tracing::debug!("Config reloaded, rotation settings unchanged");
                    continue;
                }
                tracing::info!(
                    operator = %rotation_config.operator_identity,
                    interval = %rotation_config.interval,
                    "Applying new rotation settings"
                );
                rotation.store(Arc::new(AddressRotationService::new(rotation_config)));
                metrics::record_config_reload(true);
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected reloaded rotation settings");
                metrics::record_config_reload(false);
            }
        }
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}

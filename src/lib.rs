//! Deterministic deposit address rotation service library.

// Core
pub mod config;
pub mod rotation;

// Serving
pub mod http;
pub mod lifecycle;
pub mod observability;

// External collaborators
pub mod blockchain;
pub mod connectors;
pub mod status;

pub use config::schema::RotatorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rotation::{AddressRotationService, DeterministicAddressDeriver, RotationError, TimeBucket};

//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware stack, graceful shutdown)
//!     → request.rs (request ID assigned and propagated)
//!     → handlers.rs (rotation / status / connector endpoints)
//!     → error.rs (typed errors → JSON error bodies)
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

//! Deterministic deposit-address rotation.
//!
//! # Data Flow
//! ```text
//! wall clock instant + RotationInterval
//!     → bucket.rs (floor to interval boundary → TimeBucket)
//!     → deriver.rs (keccak256(tag ‖ identity ‖ bucket) → DerivedAddress)
//!     → service.rs (current / next / range / validate)
//! ```
//!
//! # Design Decisions
//! - Nothing here performs I/O or keeps mutable state
//! - The hash function and domain tag are versioned together; changing
//!   either requires a new tag so independent consumers stay in agreement
//! - Configuration errors surface at construction, everything after is total

pub mod bucket;
pub mod deriver;
pub mod error;
pub mod service;

pub use bucket::{bucket_for, seconds_until_next_boundary, RotationInterval, TimeBucket};
pub use deriver::{DerivedAddress, DeterministicAddressDeriver, OperatorIdentity, DOMAIN_TAG};
pub use error::{RotationError, RotationResult};
pub use service::{AddressRange, AddressRotationService, CurrentAddress, RotationConfig};

//! Deterministic address derivation.
//!
//! # Derivation (version 1)
//! ```text
//! digest  = keccak256(DOMAIN_TAG ‖ 0x00 ‖ identity ‖ 0x00 ‖ bucket)
//! address = "0x" ‖ hex(digest[12..32])
//! ```
//!
//! Anyone holding the identity and bucket can recompute the address. There is
//! no key material involved, so a derived address is a display and monitoring
//! target only.

use alloy::primitives::{keccak256, Address};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::rotation::bucket::TimeBucket;
use crate::rotation::error::{RotationError, RotationResult};

/// Domain-separation tag for derivation version 1.
///
/// Changing the hash or the input layout requires a new tag.
pub const DOMAIN_TAG: &[u8] = b"deposit-rotator/address/v1";

/// Upper bound on identity length in bytes.
pub const MAX_IDENTITY_LEN: usize = 256;

/// Opaque operator identifier mixed into every derived address.
///
/// Used verbatim: `0xABC…` and `0xabc…` are different identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperatorIdentity(String);

impl OperatorIdentity {
    /// Validate an identity string.
    ///
    /// Identities starting with `0x` must be well-formed 20-byte hex addresses.
    pub fn new(identity: impl Into<String>) -> RotationResult<Self> {
        let identity = identity.into();
        if identity.is_empty() {
            return Err(RotationError::InvalidIdentity("identity is empty".to_string()));
        }
        if identity.len() > MAX_IDENTITY_LEN {
            return Err(RotationError::InvalidIdentity(format!(
                "identity exceeds {} bytes",
                MAX_IDENTITY_LEN
            )));
        }
        if identity.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(RotationError::InvalidIdentity(
                "identity contains whitespace or control characters".to_string(),
            ));
        }
        if identity.starts_with("0x") || identity.starts_with("0X") {
            let hex = &identity[2..];
            if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(RotationError::InvalidIdentity(format!(
                    "'{}' is not a 20-byte hex address",
                    identity
                )));
            }
        }
        Ok(Self(identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OperatorIdentity {
    type Error = RotationError;

    fn try_from(identity: String) -> Result<Self, Self::Error> {
        Self::new(identity)
    }
}

impl From<OperatorIdentity> for String {
    fn from(identity: OperatorIdentity) -> Self {
        identity.0
    }
}

impl fmt::Display for OperatorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 20-byte account-shaped address computed from identity and bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedAddress(Address);

impl DerivedAddress {
    pub fn as_address(&self) -> Address {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0 .0 .0
    }

    /// Case-insensitive comparison against a textual address.
    pub fn matches(&self, candidate: &str) -> bool {
        candidate.eq_ignore_ascii_case(&self.to_string())
    }
}

impl fmt::Display for DerivedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_checksum(None))
    }
}

impl FromStr for DerivedAddress {
    type Err = RotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_str(s)
            .map(Self)
            .map_err(|e| RotationError::InvalidAddress(format!("'{}': {}", s, e)))
    }
}

/// Computes derived addresses. Stateless; copies are free.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicAddressDeriver;

impl DeterministicAddressDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Derive the address for `identity` during `bucket`.
    pub fn derive(&self, identity: &OperatorIdentity, bucket: &TimeBucket) -> DerivedAddress {
        let identity = identity.as_str().as_bytes();
        let bucket = bucket.as_str().as_bytes();

        let mut preimage = Vec::with_capacity(DOMAIN_TAG.len() + identity.len() + bucket.len() + 2);
        preimage.extend_from_slice(DOMAIN_TAG);
        preimage.push(0);
        preimage.extend_from_slice(identity);
        preimage.push(0);
        preimage.extend_from_slice(bucket);

        let digest = keccak256(&preimage);
        DerivedAddress(Address::from_slice(&digest[12..]))
    }

    /// Check whether `address` is the one derived for `identity` during `bucket`.
    pub fn validate(
        &self,
        address: &str,
        identity: &OperatorIdentity,
        bucket: &TimeBucket,
    ) -> bool {
        self.derive(identity, bucket).matches(address)
    }
}

//! Address rotation service.
//!
//! # Responsibilities
//! - Hold the immutable rotation configuration
//! - Answer current / next / range / validate queries for any instant
//!
//! The service keeps no mutable state, so a single instance can be shared
//! across any number of tasks behind an `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rotation::bucket::{RotationInterval, TimeBucket};
use crate::rotation::deriver::{DerivedAddress, DeterministicAddressDeriver, OperatorIdentity};
use crate::rotation::error::RotationResult;

/// Immutable inputs of a rotation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationConfig {
    pub operator_identity: OperatorIdentity,
    pub interval: RotationInterval,
}

impl RotationConfig {
    /// Validate raw identity and interval values.
    pub fn new(operator_identity: &str, interval_minutes: i64) -> RotationResult<Self> {
        Ok(Self {
            operator_identity: OperatorIdentity::new(operator_identity)?,
            interval: RotationInterval::from_minutes(interval_minutes)?,
        })
    }
}

/// The address in force at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAddress {
    pub address: DerivedAddress,
    pub bucket: TimeBucket,
    pub bucket_started_at: DateTime<Utc>,
    pub bucket_expires_at: DateTime<Utc>,
    pub seconds_remaining: u64,
}

/// One element of an [`AddressRange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub boundary: DateTime<Utc>,
    pub bucket: TimeBucket,
    pub address: DerivedAddress,
}

/// Deterministic deposit-address rotation.
#[derive(Debug, Clone)]
pub struct AddressRotationService {
    config: RotationConfig,
    deriver: DeterministicAddressDeriver,
}

impl AddressRotationService {
    pub fn new(config: RotationConfig) -> Self {
        tracing::debug!(
            operator = %config.operator_identity,
            interval = %config.interval,
            "Rotation service constructed"
        );
        Self {
            config,
            deriver: DeterministicAddressDeriver::new(),
        }
    }

    /// Build a service from raw values, failing fast on bad configuration.
    pub fn from_parts(operator_identity: &str, interval_minutes: i64) -> RotationResult<Self> {
        Ok(Self::new(RotationConfig::new(operator_identity, interval_minutes)?))
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub fn identity(&self) -> &OperatorIdentity {
        &self.config.operator_identity
    }

    pub fn interval(&self) -> RotationInterval {
        self.config.interval
    }

    /// Address for the bucket containing `now`.
    pub fn current_address(&self, now: DateTime<Utc>) -> CurrentAddress {
        let interval = self.config.interval;
        let bucket = interval.bucket_for(now);
        CurrentAddress {
            address: self.deriver.derive(self.identity(), &bucket),
            bucket,
            bucket_started_at: interval.bucket_start(now),
            bucket_expires_at: interval.next_boundary(now),
            seconds_remaining: interval.seconds_until_next_boundary(now),
        }
    }

    /// Address for the bucket that follows the one containing `now`.
    pub fn next_address(&self, now: DateTime<Utc>) -> DerivedAddress {
        let interval = self.config.interval;
        let bucket = interval.bucket_for(interval.next_boundary(now));
        self.deriver.derive(self.identity(), &bucket)
    }

    pub fn derive_for_bucket(&self, bucket: &TimeBucket) -> DerivedAddress {
        self.deriver.derive(self.identity(), bucket)
    }

    /// Lazy sequence of addresses for every boundary `start + k·interval`
    /// in `[start, end)`.
    pub fn addresses_for_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_minutes: i64,
    ) -> RotationResult<AddressRange> {
        let interval = RotationInterval::from_minutes(interval_minutes)?;
        Ok(self.range_with(start, end, interval))
    }

    /// Same as [`Self::addresses_for_range`] with the configured interval.
    pub fn addresses_for_range_default(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AddressRange {
        self.range_with(start, end, self.config.interval)
    }

    fn range_with(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: RotationInterval,
    ) -> AddressRange {
        AddressRange {
            deriver: self.deriver,
            identity: self.config.operator_identity.clone(),
            start,
            end,
            interval,
        }
    }

    /// Check whether `address` is the one derived for `bucket`.
    pub fn validate(&self, address: &str, bucket: &TimeBucket) -> bool {
        self.deriver.validate(address, self.identity(), bucket)
    }
}

/// Finite, restartable address sequence.
///
/// Holds only its bounds; every call to [`AddressRange::iter`] starts over.
#[derive(Debug, Clone)]
pub struct AddressRange {
    deriver: DeterministicAddressDeriver,
    identity: OperatorIdentity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: RotationInterval,
}

impl AddressRange {
    /// `ceil((end - start) / interval)`, or zero for an empty range.
    pub fn len(&self) -> usize {
        let span = self.end.timestamp_millis() - self.start.timestamp_millis();
        if span <= 0 {
            return 0;
        }
        let step = self.interval.as_millis();
        ((span + step - 1) / step) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn interval(&self) -> RotationInterval {
        self.interval
    }

    /// Entry for boundary `k`, if it lies inside the range.
    pub fn get(&self, k: usize) -> Option<RangeEntry> {
        if k >= self.len() {
            return None;
        }
        let offset = (k as i64).checked_mul(self.interval.as_millis())?;
        let boundary_ms = self.start.timestamp_millis().checked_add(offset)?;
        let boundary = DateTime::from_timestamp_millis(boundary_ms)?;
        let bucket = self.interval.bucket_for(boundary);
        Some(RangeEntry {
            boundary,
            address: self.deriver.derive(&self.identity, &bucket),
            bucket,
        })
    }

    pub fn iter(&self) -> AddressRangeIter<'_> {
        AddressRangeIter {
            range: self,
            next: 0,
            len: self.len(),
        }
    }
}

impl<'a> IntoIterator for &'a AddressRange {
    type Item = RangeEntry;
    type IntoIter = AddressRangeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over an [`AddressRange`].
#[derive(Debug, Clone)]
pub struct AddressRangeIter<'a> {
    range: &'a AddressRange,
    next: usize,
    len: usize,
}

impl Iterator for AddressRangeIter<'_> {
    type Item = RangeEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let entry = self.range.get(self.next);
        self.next += 1;
        entry
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AddressRangeIter<'_> {}

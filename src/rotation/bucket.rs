//! Time bucketing for address rotation.
//!
//! # Responsibilities
//! - Truncate a wall-clock instant to its rotation window
//! - Render the window start as a canonical minute-resolution key
//! - Report the time left until the next window opens

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rotation::error::{RotationError, RotationResult};

/// Largest accepted interval: 366 days.
pub const MAX_INTERVAL_MINUTES: i64 = 366 * 24 * 60;

/// Canonical bucket key format (UTC, minute resolution).
pub const BUCKET_FORMAT: &str = "%Y-%m-%dT%H:%M";

const MILLIS_PER_MINUTE: i64 = 60_000;

/// A validated rotation interval in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RotationInterval {
    minutes: u32,
}

impl RotationInterval {
    /// Validate an interval given in minutes.
    ///
    /// Zero, negative and oversized values are rejected.
    pub fn from_minutes(minutes: i64) -> RotationResult<Self> {
        if minutes <= 0 || minutes > MAX_INTERVAL_MINUTES {
            return Err(RotationError::InvalidInterval(minutes));
        }
        Ok(Self {
            minutes: minutes as u32,
        })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn as_millis(&self) -> i64 {
        i64::from(self.minutes) * MILLIS_PER_MINUTE
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }

    /// Start of the window containing `instant`.
    pub fn bucket_start(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let step = self.as_millis();
        let start = instant.timestamp_millis().div_euclid(step) * step;
        DateTime::from_timestamp_millis(start).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Start of the window after the one containing `instant`.
    pub fn next_boundary(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        self.bucket_start(instant)
            .checked_add_signed(self.as_duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn bucket_for(&self, instant: DateTime<Utc>) -> TimeBucket {
        TimeBucket::from_start(self.bucket_start(instant))
    }

    /// Whole seconds until the next boundary, rounded up.
    ///
    /// An instant sitting exactly on a boundary has the full interval ahead.
    pub fn seconds_until_next_boundary(&self, instant: DateTime<Utc>) -> u64 {
        let remaining_ms =
            self.next_boundary(instant).timestamp_millis() - instant.timestamp_millis();
        (remaining_ms.max(0) as u64).div_ceil(1000)
    }
}

impl TryFrom<i64> for RotationInterval {
    type Error = RotationError;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl From<RotationInterval> for i64 {
    fn from(interval: RotationInterval) -> Self {
        i64::from(interval.minutes)
    }
}

impl fmt::Display for RotationInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes)
    }
}

/// Identifier of one rotation window, e.g. `2024-01-01T00:05`.
///
/// Two instants share a bucket exactly when they fall in the same window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeBucket {
    key: String,
}

impl TimeBucket {
    fn from_start(start: DateTime<Utc>) -> Self {
        Self {
            key: start.format(BUCKET_FORMAT).to_string(),
        }
    }

    /// Parse a bucket key. Only the canonical rendering is accepted.
    pub fn parse(key: &str) -> RotationResult<Self> {
        let parsed = NaiveDateTime::parse_from_str(key, BUCKET_FORMAT)
            .map_err(|_| RotationError::InvalidBucket(key.to_string()))?;
        let bucket = Self::from_start(parsed.and_utc());
        if bucket.key != key {
            return Err(RotationError::InvalidBucket(key.to_string()));
        }
        Ok(bucket)
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Start instant of the window this key names.
    pub fn start(&self) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(&self.key, BUCKET_FORMAT)
            .map(|naive| naive.and_utc())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl TryFrom<String> for TimeBucket {
    type Error = RotationError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        Self::parse(&key)
    }
}

impl From<TimeBucket> for String {
    fn from(bucket: TimeBucket) -> Self {
        bucket.key
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Bucket containing `instant` for an interval given in minutes.
pub fn bucket_for(instant: DateTime<Utc>, interval_minutes: i64) -> RotationResult<TimeBucket> {
    Ok(RotationInterval::from_minutes(interval_minutes)?.bucket_for(instant))
}

/// Seconds from `instant` to the next interval boundary, rounded up.
pub fn seconds_until_next_boundary(
    instant: DateTime<Utc>,
    interval_minutes: i64,
) -> RotationResult<u64> {
    Ok(RotationInterval::from_minutes(interval_minutes)?.seconds_until_next_boundary(instant))
}

// crates/aiops-core/src/core/time.rs
// ============================================================================
// Module: Timestamp and Time Window
// Description: RFC 3339 timestamp wrapper and evidence time windows.
// Purpose: Give every timestamp in the control plane one canonical wire form.
// Dependencies: time, serde
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A point in time, serialized as RFC 3339 on the wire.
///
/// # Invariants
/// - Always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an existing `OffsetDateTime`.
    #[must_use]
    pub const fn from_offset_date_time(inner: OffsetDateTime) -> Self {
        Self(inner)
    }

    /// Returns the inner `OffsetDateTime`.
    #[must_use]
    pub const fn into_offset_date_time(self) -> OffsetDateTime {
        self.0
    }

    /// Parses an RFC 3339 timestamp string.
    ///
    /// # Errors
    ///
    /// Returns an error when `value` is not valid RFC 3339.
    pub fn parse_rfc3339(value: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(value, &Rfc3339).map(Self)
    }

    /// Parses an RFC 3339 timestamp, substituting wall-clock now on failure.
    ///
    /// Used by the alert gateway, which must never reject an alert because
    /// its `startsAt` field failed to parse.
    #[must_use]
    pub fn parse_rfc3339_or_now(value: &str) -> Self {
        Self::parse_rfc3339(value).unwrap_or_else(|_| Self::now())
    }

    /// Returns `self - duration`.
    #[must_use]
    pub fn checked_sub(self, duration: time::Duration) -> Option<Self> {
        self.0.checked_sub(duration).map(Self)
    }

    /// Returns `self + duration`.
    #[must_use]
    pub fn checked_add(self, duration: time::Duration) -> Option<Self> {
        self.0.checked_add(duration).map(Self)
    }

    /// Returns the number of whole seconds since the Unix epoch.
    #[must_use]
    pub const fn unix_timestamp(self) -> i64 {
        self.0.unix_timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0.unix_timestamp()),
        }
    }
}

mod rfc3339 {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub(super) fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&text, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

/// A half-open, inclusive time window `[start, end]` used to scope evidence
/// collection.
///
/// # Invariants
/// - `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start (inclusive).
    pub start: Timestamp,
    /// Window end (inclusive).
    pub end: Timestamp,
}

impl TimeWindow {
    /// Creates a time window, swapping the bounds if given out of order.
    #[must_use]
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        if start <= end { Self { start, end } } else { Self { start: end, end: start } }
    }

    /// Returns true when `point` falls within `[start, end + epsilon]`.
    #[must_use]
    pub fn contains_with_epsilon(&self, point: Timestamp, epsilon: time::Duration) -> bool {
        let Some(end_with_epsilon) = self.end.checked_add(epsilon) else {
            return point >= self.start;
        };
        point >= self.start && point <= end_with_epsilon
    }
}

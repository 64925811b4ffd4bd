//! Ban entry evaluation.

use chrono::{DateTime, ParseError, Utc};

/// Parse a stored expiry. RFC3339 is the only accepted format.
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc))
}

/// Result of looking up one address in the ban table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BanStatus {
    /// No entry for the address.
    Absent,
    /// Ban still in force.
    Active { until: DateTime<Utc> },
    /// Ban expired; the entry has been evicted.
    Lapsed { expired_at: DateTime<Utc> },
    /// Stored timestamp did not parse; the entry has been evicted.
    Malformed { raw: String },
}

impl BanStatus {
    /// Classify a stored timestamp against `now`.
    ///
    /// A ban is active only while its expiry is strictly after `now`.
    pub fn classify(raw: &str, now: DateTime<Utc>) -> Self {
        match parse_expiry(raw) {
            Ok(until) if now < until => BanStatus::Active { until },
            Ok(expired_at) => BanStatus::Lapsed { expired_at },
            Err(_) => BanStatus::Malformed {
                raw: raw.to_string(),
            },
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BanStatus::Active { .. })
    }

    /// Whether the entry should be (or has been) removed from the table.
    pub fn is_evicted(&self) -> bool {
        matches!(self, BanStatus::Lapsed { .. } | BanStatus::Malformed { .. })
    }
}

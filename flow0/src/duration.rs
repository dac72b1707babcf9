//! Millisecond durations with a stable wire format.
//!
//! [`DurationMs`] serializes as a plain integer, so trace records and
//! workflow files carry `"latency": 12` instead of serde's
//! `{"secs": 0, "nanos": 12000000}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Duration in whole milliseconds.
///
/// # Examples
///
/// ```
/// use flow0::DurationMs;
///
/// let d = DurationMs::from_secs(2);
/// assert_eq!(d.as_millis(), 2000);
/// assert_eq!(serde_json::to_string(&d).unwrap(), "2000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(u64);

impl DurationMs {
    /// Zero duration.
    pub const ZERO: Self = Self(0);

    /// Create from milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Create from seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Elapsed time between two timestamps. Clamps to zero when the clock
    /// went backwards.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let ms = (end - start).num_milliseconds();
        Self(u64::try_from(ms).unwrap_or(0))
    }

    /// Get the value in milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Multiply by a non-negative factor, saturating at `u64::MAX`.
    pub fn scaled(&self, factor: f64) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return Self::ZERO;
        }
        let scaled = self.0 as f64 * factor;
        if scaled >= u64::MAX as f64 {
            Self(u64::MAX)
        } else {
            Self(scaled as u64)
        }
    }

    /// Convert to `std::time::Duration`.
    pub fn to_std(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        Self(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl From<DurationMs> for Duration {
    fn from(d: DurationMs) -> Self {
        Duration::from_millis(d.0)
    }
}

impl Default for DurationMs {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::fmt::Display for DurationMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn between_clamps_negative_spans() {
        let now = Utc::now();
        let later = now + TimeDelta::milliseconds(250);
        assert_eq!(DurationMs::between(now, later).as_millis(), 250);
        assert_eq!(DurationMs::between(later, now), DurationMs::ZERO);
    }

    #[test]
    fn scaled_saturates_and_rejects_negative() {
        assert_eq!(DurationMs::from_millis(100).scaled(2.5).as_millis(), 250);
        assert_eq!(DurationMs::from_millis(100).scaled(-1.0), DurationMs::ZERO);
        assert_eq!(
            DurationMs::from_millis(u64::MAX).scaled(4.0).as_millis(),
            u64::MAX
        );
    }

    #[test]
    fn std_round_trip() {
        let d: DurationMs = Duration::from_millis(1500).into();
        assert_eq!(d.to_std(), Duration::from_millis(1500));
        assert_eq!(d.to_string(), "1500ms");
    }
}

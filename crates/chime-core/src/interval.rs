//! Reminder interval grammar: `<positive integer> <unit>`.
//!
//! | Unit                          | Seconds per unit |
//! |-------------------------------|------------------|
//! | `min`, `minute`, `minutes`    | 60               |
//! | `hour`, `hours`               | 3600             |
//!
//! Units are case-insensitive. Anything else is rejected.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The interval text did not match `<positive integer> <unit>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid interval {0:?}: expected something like '30 min' or '1 hour'")]
pub struct InvalidInterval(pub String);

/// A strictly positive repeat interval with whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    secs: u64,
}

impl Interval {
    /// Parse user input such as `"30 min"` or `"2 Hours"`.
    pub fn parse(text: &str) -> Result<Self, InvalidInterval> {
        let invalid = || InvalidInterval(text.to_string());

        let lowered = text.to_lowercase();
        let mut parts = lowered.split_whitespace();
        let (Some(count), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        // Reject signs explicitly: "+5 min" is not part of the grammar.
        if !count.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let count: u64 = count.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }

        let unit_secs = match unit {
            "min" | "minute" | "minutes" => 60,
            "hour" | "hours" => 3600,
            _ => return Err(invalid()),
        };

        let interval = count
            .checked_mul(unit_secs)
            .map(|secs| Self { secs })
            .ok_or_else(invalid)?;

        // The first occurrence has to land on a representable timestamp.
        if interval.next_after(Utc::now()).is_none() {
            return Err(invalid());
        }
        Ok(interval)
    }

    pub fn as_secs(&self) -> u64 {
        self.secs
    }

    /// `at + self`, or `None` past the last representable timestamp.
    pub fn next_after(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.secs).ok()?;
        at.checked_add_signed(chrono::Duration::try_seconds(secs)?)
    }
}

impl FromStr for Interval {
    type Err = InvalidInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secs % 3600 == 0 {
            let n = self.secs / 3600;
            write!(f, "{n} {}", if n == 1 { "hour" } else { "hours" })
        } else {
            let n = self.secs / 60;
            write!(f, "{n} {}", if n == 1 { "minute" } else { "minutes" })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_units_scale_by_sixty() {
        for unit in ["min", "minute", "minutes", "MIN", "Minutes"] {
            for n in [1u64, 5, 30, 90, 1440] {
                let parsed = Interval::parse(&format!("{n} {unit}")).unwrap();
                assert_eq!(parsed.as_secs(), n * 60, "{n} {unit}");
            }
        }
    }

    #[test]
    fn hour_units_scale_by_3600() {
        for unit in ["hour", "hours", "HOUR", "Hours"] {
            for n in [1u64, 2, 12, 48] {
                let parsed = Interval::parse(&format!("{n} {unit}")).unwrap();
                assert_eq!(parsed.as_secs(), n * 3600, "{n} {unit}");
            }
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(Interval::parse("  30   min ").unwrap().as_secs(), 1800);
    }

    #[test]
    fn malformed_input_is_rejected() {
        for bad in [
            "",
            "bad input",
            "30",
            "min",
            "30min",
            "0 min",
            "-5 min",
            "+5 min",
            "1.5 hours",
            "30 seconds",
            "30 min extra",
            "ten minutes",
            "99999999999999999999 min",
            "10000000000000000 min",
            "100000000000 hours",
        ] {
            assert!(Interval::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn overflowing_product_is_rejected() {
        let text = format!("{} hours", u64::MAX / 1000);
        assert!(Interval::parse(&text).is_err());
    }

    #[test]
    fn display_prefers_whole_hours() {
        assert_eq!(Interval::parse("120 min").unwrap().to_string(), "2 hours");
        assert_eq!(Interval::parse("1 hour").unwrap().to_string(), "1 hour");
        assert_eq!(Interval::parse("90 min").unwrap().to_string(), "90 minutes");
    }

    #[test]
    fn next_after_stops_at_the_last_timestamp() {
        let hour = Interval::parse("1 hour").unwrap();
        let now = Utc::now();
        assert_eq!(hour.next_after(now), Some(now + chrono::Duration::hours(1)));
        assert_eq!(hour.next_after(DateTime::<Utc>::MAX_UTC), None);
    }
}

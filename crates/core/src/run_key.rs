//! Execution window keys.
//!
//! A run key names one idempotency window of a job. It is derived from a
//! reference instant truncated to the job's [`Frequency`] in a fixed zone, so
//! every instance computing it during the same window gets the same string.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::task::Frequency;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunKey(String);

impl RunKey {
    /// Compute the key of the window containing `reference`.
    ///
    /// - Hourly: start of the local hour, RFC 3339 with offset
    ///   (`2024-03-10T14:00:00+01:00`).
    /// - Daily: local calendar date (`2024-03-10`).
    pub fn for_window(frequency: Frequency, reference: DateTime<Utc>, zone: Tz) -> Self {
        let local = reference.with_timezone(&zone);
        match frequency {
            Frequency::Hourly => {
                // Subtract the local minutes/seconds rather than rounding the UTC
                // instant so zones with fractional-hour offsets truncate locally.
                let into_hour = Duration::seconds(i64::from(local.minute() * 60 + local.second()))
                    + Duration::nanoseconds(i64::from(local.nanosecond()));
                let hour_start = zone.from_utc_datetime(&(reference - into_hour).naive_utc());
                Self(hour_start.to_rfc3339_opts(SecondsFormat::Secs, false))
            }
            Frequency::Daily => Self(local.date_naive().format("%Y-%m-%d").to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl core::fmt::Display for RunKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RunKey> for String {
    fn from(value: RunKey) -> Self {
        value.0
    }
}

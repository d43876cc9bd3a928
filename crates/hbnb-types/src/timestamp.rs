//! Timestamps in the ISO format used by the JSON representation
//!
//! Timestamps are naive UTC values with microsecond precision, written as
//! `2017-03-25T02:17:06.000000`.

use chrono::{Duration, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format used for serialized timestamps
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current time, truncated to the serialized precision
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

/// A timestamp strictly later than `previous`.
///
/// Uses the current time when the clock has moved past `previous`,
/// otherwise `previous` plus one microsecond.
pub fn after(previous: NaiveDateTime) -> NaiveDateTime {
    let current = now();
    if current > previous {
        current
    } else {
        previous + Duration::microseconds(1)
    }
}

pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(FORMAT))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
}

use std::ops::Sub;

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// The current instant, truncated to the microsecond precision it is stored with.
pub fn now() -> Timestamp {
    Timestamp(Utc::now().trunc_subsecs(6))
}

/// A UTC instant stored as a fixed-width RFC 3339 string, so that string ordering in the database matches time ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0
            .to_rfc3339_opts(SecondsFormat::Micros, true)
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Micros, true))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn serialized_form_sorts_like_time() {
        let earlier = Timestamp::from(Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap());
        let later = Timestamp::from(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());

        let earlier_text = serde_json::to_string(&earlier).unwrap();
        let later_text = serde_json::to_string(&later).unwrap();

        assert_eq!(earlier_text, "\"2024-01-09T23:59:59.000000Z\"");
        assert!(earlier_text < later_text);
        assert_eq!(serde_json::from_str::<Timestamp>(&later_text).unwrap(), later);
    }
}

//! Optional timestamps in snapshot documents.
//!
//! Producers write an unset time as the zero instant `0001-01-01T00:00:00Z`
//! (or `null`). Both decode to `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Unix seconds of `0001-01-01T00:00:00Z`.
const ZERO_INSTANT_SECS: i64 = -62_135_596_800;

pub(crate) fn is_zero(time: &DateTime<Utc>) -> bool {
    time.timestamp() == ZERO_INSTANT_SECS && time.timestamp_subsec_nanos() == 0
}

/// `deserialize_with` helper mapping the zero instant to `None`.
pub(crate) fn zero_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let time = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(time.filter(|t| !is_zero(t)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Stamp {
        #[serde(default, deserialize_with = "zero_as_none")]
        at: Option<DateTime<Utc>>,
    }

    fn decode(json: &str) -> Option<DateTime<Utc>> {
        serde_json::from_str::<Stamp>(json).unwrap().at
    }

    #[test]
    fn test_zero_instant_is_unset() {
        assert!(decode(r#"{"at": "0001-01-01T00:00:00Z"}"#).is_none());
        assert!(decode(r#"{"at": null}"#).is_none());
        assert!(decode("{}").is_none());
    }

    #[test]
    fn test_real_times_are_kept() {
        let at = decode(r#"{"at": "2024-03-01T12:00:00Z"}"#).unwrap();
        assert_eq!(at.timestamp(), 1_709_294_400);
        // One second past the zero instant is a real time.
        assert!(decode(r#"{"at": "0001-01-01T00:00:01Z"}"#).is_some());
    }
}

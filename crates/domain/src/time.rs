//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `created_at` and `learned_at`.
///
/// Serialized as RFC 3339, which also accepts the ISO-8601 strings written by
/// older stores (`2024-05-01T18:22:03.123456+00:00`).
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_iso_timestamp_with_offset() {
        let ts: Timestamp = serde_json::from_str("\"2024-05-01T18:22:03.123456+00:00\"").unwrap();
        assert_eq!(ts.timestamp(), 1_714_587_723);
    }

    #[test]
    fn should_not_go_backwards() {
        let before = Utc::now();
        assert!(now() >= before);
    }
}

//! Value codecs for the persisted layout.
//!
//! Numeric fields use bincode's standard configuration, which is a compact
//! variable-length integer encoding. Timestamps are stored as fixed-width
//! RFC 3339 text so lexicographic byte comparison orders chronologically.
//! Booleans are a single `0x00`/`0x01` byte.

use super::errors::{StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};

fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Encode a signed credit amount.
pub fn encode_i64(v: i64) -> StoreResult<Vec<u8>> {
    Ok(bincode::encode_to_vec(v, config())?)
}

/// Decode a signed credit amount. Trailing bytes are corruption.
pub fn decode_i64(key: &[u8], bytes: &[u8]) -> StoreResult<i64> {
    let (v, read) = bincode::decode_from_slice::<i64, _>(bytes, config())
        .map_err(|e| StoreError::corrupt(key, e.to_string()))?;
    if read != bytes.len() {
        return Err(StoreError::corrupt(key, "trailing bytes after integer"));
    }
    Ok(v)
}

/// Encode a timestamp as sortable RFC 3339 text (fixed nanosecond width).
pub fn encode_time(t: DateTime<Utc>) -> Vec<u8> {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true).into_bytes()
}

/// Decode an RFC 3339 timestamp.
pub fn decode_time(key: &[u8], bytes: &[u8]) -> StoreResult<DateTime<Utc>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| StoreError::corrupt(key, e.to_string()))?;
    let t = DateTime::parse_from_rfc3339(text)
        .map_err(|e| StoreError::corrupt(key, e.to_string()))?;
    Ok(t.with_timezone(&Utc))
}

/// Encode a boolean flag.
pub fn encode_bool(v: bool) -> Vec<u8> {
    vec![u8::from(v)]
}

/// Decode a boolean flag. Anything but a single known byte is corruption.
pub fn decode_bool(key: &[u8], bytes: &[u8]) -> StoreResult<bool> {
    match bytes {
        [0x00] => Ok(false),
        [0x01] => Ok(true),
        _ => Err(StoreError::corrupt(key, "not a boolean flag")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn integer_roundtrip() {
        for v in [0i64, 1, -1, 5, 100, -255, i64::MAX, i64::MIN] {
            let bytes = encode_i64(v).unwrap();
            assert_eq!(decode_i64(b"k", &bytes).unwrap(), v);
        }
    }

    #[test]
    fn small_integers_are_compact() {
        assert!(encode_i64(100).unwrap().len() <= 2);
    }

    #[test]
    fn trailing_bytes_are_corrupt() {
        let mut bytes = encode_i64(7).unwrap();
        bytes.push(0xFF);
        assert!(matches!(
            decode_i64(b"k", &bytes),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn time_roundtrip() {
        let t = Utc.with_ymd_and_hms(2016, 8, 21, 12, 30, 45).unwrap();
        let bytes = encode_time(t);
        assert_eq!(decode_time(b"k", &bytes).unwrap(), t);
    }

    #[test]
    fn encoded_times_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2016, 8, 21, 9, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2016, 8, 21, 10, 0, 0).unwrap();
        assert!(encode_time(early) < encode_time(late));
    }

    #[test]
    fn bool_roundtrip_and_corruption() {
        assert!(decode_bool(b"k", &encode_bool(true)).unwrap());
        assert!(!decode_bool(b"k", &encode_bool(false)).unwrap());
        assert!(decode_bool(b"k", &[0x02]).is_err());
        assert!(decode_bool(b"k", &[]).is_err());
    }
}

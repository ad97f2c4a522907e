//! HTTP Range header interpretation for audio streaming
//!
//! Only a single contiguous `bytes=<start>-[<end>]` range is understood. Every
//! stream request must carry one; whole-file transfers are not served.

use axum::http::{HeaderMap, header};

use super::{StreamingError, StreamingResult};

/// Parsed single-range request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    /// First byte offset requested
    pub start: u64,
    /// Last byte offset requested, inclusive. `None` lets the window policy decide.
    pub explicit_end: Option<u64>,
}

/// Extract the raw Range header value from HTTP headers.
///
/// Returns `Ok(None)` only when no Range header was sent.
///
/// # Errors
/// - `StreamingError::MalformedRange` - Header present but not visible ASCII
pub fn extract_range_header(headers: &HeaderMap) -> StreamingResult<Option<&str>> {
    let Some(value) = headers.get(header::RANGE) else {
        return Ok(None);
    };

    value
        .to_str()
        .map(Some)
        .map_err(|_| StreamingError::MalformedRange {
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        })
}

/// Parse a Range header value into a [`RangeRequest`].
///
/// Accepts `bytes=500-`, `bytes=500-999` and the bare `500-` form.
///
/// # Examples
/// ```
/// use sonora_core::streaming::range::{RangeRequest, parse_range_header};
///
/// let range = parse_range_header(Some("bytes=100-")).unwrap();
/// assert_eq!(range, RangeRequest { start: 100, explicit_end: None });
/// ```
///
/// # Errors
/// - `StreamingError::MissingRange` - No header value, or an empty one
/// - `StreamingError::MalformedRange` - Wrong unit, no start digits, multiple
///   ranges, suffix ranges, or an end below the start
pub fn parse_range_header(value: Option<&str>) -> StreamingResult<RangeRequest> {
    let raw = value.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(StreamingError::MissingRange);
    }

    let malformed = || StreamingError::MalformedRange {
        value: raw.to_string(),
    };

    let spec = match raw.split_once('=') {
        Some((unit, spec)) if unit.trim().eq_ignore_ascii_case("bytes") => spec.trim(),
        Some(_) => return Err(malformed()),
        None => raw,
    };

    if spec.contains(',') {
        return Err(malformed());
    }

    let (start_str, end_str) = spec.split_once('-').unwrap_or((spec, ""));
    let start = parse_offset(start_str.trim()).ok_or_else(malformed)?;

    let end_str = end_str.trim();
    let explicit_end = if end_str.is_empty() {
        None
    } else {
        let end = parse_offset(end_str).ok_or_else(malformed)?;
        if end < start {
            return Err(malformed());
        }
        Some(end)
    };

    Ok(RangeRequest {
        start,
        explicit_end,
    })
}

fn parse_offset(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_parse_open_ended_range() {
        let range = parse_range_header(Some("bytes=0-")).unwrap();
        assert_eq!(range.start, 0);
        assert_eq!(range.explicit_end, None);

        let range = parse_range_header(Some("bytes=2499000-")).unwrap();
        assert_eq!(range.start, 2_499_000);
    }

    #[test]
    fn test_parse_closed_range() {
        let range = parse_range_header(Some("bytes=100-199")).unwrap();
        assert_eq!(
            range,
            RangeRequest {
                start: 100,
                explicit_end: Some(199)
            }
        );
    }

    #[test]
    fn test_parse_without_unit() {
        let range = parse_range_header(Some("42-")).unwrap();
        assert_eq!(range.start, 42);
        let range = parse_range_header(Some("42")).unwrap();
        assert_eq!(range.start, 42);
        assert_eq!(range.explicit_end, None);
    }

    #[test]
    fn test_missing_range() {
        assert!(matches!(
            parse_range_header(None),
            Err(StreamingError::MissingRange)
        ));
        assert!(matches!(
            parse_range_header(Some("   ")),
            Err(StreamingError::MissingRange)
        ));
    }

    #[test]
    fn test_malformed_ranges() {
        for value in [
            "bytes=",
            "bytes=-500",
            "bytes=abc-",
            "bytes=10-abc",
            "bytes=0-10,20-30",
            "bytes=200-100",
            "items=0-",
            "bytes=+5-",
        ] {
            assert!(
                matches!(
                    parse_range_header(Some(value)),
                    Err(StreamingError::MalformedRange { .. })
                ),
                "expected {value:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_extract_range_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_range_header(&headers).unwrap(), None);

        headers.insert(header::RANGE, HeaderValue::from_static("bytes=5-"));
        assert_eq!(extract_range_header(&headers).unwrap(), Some("bytes=5-"));
    }

    #[test]
    fn test_unreadable_range_header_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::RANGE,
            HeaderValue::from_bytes(b"bytes=\xff-").unwrap(),
        );

        assert!(matches!(
            extract_range_header(&headers),
            Err(StreamingError::MalformedRange { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_open_ended_start_round_trips(start in any::<u64>()) {
            let range = parse_range_header(Some(&format!("bytes={start}-"))).unwrap();
            prop_assert_eq!(range.start, start);
            prop_assert_eq!(range.explicit_end, None);
        }

        #[test]
        fn prop_closed_range_keeps_order(start in 0u64..1_000_000, extra in 0u64..1_000_000) {
            let end = start + extra;
            let range = parse_range_header(Some(&format!("bytes={start}-{end}"))).unwrap();
            prop_assert_eq!(range.explicit_end, Some(end));
        }
    }
}

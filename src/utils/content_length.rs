//! Content length extraction utilities.

use reqwest::header::{HeaderMap, CONTENT_LENGTH};

/// Reads the `Content-Length` header.
///
/// Returns `None` when the header is missing, is not a number, or is zero:
/// all three mean the size is unknown as far as progress reporting goes.
///
/// The header is read directly rather than through
/// `Response::content_length`, which reports the size of the body actually
/// received and is therefore 0 for every `HEAD` response.
///
/// # Example
///
/// ```rust
/// use fetchq::utils::content_length;
/// use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(CONTENT_LENGTH, HeaderValue::from_static("2048"));
/// assert_eq!(content_length(&headers), Some(2048));
/// ```
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|&length| length > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_content_length() {
        assert_eq!(content_length(&headers_with("1024")), Some(1024));
        assert_eq!(content_length(&headers_with(" 999999999999 ")), Some(999999999999));
    }

    #[test]
    fn test_content_length_unknown() {
        assert_eq!(content_length(&HeaderMap::new()), None);
        assert_eq!(content_length(&headers_with("0")), None);
        assert_eq!(content_length(&headers_with("lots")), None);
        assert_eq!(content_length(&headers_with("-5")), None);
    }
}

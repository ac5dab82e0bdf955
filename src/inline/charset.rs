//! Charset conversion between Rust strings and the bytes the backend sees.

use std::borrow::Cow;

use encoding_rs::Encoding;
use tracing::warn;

/// Charset used when nothing better is known.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Decode bytes using a named charset.
///
/// Unknown labels fall back to lossy UTF-8.
pub fn decode(charset: &str, bytes: &[u8]) -> String {
    if is_utf8(charset) {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    match Encoding::for_label(charset.trim().as_bytes()) {
        Some(encoding) => {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
        None => {
            warn!(charset, "Unknown charset, falling back to UTF-8 lossy");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Encode a string into a named charset.
///
/// Characters the charset cannot represent become numeric character references,
/// which is what `encoding_rs` does for every non-UTF encoder.
pub fn encode<'a>(charset: &str, text: &'a str) -> Cow<'a, [u8]> {
    if is_utf8(charset) {
        return Cow::Borrowed(text.as_bytes());
    }
    match Encoding::for_label(charset.trim().as_bytes()) {
        Some(encoding) => {
            let (encoded, _, _) = encoding.encode(text);
            encoded
        }
        None => {
            warn!(charset, "Unknown charset, encoding as UTF-8");
            Cow::Borrowed(text.as_bytes())
        }
    }
}

/// Whether the label names plain US-ASCII.
pub fn is_us_ascii(charset: &str) -> bool {
    let c = charset.trim();
    c.eq_ignore_ascii_case("us-ascii") || c.eq_ignore_ascii_case("ascii")
}

fn is_utf8(charset: &str) -> bool {
    let c = charset.trim();
    c.is_empty() || c.eq_ignore_ascii_case("utf-8") || c.eq_ignore_ascii_case("utf8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode("ISO-8859-1", b"caf\xe9"), "café");
    }

    #[test]
    fn test_decode_utf8_lossy() {
        assert_eq!(decode("utf-8", "日本".as_bytes()), "日本");
        assert_eq!(decode("UTF-8", b"ok\xff"), "ok\u{fffd}");
    }

    #[test]
    fn test_decode_unknown_charset_falls_back() {
        assert_eq!(decode("x-made-up", b"plain"), "plain");
    }

    #[test]
    fn test_encode_latin1() {
        assert_eq!(encode("ISO-8859-1", "café").as_ref(), b"caf\xe9");
    }

    #[test]
    fn test_encode_empty_label_is_utf8() {
        assert_eq!(encode("", "é").as_ref(), "é".as_bytes());
    }

    #[test]
    fn test_us_ascii_detection() {
        assert!(is_us_ascii("US-ASCII"));
        assert!(is_us_ascii("us-ascii"));
        assert!(!is_us_ascii("UTF-8"));
    }
}

//! Encoded words for non-ASCII header values
//!
//! <https://tools.ietf.org/html/rfc1522>

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

fn allowed_char(c: char) -> bool {
    c >= 1 as char && c <= 9 as char
        || c == 11 as char
        || c == 12 as char
        || c >= 14 as char && c <= 127 as char
}

/// Wraps a header value in an UTF-8 B encoded word when it contains
/// bytes outside the 7-bit printable range; pure-ASCII values pass
/// through unchanged.
pub fn encode(s: &str) -> String {
    if s.chars().all(allowed_char) {
        s.into()
    } else {
        format!("=?UTF-8?B?{}?=", BASE64.encode(s))
    }
}

/// Reverses [`encode`]; returns `None` for undecodable payloads.
pub fn decode(s: &str) -> Option<String> {
    const PREFIX: &str = "=?UTF-8?B?";
    const SUFFIX: &str = "?=";

    let s = s.trim();
    if let Some(stripped) = s.strip_prefix(PREFIX) {
        let payload = stripped.strip_suffix(SUFFIX)?;
        BASE64
            .decode(payload)
            .ok()
            .and_then(|v| String::from_utf8(v).ok())
    } else {
        Some(s.into())
    }
}

#[cfg(test)]
mod test {
    use super::{decode, encode};

    #[test]
    fn encode_ascii_is_identity() {
        assert_eq!(&encode("Kayo. ?"), "Kayo. ?");
    }

    #[test]
    fn decode_ascii() {
        assert_eq!(decode("Kayo. ?"), Some("Kayo. ?".into()));
    }

    #[test]
    fn encode_utf8() {
        assert_eq!(
            &encode("Привет, мир!"),
            "=?UTF-8?B?0J/RgNC40LLQtdGCLCDQvNC40YAh?="
        );
    }

    #[test]
    fn decode_utf8() {
        assert_eq!(
            decode("=?UTF-8?B?0J/RgNC40LLQtdGCLCDQvNC40YAh?="),
            Some("Привет, мир!".into())
        );
    }

    #[test]
    fn round_trips_arbitrary_unicode() {
        for original in ["héllo", "日本語の件名", "emoji 🦀 subject", "mixed ascii ünd more"] {
            assert_eq!(decode(&encode(original)), Some(original.to_owned()));
        }
    }

    #[test]
    fn truncated_encoded_word_is_rejected() {
        // shorter than a prefix plus a suffix; the trailing `=` belongs
        // to both, so naive slicing would underflow
        assert_eq!(decode("=?UTF-8?B?="), None);
        assert_eq!(decode("=?UTF-8?B?"), None);
        assert_eq!(decode("=?UTF-8?B?not base64!?="), None);
    }

    #[test]
    fn control_chars_force_encoding() {
        assert_ne!(&encode("tab\u{0}break"), "tab\u{0}break");
    }
}

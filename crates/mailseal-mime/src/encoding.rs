//! MIME encoding utilities.
//!
//! Base64 bodies (RFC 2045, wrapped at 76 columns), RFC 2047 header
//! encoded-words and dot-stuffing for line-oriented transports.

use crate::charset::Charset;
use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum encoded line length for base64 bodies (RFC 2045).
pub const BASE64_LINE_WIDTH: usize = 76;

/// Largest chunk of raw header bytes per encoded-word; keeps each word
/// under the 75 character limit of RFC 2047.
const ENCODED_WORD_CHUNK: usize = 45;

/// Encodes data as unwrapped Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into lines of at most 76 characters.
///
/// Lines are joined with `line_break`; there is no trailing line break.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8], line_break: &str) -> String {
    let encoded = STANDARD.encode(data);
    let line_count = encoded.len().div_ceil(BASE64_LINE_WIDTH);
    let mut wrapped =
        String::with_capacity(encoded.len() + line_count.saturating_sub(1) * line_break.len());

    // Base64 output is pure ASCII, so byte chunks are valid str slices.
    for (i, line) in encoded.as_bytes().chunks(BASE64_LINE_WIDTH).enumerate() {
        if i > 0 {
            wrapped.push_str(line_break);
        }
        wrapped.extend(line.iter().map(|&b| char::from(b)));
    }

    wrapped
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes a header value using RFC 2047 B-encoding if needed.
///
/// Printable ASCII values without `=` or `?` are returned unchanged;
/// control characters such as CR and LF are always encoded. Long values
/// are split into several encoded-words separated by a space, never
/// splitting a character across words.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: Charset) -> String {
    if text
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '=' && c != '?')
    {
        return text.to_string();
    }

    let charset_name = charset.name();
    let mut words = Vec::new();
    let mut chunk = Vec::new();
    let mut buf = [0u8; 4];

    for c in text.chars() {
        let bytes = charset.encode(c.encode_utf8(&mut buf));
        if !chunk.is_empty() && chunk.len() + bytes.len() > ENCODED_WORD_CHUNK {
            words.push(format!("=?{charset_name}?B?{}?=", encode_base64(&chunk)));
            chunk.clear();
        }
        chunk.extend_from_slice(&bytes);
    }
    if !chunk.is_empty() {
        words.push(format!("=?{charset_name}?B?{}?=", encode_base64(&chunk)));
    }

    words.join(" ")
}

/// Doubles a leading `.` on every line.
///
/// A line starts at the beginning of the buffer and after every `\n`, so
/// both CRLF and bare LF input are handled.
#[must_use]
pub fn dot_stuff(body: &[u8]) -> Vec<u8> {
    let extra = body
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'.' && (i == 0 || body[i - 1] == b'\n'))
        .count();
    if extra == 0 {
        return body.to_vec();
    }

    let mut stuffed = Vec::with_capacity(body.len() + extra);
    let mut at_line_start = true;
    for &b in body {
        if at_line_start && b == b'.' {
            stuffed.push(b'.');
        }
        stuffed.push(b);
        at_line_start = b == b'\n';
    }
    stuffed
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_wrapped_short_input_is_one_line() {
        assert_eq!(encode_base64_wrapped(b"Hi", "\r\n"), "SGk=");
        assert_eq!(encode_base64_wrapped(b"", "\r\n"), "");
    }

    #[test]
    fn test_base64_wrapped_exact_width() {
        // 57 raw bytes encode to exactly one 76 character line.
        let encoded = encode_base64_wrapped(&[0u8; 57], "\r\n");
        assert_eq!(encoded.len(), 76);
        assert!(!encoded.contains("\r\n"));

        let encoded = encode_base64_wrapped(&[0u8; 58], "\r\n");
        let lines: Vec<&str> = encoded.split("\r\n").collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 76);
        assert_eq!(lines[1], "AA==");
    }

    #[test]
    fn test_decode_ignores_line_breaks() {
        let data: Vec<u8> = (0..=255).collect();
        let wrapped = encode_base64_wrapped(&data, "\r\n");
        assert_eq!(decode_base64(&wrapped).unwrap(), data);
    }

    #[test]
    fn test_rfc2047_plain_ascii_untouched() {
        assert_eq!(encode_rfc2047("Hello", Charset::Utf8), "Hello");
    }

    #[test]
    fn test_rfc2047_encode() {
        let encoded = encode_rfc2047("Héllo", Charset::Utf8);
        assert_eq!(encoded, "=?utf-8?B?SMOpbGxv?=");

        let encoded = encode_rfc2047("Héllo", Charset::Latin1);
        assert_eq!(encoded, "=?iso-8859-1?B?SOlsbG8=?=");
    }

    #[test]
    fn test_rfc2047_control_characters_encoded() {
        let encoded = encode_rfc2047("Hi\r\nBcc: x@example.com", Charset::UsAscii);
        assert_eq!(encoded, "=?us-ascii?B?SGkNCkJjYzogeEBleGFtcGxlLmNvbQ==?=");
        assert!(!encoded.contains(['\r', '\n']));
        assert!(encode_rfc2047("a\tb", Charset::Utf8).starts_with("=?utf-8?B?"));
    }

    #[test]
    fn test_rfc2047_long_value_is_split() {
        let subject = "é".repeat(60);
        let encoded = encode_rfc2047(&subject, Charset::Utf8);
        let words: Vec<&str> = encoded.split(' ').collect();
        assert!(words.len() > 1);
        for word in words {
            assert!(word.len() <= 75, "encoded-word too long: {word}");
            let payload = word
                .strip_prefix("=?utf-8?B?")
                .and_then(|w| w.strip_suffix("?="))
                .unwrap();
            // Each word decodes to whole characters.
            String::from_utf8(decode_base64(payload).unwrap()).unwrap();
        }
    }

    #[test]
    fn test_dot_stuff_leading_dot() {
        assert_eq!(dot_stuff(b".foo"), b"..foo");
        assert_eq!(dot_stuff(b"a\r\n.foo\r\n"), b"a\r\n..foo\r\n");
        assert_eq!(dot_stuff(b"a\n.\nb"), b"a\n..\nb");
    }

    #[test]
    fn test_dot_stuff_inner_dots_untouched() {
        assert_eq!(dot_stuff(b"a.b\r\nc. d"), b"a.b\r\nc. d");
        assert_eq!(dot_stuff(b"no dots here"), b"no dots here");
    }

    proptest! {
        #[test]
        fn prop_wrapped_lines_never_exceed_width(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let wrapped = encode_base64_wrapped(&data, "\r\n");
            for line in wrapped.split("\r\n") {
                prop_assert!(line.len() <= BASE64_LINE_WIDTH);
            }
            prop_assert_eq!(decode_base64(&wrapped).unwrap(), data);
        }

        #[test]
        fn prop_dot_stuffed_lines_never_start_with_single_dot(text in "[a-z.\r\n]{0,200}") {
            let stuffed = dot_stuff(text.as_bytes());
            let stuffed = String::from_utf8(stuffed).unwrap();
            for line in stuffed.split('\n') {
                if line.starts_with('.') {
                    prop_assert!(line.starts_with(".."));
                }
            }
            // Removing the stuffing restores the input.
            let unstuffed: Vec<String> = stuffed
                .split('\n')
                .map(|l| l.strip_prefix('.').filter(|_| l.starts_with("..")).unwrap_or(l).to_string())
                .collect();
            prop_assert_eq!(unstuffed.join("\n"), text);
        }
    }
}

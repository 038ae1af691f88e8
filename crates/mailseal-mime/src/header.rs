//! MIME header handling.

use crate::charset::Charset;
use crate::encoding::encode_rfc2047;
use std::fmt;

/// Ordered collection of email headers.
///
/// Names keep the case they were added with and are matched
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Sets a header value, replacing any existing values.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.headers.push((name, value.into()));
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Encodes a header value using RFC 2047 if needed.
    #[must_use]
    pub fn encode_value(value: &str, charset: Charset) -> String {
        encode_rfc2047(value, charset)
    }

    /// Renders every header as `Name: value` followed by `line_break`.
    ///
    /// Bare CR and LF inside values are replaced with spaces so that a value
    /// can never start a new header line.
    #[must_use]
    pub fn render(&self, line_break: &str) -> String {
        let mut out = String::new();
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(&single_line(value));
            out.push_str(line_break);
        }
        out
    }
}

/// Replaces CR and LF with spaces so a value stays on its header line.
#[must_use]
pub(crate) fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("\r\n"))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.add(name, value);
        }
        headers
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
    }

    #[test]
    fn test_headers_set() {
        let mut headers = Headers::new();
        headers.add("X-Tag", "one");
        headers.add("x-tag", "two");
        assert_eq!(headers.get_all("X-Tag").len(), 2);

        headers.set("X-Tag", "three");
        assert_eq!(headers.get_all("X-Tag"), vec!["three"]);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        assert!(headers.contains("Subject"));

        headers.remove("subject");
        assert!(!headers.contains("Subject"));
    }

    #[test]
    fn test_headers_render_keeps_order_and_case() {
        let headers: Headers = [
            ("Content-Type", "text/plain"),
            ("Content-Transfer-Encoding", "base64"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            headers.render("\r\n"),
            "Content-Type: text/plain\r\nContent-Transfer-Encoding: base64\r\n"
        );
        assert_eq!(headers.to_string(), headers.render("\r\n"));
    }

    #[test]
    fn test_headers_render_strips_line_breaks() {
        let mut headers = Headers::new();
        headers.add("X-Note", "a\r\nBcc: evil@example.com");
        assert_eq!(headers.render("\r\n"), "X-Note: a  Bcc: evil@example.com\r\n");
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(Headers::encode_value("plain", Charset::Utf8), "plain");
        assert!(Headers::encode_value("Grüße", Charset::Utf8).starts_with("=?utf-8?B?"));
    }
}

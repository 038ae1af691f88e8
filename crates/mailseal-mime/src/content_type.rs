//! MIME content type handling.

use crate::boundary::Boundary;
use crate::charset::Charset;
use crate::error::{Error, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::fmt;

/// Characters that force a parameter value into a quoted string (RFC 2045).
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// Bytes escaped in RFC 2231 extended values: everything but attribute-chars.
const EXTENDED_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// MIME content type with parameters.
///
/// Parameters keep their insertion order so that rendering is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "application", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "pkcs7-mime").
    pub sub_type: String,
    parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a text/plain content type in the given charset.
    #[must_use]
    pub fn text_plain(charset: Charset) -> Self {
        Self::new("text", "plain").with_parameter("charset", charset.name())
    }

    /// Creates a text/html content type in the given charset.
    #[must_use]
    pub fn text_html(charset: Charset) -> Self {
        Self::new("text", "html").with_parameter("charset", charset.name())
    }

    /// Creates an application/octet-stream content type.
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Creates a multipart content type with a freshly generated boundary.
    #[must_use]
    pub fn multipart(sub_type: impl Into<String>) -> Self {
        let mut ct = Self::new("multipart", sub_type);
        ct.generate_boundary();
        ct
    }

    /// Adds or replaces a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(key, value);
        self
    }

    /// Adds or replaces a parameter in place.
    ///
    /// Parameter names are case-insensitive; a replaced parameter keeps its
    /// original position.
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into().to_lowercase();
        let value = value.into();
        match self.parameters.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.parameters.push((key, value)),
        }
    }

    /// Sets the `name` parameter.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_parameter("name", name);
        self
    }

    /// Assigns a freshly generated boundary and returns it.
    ///
    /// Any previous boundary is replaced; tokens are never reused.
    pub fn generate_boundary(&mut self) -> Boundary {
        let boundary = Boundary::generate();
        self.set_parameter("boundary", boundary.as_str());
        boundary
    }

    /// Returns a parameter value if present.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over the parameters in order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns the name parameter if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameter("name")
    }

    /// Returns the bare media type (`type/subtype`).
    #[must_use]
    pub fn media_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="quoted value"`
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = split_parameters(s).into_iter();

        let type_str = parts
            .next()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::InvalidContentType("Empty content type".to_string()))?;

        let (main_type, sub_type) = type_str
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype: {s}")))?;
        let main_type = main_type.trim().to_lowercase();
        let sub_type = sub_type.trim().to_lowercase();
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(format!("Incomplete type: {s}")));
        }

        let mut content_type = Self::new(main_type, sub_type);

        for param in parts {
            let param = param.trim();
            if let Some((key, value)) = param.split_once('=') {
                let (key, value) = (key.trim(), value.trim());
                match key.strip_suffix('*') {
                    Some(key) => content_type.set_parameter(key, decode_extended(value)),
                    None => content_type.set_parameter(key, unquote(value)),
                }
            }
        }

        Ok(content_type)
    }
}

/// Splits on `;` outside of quoted strings.
fn split_parameters(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in s.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            ';' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Decodes an RFC 2231 `charset'language'value`; the value is read as UTF-8.
fn decode_extended(value: &str) -> String {
    let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// Values with control or non-ASCII characters cannot sit in a quoted string.
fn needs_extended(value: &str) -> bool {
    value.chars().any(|c| !c.is_ascii() || c.is_ascii_control())
}

fn needs_quoting(key: &str, value: &str) -> bool {
    // File names are always quoted for the benefit of lenient readers.
    key == "name"
        || value.is_empty()
        || value.contains(|c: char| c.is_whitespace() || TSPECIALS.contains(c))
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        for (key, value) in &self.parameters {
            if needs_extended(value) {
                let encoded = utf8_percent_encode(value, EXTENDED_VALUE);
                write!(f, "; {key}*=utf-8''{encoded}")?;
            } else if needs_quoting(key, value) {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "; {key}=\"{escaped}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
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
    fn test_content_type_new() {
        let ct = ContentType::new("text", "plain");
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.parameters().count(), 0);
    }

    #[test]
    fn test_text_plain() {
        let ct = ContentType::text_plain(Charset::UsAscii);
        assert_eq!(ct.media_type(), "text/plain");
        assert_eq!(ct.charset(), Some("us-ascii"));
        assert_eq!(ct.to_string(), "text/plain; charset=us-ascii");
    }

    #[test]
    fn test_text_html() {
        let ct = ContentType::text_html(Charset::Utf8);
        assert_eq!(ct.to_string(), "text/html; charset=utf-8");
        assert!(ct.is_text());
    }

    #[test]
    fn test_multipart_generates_boundary() {
        let ct = ContentType::multipart("mixed");
        assert!(ct.is_multipart());
        let boundary = ct.boundary().unwrap();
        assert!(Boundary::new(boundary).is_ok());
        assert_eq!(ct.to_string(), format!("multipart/mixed; boundary={boundary}"));
    }

    #[test]
    fn test_generate_boundary_replaces_previous() {
        let mut ct = ContentType::multipart("mixed");
        let first = ct.boundary().unwrap().to_string();
        let second = ct.generate_boundary();
        assert_ne!(first, second.as_str());
        assert_eq!(ct.boundary(), Some(second.as_str()));
        assert_eq!(ct.parameters().count(), 1);
    }

    #[test]
    fn test_name_is_always_quoted() {
        let ct = ContentType::new("application", "pkcs7-mime")
            .with_parameter("smime-type", "enveloped-data")
            .with_name("smime.p7m");
        assert_eq!(
            ct.to_string(),
            "application/pkcs7-mime; smime-type=enveloped-data; name=\"smime.p7m\""
        );
        assert_eq!(ct.name(), Some("smime.p7m"));
    }

    #[test]
    fn test_tspecials_are_quoted() {
        let ct = ContentType::new("multipart", "signed")
            .with_parameter("protocol", "application/x-pkcs7-signature")
            .with_parameter("micalg", "sha-256");
        assert_eq!(
            ct.to_string(),
            "multipart/signed; protocol=\"application/x-pkcs7-signature\"; micalg=sha-256"
        );
    }

    #[test]
    fn test_quotes_inside_value_are_escaped() {
        let ct = ContentType::octet_stream().with_name("say \"hi\".txt");
        assert_eq!(
            ct.to_string(),
            "application/octet-stream; name=\"say \\\"hi\\\".txt\""
        );
    }

    #[test]
    fn test_line_breaks_in_name_stay_on_one_line() {
        let ct = ContentType::octet_stream().with_name("a.txt\r\nContent-Type: text/html");
        let rendered = ct.to_string();
        assert_eq!(
            rendered,
            "application/octet-stream; name*=utf-8''a.txt%0D%0AContent-Type%3A%20text%2Fhtml"
        );
        assert!(!rendered.contains(|c: char| c.is_ascii_control()));
    }

    #[test]
    fn test_non_ascii_name_is_extended() {
        let ct = ContentType::octet_stream().with_name("r\u{e9}sum\u{e9}.pdf");
        assert_eq!(
            ct.to_string(),
            "application/octet-stream; name*=utf-8''r%C3%A9sum%C3%A9.pdf"
        );
        assert!(ct.to_string().is_ascii());
    }

    #[test]
    fn test_extended_value_parses_back() {
        for name in ["r\u{e9}sum\u{e9}.pdf", "a.txt\r\nX-Evil: 1", "tab\there"] {
            let ct = ContentType::octet_stream().with_name(name);
            let parsed = ContentType::parse(&ct.to_string()).unwrap();
            assert_eq!(parsed.name(), Some(name));
        }

        let ct = ContentType::parse("image/png; name*=iso-8859-1'en'a%20b.png").unwrap();
        assert_eq!(ct.name(), Some("a b.png"));
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("image/png; name=\"a;b.png\"; X-Flag=1").unwrap();
        assert_eq!(ct.media_type(), "image/png");
        assert_eq!(ct.name(), Some("a;b.png"));
        assert_eq!(ct.parameter("x-flag"), Some("1"));
    }

    #[test]
    fn test_content_type_parse_invalid() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("/plain").is_err());
    }

    #[test]
    fn test_set_parameter_replaces_in_place() {
        let ct = ContentType::new("text", "plain")
            .with_parameter("charset", "iso-8859-1")
            .with_parameter("format", "flowed")
            .with_parameter("CHARSET", "utf-8");

        assert_eq!(ct.charset(), Some("utf-8"));
        assert_eq!(ct.to_string(), "text/plain; charset=utf-8; format=flowed");
    }
}

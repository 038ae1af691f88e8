//! Line-disciplined MIME output.
//!
//! Every line written through [`MimeWriter`] ends with the configured line
//! break, so boundaries and headers always sit on lines of their own.

use std::fmt::Display;

use crate::boundary::Boundary;
use crate::header::{Headers, single_line};

/// Canonical line break for MIME on the wire.
pub const CRLF: &str = "\r\n";

/// Incremental builder for MIME entity bytes.
#[derive(Debug, Clone)]
pub struct MimeWriter {
    out: Vec<u8>,
    line_break: String,
}

impl MimeWriter {
    /// Creates a writer that terminates lines with `line_break`.
    #[must_use]
    pub fn new(line_break: impl Into<String>) -> Self {
        Self {
            out: Vec::new(),
            line_break: line_break.into(),
        }
    }

    /// Returns the line break this writer uses.
    #[must_use]
    pub fn line_break_str(&self) -> &str {
        &self.line_break
    }

    /// Writes a delimiter line (`--boundary`).
    pub fn delimiter(&mut self, boundary: &Boundary) -> &mut Self {
        self.line(&boundary.delimiter())
    }

    /// Writes the closing line (`--boundary--`).
    pub fn terminator(&mut self, boundary: &Boundary) -> &mut Self {
        self.line(&boundary.terminator())
    }

    /// Writes a `Name: value` header line.
    ///
    /// CR and LF in the value are replaced with spaces.
    pub fn header(&mut self, name: &str, value: impl Display) -> &mut Self {
        let value = single_line(&value.to_string());
        self.line(&format!("{name}: {value}"))
    }

    /// Writes every header of the collection in order.
    pub fn headers(&mut self, headers: &Headers) -> &mut Self {
        let rendered = headers.render(&self.line_break);
        self.out.extend_from_slice(rendered.as_bytes());
        self
    }

    /// Writes `text` followed by a line break.
    pub fn line(&mut self, text: &str) -> &mut Self {
        self.out.extend_from_slice(text.as_bytes());
        self.line_break()
    }

    /// Writes a bare line break.
    pub fn line_break(&mut self) -> &mut Self {
        self.out.extend_from_slice(self.line_break.as_bytes());
        self
    }

    /// Writes raw bytes without a line break.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Consumes the writer and returns the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

impl Default for MimeWriter {
    fn default() -> Self {
        Self::new(CRLF)
    }
}

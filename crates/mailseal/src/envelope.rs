//! The unit of exchange between pipeline stages.

use std::borrow::Cow;

use mailseal_mime::encoding::encode_base64_wrapped;
use mailseal_mime::{ContentType, MimeWriter, TransferEncoding};

/// Body bytes plus the metadata needed to place them in a MIME entity.
///
/// A base64 envelope either already holds wrapped base64 text or holds raw
/// bytes that are encoded when the wire body is requested. Either way the
/// encoding happens once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEnvelope {
    body: Vec<u8>,
    content_type: ContentType,
    transfer_encoding: TransferEncoding,
    encoded: bool,
}

impl ContentEnvelope {
    /// Creates an envelope.
    ///
    /// With a base64 transfer encoding and `encode_body` set, `body` is
    /// encoded now (wrapped at 76 columns with `line_break`). Other
    /// encodings take the body as already wire-ready.
    #[must_use]
    pub fn new(
        body: impl Into<Vec<u8>>,
        content_type: ContentType,
        transfer_encoding: TransferEncoding,
        encode_body: bool,
        line_break: &str,
    ) -> Self {
        let body = body.into();
        let (body, encoded) = if !transfer_encoding.is_base64() {
            (body, true)
        } else if encode_body {
            (encode_base64_wrapped(&body, line_break).into_bytes(), true)
        } else {
            (body, false)
        };

        Self {
            body,
            content_type,
            transfer_encoding,
            encoded,
        }
    }

    /// Returns the stored body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the content type.
    #[must_use]
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Returns the transfer encoding.
    #[must_use]
    pub const fn transfer_encoding(&self) -> TransferEncoding {
        self.transfer_encoding
    }

    /// Returns true if the stored body still needs base64 encoding.
    #[must_use]
    pub const fn needs_encoding(&self) -> bool {
        !self.encoded
    }

    /// Returns the body as it appears on the wire.
    #[must_use]
    pub fn wire_body(&self, line_break: &str) -> Cow<'_, [u8]> {
        if self.encoded {
            Cow::Borrowed(&self.body)
        } else {
            Cow::Owned(encode_base64_wrapped(&self.body, line_break).into_bytes())
        }
    }

    /// Renders the envelope as a MIME entity: content headers, a blank line,
    /// then the wire body with no trailing line break.
    #[must_use]
    pub fn to_entity(&self, line_break: &str) -> Vec<u8> {
        let mut writer = MimeWriter::new(line_break);
        writer
            .header("Content-Type", &self.content_type)
            .header("Content-Transfer-Encoding", self.transfer_encoding)
            .line_break()
            .bytes(&self.wire_body(line_break));
        writer.into_bytes()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;
    use mailseal_mime::{CRLF, Charset};

    #[test]
    fn test_pre_encoded_base64() {
        let envelope = ContentEnvelope::new(
            "Hi",
            ContentType::text_plain(Charset::UsAscii),
            TransferEncoding::Base64,
            true,
            CRLF,
        );
        assert_eq!(envelope.body(), b"SGk=");
        assert!(!envelope.needs_encoding());
        assert_eq!(envelope.wire_body(CRLF).as_ref(), b"SGk=");
    }

    #[test]
    fn test_raw_base64_encoded_once_on_wire() {
        let envelope = ContentEnvelope::new(
            vec![0u8, 1, 2],
            ContentType::octet_stream(),
            TransferEncoding::Base64,
            false,
            CRLF,
        );
        assert_eq!(envelope.body(), b"\x00\x01\x02");
        assert!(envelope.needs_encoding());
        assert_eq!(envelope.wire_body(CRLF).as_ref(), b"AAEC");
    }

    #[test]
    fn test_seven_bit_is_untouched() {
        let envelope = ContentEnvelope::new(
            "plain",
            ContentType::text_plain(Charset::UsAscii),
            TransferEncoding::SevenBit,
            true,
            CRLF,
        );
        assert_eq!(envelope.body(), b"plain");
        assert!(!envelope.needs_encoding());
    }

    #[test]
    fn test_entity_layout() {
        let envelope = ContentEnvelope::new(
            "Hi",
            ContentType::text_plain(Charset::UsAscii),
            TransferEncoding::Base64,
            true,
            CRLF,
        );
        assert_eq!(
            envelope.to_entity(CRLF),
            b"Content-Type: text/plain; charset=us-ascii\r\n\
              Content-Transfer-Encoding: base64\r\n\
              \r\n\
              SGk="
        );
    }
}

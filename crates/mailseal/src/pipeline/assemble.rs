//! Unsigned content assembly: a single body part or `multipart/mixed`.

use mailseal_mime::encoding::encode_base64_wrapped;
use mailseal_mime::{Charset, ContentType, MimeWriter, TransferEncoding};
use tracing::{debug, warn};

use crate::attachment::AttachmentSet;
use crate::envelope::ContentEnvelope;

/// Builds the body part envelope.
///
/// The body is base64 in `charset`; `encode` pre-encodes it so the envelope
/// can be embedded as text in an enclosing structure.
#[must_use]
pub fn body_part(
    body: &str,
    charset: Charset,
    is_html: bool,
    encode: bool,
    line_break: &str,
) -> ContentEnvelope {
    if !charset.can_encode(body) {
        warn!(%charset, "body has characters outside its charset, replacing with '?'");
    }

    let content_type = if is_html {
        ContentType::text_html(charset)
    } else {
        ContentType::text_plain(charset)
    };

    ContentEnvelope::new(
        charset.encode(body),
        content_type,
        TransferEncoding::Base64,
        encode,
        line_break,
    )
}

/// Builds the unsigned envelope for a body and its attachments.
///
/// Without attachments this is the body part alone, pre-encoded when `wrap`
/// is set. With attachments it is a `multipart/mixed` entity holding the
/// body part followed by one base64 part per attachment.
#[must_use]
pub fn assemble(
    body: &str,
    charset: Charset,
    is_html: bool,
    attachments: &AttachmentSet,
    wrap: bool,
    line_break: &str,
) -> ContentEnvelope {
    if attachments.is_empty() {
        debug!(%charset, is_html, wrap, "assembled single-part body");
        return body_part(body, charset, is_html, wrap, line_break);
    }

    let mut content_type = ContentType::new("multipart", "mixed");
    let boundary = content_type.generate_boundary();
    let body = body_part(body, charset, is_html, true, line_break);

    let mut writer = MimeWriter::new(line_break);
    writer
        .delimiter(&boundary)
        .bytes(&body.to_entity(line_break))
        .line_break();

    for attachment in attachments {
        writer
            .delimiter(&boundary)
            .header("Content-Type", attachment.content_type())
            .header("Content-Transfer-Encoding", TransferEncoding::Base64)
            .line_break()
            .line(&encode_base64_wrapped(attachment.data(), line_break))
            .line_break();
    }
    writer.terminator(&boundary);

    debug!(
        parts = attachments.len() + 1,
        boundary = %boundary,
        len = writer.len(),
        "assembled multipart/mixed body"
    );

    ContentEnvelope::new(
        writer.into_bytes(),
        content_type,
        TransferEncoding::SevenBit,
        false,
        line_break,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;
    use crate::attachment::Attachment;
    use mailseal_mime::CRLF;
    use mailseal_mime::encoding::decode_base64;

    fn attachments(count: usize) -> AttachmentSet {
        let mut set = AttachmentSet::new();
        for i in 0..count {
            set.add(
                Attachment::from_bytes(format!("file {i}"), format!("f{i}.txt"), Some("text/plain"))
                    .unwrap(),
            );
        }
        set
    }

    #[test]
    fn test_single_part_raw_when_not_wrapped() {
        let envelope = assemble("Hi", Charset::UsAscii, false, &AttachmentSet::new(), false, CRLF);
        assert_eq!(envelope.content_type().to_string(), "text/plain; charset=us-ascii");
        assert_eq!(envelope.transfer_encoding(), TransferEncoding::Base64);
        assert!(envelope.needs_encoding());
        assert_eq!(envelope.body(), b"Hi");
    }

    #[test]
    fn test_single_part_pre_encoded_when_wrapped() {
        let envelope = assemble("Hi", Charset::Utf8, true, &AttachmentSet::new(), true, CRLF);
        assert_eq!(envelope.content_type().to_string(), "text/html; charset=utf-8");
        assert!(!envelope.needs_encoding());
        assert_eq!(envelope.body(), b"SGk=");
    }

    #[test]
    fn test_unrepresentable_characters_replaced() {
        let envelope = body_part("caf\u{e9}", Charset::UsAscii, false, false, CRLF);
        assert_eq!(envelope.body(), b"caf?");
    }

    #[test]
    fn test_mixed_layout() {
        let envelope = assemble("Hi", Charset::UsAscii, false, &attachments(1), false, CRLF);
        let boundary = envelope.content_type().boundary().unwrap().to_string();
        assert_eq!(envelope.content_type().media_type(), "multipart/mixed");
        assert_eq!(envelope.transfer_encoding(), TransferEncoding::SevenBit);
        assert!(!envelope.needs_encoding());

        let expected = format!(
            "--{boundary}\r\n\
             Content-Type: text/plain; charset=us-ascii\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             SGk=\r\n\
             --{boundary}\r\n\
             Content-Type: text/plain; name=\"f0.txt\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             ZmlsZSAw\r\n\
             \r\n\
             --{boundary}--\r\n"
        );
        assert_eq!(String::from_utf8(envelope.body().to_vec()).unwrap(), expected);
    }

    #[test]
    fn test_mixed_part_count() {
        let envelope = assemble("Hi", Charset::UsAscii, false, &attachments(3), false, CRLF);
        let boundary = envelope.content_type().boundary().unwrap().to_string();
        let text = String::from_utf8(envelope.body().to_vec()).unwrap();

        let delimiter = format!("--{boundary}");
        let terminator = format!("--{boundary}--");
        assert_eq!(text.lines().filter(|l| *l == delimiter).count(), 4);
        assert_eq!(text.lines().filter(|l| *l == terminator).count(), 1);
        assert!(text.ends_with(&format!("{terminator}\r\n")));
    }

    #[test]
    fn test_attachment_base64_wrapped() {
        let mut set = AttachmentSet::new();
        let data = vec![0xABu8; 200];
        set.add(Attachment::from_bytes(data.clone(), "big.bin", None).unwrap());

        let envelope = assemble("", Charset::UsAscii, false, &set, false, CRLF);
        let text = String::from_utf8(envelope.body().to_vec()).unwrap();
        let attachment_part = text.split("name=\"big.bin\"").nth(1).unwrap();
        let encoded: String = attachment_part
            .split("\r\n\r\n")
            .nth(1)
            .unwrap()
            .to_string();

        assert!(encoded.split("\r\n").all(|line| line.len() <= 76));
        assert_eq!(decode_base64(&encoded).unwrap(), data);
    }

    #[test]
    fn test_attachment_names_cannot_add_header_lines() {
        let mut set = AttachmentSet::new();
        let injected = "a.txt\r\nContent-Type: text/html";
        set.add(Attachment::from_bytes(b"x".to_vec(), injected, None).unwrap());
        set.add(Attachment::from_bytes(b"y".to_vec(), "r\u{e9}sum\u{e9}.pdf", None).unwrap());

        let envelope = assemble("Hi", Charset::UsAscii, false, &set, false, CRLF);
        let boundary = envelope.content_type().boundary().unwrap().to_string();
        let text = String::from_utf8(envelope.body().to_vec()).unwrap();
        assert!(text.is_ascii());

        let parts: Vec<&str> = text
            .split(&format!("--{boundary}\r\n"))
            .filter(|p| !p.is_empty())
            .collect();
        assert_eq!(parts.len(), 3);
        for part in &parts[1..] {
            let (head, _) = part.split_once("\r\n\r\n").unwrap();
            let lines: Vec<&str> = head.split("\r\n").collect();
            assert_eq!(lines.len(), 2, "unexpected header lines: {lines:?}");
            assert!(lines[0].starts_with("Content-Type: application/octet-stream; name*=utf-8''"));
            assert_eq!(lines[1], "Content-Transfer-Encoding: base64");
        }
        assert!(parts[2].contains("name*=utf-8''r%C3%A9sum%C3%A9.pdf\r\n"));
    }
}

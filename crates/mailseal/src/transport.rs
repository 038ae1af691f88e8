//! Conversion of a composed message into a transport message.

use chrono::{DateTime, Utc};
use mailseal_mime::encoding::encode_rfc2047;
use mailseal_mime::{Charset, ContentType, Headers, MimeWriter, TransferEncoding};
use tracing::debug;

use crate::address::{Address, Mailbox, SecureAddress};
use crate::error::Result;
use crate::message::{DeliveryNotifications, Message, Priority};
use crate::pipeline::{ComposedBody, Composer};

/// The single content part handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateView {
    /// Content type.
    pub content_type: ContentType,
    /// Transfer encoding.
    pub transfer_encoding: TransferEncoding,
    /// Wire-ready body.
    pub body: Vec<u8>,
}

impl From<ComposedBody> for AlternateView {
    fn from(composed: ComposedBody) -> Self {
        Self {
            content_type: composed.content_type,
            transfer_encoding: composed.transfer_encoding,
            body: composed.body,
        }
    }
}

/// A message ready for a mail transport.
///
/// Certificates are dropped; only plain mailboxes remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    /// Date header value.
    pub date: DateTime<Utc>,
    /// Author.
    pub from: Option<Mailbox>,
    /// Sender, when different from the author.
    pub sender: Option<Mailbox>,
    /// Primary recipients.
    pub to: Vec<Mailbox>,
    /// Carbon-copy recipients.
    pub cc: Vec<Mailbox>,
    /// Blind carbon-copy recipients; never rendered into headers.
    pub bcc: Vec<Mailbox>,
    /// Reply-to addresses.
    pub reply_to: Vec<Mailbox>,
    /// Subject line.
    pub subject: String,
    /// Subject charset.
    pub subject_charset: Charset,
    /// Custom headers.
    pub headers: Headers,
    /// Charset for custom header values.
    pub headers_charset: Charset,
    /// Priority.
    pub priority: Priority,
    /// Delivery status notification options.
    pub delivery_notification: DeliveryNotifications,
    /// The composed body.
    pub view: AlternateView,
    /// Line break used for header lines; the composed body already uses it.
    pub line_break: String,
}

fn mailboxes(addresses: &[SecureAddress]) -> Vec<Mailbox> {
    addresses.iter().map(|a| a.mailbox().clone()).collect()
}

impl Message {
    /// Composes the body and copies the envelope fields into a transport
    /// message. The composed body is attached exactly once.
    ///
    /// # Errors
    ///
    /// Returns any composition error.
    pub fn to_transport_message(&self, composer: &Composer) -> Result<TransportMessage> {
        let composed = composer.compose(self)?;
        let default_charset = composer.config().default_charset;

        Ok(TransportMessage {
            date: Utc::now(),
            from: self.from.as_ref().map(|a| a.mailbox().clone()),
            sender: self.sender.as_ref().map(|a| a.mailbox().clone()),
            to: mailboxes(&self.to),
            cc: mailboxes(&self.cc),
            bcc: mailboxes(&self.bcc),
            reply_to: mailboxes(&self.reply_to),
            subject: self.subject.clone(),
            subject_charset: self.subject_charset.unwrap_or(default_charset),
            headers: self.headers.clone(),
            headers_charset: self.headers_charset.unwrap_or(default_charset),
            priority: self.priority,
            delivery_notification: self.delivery_notification.clone(),
            view: composed.into(),
            line_break: composer.config().line_break.clone(),
        })
    }
}

impl TransportMessage {
    /// Returns all envelope recipients (to, cc, bcc).
    #[must_use]
    pub fn all_recipients(&self) -> Vec<&Address> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|m| &m.address)
            .collect()
    }

    fn address_list(&self, mailboxes: &[Mailbox]) -> String {
        mailboxes
            .iter()
            .map(|m| m.to_header_value(self.headers_charset))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Builds the RFC 5322 formatted message.
    ///
    /// Header lines end with [`line_break`](Self::line_break), matching the
    /// composed body. Line breaks inside header values never start a new
    /// header.
    #[must_use]
    pub fn to_rfc5322(&self) -> Vec<u8> {
        let mut writer = MimeWriter::new(self.line_break.as_str());

        writer.header("Date", self.date.to_rfc2822());
        if let Some(from) = &self.from {
            writer.header("From", from.to_header_value(self.headers_charset));
        }
        if let Some(sender) = &self.sender {
            writer.header("Sender", sender.to_header_value(self.headers_charset));
        }
        if !self.to.is_empty() {
            writer.header("To", self.address_list(&self.to));
        }
        if !self.cc.is_empty() {
            writer.header("Cc", self.address_list(&self.cc));
        }
        if !self.reply_to.is_empty() {
            writer.header("Reply-To", self.address_list(&self.reply_to));
        }
        writer.header("Subject", encode_rfc2047(&self.subject, self.subject_charset));

        if let Some(x_priority) = self.priority.x_priority() {
            writer.header("X-Priority", x_priority);
        }
        if let Some(importance) = self.priority.importance() {
            writer.header("Importance", importance);
        }

        let custom: Headers = self
            .headers
            .iter()
            .map(|(name, value)| (name, Headers::encode_value(value, self.headers_charset)))
            .collect();
        writer.headers(&custom);

        writer
            .header("MIME-Version", "1.0")
            .header("Content-Type", &self.view.content_type)
            .header("Content-Transfer-Encoding", self.view.transfer_encoding)
            .line_break()
            .bytes(&self.view.body);

        debug!(
            recipients = self.all_recipients().len(),
            len = writer.len(),
            "rendered transport message"
        );
        writer.into_bytes()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;
    use crate::attachment::Attachment;
    use crate::error::Error;

    fn addr(a: &str) -> SecureAddress {
        SecureAddress::new(a).unwrap()
    }

    fn render(message: &Message) -> String {
        let transport = message.to_transport_message(&Composer::new()).unwrap();
        String::from_utf8(transport.to_rfc5322()).unwrap()
    }

    #[test]
    fn test_conversion_copies_envelope() {
        let mut message = Message::with_text(
            SecureAddress::with_name("Alice", "alice@example.com").unwrap(),
            addr("bob@example.com"),
            "Hello",
            "Hi",
        )
        .cc(addr("carol@example.com"))
        .bcc(addr("dave@example.com"));
        message.priority = Priority::High;

        let transport = message.to_transport_message(&Composer::new()).unwrap();
        assert_eq!(transport.subject, "Hello");
        assert_eq!(transport.subject_charset, Charset::UsAscii);
        assert_eq!(transport.priority, Priority::High);
        assert_eq!(transport.view.content_type.media_type(), "text/plain");
        assert_eq!(transport.view.body, b"SGk=");

        let recipients: Vec<_> = transport
            .all_recipients()
            .into_iter()
            .map(Address::as_str)
            .collect();
        assert_eq!(
            recipients,
            vec!["bob@example.com", "carol@example.com", "dave@example.com"]
        );
    }

    #[test]
    fn test_rfc5322_rendering() {
        let mut message = Message::with_text(
            SecureAddress::with_name("Alice", "alice@example.com").unwrap(),
            addr("bob@example.com"),
            "Hello",
            "Hi",
        )
        .bcc(addr("secret@example.com"));
        message.headers.add("X-Mailer", "mailseal");
        message.priority = Priority::Low;

        let text = render(&message);
        assert!(text.starts_with("Date: "));
        assert!(text.contains("From: Alice <alice@example.com>\r\n"));
        assert!(text.contains("To: bob@example.com\r\n"));
        assert!(text.contains("Subject: Hello\r\n"));
        assert!(text.contains("X-Priority: 5 (Lowest)\r\n"));
        assert!(text.contains("X-Mailer: mailseal\r\n"));
        assert!(text.contains("MIME-Version: 1.0\r\n"));
        assert!(text.contains("Content-Type: text/plain; charset=us-ascii\r\n"));
        assert!(text.ends_with("Content-Transfer-Encoding: base64\r\n\r\nSGk="));
        assert!(!text.contains("secret@example.com"));
    }

    #[test]
    fn test_encoded_subject() {
        let mut message =
            Message::with_text(addr("a@example.com"), addr("b@example.com"), "Caf\u{e9}", "x");
        message.subject_charset = Some(Charset::Utf8);

        let text = render(&message);
        assert!(text.contains("Subject: =?utf-8?B?Q2Fmw6k=?=\r\n"));
    }

    #[test]
    fn test_multipart_rendering() {
        let message = Message::with_text(addr("a@example.com"), addr("b@example.com"), "S", "x")
            .attach(Attachment::from_bytes(b"1".to_vec(), "one.txt", None).unwrap());
        let text = render(&message);
        assert!(text.contains("Content-Type: multipart/mixed; boundary="));
        assert!(text.contains("Content-Transfer-Encoding: 7bit\r\n\r\nThis is a multi-part"));
    }

    fn header_names(text: &str, line_break: &str) -> Vec<String> {
        let (head, _) = text.split_once(&format!("{line_break}{line_break}")).unwrap();
        head.split(line_break)
            .map(|l| l.split_once(':').unwrap().0.to_string())
            .collect()
    }

    #[test]
    fn test_subject_line_break_cannot_add_header() {
        let message = Message::with_text(
            addr("a@example.com"),
            addr("b@example.com"),
            "Hello\r\nBcc: evil@example.com",
            "Hi",
        );

        let text = render(&message);
        assert!(text.contains("Subject: =?us-ascii?B?"));
        assert!(!text.contains("Hello\r\n"));
        assert_eq!(
            header_names(&text, "\r\n"),
            vec![
                "Date",
                "From",
                "To",
                "Subject",
                "MIME-Version",
                "Content-Type",
                "Content-Transfer-Encoding"
            ]
        );
    }

    #[test]
    fn test_display_name_line_break_cannot_add_header() {
        let message = Message::with_text(addr("a@example.com"), addr("b@example.com"), "S", "x");
        let mut transport = message.to_transport_message(&Composer::new()).unwrap();
        let mut eve = Mailbox::new("eve@example.com").unwrap();
        eve.name = Some("Eve\r\nX-Injected: 1".to_string());
        transport.from = Some(eve.clone());
        transport.reply_to = vec![eve];

        let text = String::from_utf8(transport.to_rfc5322()).unwrap();
        let names = header_names(&text, "\r\n");
        assert!(!names.iter().any(|n| n == "X-Injected"), "{names:?}");
        assert!(text.contains(
            "From: =?us-ascii?B?RXZlDQpYLUluamVjdGVkOiAx?= <eve@example.com>\r\n"
        ));
    }

    #[test]
    fn test_rendering_uses_configured_line_break() {
        let composer = Composer::new()
            .with_config(crate::config::ComposeConfig::builder().line_break("\n").build());
        let message = Message::with_text(addr("a@example.com"), addr("b@example.com"), "S", "x")
            .attach(Attachment::from_bytes(b"1".to_vec(), "one.txt", None).unwrap());

        let transport = message.to_transport_message(&composer).unwrap();
        assert_eq!(transport.line_break, "\n");

        let text = String::from_utf8(transport.to_rfc5322()).unwrap();
        assert!(!text.contains('\r'));
        assert!(text.contains("Subject: S\nMIME-Version: 1.0\n"));
        assert!(text.contains("Content-Transfer-Encoding: 7bit\n\nThis is a multi-part"));
    }

    #[test]
    fn test_conversion_propagates_errors() {
        let message =
            Message::with_text(addr("a@example.com"), addr("b@example.com"), "S", "x").signed();
        let err = message.to_transport_message(&Composer::new()).unwrap_err();
        assert!(matches!(err, Error::MissingSigningCertificate(_)));
    }
}

//! Outgoing message model.

use mailseal_mime::{Charset, Headers};

use crate::address::SecureAddress;
use crate::attachment::{Attachment, AttachmentSet};

/// Message priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Priority {
    /// Low priority.
    Low,
    /// Normal priority (no priority headers are written).
    #[default]
    Normal,
    /// High priority.
    High,
}

impl Priority {
    /// Returns the `X-Priority` header value, if any.
    #[must_use]
    pub const fn x_priority(self) -> Option<&'static str> {
        match self {
            Self::Low => Some("5 (Lowest)"),
            Self::Normal => None,
            Self::High => Some("1 (Highest)"),
        }
    }

    /// Returns the `Importance` header value, if any.
    #[must_use]
    pub const fn importance(self) -> Option<&'static str> {
        match self {
            Self::Low => Some("low"),
            Self::Normal => None,
            Self::High => Some("high"),
        }
    }
}

/// Delivery status notification option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryNotification {
    /// Notify on successful delivery.
    OnSuccess,
    /// Notify on delivery failure.
    OnFailure,
    /// Notify when delivery is delayed.
    Delay,
    /// Never notify.
    Never,
}

impl DeliveryNotification {
    /// Returns the SMTP `NOTIFY` keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnSuccess => "SUCCESS",
            Self::OnFailure => "FAILURE",
            Self::Delay => "DELAY",
            Self::Never => "NEVER",
        }
    }
}

/// Set of delivery notification options; empty means none requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryNotifications {
    options: Vec<DeliveryNotification>,
}

impl DeliveryNotifications {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option.
    ///
    /// `Never` excludes every other option, so adding it clears the set and
    /// adding anything else drops `Never`.
    pub fn insert(&mut self, option: DeliveryNotification) {
        if option == DeliveryNotification::Never {
            self.options.clear();
        } else {
            self.options.retain(|o| *o != DeliveryNotification::Never);
        }
        if !self.options.contains(&option) {
            self.options.push(option);
        }
    }

    /// Adds an option, builder style.
    #[must_use]
    pub fn with(mut self, option: DeliveryNotification) -> Self {
        self.insert(option);
        self
    }

    /// Returns true if the option is present.
    #[must_use]
    pub fn contains(&self, option: DeliveryNotification) -> bool {
        self.options.contains(&option)
    }

    /// Returns true if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Returns an iterator over the options.
    pub fn iter(&self) -> impl Iterator<Item = DeliveryNotification> + '_ {
        self.options.iter().copied()
    }

    /// Returns the value of the SMTP `NOTIFY` parameter, if any option is set.
    #[must_use]
    pub fn notify_parameter(&self) -> Option<String> {
        if self.options.is_empty() {
            return None;
        }
        Some(
            self.options
                .iter()
                .map(|o| o.as_str())
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// An outgoing message that can be signed and/or encrypted.
///
/// The composer only reads a message; it never mutates it.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Author address; required for signing and encryption.
    pub from: Option<SecureAddress>,
    /// Sender address, when different from the author.
    pub sender: Option<SecureAddress>,
    /// Primary recipients.
    pub to: Vec<SecureAddress>,
    /// Carbon-copy recipients.
    pub cc: Vec<SecureAddress>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<SecureAddress>,
    /// Reply-to addresses.
    pub reply_to: Vec<SecureAddress>,
    /// Subject line.
    pub subject: String,
    /// Subject charset; the configured default applies when unset.
    pub subject_charset: Option<Charset>,
    /// Custom headers.
    pub headers: Headers,
    /// Charset for custom header values; the configured default applies when unset.
    pub headers_charset: Option<Charset>,
    /// Priority.
    pub priority: Priority,
    /// Delivery status notification options.
    pub delivery_notification: DeliveryNotifications,
    /// Body text.
    pub body: String,
    /// Body charset; the configured default applies when unset.
    pub body_charset: Option<Charset>,
    /// Whether the body is HTML.
    pub is_html: bool,
    /// Attachments.
    pub attachments: AttachmentSet,
    /// Whether to sign.
    pub is_signed: bool,
    /// Whether to encrypt.
    pub is_encrypted: bool,
}

impl Message {
    /// Creates a message from `from` to a single recipient.
    #[must_use]
    pub fn new(from: SecureAddress, to: SecureAddress) -> Self {
        Self {
            from: Some(from),
            to: vec![to],
            ..Self::default()
        }
    }

    /// Creates a message with subject and body text.
    #[must_use]
    pub fn with_text(
        from: SecureAddress,
        to: SecureAddress,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            ..Self::new(from, to)
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: SecureAddress) -> Self {
        self.to.push(recipient);
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: SecureAddress) -> Self {
        self.cc.push(recipient);
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: SecureAddress) -> Self {
        self.bcc.push(recipient);
        self
    }

    /// Adds an attachment; exact duplicates are ignored.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.add(attachment);
        self
    }

    /// Requests a signature.
    #[must_use]
    pub const fn signed(mut self) -> Self {
        self.is_signed = true;
        self
    }

    /// Requests encryption.
    #[must_use]
    pub const fn encrypted(mut self) -> Self {
        self.is_encrypted = true;
        self
    }

    /// Marks the body as HTML.
    #[must_use]
    pub const fn html(mut self) -> Self {
        self.is_html = true;
        self
    }

    /// Returns true if the composed body is multipart.
    ///
    /// Encryption always collapses the body to one opaque part; otherwise
    /// attachments or a signature make it multipart.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.is_encrypted && (!self.attachments.is_empty() || self.is_signed)
    }

    /// Returns To, Cc and Bcc recipients in order.
    pub fn recipients(&self) -> impl Iterator<Item = &SecureAddress> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    fn addr(a: &str) -> SecureAddress {
        SecureAddress::new(a).unwrap()
    }

    fn attachment() -> Attachment {
        Attachment::from_bytes(b"data".to_vec(), "a.bin", None).unwrap()
    }

    #[test]
    fn test_multipart_rule() {
        let plain = Message::new(addr("a@example.com"), addr("b@example.com"));
        assert!(!plain.is_multipart());

        assert!(plain.clone().signed().is_multipart());
        assert!(plain.clone().attach(attachment()).is_multipart());
        assert!(!plain.clone().signed().encrypted().is_multipart());
        assert!(!plain.clone().attach(attachment()).encrypted().is_multipart());
    }

    #[test]
    fn test_with_text() {
        let message =
            Message::with_text(addr("a@example.com"), addr("b@example.com"), "Hello", "Hi");
        assert_eq!(message.subject, "Hello");
        assert_eq!(message.body, "Hi");
        assert_eq!(message.to.len(), 1);
        assert!(message.from.is_some());
        assert_eq!(message.priority, Priority::Normal);
    }

    #[test]
    fn test_recipients_order() {
        let message = Message::new(addr("a@example.com"), addr("to@example.com"))
            .cc(addr("cc@example.com"))
            .bcc(addr("bcc@example.com"));
        let all: Vec<_> = message.recipients().map(|r| r.address().as_str()).collect();
        assert_eq!(all, vec!["to@example.com", "cc@example.com", "bcc@example.com"]);
    }

    #[test]
    fn test_priority_headers() {
        assert_eq!(Priority::High.x_priority(), Some("1 (Highest)"));
        assert_eq!(Priority::Low.importance(), Some("low"));
        assert_eq!(Priority::Normal.x_priority(), None);
    }

    #[test]
    fn test_delivery_notifications() {
        let mut options = DeliveryNotifications::new();
        assert_eq!(options.notify_parameter(), None);

        options.insert(DeliveryNotification::OnSuccess);
        options.insert(DeliveryNotification::OnFailure);
        options.insert(DeliveryNotification::OnSuccess);
        assert_eq!(options.notify_parameter().as_deref(), Some("SUCCESS,FAILURE"));

        options.insert(DeliveryNotification::Never);
        assert_eq!(options.notify_parameter().as_deref(), Some("NEVER"));

        let options = options.with(DeliveryNotification::Delay);
        assert!(!options.contains(DeliveryNotification::Never));
        assert_eq!(options.iter().count(), 1);
    }
}

//! Enveloped-data wrapping (`application/pkcs7-mime`).

use mailseal_mime::{ContentType, TransferEncoding};
use tracing::{debug, trace};

use crate::address::{Address, Certificate};
use crate::crypto::Encrypt;
use crate::envelope::ContentEnvelope;
use crate::error::{Error, Result};
use crate::message::Message;

/// File name of the enveloped-data part.
pub const ENVELOPED_FILE_NAME: &str = "smime.p7m";

/// Collects the certificates to encrypt to.
///
/// The sender's own encryption certificate comes first when present,
/// followed by one certificate per distinct recipient (To, Cc, Bcc, compared
/// case-insensitively).
///
/// # Errors
///
/// Returns [`Error::MissingSender`] without a From address, or
/// [`Error::MissingEncryptionCertificate`] naming the first recipient
/// that has no certificate.
pub fn recipient_certificates(message: &Message) -> Result<Vec<&Certificate>> {
    let from = message.from.as_ref().ok_or(Error::MissingSender)?;

    let mut certificates: Vec<&Certificate> = from.encryption_certificate().into_iter().collect();
    let mut seen: Vec<&Address> = Vec::new();

    for recipient in message.recipients() {
        let address = recipient.address();
        if seen.iter().any(|a| a.matches(address)) {
            continue;
        }
        seen.push(address);

        let certificate = recipient
            .encryption_certificate()
            .ok_or_else(|| Error::MissingEncryptionCertificate(address.to_string()))?;
        certificates.push(certificate);
    }

    Ok(certificates)
}

/// Wraps `content` in a single opaque enveloped-data envelope.
///
/// The plaintext is the content rendered as a MIME entity. The ciphertext is
/// stored raw and base64-encoded once when written to the wire.
///
/// # Errors
///
/// Returns the errors of [`recipient_certificates`],
/// [`Error::EncryptionNotConfigured`] without a backend, or the backend's
/// error. Nothing is returned on failure.
pub fn encrypt(
    content: &ContentEnvelope,
    message: &Message,
    encryptor: Option<&dyn Encrypt>,
    line_break: &str,
) -> Result<ContentEnvelope> {
    let certificates = recipient_certificates(message)?;
    let encryptor = encryptor.ok_or(Error::EncryptionNotConfigured)?;

    let plaintext = content.to_entity(line_break);
    let ciphertext = encryptor.encrypt(&plaintext, &certificates)?;
    trace!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "computed enveloped data"
    );
    debug!(certificates = certificates.len(), "encrypted message body");

    let content_type = ContentType::new("application", "pkcs7-mime")
        .with_parameter("smime-type", "enveloped-data")
        .with_name(ENVELOPED_FILE_NAME);

    Ok(ContentEnvelope::new(
        ciphertext,
        content_type,
        TransferEncoding::Base64,
        false,
        line_break,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;
    use crate::address::SecureAddress;
    use crate::crypto::CryptoError;
    use mailseal_mime::{CRLF, Charset};
    use std::cell::Cell;

    /// Reverses the plaintext and counts calls.
    #[derive(Default)]
    struct ReversingEncryptor {
        calls: Cell<usize>,
        recipients: Cell<usize>,
    }

    impl Encrypt for ReversingEncryptor {
        fn encrypt(
            &self,
            content: &[u8],
            recipients: &[&Certificate],
        ) -> std::result::Result<Vec<u8>, CryptoError> {
            self.calls.set(self.calls.get() + 1);
            self.recipients.set(recipients.len());
            Ok(content.iter().rev().copied().collect())
        }
    }

    fn secure(address: &str, der: u8) -> SecureAddress {
        SecureAddress::new(address)
            .unwrap()
            .with_encryption_certificate(Certificate::from_der(vec![der]))
    }

    fn content() -> ContentEnvelope {
        crate::pipeline::body_part("Hi", Charset::UsAscii, false, true, CRLF)
    }

    #[test]
    fn test_enveloped_data() {
        let message = Message::new(secure("alice@example.com", 1), secure("bob@example.com", 2));
        let encryptor = ReversingEncryptor::default();

        let envelope = encrypt(&content(), &message, Some(&encryptor), CRLF).unwrap();
        assert_eq!(
            envelope.content_type().to_string(),
            "application/pkcs7-mime; smime-type=enveloped-data; name=\"smime.p7m\""
        );
        assert_eq!(envelope.transfer_encoding(), TransferEncoding::Base64);
        assert!(envelope.needs_encoding());

        let mut expected = content().to_entity(CRLF);
        expected.reverse();
        assert_eq!(envelope.body(), expected);
        assert_eq!(encryptor.recipients.get(), 2);
    }

    #[test]
    fn test_distinct_recipients() {
        let message = Message::new(secure("alice@example.com", 1), secure("bob@example.com", 2))
            .cc(secure("BOB@example.com", 2))
            .bcc(secure("carol@example.com", 3));

        let certificates = recipient_certificates(&message).unwrap();
        let ders: Vec<_> = certificates.iter().map(|c| c.as_der()[0]).collect();
        assert_eq!(ders, vec![1, 2, 3]);
    }

    #[test]
    fn test_sender_without_certificate() {
        let message = Message::new(
            SecureAddress::new("alice@example.com").unwrap(),
            secure("bob@example.com", 2),
        );
        assert_eq!(recipient_certificates(&message).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_recipient_certificate() {
        let message = Message::new(secure("alice@example.com", 1), secure("bob@example.com", 2))
            .bcc(SecureAddress::new("eve@example.com").unwrap());
        let encryptor = ReversingEncryptor::default();

        let err = encrypt(&content(), &message, Some(&encryptor), CRLF).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingEncryptionCertificate(ref a) if a == "eve@example.com"
        ));
        assert_eq!(encryptor.calls.get(), 0);
    }

    #[test]
    fn test_requires_sender() {
        let mut message =
            Message::new(secure("alice@example.com", 1), secure("bob@example.com", 2));
        message.from = None;
        let err = encrypt(&content(), &message, None, CRLF).unwrap_err();
        assert!(matches!(err, Error::MissingSender));
    }

    #[test]
    fn test_requires_backend() {
        let message = Message::new(secure("alice@example.com", 1), secure("bob@example.com", 2));
        let err = encrypt(&content(), &message, None, CRLF).unwrap_err();
        assert!(matches!(err, Error::EncryptionNotConfigured));
    }
}

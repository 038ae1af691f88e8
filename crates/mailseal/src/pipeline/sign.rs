//! Detached-signature wrapping (`multipart/signed`).

use mailseal_mime::encoding::encode_base64_wrapped;
use mailseal_mime::{ContentType, MimeWriter, TransferEncoding};
use tracing::{debug, trace};

use crate::crypto::{MICALG, SIGNATURE_PROTOCOL, Sign};
use crate::envelope::ContentEnvelope;
use crate::error::{Error, Result};
use crate::message::Message;

/// File name of the signature part.
pub const SIGNATURE_FILE_NAME: &str = "smime.p7s";

/// Wraps `content` in a `multipart/signed` envelope.
///
/// The signed bytes are the content's headers and wire body exactly as they
/// appear in the first part. The sender's encryption certificate, if any,
/// is embedded in the signature.
///
/// # Errors
///
/// Returns [`Error::MissingSender`] without a From address,
/// [`Error::MissingSigningCertificate`] if the sender cannot sign,
/// [`Error::SigningNotConfigured`] without a backend, or the backend's
/// error. Nothing is returned on failure.
pub fn sign(
    content: &ContentEnvelope,
    message: &Message,
    signer: Option<&dyn Sign>,
    line_break: &str,
) -> Result<ContentEnvelope> {
    let from = message.from.as_ref().ok_or(Error::MissingSender)?;
    let identity = from
        .signing_identity()
        .ok_or_else(|| Error::MissingSigningCertificate(from.address().to_string()))?;
    let signer = signer.ok_or(Error::SigningNotConfigured)?;

    let signed = content.to_entity(line_break);
    let signature = signer.sign(&signed, identity, from.encryption_certificate())?;
    trace!(signed_len = signed.len(), signature_len = signature.len(), "computed signature");

    let mut content_type = ContentType::new("multipart", "signed")
        .with_parameter("protocol", SIGNATURE_PROTOCOL)
        .with_parameter("micalg", MICALG);
    let boundary = content_type.generate_boundary();

    let signature_type = ContentType::new("application", "x-pkcs7-signature")
        .with_name(SIGNATURE_FILE_NAME);

    let mut writer = MimeWriter::new(line_break);
    writer
        .delimiter(&boundary)
        .bytes(&signed)
        .line_break()
        .delimiter(&boundary)
        .header("Content-Type", signature_type)
        .header("Content-Transfer-Encoding", TransferEncoding::Base64)
        .header(
            "Content-Disposition",
            format_args!("attachment; filename=\"{SIGNATURE_FILE_NAME}\""),
        )
        .header("Content-Description", "S/MIME Cryptographic Signature")
        .line_break()
        .line(&encode_base64_wrapped(&signature, line_break))
        .line_break()
        .terminator(&boundary);

    debug!(signer = %from.address(), boundary = %boundary, "signed message body");

    Ok(ContentEnvelope::new(
        writer.into_bytes(),
        content_type,
        TransferEncoding::SevenBit,
        false,
        line_break,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;
    use crate::address::{Certificate, SecureAddress, SigningIdentity};
    use crate::crypto::CryptoError;
    use mailseal_mime::{CRLF, Charset};
    use std::cell::RefCell;

    /// Records what it was asked to sign and returns a fixed signature.
    #[derive(Default)]
    struct RecordingSigner {
        seen: RefCell<Vec<(Vec<u8>, bool)>>,
    }

    impl Sign for RecordingSigner {
        fn sign(
            &self,
            content: &[u8],
            _identity: &SigningIdentity,
            embed: Option<&Certificate>,
        ) -> std::result::Result<Vec<u8>, CryptoError> {
            self.seen.borrow_mut().push((content.to_vec(), embed.is_some()));
            Ok(b"SIG".to_vec())
        }
    }

    fn identity() -> SigningIdentity {
        SigningIdentity::new(Certificate::from_der(vec![1]), vec![2])
    }

    fn message(from: SecureAddress) -> Message {
        Message::new(from, SecureAddress::new("bob@example.com").unwrap()).signed()
    }

    fn content() -> ContentEnvelope {
        crate::pipeline::body_part("Hi", Charset::UsAscii, false, true, CRLF)
    }

    #[test]
    fn test_signed_layout() {
        let from = SecureAddress::new("alice@example.com")
            .unwrap()
            .with_signing_identity(identity());
        let signer = RecordingSigner::default();

        let envelope = sign(&content(), &message(from), Some(&signer), CRLF).unwrap();
        let ct = envelope.content_type();
        let boundary = ct.boundary().unwrap().to_string();

        assert_eq!(ct.media_type(), "multipart/signed");
        assert_eq!(ct.parameter("protocol"), Some("application/x-pkcs7-signature"));
        assert_eq!(ct.parameter("micalg"), Some("sha-256"));
        assert_eq!(envelope.transfer_encoding(), TransferEncoding::SevenBit);

        let expected = format!(
            "--{boundary}\r\n\
             Content-Type: text/plain; charset=us-ascii\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             SGk=\r\n\
             --{boundary}\r\n\
             Content-Type: application/x-pkcs7-signature; name=\"smime.p7s\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             Content-Disposition: attachment; filename=\"smime.p7s\"\r\n\
             Content-Description: S/MIME Cryptographic Signature\r\n\
             \r\n\
             U0lH\r\n\
             \r\n\
             --{boundary}--\r\n"
        );
        assert_eq!(String::from_utf8(envelope.body().to_vec()).unwrap(), expected);

        let seen = signer.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, content().to_entity(CRLF));
        assert!(!seen[0].1);
    }

    #[test]
    fn test_embeds_encryption_certificate() {
        let from = SecureAddress::new("alice@example.com")
            .unwrap()
            .with_shared_certificate(identity());
        let signer = RecordingSigner::default();

        sign(&content(), &message(from), Some(&signer), CRLF).unwrap();
        assert!(signer.seen.borrow()[0].1);
    }

    #[test]
    fn test_requires_sender() {
        let mut message = message(SecureAddress::new("alice@example.com").unwrap());
        message.from = None;
        let err = sign(&content(), &message, None, CRLF).unwrap_err();
        assert!(matches!(err, Error::MissingSender));
    }

    #[test]
    fn test_requires_signing_identity() {
        let signer = RecordingSigner::default();
        let message = message(SecureAddress::new("alice@example.com").unwrap());

        let err = sign(&content(), &message, Some(&signer), CRLF).unwrap_err();
        assert!(matches!(err, Error::MissingSigningCertificate(ref a) if a == "alice@example.com"));
        assert!(signer.seen.borrow().is_empty());
    }

    #[test]
    fn test_requires_backend() {
        let from = SecureAddress::new("alice@example.com")
            .unwrap()
            .with_signing_identity(identity());
        let err = sign(&content(), &message(from), None, CRLF).unwrap_err();
        assert!(matches!(err, Error::SigningNotConfigured));
    }
}

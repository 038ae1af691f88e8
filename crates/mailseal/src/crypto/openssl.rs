//! OpenSSL-backed CMS/PKCS#7 collaborator.

use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::stack::Stack;
use openssl::symm::Cipher;
use openssl::x509::X509;
use tracing::trace;

use super::{CryptoError, Encrypt, Sign};
use crate::address::{Certificate, SigningIdentity};

/// Signs and encrypts with the host OpenSSL library.
///
/// Signatures are detached, binary-safe and carry the signer's whole chain
/// plus OpenSSL's default signed attributes (including signing time).
/// Enveloped-data uses AES-256-CBC.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpensslCms;

impl OpensslCms {
    /// Creates the collaborator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads a certificate from PEM.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM block is not a certificate.
    pub fn certificate_from_pem(pem: &[u8]) -> Result<Certificate, CryptoError> {
        let cert =
            X509::from_pem(pem).map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        Ok(Certificate::from_der(cert.to_der()?))
    }

    /// Loads a signing identity from PEM.
    ///
    /// `certs_pem` holds the signer certificate first, followed by any
    /// issuing certificates.
    ///
    /// # Errors
    ///
    /// Returns an error if no certificate is present or the key is invalid.
    pub fn identity_from_pem(
        certs_pem: &[u8],
        key_pem: &[u8],
    ) -> Result<SigningIdentity, CryptoError> {
        let certs = X509::stack_from_pem(certs_pem)
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        let mut ders = certs
            .iter()
            .map(|c| c.to_der().map(Certificate::from_der))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        let leaf = ders
            .next()
            .ok_or_else(|| CryptoError::InvalidCertificate("no certificate in PEM".to_string()))?;

        let key = PKey::private_key_from_pem(key_pem)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(SigningIdentity::new(leaf, key.private_key_to_der()?).with_chain(ders))
    }
}

fn load_certificate(certificate: &Certificate) -> Result<X509, CryptoError> {
    X509::from_der(certificate.as_der())
        .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))
}

fn load_key(identity: &SigningIdentity) -> Result<PKey<Private>, CryptoError> {
    PKey::private_key_from_der(identity.private_key_der())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

impl Sign for OpensslCms {
    fn sign(
        &self,
        content: &[u8],
        identity: &SigningIdentity,
        embed: Option<&Certificate>,
    ) -> Result<Vec<u8>, CryptoError> {
        let signer = load_certificate(identity.certificate())?;
        let key = load_key(identity)?;

        let mut extra = Stack::<X509>::new()?;
        for cert in identity.chain().iter().chain(embed) {
            extra.push(load_certificate(cert)?)?;
        }

        let signature = Pkcs7::sign(
            &signer,
            &key,
            &extra,
            content,
            Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY,
        )?
        .to_der()?;
        trace!(content_len = content.len(), signature_len = signature.len(), "signed");
        Ok(signature)
    }
}

impl Encrypt for OpensslCms {
    fn encrypt(
        &self,
        content: &[u8],
        recipients: &[&Certificate],
    ) -> Result<Vec<u8>, CryptoError> {
        if recipients.is_empty() {
            return Err(CryptoError::Backend("no recipient certificates".to_string()));
        }

        let mut certs = Stack::<X509>::new()?;
        for cert in recipients {
            certs.push(load_certificate(cert)?)?;
        }

        let enveloped =
            Pkcs7::encrypt(&certs, content, Cipher::aes_256_cbc(), Pkcs7Flags::BINARY)?
                .to_der()?;
        trace!(content_len = content.len(), enveloped_len = enveloped.len(), "encrypted");
        Ok(enveloped)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::similar_names)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::hash::MessageDigest;
    use openssl::rsa::Rsa;
    use openssl::x509::store::X509StoreBuilder;
    use openssl::x509::{X509Builder, X509NameBuilder};

    fn self_signed(cn: &str) -> (X509, PKey<Private>) {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", cn).unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder
            .set_serial_number(&BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap())
            .unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
        builder.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();
        (builder.build(), key)
    }

    fn identity(cert: &X509, key: &PKey<Private>) -> SigningIdentity {
        SigningIdentity::new(
            Certificate::from_der(cert.to_der().unwrap()),
            key.private_key_to_der().unwrap(),
        )
    }

    #[test]
    fn test_detached_signature_verifies() {
        let (cert, key) = self_signed("alice@example.com");
        let content = b"Content-Type: text/plain\r\n\r\nHello";

        let der = OpensslCms::new()
            .sign(content, &identity(&cert, &key), None)
            .unwrap();

        let pkcs7 = Pkcs7::from_der(&der).unwrap();
        let store = X509StoreBuilder::new().unwrap().build();
        let certs = Stack::<X509>::new().unwrap();
        pkcs7
            .verify(
                &certs,
                &store,
                Some(content),
                None,
                Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
            )
            .unwrap();

        // Tampered content must not verify.
        assert!(
            pkcs7
                .verify(
                    &certs,
                    &store,
                    Some(b"tampered"),
                    None,
                    Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
                )
                .is_err()
        );
    }

    #[test]
    fn test_enveloped_data_decrypts() {
        let (cert, key) = self_signed("bob@example.com");
        let recipient = Certificate::from_der(cert.to_der().unwrap());

        let der = OpensslCms::new().encrypt(b"secret", &[&recipient]).unwrap();

        let plain = Pkcs7::from_der(&der)
            .unwrap()
            .decrypt(&key, &cert, Pkcs7Flags::BINARY)
            .unwrap();
        assert_eq!(plain, b"secret");
    }

    #[test]
    fn test_encrypt_requires_recipients() {
        let err = OpensslCms::new().encrypt(b"secret", &[]).unwrap_err();
        assert!(matches!(err, CryptoError::Backend(_)));
    }

    #[test]
    fn test_invalid_certificate() {
        let bogus = Certificate::from_der(vec![1, 2, 3]);
        let err = OpensslCms::new().encrypt(b"x", &[&bogus]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidCertificate(_)));
    }

    #[test]
    fn test_identity_from_pem() {
        let (cert, key) = self_signed("carol@example.com");
        let identity = OpensslCms::identity_from_pem(
            &cert.to_pem().unwrap(),
            &key.private_key_to_pem_pkcs8().unwrap(),
        )
        .unwrap();

        assert_eq!(identity.certificate().as_der(), cert.to_der().unwrap());
        assert!(identity.chain().is_empty());

        let loaded = OpensslCms::certificate_from_pem(&cert.to_pem().unwrap()).unwrap();
        assert_eq!(&loaded, identity.certificate());
    }
}

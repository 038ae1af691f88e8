//! Crypto collaborators for S/MIME signing and encryption.
//!
//! The composition pipeline never touches key material directly. It hands
//! exact byte sequences to a [`Sign`] or [`Encrypt`] implementation and
//! wraps whatever DER blob comes back.

#[cfg(feature = "openssl")]
mod openssl;

#[cfg(feature = "openssl")]
pub use self::openssl::OpensslCms;

use crate::address::{Certificate, SigningIdentity};

/// Digest algorithm announced in `multipart/signed` (`micalg`).
pub const MICALG: &str = "sha-256";

/// Signature protocol announced in `multipart/signed`.
pub const SIGNATURE_PROTOCOL: &str = "application/x-pkcs7-signature";

/// Crypto collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// A certificate could not be decoded.
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// A private key could not be decoded.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// The backend refused or failed the operation.
    #[error("Crypto backend error: {0}")]
    Backend(String),

    /// OpenSSL error.
    #[cfg(feature = "openssl")]
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] ::openssl::error::ErrorStack),
}

/// Produces detached CMS/PKCS#7 signatures.
pub trait Sign {
    /// Signs `content` exactly as given.
    ///
    /// The signature must include the signer's whole certificate chain and a
    /// signing-time attribute. `embed` is an extra certificate (the signer's
    /// encryption certificate) bundled for the recipient's later use.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity is unusable or signing fails.
    fn sign(
        &self,
        content: &[u8],
        identity: &SigningIdentity,
        embed: Option<&Certificate>,
    ) -> Result<Vec<u8>, CryptoError>;
}

/// Produces CMS/PKCS#7 enveloped-data.
pub trait Encrypt {
    /// Encrypts `content` to every certificate in `recipients`.
    ///
    /// # Errors
    ///
    /// Returns an error if a certificate is unusable or encryption fails.
    fn encrypt(&self, content: &[u8], recipients: &[&Certificate]) -> Result<Vec<u8>, CryptoError>;
}

impl<T: Sign + ?Sized> Sign for &T {
    fn sign(
        &self,
        content: &[u8],
        identity: &SigningIdentity,
        embed: Option<&Certificate>,
    ) -> Result<Vec<u8>, CryptoError> {
        (**self).sign(content, identity, embed)
    }
}

impl<T: Encrypt + ?Sized> Encrypt for &T {
    fn encrypt(&self, content: &[u8], recipients: &[&Certificate]) -> Result<Vec<u8>, CryptoError> {
        (**self).encrypt(content, recipients)
    }
}

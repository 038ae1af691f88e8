//! Error types for message composition.

use std::io;

use crate::crypto::CryptoError;

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Identities, certificates or collaborators are missing.
    Configuration,
    /// Caller-supplied content could not be used.
    Input,
    /// The crypto collaborator failed.
    Crypto,
    /// The operation is deliberately not supported.
    Unsupported,
}

/// Composition error types.
///
/// Every error aborts the whole composition; no partial output is produced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The message has no From address.
    #[error("Sender address not specified")]
    MissingSender,

    /// Signing was requested but the sender has no signing identity.
    #[error("Sender '{0}' does not have a signing certificate")]
    MissingSigningCertificate(String),

    /// Encryption was requested but a recipient has no certificate.
    #[error("Email address '{0}' does not have an encryption certificate")]
    MissingEncryptionCertificate(String),

    /// Signing was requested but the composer has no signing backend.
    #[error("Cannot sign message: no signing backend configured")]
    SigningNotConfigured,

    /// Encryption was requested but the composer has no encryption backend.
    #[error("Cannot encrypt message: no encryption backend configured")]
    EncryptionNotConfigured,

    /// An attachment was built without any content source.
    #[error("Attachment has no content source")]
    MissingAttachmentSource,

    /// An attachment source could not be read.
    #[error("Cannot read attachment '{name}': {source}")]
    ReadAttachment {
        /// Attachment name or path.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Signing or encryption failed inside the crypto collaborator.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// MIME construction error.
    #[error("MIME error: {0}")]
    Mime(#[from] mailseal_mime::Error),

    /// Operation not supported.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl Error {
    /// Returns the broad classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSender
            | Self::MissingSigningCertificate(_)
            | Self::MissingEncryptionCertificate(_)
            | Self::SigningNotConfigured
            | Self::EncryptionNotConfigured => ErrorKind::Configuration,
            Self::MissingAttachmentSource
            | Self::ReadAttachment { .. }
            | Self::InvalidAddress(_)
            | Self::Mime(_) => ErrorKind::Input,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Returns true for configuration errors.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::MissingSender.kind(), ErrorKind::Configuration);
        assert!(Error::MissingEncryptionCertificate("a@b.c".into()).is_configuration());
        assert_eq!(Error::MissingAttachmentSource.kind(), ErrorKind::Input);
        assert_eq!(Error::Unsupported("copy_to").kind(), ErrorKind::Unsupported);
        assert_eq!(
            Error::Crypto(CryptoError::Backend("boom".into())).kind(),
            ErrorKind::Crypto
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::MissingEncryptionCertificate("bob@example.com".into()).to_string(),
            "Email address 'bob@example.com' does not have an encryption certificate"
        );
        assert_eq!(
            Error::Unsupported("copy_to").to_string(),
            "copy_to is not supported"
        );
    }
}

//! The composition pipeline.
//!
//! ```text
//! Message -> assemble -> [sign] -> [encrypt] -> serialize -> ComposedBody
//! ```
//!
//! Each stage takes one [`ContentEnvelope`] and returns a new one. Signing
//! always runs before encryption.

mod assemble;
mod encrypt;
mod serialize;
mod sign;

use std::fmt;
use std::sync::Arc;

use mailseal_mime::{ContentType, TransferEncoding};
use tracing::debug;

pub use assemble::{assemble, body_part};
pub use encrypt::{ENVELOPED_FILE_NAME, encrypt, recipient_certificates};
pub use serialize::serialize;
pub use sign::{SIGNATURE_FILE_NAME, sign};

use crate::config::ComposeConfig;
use crate::crypto::{Encrypt, Sign};
use crate::envelope::ContentEnvelope;
use crate::error::Result;
use crate::message::Message;

/// A composed body ready to attach to a transport message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedBody {
    /// Top-level content type.
    pub content_type: ContentType,
    /// Top-level transfer encoding.
    pub transfer_encoding: TransferEncoding,
    /// Wire-ready body bytes.
    pub body: Vec<u8>,
}

/// Runs the composition pipeline with configured crypto collaborators.
#[derive(Clone, Default)]
pub struct Composer {
    config: ComposeConfig,
    signer: Option<Arc<dyn Sign + Send + Sync>>,
    encryptor: Option<Arc<dyn Encrypt + Send + Sync>>,
}

impl Composer {
    /// Creates a composer with default configuration and no crypto backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ComposeConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the signing backend.
    #[must_use]
    pub fn with_signer(mut self, signer: impl Sign + Send + Sync + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Sets the encryption backend.
    #[must_use]
    pub fn with_encryptor(mut self, encryptor: impl Encrypt + Send + Sync + 'static) -> Self {
        self.encryptor = Some(Arc::new(encryptor));
        self
    }

    /// Uses one backend for both signing and encryption.
    #[must_use]
    pub fn with_crypto<C>(mut self, crypto: C) -> Self
    where
        C: Sign + Encrypt + Send + Sync + 'static,
    {
        let crypto = Arc::new(crypto);
        self.signer = Some(crypto.clone());
        self.encryptor = Some(crypto);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Composes the message body.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if signing or encryption is requested
    /// without the needed identities, certificates or backend, or the
    /// backend's error. No partial output is produced.
    pub fn compose(&self, message: &Message) -> Result<ComposedBody> {
        let line_break = self.config.line_break.as_str();
        let charset = message.body_charset.unwrap_or(self.config.default_charset);
        let wrap = message.is_multipart() || message.is_encrypted;

        debug!(
            signed = message.is_signed,
            encrypted = message.is_encrypted,
            attachments = message.attachments.len(),
            "composing message"
        );

        let mut envelope = assemble(
            &message.body,
            charset,
            message.is_html,
            &message.attachments,
            wrap,
            line_break,
        );

        if message.is_signed {
            let signer = self.signer.as_deref().map(|s| s as &dyn Sign);
            envelope = sign(&envelope, message, signer, line_break)?;
        }

        if message.is_encrypted {
            let encryptor = self.encryptor.as_deref().map(|e| e as &dyn Encrypt);
            envelope = encrypt(&envelope, message, encryptor, line_break)?;
        }

        Ok(serialize(&envelope, message.is_multipart(), &self.config))
    }
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("config", &self.config)
            .field("signer", &self.signer.is_some())
            .field("encryptor", &self.encryptor.is_some())
            .finish()
    }
}

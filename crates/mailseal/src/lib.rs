//! # mailseal
//!
//! S/MIME message composition: plain, signed, encrypted and
//! signed-then-encrypted email bodies.
//!
//! ## Features
//!
//! - **Secure addresses**: mailboxes carrying optional signing identities and
//!   encryption certificates
//! - **Attachments**: ordered, duplicate-free attachment sets
//! - **Pipeline**: unsigned assembly, `multipart/signed` detached signatures,
//!   `application/pkcs7-mime` enveloped data, wire serialization
//! - **Pluggable crypto**: [`Sign`] and [`Encrypt`] collaborators, with an
//!   OpenSSL-backed implementation behind the `openssl` feature
//! - **Transport handoff**: explicit conversion into an RFC 5322 message
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailseal::{Composer, Message, SecureAddress};
//! use mailseal::crypto::OpensslCms;
//!
//! let identity = OpensslCms::identity_from_pem(&cert_pem, &key_pem)?;
//! let from = SecureAddress::new("alice@example.com")?.with_shared_certificate(identity);
//! let to = SecureAddress::new("bob@example.com")?
//!     .with_encryption_certificate(OpensslCms::certificate_from_pem(&bob_pem)?);
//!
//! let message = Message::with_text(from, to, "Hello", "Hi Bob").signed().encrypted();
//! let composer = Composer::new().with_crypto(OpensslCms::new());
//!
//! let wire = message.to_transport_message(&composer)?.to_rfc5322();
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Message ──→ assemble ──→ [sign] ──→ [encrypt] ──→ serialize ──→ ComposedBody
//! ```
//!
//! Encryption always collapses the body into a single opaque part; signing
//! or attachments make it multipart otherwise.
//!
//! ## Modules
//!
//! - [`crypto`]: crypto collaborator traits and backends
//! - [`pipeline`]: the composition stages and the [`Composer`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod attachment;
mod config;
pub mod crypto;
mod envelope;
mod error;
mod message;
pub mod pipeline;
mod transport;

pub use address::{
    Address, Certificate, Mailbox, SecureAddress, SecureCapabilities, SigningIdentity,
};
pub use attachment::{Attachment, AttachmentBuilder, AttachmentSet};
pub use config::{ComposeConfig, ComposeConfigBuilder, DEFAULT_PREAMBLE};
pub use crypto::{CryptoError, Encrypt, Sign};
pub use envelope::ContentEnvelope;
pub use error::{Error, ErrorKind, Result};
pub use message::{DeliveryNotification, DeliveryNotifications, Message, Priority};
pub use pipeline::{ComposedBody, Composer};
pub use transport::{AlternateView, TransportMessage};

pub use mailseal_mime::{Charset, ContentType, Headers, TransferEncoding};

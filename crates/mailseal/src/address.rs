//! Addresses and the secure identities attached to them.
//!
//! A [`SecureAddress`] is a plain [`Mailbox`] plus an optional set of
//! certificate capabilities. Signing needs a [`SigningIdentity`] on the
//! sender; encryption needs a [`Certificate`] for every recipient.

use std::fmt;

use mailseal_mime::{Charset, Headers};

use crate::error::{Error, Result};

/// Characters that force a display name into a quoted string (RFC 5322).
const NAME_SPECIALS: &str = "()<>[]:;@\\,.\"";

/// Email address (`local@domain`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares two addresses ignoring ASCII case.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Validates an email address (basic validation).
    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr.contains(|c: char| c.is_whitespace() || c.is_control() || c == '<' || c == '>') {
            return Err(Error::InvalidAddress(format!(
                "Address contains illegal characters: {addr}"
            )));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress("Address must contain @".into()));
        };

        if domain.contains('@') {
            return Err(Error::InvalidAddress(
                "Address must have exactly one @".into(),
            ));
        }

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(
                "Local and domain parts cannot be empty".into(),
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: Address,
}

impl Mailbox {
    /// Creates a new mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: None,
            address: Address::new(address)?,
        })
    }

    /// Creates a new mailbox with a display name and address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the name contains
    /// control characters.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.contains(char::is_control) {
            return Err(Error::InvalidAddress(format!(
                "Display name contains control characters: {name:?}"
            )));
        }
        Ok(Self {
            name: Some(name),
            address: Address::new(address)?,
        })
    }

    /// Renders the mailbox for a header, encoding a display name that is
    /// non-ASCII or contains control characters.
    #[must_use]
    pub fn to_header_value(&self, charset: Charset) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            None => self.address.to_string(),
            Some(name) if !name.is_ascii() || name.contains(char::is_control) => format!(
                "{} <{}>",
                Headers::encode_value(name, charset),
                self.address
            ),
            Some(name) if name.contains(|c: char| NAME_SPECIALS.contains(c)) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{escaped}\" <{}>", self.address)
            }
            Some(name) => format!("{name} <{}>", self.address),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value(Charset::Utf8))
    }
}

/// DER-encoded X.509 certificate handle.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    /// Wraps DER-encoded certificate bytes.
    #[must_use]
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self { der: der.into() }
    }

    /// Returns the DER bytes.
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("der_len", &self.der.len())
            .finish()
    }
}

/// Private key and certificate chain used to produce signatures.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    certificate: Certificate,
    private_key: Vec<u8>,
    chain: Vec<Certificate>,
}

impl SigningIdentity {
    /// Creates an identity from a certificate and its DER (PKCS#8) private key.
    #[must_use]
    pub fn new(certificate: Certificate, private_key_der: impl Into<Vec<u8>>) -> Self {
        Self {
            certificate,
            private_key: private_key_der.into(),
            chain: Vec::new(),
        }
    }

    /// Adds the issuing chain, leaf-most first, excluding the signer itself.
    #[must_use]
    pub fn with_chain(mut self, chain: impl IntoIterator<Item = Certificate>) -> Self {
        self.chain.extend(chain);
        self
    }

    /// Returns the signer certificate.
    #[must_use]
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Returns the DER private key.
    #[must_use]
    pub fn private_key_der(&self) -> &[u8] {
        &self.private_key
    }

    /// Returns the issuing chain.
    #[must_use]
    pub fn chain(&self) -> &[Certificate] {
        &self.chain
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("certificate", &self.certificate)
            .field("private_key", &"<redacted>")
            .field("chain", &self.chain)
            .finish()
    }
}

/// Certificate capabilities carried by an address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecureCapabilities {
    /// Identity used when this address signs.
    pub signing: Option<SigningIdentity>,
    /// Certificate used when encrypting to this address.
    pub encryption: Option<Certificate>,
}

/// An address with optional signing and encryption capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureAddress {
    mailbox: Mailbox,
    capabilities: SecureCapabilities,
}

impl SecureAddress {
    /// Creates an address without any certificates.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Mailbox::new(address)?.into())
    }

    /// Creates an address with a display name and no certificates.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the name contains
    /// control characters.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        Ok(Mailbox::with_name(name, address)?.into())
    }

    /// Sets the certificate used to encrypt to this address.
    #[must_use]
    pub fn with_encryption_certificate(mut self, certificate: Certificate) -> Self {
        self.capabilities.encryption = Some(certificate);
        self
    }

    /// Sets the identity used when this address signs.
    #[must_use]
    pub fn with_signing_identity(mut self, identity: SigningIdentity) -> Self {
        self.capabilities.signing = Some(identity);
        self
    }

    /// Uses one identity for both signing and encryption.
    #[must_use]
    pub fn with_shared_certificate(mut self, identity: SigningIdentity) -> Self {
        self.capabilities.encryption = Some(identity.certificate().clone());
        self.capabilities.signing = Some(identity);
        self
    }

    /// Returns the mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Returns the bare address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.mailbox.address
    }

    /// Returns the capability record.
    #[must_use]
    pub fn capabilities(&self) -> &SecureCapabilities {
        &self.capabilities
    }

    /// Returns the signing identity, if any.
    #[must_use]
    pub fn signing_identity(&self) -> Option<&SigningIdentity> {
        self.capabilities.signing.as_ref()
    }

    /// Returns the encryption certificate, if any.
    #[must_use]
    pub fn encryption_certificate(&self) -> Option<&Certificate> {
        self.capabilities.encryption.as_ref()
    }

    /// Returns true if this address can sign.
    #[must_use]
    pub fn can_sign(&self) -> bool {
        self.capabilities.signing.is_some()
    }

    /// Returns true if messages can be encrypted to this address.
    #[must_use]
    pub fn can_encrypt(&self) -> bool {
        self.capabilities.encryption.is_some()
    }
}

impl From<Mailbox> for SecureAddress {
    fn from(mailbox: Mailbox) -> Self {
        Self {
            mailbox,
            capabilities: SecureCapabilities::default(),
        }
    }
}

impl fmt::Display for SecureAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.mailbox, f)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn identity() -> SigningIdentity {
        SigningIdentity::new(Certificate::from_der(b"cert".to_vec()), b"key".to_vec())
    }

    #[test]
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(Address::new("userexample.com").is_err());
        assert!(Address::new("").is_err());
        assert!(Address::new("@example.com").is_err());
        assert!(Address::new("user@").is_err());
        assert!(Address::new("a@b@c").is_err());
        assert!(Address::new("a b@c.d").is_err());
        assert!(Address::new("a@c.d\r\nBcc: x@y.z").is_err());
    }

    #[test]
    fn test_address_matches_ignores_case() {
        let a = Address::new("Bob@Example.com").unwrap();
        let b = Address::new("bob@example.COM").unwrap();
        assert!(a.matches(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_mailbox_header_value() {
        let plain = Mailbox::new("john@example.com").unwrap();
        assert_eq!(plain.to_header_value(Charset::Utf8), "john@example.com");

        let named = Mailbox::with_name("John Doe", "john@example.com").unwrap();
        assert_eq!(named.to_string(), "John Doe <john@example.com>");

        let quoted = Mailbox::with_name("Doe, John", "john@example.com").unwrap();
        assert_eq!(quoted.to_string(), "\"Doe, John\" <john@example.com>");

        let encoded = Mailbox::with_name("Jürgen", "j@example.com").unwrap();
        assert_eq!(
            encoded.to_header_value(Charset::Utf8),
            "=?utf-8?B?SsO8cmdlbg==?= <j@example.com>"
        );
    }

    #[test]
    fn test_display_name_with_line_break_rejected() {
        let err = Mailbox::with_name("Eve\r\nX-Injected: 1", "eve@example.com").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
        assert!(SecureAddress::with_name("Eve\nX: 1", "eve@example.com").is_err());
    }

    #[test]
    fn test_control_characters_in_name_field_are_encoded() {
        let mut mailbox = Mailbox::new("eve@example.com").unwrap();
        mailbox.name = Some("Eve\r\nX-Injected: 1".to_string());
        assert_eq!(
            mailbox.to_header_value(Charset::UsAscii),
            "=?us-ascii?B?RXZlDQpYLUluamVjdGVkOiAx?= <eve@example.com>"
        );
    }

    #[test]
    fn test_plain_address_has_no_capabilities() {
        let addr = SecureAddress::new("alice@example.com").unwrap();
        assert!(!addr.can_sign());
        assert!(!addr.can_encrypt());
        assert!(addr.signing_identity().is_none());
        assert!(addr.encryption_certificate().is_none());
    }

    #[test]
    fn test_shared_certificate_sets_both() {
        let addr = SecureAddress::with_name("Alice", "alice@example.com")
            .unwrap()
            .with_shared_certificate(identity());
        assert!(addr.can_sign());
        assert_eq!(addr.encryption_certificate().unwrap().as_der(), b"cert");
    }

    #[test]
    fn test_separate_certificates() {
        let addr = SecureAddress::new("alice@example.com")
            .unwrap()
            .with_signing_identity(identity())
            .with_encryption_certificate(Certificate::from_der(b"enc".to_vec()));
        assert_eq!(addr.signing_identity().unwrap().certificate().as_der(), b"cert");
        assert_eq!(addr.encryption_certificate().unwrap().as_der(), b"enc");
    }

    #[test]
    fn test_signing_identity_debug_redacts_key() {
        let debug = format!("{:?}", identity().with_chain([Certificate::from_der(vec![1, 2])]));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("der_len: 2"));
    }
}

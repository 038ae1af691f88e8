//! Multipart boundary tokens.
//!
//! Every multipart body gets its own freshly generated token so that a part
//! taken from one message can never be mistaken for a part of another.

use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::{Error, Result};

/// Prefix shared by every generated token.
const PREFIX: &str = "mailseal-";

/// Number of random alphanumeric characters after the prefix.
const TOKEN_LEN: usize = 40;

/// Longest boundary allowed by RFC 2046.
const MAX_LEN: usize = 70;

/// A multipart boundary token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Generates a fresh random boundary.
    ///
    /// Uses the thread-local RNG, so concurrent callers never share state.
    #[must_use]
    pub fn generate() -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        Self(format!("{PREFIX}{token}"))
    }

    /// Wraps an existing token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty, longer than 70 characters,
    /// ends with a space or contains characters outside the RFC 2046
    /// `bchars` set.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() || token.len() > MAX_LEN {
            return Err(Error::InvalidBoundary(format!(
                "length must be 1..={MAX_LEN}, got {}",
                token.len()
            )));
        }
        if token.ends_with(' ') {
            return Err(Error::InvalidBoundary("trailing space".to_string()));
        }
        if let Some(c) = token.chars().find(|&c| !is_bchar(c)) {
            return Err(Error::InvalidBoundary(format!("illegal character {c:?}")));
        }
        Ok(Self(token))
    }

    /// Returns the bare token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the delimiter line that precedes every part (`--token`).
    #[must_use]
    pub fn delimiter(&self) -> String {
        format!("--{}", self.0)
    }

    /// Returns the line that closes the multipart body (`--token--`).
    #[must_use]
    pub fn terminator(&self) -> String {
        format!("--{}--", self.0)
    }
}

fn is_bchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c)
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Boundary {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_shape() {
        let boundary = Boundary::generate();
        assert!(boundary.as_str().starts_with(PREFIX));
        assert_eq!(boundary.as_str().len(), PREFIX.len() + TOKEN_LEN);
        assert!(boundary.as_str().len() <= MAX_LEN);
        // Generated tokens never need quoting.
        assert!(
            boundary
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        );
    }

    #[test]
    fn test_generate_uniqueness() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(Boundary::generate()), "duplicate boundary");
        }
    }

    #[test]
    fn test_delimiter_and_terminator() {
        let boundary = Boundary::new("abc123").unwrap();
        assert_eq!(boundary.delimiter(), "--abc123");
        assert_eq!(boundary.terminator(), "--abc123--");
        assert_eq!(boundary.to_string(), "abc123");
    }

    #[test]
    fn test_new_rejects_bad_tokens() {
        assert!(Boundary::new("").is_err());
        assert!(Boundary::new("a".repeat(71)).is_err());
        assert!(Boundary::new("ends with space ").is_err());
        assert!(Boundary::new("semi;colon").is_err());
        assert!(Boundary::new("=_Part_0.1").is_ok());
    }

    proptest! {
        #[test]
        fn prop_generated_tokens_are_valid(_seed in 0u8..32) {
            let boundary = Boundary::generate();
            prop_assert!(Boundary::new(boundary.as_str()).is_ok());
        }
    }
}

//! Character sets for message bodies and headers.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Replacement byte for characters the charset cannot represent.
const REPLACEMENT: u8 = b'?';

/// Character set used to turn body or subject text into bytes.
///
/// Defaults to US-ASCII, which is always safe for 7-bit transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Charset {
    /// US-ASCII (7-bit).
    #[default]
    UsAscii,
    /// UTF-8.
    Utf8,
    /// ISO-8859-1 (Latin-1).
    Latin1,
}

impl Charset {
    /// Returns the IANA name used in `charset=` parameters.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UsAscii => "us-ascii",
            Self::Utf8 => "utf-8",
            Self::Latin1 => "iso-8859-1",
        }
    }

    /// Returns true if every character of `text` has a representation.
    #[must_use]
    pub fn can_encode(self, text: &str) -> bool {
        match self {
            Self::UsAscii => text.is_ascii(),
            Self::Utf8 => true,
            Self::Latin1 => text.chars().all(|c| u8::try_from(c).is_ok()),
        }
    }

    /// Encodes `text`, replacing unrepresentable characters with `?`.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::UsAscii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { REPLACEMENT })
                .collect(),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c).unwrap_or(REPLACEMENT))
                .collect(),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "us-ascii" | "ascii" | "us_ascii" => Ok(Self::UsAscii),
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Self::Latin1),
            other => Err(Error::InvalidEncoding(format!("Unsupported charset: {other}"))),
        }
    }
}

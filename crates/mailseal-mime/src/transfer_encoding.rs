//! Content-Transfer-Encoding values.

use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferEncoding {
    /// 7-bit ASCII, line oriented.
    SevenBit,
    /// 8-bit, line oriented.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// Returns true for base64.
    #[must_use]
    pub const fn is_base64(self) -> bool {
        matches!(self, Self::Base64)
    }

    /// Returns true if bodies with this encoding need dot-stuffing before
    /// they reach a line-oriented transport.
    #[must_use]
    pub const fn needs_dot_stuffing(self) -> bool {
        matches!(self, Self::SevenBit)
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-unknown"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_transfer_encoding_display() {
        assert_eq!(TransferEncoding::SevenBit.to_string(), "7bit");
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_dot_stuffing_only_for_seven_bit() {
        assert!(TransferEncoding::SevenBit.needs_dot_stuffing());
        assert!(!TransferEncoding::Base64.needs_dot_stuffing());
        assert!(!TransferEncoding::EightBit.needs_dot_stuffing());
    }
}

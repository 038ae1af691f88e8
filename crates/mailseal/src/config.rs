//! Composition configuration types.

use mailseal_mime::{CRLF, Charset};

/// Fallback text shown by readers that do not understand MIME.
pub const DEFAULT_PREAMBLE: &str = "This is a multi-part message in MIME format.";

/// Composition configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ComposeConfig {
    /// Line break written after every line (CRLF on the wire).
    pub line_break: String,
    /// Preamble line placed before multipart bodies.
    pub multipart_preamble: String,
    /// Charset used when a message does not specify one.
    pub default_charset: Charset,
}

impl ComposeConfig {
    /// Creates a configuration with wire defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            line_break: CRLF.to_string(),
            multipart_preamble: DEFAULT_PREAMBLE.to_string(),
            default_charset: Charset::UsAscii,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ComposeConfigBuilder {
        ComposeConfigBuilder::new()
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for composition configuration.
#[derive(Debug, Clone, Default)]
pub struct ComposeConfigBuilder {
    line_break: Option<String>,
    multipart_preamble: Option<String>,
    default_charset: Option<Charset>,
}

impl ComposeConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the line break token.
    #[must_use]
    pub fn line_break(mut self, line_break: impl Into<String>) -> Self {
        self.line_break = Some(line_break.into());
        self
    }

    /// Sets the multipart preamble line.
    #[must_use]
    pub fn multipart_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.multipart_preamble = Some(preamble.into());
        self
    }

    /// Sets the charset used when a message leaves it unspecified.
    #[must_use]
    pub const fn default_charset(mut self, charset: Charset) -> Self {
        self.default_charset = Some(charset);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ComposeConfig {
        let defaults = ComposeConfig::new();
        ComposeConfig {
            line_break: self.line_break.unwrap_or(defaults.line_break),
            multipart_preamble: self.multipart_preamble.unwrap_or(defaults.multipart_preamble),
            default_charset: self.default_charset.unwrap_or(defaults.default_charset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ComposeConfig::default();
        assert_eq!(config.line_break, "\r\n");
        assert_eq!(config.multipart_preamble, DEFAULT_PREAMBLE);
        assert_eq!(config.default_charset, Charset::UsAscii);
    }

    #[test]
    fn test_config_builder() {
        let config = ComposeConfig::builder()
            .line_break("\n")
            .default_charset(Charset::Utf8)
            .build();

        assert_eq!(config.line_break, "\n");
        assert_eq!(config.default_charset, Charset::Utf8);
        assert_eq!(config.multipart_preamble, DEFAULT_PREAMBLE);
    }
}

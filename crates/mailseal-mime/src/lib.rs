//! # mailseal-mime
//!
//! MIME building blocks for composing email bodies.
//!
//! ## Features
//!
//! - **Content types**: ordered parameters, quoting, parsing
//! - **Boundaries**: random, collision-resistant multipart delimiters
//! - **Encoding**: Base64 wrapped at 76 columns, RFC 2047 header words,
//!   dot-stuffing
//! - **Writing**: CRLF-disciplined construction of MIME entities
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailseal_mime::{Charset, ContentType, MimeWriter, TransferEncoding};
//! use mailseal_mime::encoding::encode_base64_wrapped;
//!
//! let mut mixed = ContentType::new("multipart", "mixed");
//! let boundary = mixed.generate_boundary();
//!
//! let mut writer = MimeWriter::default();
//! writer
//!     .delimiter(&boundary)
//!     .header("Content-Type", ContentType::text_plain(Charset::UsAscii))
//!     .header("Content-Transfer-Encoding", TransferEncoding::Base64)
//!     .line_break()
//!     .line(&encode_base64_wrapped(b"Hello", "\r\n"))
//!     .terminator(&boundary);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod boundary;
mod charset;
mod content_type;
mod error;
mod header;
mod transfer_encoding;
mod writer;

pub mod encoding;

pub use boundary::Boundary;
pub use charset::Charset;
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use transfer_encoding::TransferEncoding;
pub use writer::{CRLF, MimeWriter};

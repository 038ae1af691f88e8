//! Final envelope serialization.

use mailseal_mime::MimeWriter;
use mailseal_mime::encoding::dot_stuff;
use tracing::debug;

use super::ComposedBody;
use crate::config::ComposeConfig;
use crate::envelope::ContentEnvelope;

/// Turns the final envelope into a wire-ready body.
///
/// Multipart bodies are preceded by the configured preamble and a blank
/// line. Seven-bit bodies are dot-stuffed; the preamble never is.
#[must_use]
pub fn serialize(
    envelope: &ContentEnvelope,
    is_multipart: bool,
    config: &ComposeConfig,
) -> ComposedBody {
    let line_break = config.line_break.as_str();
    let mut writer = MimeWriter::new(line_break);

    if is_multipart {
        writer.line(&config.multipart_preamble).line_break();
    }

    let body = envelope.wire_body(line_break);
    if envelope.transfer_encoding().needs_dot_stuffing() {
        writer.bytes(&dot_stuff(&body));
    } else {
        writer.bytes(&body);
    }

    debug!(
        content_type = %envelope.content_type(),
        transfer_encoding = %envelope.transfer_encoding(),
        len = writer.len(),
        "serialized body"
    );

    ComposedBody {
        content_type: envelope.content_type().clone(),
        transfer_encoding: envelope.transfer_encoding(),
        body: writer.into_bytes(),
    }
}

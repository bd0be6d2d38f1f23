use crate::error::{Error, Result};
use crate::gmail_api::client::GmailApi;
use crate::types::OutboundMessage;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::engine::Engine;
use std::io::Write;
use tracing::{info, warn};

/// RFC 2047 encoded-word for header values that are not plain ASCII.
pub fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?utf-8?b?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

/// Composes the RFC 2822 envelope for a plain-text message.
pub fn build_envelope(message: &OutboundMessage) -> String {
    let mut email_content = String::new();

    email_content.push_str(&format!("To: {}\r\n", message.to));
    email_content.push_str(&format!("From: {}\r\n", message.from));
    email_content.push_str(&format!(
        "Subject: {}\r\n",
        encode_header_value(&message.subject)
    ));
    email_content.push_str("MIME-Version: 1.0\r\n");
    email_content.push_str("Content-Type: text/plain; charset=\"utf-8\"\r\n");
    email_content.push_str("Content-Transfer-Encoding: 8bit\r\n");
    email_content.push_str("\r\n");

    email_content.push_str(&message.body);
    email_content
}

/// URL-safe base64, padding kept, as `messages.send` expects in `raw`.
pub fn encode_envelope(envelope: &str) -> String {
    URL_SAFE.encode(envelope.as_bytes())
}

/// Sends one message and reports the assigned id.
///
/// Transport failures are reported to `out` and yield `Ok(None)`. A response
/// without an id, or a failure to write the report, is returned as an error.
pub async fn send_email<A, W>(
    api: &A,
    out: &mut W,
    message: &OutboundMessage,
) -> Result<Option<String>>
where
    A: GmailApi + ?Sized,
    W: Write,
{
    let encoded_email = encode_envelope(&build_envelope(message));

    match api.send_raw(&encoded_email).await {
        Ok(sent) => {
            let id = sent.id.ok_or(Error::MissingField("id"))?;
            info!("Message sent with id {}", id);
            writeln!(out, "Email has been sent with the following id: {}", id)?;
            Ok(Some(id))
        }
        Err(e) if e.is_transport() => {
            warn!("Sending failed: {}", e);
            writeln!(out, "An error occurred: {}", e)?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

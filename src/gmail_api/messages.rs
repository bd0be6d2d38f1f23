use crate::email_content::{decode_first_part, extract_body_markup, last_header_value};
use crate::error::{Error, Result};
use crate::gmail_api::client::GmailApi;
use crate::types::Message;
use std::io::Write;
use tracing::debug;

const SEPARATOR_WIDTH: usize = 69;

/// What gets printed for one inbox message.
#[derive(Debug, Clone, PartialEq)]
pub struct InboxEntry {
    pub subject: String,
    pub from: String,
    pub body: String,
}

/// Extracts subject, sender and `<body>` markup from a fully fetched message.
pub fn read_message(message: &Message) -> Result<InboxEntry> {
    let payload = message
        .payload
        .as_ref()
        .ok_or(Error::MissingField("payload"))?;
    let headers = payload
        .headers
        .as_deref()
        .ok_or(Error::MissingField("headers"))?;

    let subject = last_header_value(headers, "Subject").unwrap_or_default();
    let from = last_header_value(headers, "From").unwrap_or_default();

    let decoded = decode_first_part(payload)?;
    let body = extract_body_markup(&decoded)?;

    Ok(InboxEntry {
        subject: subject.to_string(),
        from: from.to_string(),
        body,
    })
}

fn print_entry<W: Write>(out: &mut W, entry: &InboxEntry) -> std::io::Result<()> {
    writeln!(out, "Subject: {}", entry.subject)?;
    writeln!(out, "From: {}", entry.from)?;
    writeln!(out, "Message: {}", entry.body)?;
    writeln!(out, "\n\n{}\n\n", "-".repeat(SEPARATOR_WIDTH))
}

/// Prints up to `count` of the most recent messages.
///
/// A message that cannot be read is skipped; listing and fetching failures
/// are returned to the caller.
pub async fn list_recent<A, W>(api: &A, out: &mut W, count: u32) -> Result<usize>
where
    A: GmailApi + ?Sized,
    W: Write,
{
    let message_refs = api.list_messages(count).await?;
    let mut printed = 0;

    for msg_ref in &message_refs {
        let Some(id) = msg_ref.id.as_deref() else {
            continue;
        };
        let message = api.get_message(id).await?;

        match read_message(&message) {
            Ok(entry) => {
                print_entry(out, &entry)?;
                printed += 1;
            }
            Err(e) => debug!("Skipping message {}: {}", id, e),
        }
    }

    Ok(printed)
}

use crate::email_content::first_header_value;
use crate::error::{Error, Result};
use crate::gmail_api::client::GmailApi;
use crate::types::{Thread, ThreadRef};
use std::io::Write;
use tracing::warn;

pub const MAX_THREADS: u32 = 100;

/// Threads with at most this many messages are not reported.
const MIN_REPORTED_LEN: usize = 2;

/// Subject of the first message when the thread has more than two messages.
///
/// Missing messages, payload or headers are errors; a thread that is simply
/// short, or has no Subject header, yields `Ok(None)`.
pub fn long_thread_subject(thread: &Thread) -> Result<Option<(String, usize)>> {
    let messages = thread
        .messages
        .as_deref()
        .ok_or(Error::MissingField("messages"))?;
    if messages.len() <= MIN_REPORTED_LEN {
        return Ok(None);
    }

    let headers = messages[0]
        .payload
        .as_ref()
        .and_then(|p| p.headers.as_deref())
        .ok_or(Error::MissingField("headers"))?;

    Ok(first_header_value(headers, "Subject")
        .filter(|subject| !subject.is_empty())
        .map(|subject| (subject.to_string(), messages.len())))
}

async fn report_long_threads<A, W>(api: &A, out: &mut W) -> Result<Vec<ThreadRef>>
where
    A: GmailApi + ?Sized,
    W: Write,
{
    let threads = api.list_threads(MAX_THREADS).await?;
    for thread_ref in &threads {
        let id = thread_ref.id.as_deref().ok_or(Error::MissingField("id"))?;
        let thread = api.get_thread(id).await?;
        if let Some((subject, count)) = long_thread_subject(&thread)? {
            writeln!(out, "- {}, {}", subject, count)?;
        }
    }
    Ok(threads)
}

/// Prints every listed thread longer than two messages and returns the full,
/// unfiltered thread list.
///
/// Transport failures anywhere in the run are reported and yield `Ok(None)`.
/// Malformed thread data is not isolated per thread and aborts the run.
pub async fn summarize_long_threads<A, W>(api: &A, out: &mut W) -> Result<Option<Vec<ThreadRef>>>
where
    A: GmailApi + ?Sized,
    W: Write,
{
    match report_long_threads(api, out).await {
        Ok(threads) => Ok(Some(threads)),
        Err(e) if e.is_transport() => {
            warn!("Thread listing failed: {}", e);
            writeln!(out, "An error occurred: {}", e)?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

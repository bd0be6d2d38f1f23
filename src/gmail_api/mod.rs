//! Gmail API module split into logical submodules
//!
//! - auth: credential loading, refresh and the interactive flow
//! - client: the remote operations and their reqwest implementation
//! - operations: sending mail
//! - messages: inbox listing
//! - threads: long-thread summaries

pub mod auth;
pub mod client;
pub mod messages;
pub mod operations;
pub mod threads;

pub use auth::{get_credentials, Credential, CredentialManager};
pub use client::{GmailApi, GmailClient};
pub use messages::list_recent;
pub use operations::send_email;
pub use threads::summarize_long_threads;

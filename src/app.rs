use crate::cli::{print_menu, prompt, MenuChoice};
use crate::config::Config;
use crate::error::Result;
use crate::gmail_api::{
    get_credentials, list_recent, send_email, summarize_long_threads, GmailClient,
};
use crate::types::OutboundMessage;
use std::io::{BufRead, Write};
use tracing::info;

const WRONG_INPUT: &str = "Wrong input.";

// Every operation authenticates on its own and opens a fresh session.
async fn open_session(config: &Config) -> Result<GmailClient> {
    let credential = get_credentials(config).await?;
    Ok(GmailClient::new(
        reqwest::Client::new(),
        credential.access_token,
        &config.api_base,
    ))
}

/// Shows the menu, reads one choice and runs it to completion.
pub async fn run<R: BufRead, W: Write>(config: &Config, input: &mut R, out: &mut W) -> Result<()> {
    print_menu(out)?;
    let choice = prompt(input, out, "")?;

    let Some(choice) = MenuChoice::parse(&choice) else {
        writeln!(out, "{}", WRONG_INPUT)?;
        return Ok(());
    };
    info!("Menu choice: {:?}", choice);

    match choice {
        MenuChoice::Send => {
            let from = prompt(input, out, "Enter your email address: ")?;
            let to = prompt(input, out, "Enter the receiver's email address: ")?;
            let subject = prompt(input, out, "Enter the subject of the email: ")?;
            let body = prompt(input, out, "Enter the body of the email:\n")?;
            let message = OutboundMessage {
                from,
                to,
                subject,
                body,
            };

            let session = open_session(config).await?;
            send_email(&session, out, &message).await?;
        }
        MenuChoice::Inbox => {
            let answer = prompt(
                input,
                out,
                "Enter number of messages you would like to see from your inbox (latest first): ",
            )?;
            let Ok(count) = answer.trim().parse::<u32>() else {
                writeln!(out, "{}", WRONG_INPUT)?;
                return Ok(());
            };

            let session = open_session(config).await?;
            let printed = list_recent(&session, out, count).await?;
            info!("Displayed {} messages", printed);
        }
        MenuChoice::Threads => {
            let session = open_session(config).await?;
            if let Some(threads) = summarize_long_threads(&session, out).await? {
                info!("Scanned {} threads", threads.len());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_invalid_choice_exits_without_authenticating() {
        // Paths that do not exist: reaching authentication would fail.
        let config = Config::new("/nonexistent/credentials.json", "/nonexistent/token.json");
        let mut input = Cursor::new("7\n");
        let mut out = Vec::new();

        run(&config, &mut input, &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("3) Get your recent threads"));
        assert!(output.ends_with("Wrong input.\n"));
    }

    #[tokio::test]
    async fn test_invalid_message_count_exits_without_authenticating() {
        let config = Config::new("/nonexistent/credentials.json", "/nonexistent/token.json");
        let mut input = Cursor::new("2\nmany\n");
        let mut out = Vec::new();

        run(&config, &mut input, &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("Wrong input.\n"));
    }

    #[tokio::test]
    async fn test_missing_client_secret_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("credentials.json"), dir.path().join("token.json"));
        let mut input = Cursor::new("3\n");
        let mut out = Vec::new();

        let err = run(&config, &mut input, &mut out).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Storage { .. }));
    }
}

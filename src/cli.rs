use crate::config::{Config, DEFAULT_CREDENTIALS_FILE, DEFAULT_TOKEN_FILE};
use crate::gmail_api::auth::{CredentialStore, FileCredentialStore};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// OAuth client secret downloaded from the Google Cloud console.
    #[clap(long, default_value = DEFAULT_CREDENTIALS_FILE)]
    pub credentials: PathBuf,

    /// Token cache, created after the first authorization.
    #[clap(long, default_value = DEFAULT_TOKEN_FILE)]
    pub token: PathBuf,

    /// Delete the cached token and exit.
    #[clap(long)]
    pub clear_token: bool,

    /// Log more to stderr (repeat for more detail).
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config::new(&self.credentials, &self.token)
    }
}

pub fn handle_token_clear(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileCredentialStore::new(&config.token_path);
    if store.clear()? {
        println!("Token removed from {}. Exiting.", store.path().display());
    } else {
        println!("No token stored at {}.", store.path().display());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Send,
    Inbox,
    Threads,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().parse::<u32>().ok()? {
            1 => Some(MenuChoice::Send),
            2 => Some(MenuChoice::Inbox),
            3 => Some(MenuChoice::Threads),
            _ => None,
        }
    }
}

pub fn print_menu<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Rust Script to Interact with Gmail")?;
    writeln!(out, "Would you like to: ")?;
    writeln!(out, "1) Send email")?;
    writeln!(out, "2) See your inbox")?;
    writeln!(out, "3) Get your recent threads")?;
    out.flush()
}

/// Writes `prompt` and reads one line, without the trailing newline.
pub fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    prompt: &str,
) -> std::io::Result<String> {
    write!(out, "{}", prompt)?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::Send));
        assert_eq!(MenuChoice::parse(" 2\n"), Some(MenuChoice::Inbox));
        assert_eq!(MenuChoice::parse("3"), Some(MenuChoice::Threads));
        assert_eq!(MenuChoice::parse("4"), None);
        assert_eq!(MenuChoice::parse("send"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[test]
    fn test_prompt_strips_line_ending() {
        let mut input = Cursor::new("hello world\r\nnext\n");
        let mut out = Vec::new();
        let line = prompt(&mut input, &mut out, "Say: ").unwrap();
        assert_eq!(line, "hello world");
        assert_eq!(out, b"Say: ");
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["quickmail"]);
        let config = cli.config();
        assert_eq!(config.credentials_path, PathBuf::from("credentials.json"));
        assert_eq!(config.token_path, PathBuf::from("token.json"));
        assert!(!cli.clear_token);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["quickmail", "--token", "/tmp/t.json", "-vv", "--clear-token"]);
        assert_eq!(cli.token, PathBuf::from("/tmp/t.json"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.clear_token);
    }
}

use std::path::PathBuf;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.readonly",
];

/// Where the client secret and token cache live, and what to ask for.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub scopes: Vec<String>,
    pub api_base: String,
}

impl Config {
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            api_base: GMAIL_API_BASE.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIALS_FILE, DEFAULT_TOKEN_FILE)
    }
}

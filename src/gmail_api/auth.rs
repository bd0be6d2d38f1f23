use crate::config::{Config, DEFAULT_TOKEN_URI};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use yup_oauth2::storage::{TokenInfo, TokenStorage};
use yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod};

/// A token counts as expired this many seconds before its real expiry.
const EXPIRY_SKEW_SECS: i64 = 225;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Token bundle as cached in `token.json` (authorized-user layout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    // Absent when the cache only holds a refresh token
    #[serde(rename = "token", default)]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expiry: None,
            scopes: Vec::new(),
            token_uri: default_token_uri(),
            client_id: None,
            client_secret: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_client(mut self, client_id: &str, client_secret: &str, token_uri: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self.client_secret = Some(client_secret.to_string());
        self.token_uri = token_uri.to_string();
        self
    }

    /// A credential without an expiry never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now)
    }

    /// New credential carrying the refreshed access token. The old refresh
    /// token is kept unless the server rotated it.
    pub fn refreshed(&self, response: RefreshResponse, now: DateTime<Utc>) -> Self {
        let mut credential = self.clone();
        credential.access_token = response.access_token;
        let lifetime = response.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
        credential.expiry = Some(now + Duration::seconds(lifetime));
        if let Some(rotated) = response.refresh_token {
            credential.refresh_token = Some(rotated);
        }
        if let Some(scope) = response.scope {
            credential.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
        credential
    }
}

/// Token endpoint answer to a `refresh_token` grant.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

// Define a trait for credential persistence to allow mocking
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credential>>;
    fn save(&self, credential: &Credential) -> Result<()>;
    /// Returns whether anything was removed.
    fn clear(&self) -> Result<bool>;
}

/// Stores the credential as JSON at a fixed path, overwriting on save.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, source: std::io::Error) -> Error {
        Error::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error(e)),
        }
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        let contents = serde_json::to_string_pretty(credential)?;
        std::fs::write(&self.path, contents).map_err(|e| self.storage_error(e))
    }

    fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.storage_error(e)),
        }
    }
}

// Define a trait for the interactive flow so tests never open a browser
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, scopes: Vec<String>) -> Result<Credential>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, credential: &Credential) -> Result<Credential>;
}

// Keeps whatever the authenticator hands to its storage so the refresh
// token can be read back after the flow.
#[derive(Clone, Default)]
struct CapturedToken(Arc<Mutex<Option<TokenInfo>>>);

impl CapturedToken {
    fn take(&self) -> Option<TokenInfo> {
        self.0.lock().ok().and_then(|mut guard| guard.take())
    }
}

#[async_trait]
impl TokenStorage for CapturedToken {
    async fn set(&self, _scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| anyhow::anyhow!("token capture lock poisoned"))?;
        *guard = Some(token);
        Ok(())
    }

    async fn get(&self, _scopes: &[&str]) -> Option<TokenInfo> {
        self.0.lock().ok().and_then(|guard| guard.clone())
    }
}

/// Installed-app flow: listens on a local port and blocks until the user
/// completes the consent screen in a browser.
pub struct InstalledFlowAuthorizer {
    secret_path: PathBuf,
}

impl InstalledFlowAuthorizer {
    pub fn new(secret_path: impl Into<PathBuf>) -> Self {
        Self {
            secret_path: secret_path.into(),
        }
    }
}

#[async_trait]
impl Authorizer for InstalledFlowAuthorizer {
    async fn authorize(&self, scopes: Vec<String>) -> Result<Credential> {
        let secret = yup_oauth2::read_application_secret(&self.secret_path)
            .await
            .map_err(|source| Error::Storage {
                path: self.secret_path.clone(),
                source,
            })?;

        let captured = CapturedToken::default();
        let auth = InstalledFlowAuthenticator::builder(
            secret.clone(),
            InstalledFlowReturnMethod::HTTPRedirect,
        )
        .with_storage(Box::new(captured.clone()))
        .build()
        .await
        .map_err(|e| Error::Authorization(e.to_string()))?;

        let scope_refs: Vec<&str> = scopes.iter().map(|s| s.as_str()).collect();
        let token = auth
            .token(&scope_refs)
            .await
            .map_err(|e| Error::Authorization(e.to_string()))?;

        let access_token = token
            .token()
            .ok_or_else(|| Error::Authorization("no access token returned".to_string()))?;
        let mut credential = Credential::new(access_token)
            .with_scopes(scopes.clone())
            .with_client(&secret.client_id, &secret.client_secret, &secret.token_uri);
        if let Some(expiry) = token
            .expiration_time()
            .and_then(|t| DateTime::from_timestamp(t.unix_timestamp(), 0))
        {
            credential = credential.with_expiry(expiry);
        }
        if let Some(refresh_token) = captured.take().and_then(|info| info.refresh_token) {
            credential = credential.with_refresh_token(refresh_token);
        }
        Ok(credential)
    }
}

/// Exchanges a refresh token at the credential's token endpoint.
pub struct OAuthRefresher {
    client: reqwest::Client,
}

impl OAuthRefresher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenRefresher for OAuthRefresher {
    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| Error::Refresh("no refresh token available".to_string()))?;
        let client_id = credential
            .client_id
            .as_deref()
            .ok_or_else(|| Error::Refresh("no client id stored with token".to_string()))?;

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ];
        if let Some(secret) = credential.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        let response = self
            .client
            .post(&credential.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Refresh(format!("{}: {}", status, error_text)));
        }

        let refreshed: RefreshResponse = response.json().await?;
        Ok(credential.refreshed(refreshed, Utc::now()))
    }
}

/// Produces a usable credential: cached, refreshed once, or freshly authorized.
pub struct CredentialManager<S, A, R> {
    store: S,
    authorizer: A,
    refresher: R,
    scopes: Vec<String>,
}

impl CredentialManager<FileCredentialStore, InstalledFlowAuthorizer, OAuthRefresher> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FileCredentialStore::new(&config.token_path),
            InstalledFlowAuthorizer::new(&config.credentials_path),
            OAuthRefresher::new(reqwest::Client::new()),
            config.scopes.clone(),
        )
    }
}

impl<S: CredentialStore, A: Authorizer, R: TokenRefresher> CredentialManager<S, A, R> {
    pub fn new(store: S, authorizer: A, refresher: R, scopes: Vec<String>) -> Self {
        Self {
            store,
            authorizer,
            refresher,
            scopes,
        }
    }

    pub async fn get_credentials(&self) -> Result<Credential> {
        self.get_credentials_at(Utc::now()).await
    }

    pub async fn get_credentials_at(&self, now: DateTime<Utc>) -> Result<Credential> {
        let stored = self.store.load()?;

        if let Some(credential) = &stored {
            if credential.is_valid_at(now) {
                debug!("Using cached credential");
                return Ok(credential.clone());
            }
        }

        let credential = match stored {
            Some(unusable) if unusable.refresh_token.is_some() => {
                info!("Access token expired or missing, refreshing");
                match self.refresher.refresh(&unusable).await {
                    Ok(refreshed) => refreshed,
                    Err(e) => {
                        warn!("Token refresh failed, falling back to authorization: {}", e);
                        self.authorize().await?
                    }
                }
            }
            _ => self.authorize().await?,
        };

        self.store.save(&credential)?;
        debug!("Credential persisted");
        Ok(credential)
    }

    async fn authorize(&self) -> Result<Credential> {
        info!("Starting interactive authorization");
        self.authorizer.authorize(self.scopes.clone()).await
    }
}

// Main authentication function
pub async fn get_credentials(config: &Config) -> Result<Credential> {
    CredentialManager::from_config(config)
        .get_credentials()
        .await
}

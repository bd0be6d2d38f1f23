use crate::error::{Error, Result};
use crate::types::{
    Message, MessageRef, MessagesResponse, SentMessage, Thread, ThreadRef, ThreadsResponse,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

/// The slice of the Gmail REST API this tool talks to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GmailApi: Send + Sync {
    /// `messages.send` with an already encoded envelope.
    async fn send_raw(&self, raw: &str) -> Result<SentMessage>;
    /// `messages.list`; ordering is whatever the service returns.
    async fn list_messages(&self, max_results: u32) -> Result<Vec<MessageRef>>;
    /// `messages.get` in full format.
    async fn get_message(&self, id: &str) -> Result<Message>;
    async fn list_threads(&self, max_results: u32) -> Result<Vec<ThreadRef>>;
    async fn get_thread(&self, id: &str) -> Result<Thread>;
}

/// Authenticated session against the Gmail API.
pub struct GmailClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl GmailClient {
    pub fn new(client: reqwest::Client, token: String, base_url: &str) -> Self {
        Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(Error::Api {
                status,
                body: error_text,
            })
        }
    }
}

#[async_trait]
impl GmailApi for GmailClient {
    async fn send_raw(&self, raw: &str) -> Result<SentMessage> {
        let request_body = serde_json::json!({ "raw": raw });
        let send_url = format!("{}/messages/send", self.base_url);
        debug!("POST {}", send_url);
        let response = self
            .client
            .post(&send_url)
            .bearer_auth(&self.token)
            .json(&request_body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn list_messages(&self, max_results: u32) -> Result<Vec<MessageRef>> {
        let url = format!("{}/messages?maxResults={}", self.base_url, max_results);
        let page: MessagesResponse = self.get_json(&url).await?;
        Ok(page.messages.unwrap_or_default())
    }

    async fn get_message(&self, id: &str) -> Result<Message> {
        let url = format!("{}/messages/{}?format=full", self.base_url, id);
        self.get_json(&url).await
    }

    async fn list_threads(&self, max_results: u32) -> Result<Vec<ThreadRef>> {
        let url = format!("{}/threads?maxResults={}", self.base_url, max_results);
        let page: ThreadsResponse = self.get_json(&url).await?;
        Ok(page.threads.unwrap_or_default())
    }

    async fn get_thread(&self, id: &str) -> Result<Thread> {
        let url = format!("{}/threads/{}?format=full", self.base_url, id);
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GmailClient::new(
            reqwest::Client::new(),
            "token".to_string(),
            "https://gmail.googleapis.com/gmail/v1/users/me/",
        );
        assert_eq!(
            client.base_url,
            "https://gmail.googleapis.com/gmail/v1/users/me"
        );
    }
}

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessageRef {
    pub id: Option<String>,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Message {
    pub id: Option<String>,
    pub snippet: Option<String>,
    pub payload: Option<MessagePart>,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MessagePart {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    pub headers: Option<Vec<Header>>,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Header {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl Header {
    /// Builds a header with both name and value present, as when composing
    /// fixtures or synthetic messages.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MessagePartBody {
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadsResponse {
    pub threads: Option<Vec<ThreadRef>>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ThreadRef {
    pub id: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Thread {
    pub id: Option<String>,
    pub messages: Option<Vec<Message>>,
}

/// Response of `messages.send`.
#[derive(Debug, Deserialize, Clone)]
pub struct SentMessage {
    pub id: Option<String>,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

/// A plain-text email to be composed and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserializes_gmail_shape() {
        let json = r#"{
            "id": "18c",
            "threadId": "18b",
            "snippet": "hi",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [{"name": "Subject", "value": "Hello"}],
                "body": {"size": 0},
                "parts": [{"mimeType": "text/plain", "body": {"data": "aGk="}}]
            }
        }"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.thread_id.as_deref(), Some("18b"));
        let payload = message.payload.unwrap();
        assert!(payload.body.unwrap().data.is_none());
        assert_eq!(payload.parts.unwrap().len(), 1);
    }

    #[test]
    fn test_thread_without_messages_deserializes() {
        let thread: Thread = serde_json::from_str(r#"{"id": "t1"}"#).unwrap();
        assert!(thread.messages.is_none());
    }
}

// Reply sources for the conversation widget.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::conversation::ReplySource;
use crate::service::ChatService;

pub const NETWORK_ERROR_REPLY: &str = "Network error. Please try again.";
pub const NO_REPLY: &str = "No reply.";

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
}

/// Talks to a running chat server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpReplySource {
    client: Client,
    endpoint: String,
}

impl HttpReplySource {
    /// `server` is the base URL, e.g. `http://127.0.0.1:3000`.
    pub fn new(server: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/api/chat", server.trim_end_matches('/')),
        }
    }

    async fn post(&self, message: &str) -> reqwest::Result<ChatResponse> {
        self.client
            .post(&self.endpoint)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?
            .json::<ChatResponse>()
            .await
    }
}

impl ReplySource for HttpReplySource {
    // The body carries the reply for every status, 400 and 500 included.
    async fn reply(&self, message: &str) -> String {
        match self.post(message).await {
            Ok(response) => response.reply.unwrap_or_else(|| NO_REPLY.to_string()),
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Chat request failed");
                NETWORK_ERROR_REPLY.to_string()
            }
        }
    }
}

impl ReplySource for ChatService {
    async fn reply(&self, message: &str) -> String {
        match self.answer(message).await {
            Ok(answer) => answer.reply,
            Err(e) => e.to_string(),
        }
    }
}

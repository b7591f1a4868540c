//! Outbound generation requests with a hard deadline.

use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::constants;
use crate::error::GenerationError;

/// Raw provider payload on success, a classified failure otherwise.
pub type GenerationResult = Result<serde_json::Value, GenerationError>;

/// Provider settings for a single request.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl ProviderConfig {
    /// Resolves the key and model through `lookup`, falling back to the default model.
    pub fn from_lookup<F>(base_url: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(constants::API_KEY_VAR).filter(|key| !key.trim().is_empty());
        let model = lookup(constants::MODEL_VAR)
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| constants::DEFAULT_MODEL.to_string());
        Self {
            base_url: base_url.into(),
            api_key,
            model,
            temperature: constants::TEMPERATURE,
        }
    }

    /// Reads the process environment now, so edits apply to the next request.
    pub fn from_env(base_url: impl Into<String>) -> Self {
        Self::from_lookup(base_url, |name| std::env::var(name).ok())
    }

    fn endpoint(&self) -> Result<Url, GenerationError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GenerationError::Transport(format!("invalid base url {}: {}", self.base_url, e)))?;
        let method = format!("{}:generateContent", self.model);
        url.path_segments_mut()
            .map_err(|_| GenerationError::Transport(format!("base url {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v1beta", "models", method.as_str()]);
        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub deadline: Duration,
}

impl GenerationRequest {
    pub fn new(prompt_text: String) -> Self {
        Self {
            prompt_text,
            deadline: constants::REQUEST_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

// Structures matching the generateContent request body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Sends one request. No retries; the deadline aborts the call.
///
/// Dropping the in-flight future on timeout cancels the connection and the
/// timer goes with it, so only one outcome ever reaches the caller.
#[instrument(skip_all, fields(model = %config.model))]
pub async fn dispatch(
    client: &Client,
    request: &GenerationRequest,
    config: &ProviderConfig,
) -> GenerationResult {
    let Some(api_key) = config.api_key.as_deref() else {
        warn!("{} is not set; refusing to call the provider", constants::API_KEY_VAR);
        return Err(GenerationError::MissingCredential);
    };
    let url = config.endpoint()?;
    debug!(%url, deadline = ?request.deadline, "Dispatching generation request");

    let body = GenerateContentBody {
        contents: [Content {
            role: "user",
            parts: [Part { text: &request.prompt_text }],
        }],
        generation_config: GenerationConfig {
            temperature: config.temperature,
        },
    };

    let call = async {
        let response = client
            .post(url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Ok::<_, reqwest::Error>((status, text))
    };

    let (status, text) = match tokio::time::timeout(request.deadline, call).await {
        Err(_) => {
            warn!(deadline = ?request.deadline, "Generation request timed out");
            return Err(GenerationError::Timeout);
        }
        Ok(Err(e)) => {
            // Strip the url so the key never reaches the logs.
            let e = e.without_url();
            warn!(error = %e, "Generation request failed in transport");
            return Err(GenerationError::Transport(e.to_string()));
        }
        Ok(Ok(reply)) => reply,
    };

    if !status.is_success() {
        let message = provider_error_message(&text);
        warn!(%status, %message, "Provider rejected generation request");
        return Err(GenerationError::Provider {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        warn!(error = %e, "Provider returned a malformed body");
        GenerationError::Transport(format!("malformed provider body: {}", e))
    })
}

/// `error.message` from a structured error body, else the body itself.
fn provider_error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Err(_) => body.to_string(),
    }
}

// Glue between the inbound request and the prompt/provider/extractor chain.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::constants;
use crate::error::{ChatError, GenerationError};
use crate::extract;
use crate::profile::Profile;
use crate::prompt;
use crate::provider::{self, GenerationRequest, GenerationResult, ProviderConfig};

/// Where provider settings come from for each request.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Re-read the key and model from the environment on every request.
    Environment { base_url: String },
    Fixed(ProviderConfig),
}

impl ConfigSource {
    pub fn resolve(&self) -> ProviderConfig {
        match self {
            ConfigSource::Environment { base_url } => ProviderConfig::from_env(base_url.clone()),
            ConfigSource::Fixed(config) => config.clone(),
        }
    }
}

/// A resolved answer plus the outcome it came from.
#[derive(Debug, Clone)]
pub struct Answer {
    pub reply: String,
    pub outcome: GenerationResult,
}

impl Answer {
    pub fn is_misconfigured(&self) -> bool {
        matches!(self.outcome, Err(GenerationError::MissingCredential))
    }
}

#[derive(Clone)]
pub struct ChatService {
    profile: Arc<Profile>,
    client: Client,
    config: ConfigSource,
    deadline: Duration,
}

impl ChatService {
    pub fn new(profile: Arc<Profile>, config: ConfigSource) -> Self {
        Self {
            profile,
            client: Client::new(),
            config,
            deadline: constants::REQUEST_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn profile(&self) -> &Arc<Profile> {
        &self.profile
    }

    /// Answers one question, grounded on the profile alone.
    ///
    /// Only empty input is an error; every provider outcome becomes reply text.
    #[instrument(skip_all, fields(question_chars = message.chars().count()))]
    pub async fn answer(&self, message: &str) -> Result<Answer, ChatError> {
        let question = prompt::truncate_question(message);
        if question.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let config = self.config.resolve();
        let request =
            GenerationRequest::new(prompt::compose(&self.profile, question)).with_deadline(self.deadline);
        let outcome = provider::dispatch(&self.client, &request, &config).await;
        let reply = extract::reply_for(&outcome);
        info!(ok = outcome.is_ok(), reply_chars = reply.chars().count(), "Answered question");

        Ok(Answer { reply, outcome })
    }
}

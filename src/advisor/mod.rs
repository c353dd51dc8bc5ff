//! Remote LLM advisory over an OpenAI-compatible chat-completion endpoint.
//!
//! One request per call, no retry and no caching. Every failure maps onto
//! [`AdvisoryError`] so callers can report it and carry on.

pub mod prompt;
pub mod transport;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::AdvisorConfig;
use prompt::build_prompt;
use transport::{HttpTransport, Transport};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvisoryError {
    /// Missing or blank credential; raised before any request is sent.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Network failure or non-2xx response.
    #[error("advisory unavailable: {0}")]
    Unavailable(String),

    /// Response body did not carry a completion.
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Read the bearer token from `var`. Unset and blank are both rejected.
pub fn api_key_from_env(var: &str) -> Result<String, AdvisoryError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        Ok(_) => Err(AdvisoryError::Authentication(format!("{var} is empty"))),
        Err(_) => Err(AdvisoryError::Authentication(format!(
            "{var} environment variable not set"
        ))),
    }
}

pub struct Advisor<T = HttpTransport> {
    transport: T,
    config: AdvisorConfig,
}

impl Advisor {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisoryError> {
        let transport = HttpTransport::new(config.timeout_secs.map(Duration::from_secs))?;
        Ok(Advisor::with_transport(transport, config))
    }
}

impl<T: Transport> Advisor<T> {
    pub fn with_transport(transport: T, config: AdvisorConfig) -> Self {
        Advisor { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn request_for(&self, system_text: &str, process_text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(system_text, process_text),
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            stream: false,
        }
    }

    pub fn advise(
        &self,
        system_text: &str,
        process_text: &str,
        api_key: &str,
    ) -> Result<String, AdvisoryError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AdvisoryError::Authentication("API key is required".into()));
        }

        let request = self.request_for(system_text, process_text);
        debug!(
            endpoint = %self.config.endpoint,
            model = %request.model,
            prompt_chars = request.messages[0].content.len(),
            "requesting advisory"
        );
        let reply = self
            .transport
            .post_json(&self.config.endpoint, api_key, &request)?;

        if !reply.is_success() {
            return Err(AdvisoryError::Unavailable(format!(
                "API error {}: {}",
                reply.status,
                error_message(&reply.body)
            )));
        }

        parse_completion(&reply.body)
    }
}

fn parse_completion(body: &str) -> Result<String, AdvisoryError> {
    let completion: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| AdvisoryError::Parse(format!("failed to parse response: {e}")))?;
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AdvisoryError::Parse("no choices in response".into()))
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => crate::format::truncate_unicode(body.trim(), 200),
    }
}

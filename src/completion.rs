//! Chat-completion seam for AI-assisted variable naming.
//!
//! The engine talks to any backend through [`ChatCompletion`]. The bundled
//! implementation speaks the OpenAI-compatible `chat/completions` JSON shape
//! over a blocking HTTP client; callers on an async runtime are expected to
//! run it inside a blocking task.

use log::debug;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

/// A single role-tagged message.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Generation parameters for one completion call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the backend to reply with a single JSON object.
    pub json_reply: bool,
}

/// Errors from a completion backend.
#[derive(Debug)]
pub enum CompletionError {
    Http(String),
    Api(String),
    EmptyReply,
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompletionError::Http(details) => {
                write!(f, "Completion request failed: {}", details)
            }
            CompletionError::Api(details) => {
                write!(f, "Completion API error: {}", details)
            }
            CompletionError::EmptyReply => {
                write!(f, "Completion backend returned an empty reply")
            }
        }
    }
}

impl std::error::Error for CompletionError {}

/// A backend that can answer a chat prompt with a single text reply.
pub trait ChatCompletion {
    fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String, CompletionError>;
}

impl<T: ChatCompletion + ?Sized> ChatCompletion for &T {
    fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String, CompletionError> {
        (**self).complete(messages, params)
    }
}

/// Blocking client for OpenAI-compatible chat completion endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiChatService {
    client: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiChatService {
    pub fn new(
        api_base: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(OpenAiChatService {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

impl ChatCompletion for OpenAiChatService {
    fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String, CompletionError> {
        let payload: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        let mut request = json!({
            "model": self.model,
            "messages": payload,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });
        if params.json_reply {
            request["response_format"] = json!({ "type": "json_object" });
        }

        let url = format!("{}/chat/completions", self.api_base);
        debug!("Requesting completion from {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| CompletionError::Http(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| CompletionError::Http(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = body["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(CompletionError::Api(format!("HTTP {}: {}", status, message)));
        }

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("");
        if content.trim().is_empty() {
            return Err(CompletionError::EmptyReply);
        }

        Ok(content.to_string())
    }
}

//! LLM Client: the single point of entry for all hosted-model calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Groq API directly.
//! All generation goes through this module.
//!
//! Model: llama-3.1-8b-instant at temperature 0.3 (hardcoded, not configurable)

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

/// The model used for all generation calls.
pub const MODEL: &str = "llama-3.1-8b-instant";
pub const TEMPERATURE: f32 = 0.3;
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Literal reasoning tags some models leak into their answer.
pub const REASONING_MARKERS: [&str; 2] = ["<think>", "</think>"];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if it has any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The generation seam. `LlmClient` is the production implementation;
/// tests substitute a recording fake. Returns the raw model text; callers
/// apply [`strip_reasoning_markers`].
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        api_key: &SecretString,
    ) -> Result<String, LlmError>;
}

/// Groq chat-completions client. The API key is per session, so it is passed
/// on each call rather than held here.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
}

impl LlmClient {
    pub fn new(api_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_url,
        })
    }

    /// Makes one call to the chat-completions endpoint. No retry: every
    /// failure is terminal for the current request.
    pub async fn call(
        &self,
        system: &str,
        prompt: &str,
        api_key: &SecretString,
    ) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            temperature: TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key.expose_secret())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        if let Some(usage) = &chat_response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(chat_response)
    }
}

#[async_trait]
impl Generator for LlmClient {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        api_key: &SecretString,
    ) -> Result<String, LlmError> {
        let response = self.call(system, prompt, api_key).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Removes every literal `<think>` / `</think>` tag. The text between them is kept.
pub fn strip_reasoning_markers(text: &str) -> String {
    REASONING_MARKERS
        .iter()
        .fold(text.to_string(), |acc, marker| acc.replace(marker, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_reasoning_markers_removes_both_tags() {
        let input = "<think>weighing keywords</think>## Key Findings\n• Python matches";
        let output = strip_reasoning_markers(input);
        assert_eq!(output, "weighing keywords## Key Findings\n• Python matches");
        assert!(!output.contains("<think>"));
        assert!(!output.contains("</think>"));
    }

    #[test]
    fn test_strip_reasoning_markers_handles_repeats_and_clean_text() {
        assert_eq!(strip_reasoning_markers("<think><think>a</think>"), "a");
        assert_eq!(strip_reasoning_markers("plain answer"), "plain answer");
    }

    #[test]
    fn test_chat_request_serializes_model_and_temperature() {
        let body = serde_json::to_value(ChatRequest {
            model: MODEL,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        })
        .unwrap();

        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_chat_response_text_uses_first_choice() {
        let json = r###"{
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "## Key Findings"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160}
        }"###;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("## Key Findings"));
        assert_eq!(response.usage.unwrap().completion_tokens, 40);
    }

    #[test]
    fn test_chat_response_without_content_has_no_text() {
        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(empty.text().is_none());

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "   "}}]}"#).unwrap();
        assert!(blank.text().is_none());
    }

    #[test]
    fn test_api_error_body_parses() {
        let body = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#;
        let parsed: ApiError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Invalid API Key");
    }
}

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use market_data::config::LlmConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SYSTEM_PROMPT: &str = "You are an experienced cryptocurrency market analyst. \
    Answer only from the figures you are given and never invent prices.";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Language model returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Language model returned no text")]
    EmptyResponse,

    #[error("No API key configured for the language model")]
    MissingApiKey,
}

/// Turns a prompt into prose.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
    api_key: String,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Narrative generation enabled with model {}", config.model);
        Ok(Self {
            http,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl NarrativeGenerator for LlmClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        debug!("Received {} completion choices", reply.choices.len());
        extract_text(reply)
    }
}

fn extract_text(reply: ChatResponse) -> Result<String, GenerationError> {
    reply
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:1/v1".into(),
            model: "test-model".into(),
            api_key: api_key.map(str::to_string),
            temperature: 0.2,
            max_tokens: 64,
            timeout_secs: 1,
        }
    }

    #[test]
    fn refuses_to_start_without_a_key() {
        assert!(matches!(
            LlmClient::new(config(None)),
            Err(GenerationError::MissingApiKey)
        ));
        assert!(matches!(
            LlmClient::new(config(Some("  "))),
            Err(GenerationError::MissingApiKey)
        ));
        assert!(LlmClient::new(config(Some("sk-test"))).is_ok());
    }

    #[test]
    fn takes_the_first_choice_trimmed() {
        let reply: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Buy the dip.\n"}},
                           {"message":{"role":"assistant","content":"ignored"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(reply).unwrap(), "Buy the dip.");
    }

    #[test]
    fn blank_or_missing_content_is_empty() {
        let reply: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_text(reply), Err(GenerationError::EmptyResponse)));

        let reply: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(matches!(extract_text(reply), Err(GenerationError::EmptyResponse)));

        let reply: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"   "}}]}"#).unwrap();
        assert!(matches!(extract_text(reply), Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn request_body_matches_chat_schema() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.5,
            max_tokens: 10,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 10);
    }
}

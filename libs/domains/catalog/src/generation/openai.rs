use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::GenerationProvider;
use crate::config::OpenAIConfig;
use crate::error::{CatalogError, CatalogResult};

pub const SYSTEM_PROMPT: &str = "You are an AI assistant.";

/// OpenAI chat completions provider
pub struct OpenAIChatProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIChatProvider {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.chat_model,
            temperature: self.config.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn unavailable(err: impl std::fmt::Display) -> CatalogError {
    CatalogError::GenerationUnavailable(err.to_string())
}

/// First choice's message content from a chat completions response body.
fn extract_content(json: &serde_json::Value) -> CatalogResult<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| unavailable("Response contained no message content"))
}

#[async_trait]
impl GenerationProvider for OpenAIChatProvider {
    async fn generate(&self, prompt: &str) -> CatalogResult<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| unavailable(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(unavailable(format!("OpenAI API error {}: {}", status, body)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| unavailable(format!("Failed to parse response: {}", e)))?;

        extract_content(&json)
    }
}

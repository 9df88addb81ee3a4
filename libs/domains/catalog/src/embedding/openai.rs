use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::config::OpenAIConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{EmbeddingModel, EmbeddingResult};

/// OpenAI embeddings provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    usage: EmbeddingUsage,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct EmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

fn unavailable(err: impl std::fmt::Display) -> CatalogError {
    CatalogError::EmbeddingUnavailable(err.to_string())
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model(&self) -> EmbeddingModel {
        self.config.embedding_model
    }

    async fn embed(&self, text: &str) -> CatalogResult<EmbeddingResult> {
        let model = self.config.embedding_model;
        let request = EmbeddingRequest {
            model: model.model_name(),
            input: text,
            dimensions: model.requested_dimensions(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(unavailable(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse =
            response.json().await.map_err(unavailable)?;

        let data = embedding_response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| unavailable("No embedding returned"))?;

        Ok(EmbeddingResult {
            dimension: data.embedding.len() as u32,
            values: data.embedding,
            tokens_used: embedding_response.usage.total_tokens,
        })
    }
}

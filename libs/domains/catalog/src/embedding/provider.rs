use async_trait::async_trait;

use crate::error::CatalogResult;
use crate::models::{EmbeddingModel, EmbeddingResult};

/// Trait for embedding generation providers
///
/// A provider is bound to one model, so every vector it returns has the same
/// dimension. Failures surface as `CatalogError::EmbeddingUnavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The model this provider embeds with
    fn model(&self) -> EmbeddingModel;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> CatalogResult<EmbeddingResult>;
}

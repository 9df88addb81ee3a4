use async_trait::async_trait;

use crate::error::CatalogResult;

/// Trait for text generation providers
///
/// Failures surface as `CatalogError::GenerationUnavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Produce a natural-language answer for `prompt`
    async fn generate(&self, prompt: &str) -> CatalogResult<String>;
}

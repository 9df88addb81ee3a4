//! Deterministic providers shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use domain_catalog::{
    CatalogConfig, CatalogError, CatalogResult, CatalogService, EmbeddingModel,
    EmbeddingProvider, EmbeddingResult, FlatL2Index, GenerationProvider, RetrievalStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const DIM: usize = 8;

/// Embeds text as a letter-frequency histogram folded into `DIM` buckets.
pub struct HashEmbedder {
    pub calls: AtomicUsize,
    /// Zero-based call number that fails, if any
    pub fail_on_call: Option<usize>,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: Some(call),
        }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        for c in text.to_lowercase().chars().filter(|c| c.is_ascii_alphabetic()) {
            v[(c as usize) % DIM] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model(&self) -> EmbeddingModel {
        EmbeddingModel::Custom(DIM as u32)
    }

    async fn embed(&self, text: &str) -> CatalogResult<EmbeddingResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            return Err(CatalogError::EmbeddingUnavailable(
                "upstream returned 500".to_string(),
            ));
        }
        Ok(EmbeddingResult::new(Self::vector(text)))
    }
}

/// Records every prompt and answers with the first `Database:` line it was given.
#[derive(Default)]
pub struct EchoGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl EchoGenerator {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationProvider for EchoGenerator {
    async fn generate(&self, prompt: &str) -> CatalogResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let database = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Database: "))
            .unwrap_or("nothing");
        Ok(format!("The best match is the {} database.", database))
    }
}

pub fn service_with(
    embedder: Arc<HashEmbedder>,
    generator: Arc<EchoGenerator>,
) -> CatalogService<FlatL2Index> {
    CatalogService::new(
        Arc::new(RetrievalStore::create(DIM)),
        embedder,
        generator,
        CatalogConfig::default().with_dimension(DIM),
    )
}

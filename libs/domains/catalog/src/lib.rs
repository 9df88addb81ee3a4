//! Catalog Domain Library
//!
//! Retrieval-augmented question answering over a tabular data catalog.
//! Records are ingested from CSV, Excel or JSON, their descriptions embedded, and
//! free-text questions answered by a chat model given the nearest records as
//! context.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  CatalogService  │  ← ingestion + query pipelines, timeouts, persistence
//! └───┬──────────┬───┘
//!     │          │
//!     │   ┌──────▼───────────┐     ┌────────────────────┐
//!     │   │ EmbeddingProvider│     │ GenerationProvider │
//!     │   │    (trait)       │     │      (trait)       │
//!     │   └──────┬───────────┘     └─────────┬──────────┘
//!     │          │                           │
//!     │   ┌──────▼─────────┐       ┌─────────▼──────────┐
//!     │   │ OpenAIProvider │       │ OpenAIChatProvider │
//!     │   └────────────────┘       └────────────────────┘
//! ┌───▼──────────────┐
//! │  RetrievalStore  │  ← one RwLock over both stores
//! └───┬──────────┬───┘
//!     │          │
//! ┌───▼────────┐ ┌▼─────────────┐
//! │ VectorIndex│ │ CatalogStore │
//! │ FlatL2Index│ │              │
//! └────────────┘ └──────────────┘
//! ```
//!
//! The i-th vector in the index is always the embedding of the i-th record's
//! description. `RetrievalStore::commit` is the only way to grow either store.
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_catalog::{
//!     CatalogConfig, CatalogRow, CatalogService, FlatL2Index, OpenAIChatProvider,
//!     OpenAIConfig, OpenAIProvider,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let openai = OpenAIConfig::from_env()?;
//! let service = CatalogService::<FlatL2Index>::open(
//!     Arc::new(OpenAIProvider::new(openai.clone())),
//!     Arc::new(OpenAIChatProvider::new(openai)),
//!     CatalogConfig::from_env()?,
//! )
//! .await?;
//!
//! service
//!     .ingest(vec![CatalogRow::new()
//!         .with("Database", "Orders")
//!         .with("Description", "customer order history")])
//!     .await?;
//!
//! let answer = service.query("where are customer orders stored?", Some("analyst")).await?;
//! println!("{}", answer.answer);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod index;
pub mod models;
pub mod prompt;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod tabular;

// Re-export commonly used types
pub use catalog::CatalogStore;
pub use config::{CatalogConfig, OpenAIConfig, ensure_dimension_matches};
pub use embedding::{EmbeddingProvider, OpenAIProvider};
pub use error::{CatalogError, CatalogResult};
pub use generation::{GenerationProvider, OpenAIChatProvider};
pub use handlers::ApiDoc;
pub use index::{FlatL2Index, VectorIndex};
pub use models::{
    CatalogRecord, CatalogRow, CatalogStats, Column, EmbeddingModel, EmbeddingResult,
    IngestReport, IngestRequest, IngestResponse, Neighbor, QueryAnswer, QueryRequest,
    QueryResponse, RetrievedRecord,
};
pub use service::CatalogService;
pub use snapshot::CatalogSnapshot;
pub use store::RetrievalStore;

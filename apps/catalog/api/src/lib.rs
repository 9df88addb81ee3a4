//! Catalog API
//!
//! HTTP service for retrieval-augmented questions over a data catalog.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   ↓ (REST, JSON or multipart CSV)
//! axum router (/api/catalog/*, /health, OpenAPI docs)
//!   ↓
//! CatalogService (domain layer)
//!   ↓
//! ┌────────────────┬──────────────────────┐
//! │ RetrievalStore │ Embedding/Generation │
//! │ (+ snapshot)   │ providers            │
//! └────────────────┴──────────────────────┘
//!                    ↓
//!                 OpenAI API
//! ```
//!
//! ## Modules
//!
//! - `config`: environment-driven configuration
//! - `openapi`: combined OpenAPI document
//! - `server`: initialization and lifecycle

pub mod config;
pub mod openapi;
pub mod server;

pub use server::{build_router, run};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};

// ===== Catalog Columns =====

/// Columns understood by the ingestion pipeline.
///
/// Header names are matched case-insensitively after trimming, and each
/// column may be supplied under one of its aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Database,
    Description,
    Schema,
    Table,
    Link,
    CveId,
    Severity,
    Status,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Database,
        Column::Description,
        Column::Schema,
        Column::Table,
        Column::Link,
        Column::CveId,
        Column::Severity,
        Column::Status,
    ];

    pub const REQUIRED: [Column; 2] = [Column::Database, Column::Description];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Database => "database",
            Column::Description => "description",
            Column::Schema => "schema",
            Column::Table => "table",
            Column::Link => "link",
            Column::CveId => "cve_id",
            Column::Severity => "severity",
            Column::Status => "status",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::Database => &["source"],
            Column::CveId => &["cve"],
            _ => &[],
        }
    }

    /// True if `header` names this column or one of its aliases.
    pub fn matches(&self, header: &str) -> bool {
        let header = header.trim();
        header.eq_ignore_ascii_case(self.name())
            || self
                .aliases()
                .iter()
                .any(|alias| header.eq_ignore_ascii_case(alias))
    }

    pub fn is_required(&self) -> bool {
        Column::REQUIRED.contains(self)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ===== Catalog Rows & Records =====

/// One raw input row: column name to cell value, as read from a table or JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CatalogRow(pub BTreeMap<String, String>);

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Trimmed, non-blank value of `column`, looked up by name or alias.
    pub fn get(&self, column: Column) -> Option<&str> {
        self.0
            .iter()
            .filter(|(header, _)| column.matches(header))
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CatalogRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Metadata for one ingested item. `database` and `description` are always
/// non-empty; every other field is `""` when the source row left it blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogRecord {
    pub database: String,
    pub description: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub cve_id: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub status: String,
}

impl CatalogRecord {
    pub fn new(database: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Build a record from row number `row` of an ingestion batch.
    pub fn from_row(row: usize, input: &CatalogRow) -> CatalogResult<Self> {
        let required = |column: Column| {
            input
                .get(column)
                .map(str::to_string)
                .ok_or_else(|| CatalogError::MissingRequiredColumn {
                    row,
                    column: column.name().to_string(),
                })
        };
        let optional = |column: Column| input.get(column).unwrap_or_default().to_string();

        Ok(Self {
            database: required(Column::Database)?,
            description: required(Column::Description)?,
            schema: optional(Column::Schema),
            table: optional(Column::Table),
            link: optional(Column::Link),
            cve_id: optional(Column::CveId),
            severity: optional(Column::Severity),
            status: optional(Column::Status),
        })
    }
}

// ===== Retrieval =====

/// One hit from the vector index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    /// Squared Euclidean distance to the query
    pub distance: f32,
}

/// A catalog record returned by retrieval, in ascending distance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RetrievedRecord {
    /// 1-based rank within the result list
    pub rank: usize,
    pub position: usize,
    pub distance: f32,
    pub record: CatalogRecord,
}

/// Result of the query pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnswer {
    pub answer: String,
    pub records: Vec<RetrievedRecord>,
}

/// Outcome of a fully committed ingestion batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IngestReport {
    pub ingested: usize,
    pub total_records: usize,
}

/// Store statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogStats {
    pub records: usize,
    pub dimension: usize,
    pub top_k: usize,
}

// ===== Embeddings =====

/// Supported OpenAI embedding models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingModel {
    /// OpenAI text-embedding-3-small (1536 dimensions)
    TextEmbedding3Small,
    /// OpenAI text-embedding-3-large (3072 dimensions)
    #[default]
    TextEmbedding3Large,
    /// OpenAI text-embedding-ada-002 (1536 dimensions, legacy)
    TextEmbeddingAda002,
    /// text-embedding-3-large shortened to the given dimension
    Custom(u32),
}

impl EmbeddingModel {
    pub fn dimension(&self) -> u32 {
        match self {
            EmbeddingModel::TextEmbedding3Small => 1536,
            EmbeddingModel::TextEmbedding3Large => 3072,
            EmbeddingModel::TextEmbeddingAda002 => 1536,
            EmbeddingModel::Custom(dim) => *dim,
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            EmbeddingModel::TextEmbedding3Small => "text-embedding-3-small",
            EmbeddingModel::TextEmbedding3Large | EmbeddingModel::Custom(_) => {
                "text-embedding-3-large"
            }
            EmbeddingModel::TextEmbeddingAda002 => "text-embedding-ada-002",
        }
    }

    /// Value of the `dimensions` request field, only sent for shortened models.
    pub fn requested_dimensions(&self) -> Option<u32> {
        match self {
            EmbeddingModel::Custom(dim) => Some(*dim),
            _ => None,
        }
    }
}

impl FromStr for EmbeddingModel {
    type Err = CatalogError;

    /// Accepts a model name, or `text-embedding-3-large:<dim>` for a shortened model.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text-embedding-3-small" => Ok(EmbeddingModel::TextEmbedding3Small),
            "text-embedding-3-large" => Ok(EmbeddingModel::TextEmbedding3Large),
            "text-embedding-ada-002" => Ok(EmbeddingModel::TextEmbeddingAda002),
            other => other
                .strip_prefix("text-embedding-3-large:")
                .and_then(|dim| dim.parse::<u32>().ok())
                .filter(|dim| *dim > 0)
                .map(EmbeddingModel::Custom)
                .ok_or_else(|| {
                    CatalogError::Config(format!("Unknown embedding model '{}'", other))
                }),
        }
    }
}

/// Embedding result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmbeddingResult {
    pub values: Vec<f32>,
    pub dimension: u32,
    pub tokens_used: u32,
}

impl EmbeddingResult {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            dimension: values.len() as u32,
            values,
            tokens_used: 0,
        }
    }
}

// ===== Request/Response DTOs =====

/// Request to ingest rows supplied as JSON
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct IngestRequest {
    #[validate(length(max = 10000, message = "At most 10000 rows per batch"))]
    pub rows: Vec<CatalogRow>,
}

/// Response for upload and ingest operations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub message: String,
    pub ingested: usize,
    pub total_records: usize,
}

impl From<IngestReport> for IngestResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            message: format!("Ingested {} records", report.ingested),
            ingested: report.ingested,
            total_records: report.total_records,
        }
    }
}

/// Free-text question against the catalog
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    #[validate(length(min = 1, max = 4096, message = "Query must be 1-4096 characters"))]
    pub query: String,
    /// Role of the person asking, echoed into the prompt
    #[serde(default)]
    #[validate(length(max = 128, message = "Role must be at most 128 characters"))]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    pub response: String,
    pub records: Vec<RetrievedRecord>,
}

impl From<QueryAnswer> for QueryResponse {
    fn from(answer: QueryAnswer) -> Self {
        Self {
            response: answer.answer,
            records: answer.records,
        }
    }
}

use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector component {component} is not a finite number")]
    NonFiniteVector { component: usize },

    #[error("Vector store is empty")]
    EmptyStore,

    #[error("Catalog is empty, ingest records before querying")]
    EmptyCatalog,

    #[error("Position {position} is out of range for catalog of {len} records")]
    IndexOutOfRange { position: usize, len: usize },

    #[error("Row {row} is missing required column '{column}'")]
    MissingRequiredColumn { row: usize, column: String },

    #[error("Header row does not name required column '{column}'")]
    MissingHeaderColumn { column: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse tabular input: {0}")]
    Parse(String),

    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Generation service unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Ingestion aborted at row {row} after {committed} committed records: {source}")]
    IngestionAborted {
        row: usize,
        committed: usize,
        #[source]
        source: Box<CatalogError>,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}

/// Convert CatalogError to AppError for standardized HTTP error responses
impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::EmptyStore | CatalogError::EmptyCatalog => {
                AppError::Conflict(err.to_string())
            }
            CatalogError::MissingRequiredColumn { .. }
            | CatalogError::MissingHeaderColumn { .. }
            | CatalogError::UnsupportedFormat(_)
            | CatalogError::Parse(_) => AppError::BadRequest(err.to_string()),
            CatalogError::EmbeddingUnavailable(_) | CatalogError::GenerationUnavailable(_) => {
                AppError::ServiceUnavailable(err.to_string())
            }
            CatalogError::Timeout { .. } => AppError::GatewayTimeout(err.to_string()),
            CatalogError::IngestionAborted {
                row,
                committed,
                source,
            } => {
                let message = format!(
                    "Ingestion aborted at row {} after {} committed records: {}",
                    row, committed, source
                );
                // The batch reports with the status of whatever stopped it.
                match AppError::from(*source) {
                    AppError::Conflict(_) => AppError::Conflict(message),
                    AppError::BadRequest(_) => AppError::BadRequest(message),
                    AppError::ServiceUnavailable(_) => AppError::ServiceUnavailable(message),
                    AppError::GatewayTimeout(_) => AppError::GatewayTimeout(message),
                    _ => AppError::InternalServerError(message),
                }
            }
            CatalogError::DimensionMismatch { .. }
            | CatalogError::NonFiniteVector { .. }
            | CatalogError::IndexOutOfRange { .. }
            | CatalogError::Snapshot(_)
            | CatalogError::Config(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AppError, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestValidationResponse, ConflictResponse,
        GatewayTimeoutResponse, InternalServerErrorResponse, ServiceUnavailableResponse,
    },
};
use std::sync::Arc;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

use crate::error::CatalogResult;
use crate::index::VectorIndex;
use crate::models::{
    CatalogRecord, CatalogRow, CatalogStats, IngestRequest, IngestResponse, QueryRequest,
    QueryResponse, RetrievedRecord,
};
use crate::service::CatalogService;
use crate::tabular::parse_upload;

pub const TAG: &str = "catalog";

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// OpenAPI documentation for the Catalog API
#[derive(OpenApi)]
#[openapi(
    paths(upload, ingest, query, stats),
    components(
        schemas(
            CatalogRecord,
            CatalogRow,
            CatalogStats,
            IngestRequest,
            IngestResponse,
            QueryRequest,
            QueryResponse,
            RetrievedRecord,
            UploadForm
        ),
        responses(
            BadRequestResponse,
            BadRequestValidationResponse,
            ConflictResponse,
            ServiceUnavailableResponse,
            GatewayTimeoutResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Catalog ingestion and retrieval-augmented queries")
    )
)]
pub struct ApiDoc;

/// Multipart body of the upload endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// CSV or Excel workbook (.xlsx/.xls) with Database and Description columns
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Create the catalog router with all HTTP endpoints
///
/// The service is shared so the caller can keep a handle for shutdown work.
pub fn router<I: VectorIndex>(service: Arc<CatalogService<I>>) -> Router {
    Router::new()
        .route(
            "/upload",
            post(upload::<I>).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/ingest", post(ingest::<I>))
        .route("/query", post(query::<I>))
        .route("/stats", get(stats::<I>))
        .with_state(service)
}

/// Upload a CSV file or Excel workbook and ingest its rows
#[utoipa::path(
    post,
    path = "/upload",
    tag = TAG,
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Rows ingested", body = IngestResponse),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
async fn upload<I: VectorIndex>(
    State(service): State<Arc<CatalogService<I>>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        info!(file_name = %file_name, bytes = bytes.len(), "Received catalog upload");

        let rows = parse_upload(&file_name, &bytes)?;
        let report = service.ingest(rows).await?;

        return Ok((StatusCode::CREATED, Json(IngestResponse::from(report))));
    }

    Err(AppError::BadRequest(
        "Multipart body must contain a 'file' field".to_string(),
    ))
}

/// Ingest rows supplied as JSON
#[utoipa::path(
    post,
    path = "/ingest",
    tag = TAG,
    request_body = IngestRequest,
    responses(
        (status = 201, description = "Rows ingested", body = IngestResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
async fn ingest<I: VectorIndex>(
    State(service): State<Arc<CatalogService<I>>>,
    ValidatedJson(input): ValidatedJson<IngestRequest>,
) -> CatalogResult<impl IntoResponse> {
    let report = service.ingest(input.rows).await?;
    Ok((StatusCode::CREATED, Json(IngestResponse::from(report))))
}

/// Ask a question about the catalog
#[utoipa::path(
    post,
    path = "/query",
    tag = TAG,
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Generated answer with the records it was based on", body = QueryResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
async fn query<I: VectorIndex>(
    State(service): State<Arc<CatalogService<I>>>,
    ValidatedJson(input): ValidatedJson<QueryRequest>,
) -> CatalogResult<Json<QueryResponse>> {
    let answer = service.query(&input.query, input.role.as_deref()).await?;
    Ok(Json(answer.into()))
}

/// Store statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = TAG,
    responses(
        (status = 200, description = "Record count and retrieval settings", body = CatalogStats)
    )
)]
async fn stats<I: VectorIndex>(
    State(service): State<Arc<CatalogService<I>>>,
) -> Json<CatalogStats> {
    Json(service.stats().await)
}

use axum::response::{IntoResponse, Response};

use super::{AppError, ErrorCode};

/// Fallback for unknown routes: a JSON 404 in the usual error shape.
pub async fn not_found() -> Response {
    AppError::NotFound(ErrorCode::NotFound.default_message().to_string()).into_response()
}

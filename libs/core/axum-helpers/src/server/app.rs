use super::shutdown::shutdown_signal;
use crate::errors::handlers::not_found;
use crate::http::{cors_layer_from_env, security_headers};
use axum::{Router, middleware};
use core_config::server::ServerConfig;
use std::future::Future;
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, warn};
use utoipa::OpenApi;

/// Interactive documentation for `T`: Swagger UI, ReDoc, RapiDoc and Scalar,
/// all reading the spec served at `/api-docs/openapi.json`.
fn docs_router<T: OpenApi + 'static>() -> Router {
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as _};
    use utoipa_scalar::{Scalar, Servable as _};
    use utoipa_swagger_ui::SwaggerUi;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
}

/// Wraps `apis` into the service router.
///
/// - `apis` is mounted under `/api`
/// - OpenAPI docs at `/swagger-ui`, `/redoc`, `/rapidoc`, `/scalar`
/// - unknown routes answer with a JSON 404
/// - request tracing, security headers, CORS and response compression
///
/// # Errors
/// Fails if `CORS_ALLOWED_ORIGIN` is missing, empty or not a valid origin list.
pub async fn create_router<T>(apis: Router) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    let cors = cors_layer_from_env()?;
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Ok(docs_router::<T>()
        .nest("/api", apis)
        .fallback(not_found)
        .layer(trace)
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(CompressionLayer::new()))
}

/// Serve `router` until SIGINT/SIGTERM, then run `cleanup`.
///
/// In-flight requests are drained before `cleanup` starts, and `cleanup` is
/// abandoned if it runs longer than `cleanup_timeout`. Cleanup also runs when
/// the server stops with an error; that error is returned afterwards.
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    cleanup_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!(address = %listener.local_addr()?, "Server listening");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = &served {
        error!(error = %e, "Server stopped with an error");
    }

    info!(timeout = ?cleanup_timeout, "Running shutdown cleanup");
    match tokio::time::timeout(cleanup_timeout, cleanup).await {
        Ok(()) => info!("Shutdown cleanup finished"),
        Err(_) => warn!(timeout = ?cleanup_timeout, "Shutdown cleanup timed out, exiting anyway"),
    }

    served
}

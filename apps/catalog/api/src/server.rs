//! Server initialization and lifecycle management
//!
//! - Tracing and error report setup
//! - Provider and service construction (restoring a snapshot if configured)
//! - Router assembly with docs, health and CORS
//! - Graceful shutdown that persists the store

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::AppInfo;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_catalog::{
    CatalogService, FlatL2Index, OpenAIChatProvider, OpenAIProvider, VectorIndex, handlers,
};
use eyre::{Result, WrapErr};
use tracing::{error, info};

use crate::config::Config;
use crate::openapi::ApiDoc;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Full application router: catalog routes under `/api/catalog`, docs and `/health`.
///
/// # Errors
///
/// Returns an error if `CORS_ALLOWED_ORIGIN` is missing or invalid.
pub async fn build_router<I: VectorIndex>(
    service: Arc<CatalogService<I>>,
    app_info: AppInfo,
) -> Result<Router> {
    let api_routes = Router::new().nest("/catalog", handlers::router(service));
    let router = create_router::<ApiDoc>(api_routes)
        .await
        .wrap_err("Failed to build router")?;

    Ok(router.merge(health_router(app_info)))
}

/// Run the HTTP server
///
/// 1. Installs color-eyre and loads configuration
/// 2. Sets up structured logging (JSON for prod, pretty for dev)
/// 3. Creates the OpenAI providers and the catalog service
/// 4. Serves until SIGINT/SIGTERM, then persists the store
pub async fn run() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    init_tracing(&config.environment);

    let embedder = Arc::new(OpenAIProvider::new(config.openai.clone()));
    let generator = Arc::new(OpenAIChatProvider::new(config.openai.clone()));
    info!(
        embedding_model = config.openai.embedding_model.model_name(),
        chat_model = %config.openai.chat_model,
        "OpenAI providers configured"
    );

    let service = CatalogService::<FlatL2Index>::open(embedder, generator, config.catalog.clone())
        .await
        .wrap_err("Failed to open catalog store")?;
    let service = Arc::new(service);
    info!(
        records = service.store().len().await,
        dimension = config.catalog.dimension,
        top_k = config.catalog.top_k,
        "Catalog store ready"
    );

    let app = build_router(service.clone(), config.app).await?;

    info!("Starting {} v{}", config.app.name, config.app.version);

    create_production_app(app, &config.server, SHUTDOWN_TIMEOUT, async move {
        info!("Shutting down: persisting catalog store");
        if let Err(e) = service.persist().await {
            error!(error = %e, "Failed to persist catalog store");
        }
    })
    .await
    .wrap_err("Server error")?;

    info!("Catalog API shutdown complete");
    Ok(())
}

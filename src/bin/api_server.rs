// src/bin/api_server.rs

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use phone_catalog::infra::{config::Config, logging};
use phone_catalog::storage::schema;
use phone_catalog::transport;
use phone_catalog::{CatalogService, Database};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    logging::init(config.environment);

    // --- Database ---
    let db = Database::connect_lazy(&config.database)?;
    match db.ping().await {
        Ok(ms) => {
            info!(elapsed_ms = ms, "Database reachable");
            if config.apply_schema {
                schema::apply(&db).await?;
            }
        }
        // The pool reconnects on demand; /health reports the outage meanwhile.
        Err(e) => warn!(error = %e, "Database not reachable at startup, continuing"),
    }

    // --- HTTP ---
    let cors = CorsLayer::new()
        .allow_origin(config.frontend_url.parse::<HeaderValue>()?)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let port = config.port;
    let environment = config.environment;
    let app_state = transport::http::AppState::new(CatalogService::new(db.clone()), config);
    let app = transport::http::create_router(app_state)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()),
        )
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, environment = environment.as_str(), "API server listening");
    info!("Swagger UI available at http://localhost:{}/swagger-ui", port);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!(error = %e, "Server error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received (Ctrl+C)");
        }
    }

    db.close().await;
    info!("Graceful shutdown complete");
    Ok(())
}

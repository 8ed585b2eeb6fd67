//! Ijah API Server implementation
//!
//! HTTP REST API server using Axum. Exposes export, import and record entry
//! over the same storage and export directory the CLI uses.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::config::Config;
use crate::storage::Storage;

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/api/v1/export", post(handlers::export))
        .route("/api/v1/import", post(handlers::import))
        .route(
            "/api/v1/products",
            get(handlers::list_products).post(handlers::store_product),
        )
        .route(
            "/api/v1/products/:id",
            get(handlers::get_product).delete(handlers::delete_product),
        )
        .route(
            "/api/v1/purchases",
            get(handlers::list_purchases).post(handlers::store_purchase),
        )
        .route("/api/v1/purchases/:id", get(handlers::get_purchase))
        .route(
            "/api/v1/orders",
            get(handlers::list_orders).post(handlers::store_order),
        )
        .route("/api/v1/orders/:id", get(handlers::get_order))
        .with_state(Arc::new(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server until Ctrl+C or SIGTERM
pub async fn run_api_server(api: ApiConfig, config: Config) -> anyhow::Result<()> {
    // Create the schema up front so the first request does not race on it
    Storage::open_migrated(&config.database)?;

    let app = router(AppState::new(config));

    let addr: SocketAddr = format!("{}:{}", api.host, api.port).parse()?;
    info!("Ijah API Server starting on http://{}", addr);
    info!("   Endpoints: /api/v1/export, /api/v1/import");
    info!("   Records: /api/v1/products, /api/v1/purchases, /api/v1/orders");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Ijah API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_config_address_format() {
        let config = ApiConfig {
            host: "192.168.1.100".to_string(),
            port: 9090,
        };
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse().unwrap();
        assert_eq!(addr.port(), 9090);
    }

    #[test]
    fn test_app_state_carries_crate_version() {
        let state = AppState::new(Config::default());
        assert_eq!(state.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(state.config, Config::default());
    }
}

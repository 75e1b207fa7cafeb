//! HTTP server implementation using Axum.

use crate::handler::{handle_health, handle_rpc};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use postrpc::config::ServerConfig;
use postrpc::Dispatcher;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Dispatcher over the functions registered at start-up
    pub dispatcher: Dispatcher,
}

/// Build the router serving RPC calls on `path` and the health check.
pub fn router(dispatcher: Dispatcher, path: &str) -> Router {
    let state = Arc::new(AppState { dispatcher });

    // Configure CORS so browser clients on other origins can call in
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(ServerConfig::HEALTH_PATH, get(handle_health))
        .route(&normalize_path(path), post(handle_rpc))
        .layer(DefaultBodyLimit::max(ServerConfig::BODY_LIMIT_BYTES))
        .layer(ConcurrencyLimitLayer::new(ServerConfig::MAX_CONCURRENT_REQUESTS))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Start the RPC HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    dispatcher: Dispatcher,
    host: &str,
    port: u16,
    path: &str,
) -> anyhow::Result<SocketAddr> {
    let app = router(dispatcher, path);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    // Spawn the server in the background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postrpc::Registry;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/rpc"), "/rpc");
        assert_eq!(normalize_path("api.php"), "/api.php");
    }

    #[tokio::test]
    async fn test_server_starts() {
        let dispatcher = Dispatcher::new(Registry::new());
        let addr = start_server(dispatcher, "127.0.0.1", 0, ServerConfig::DEFAULT_PATH)
            .await
            .unwrap();
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_invalid_host_rejected() {
        let dispatcher = Dispatcher::new(Registry::new());
        assert!(start_server(dispatcher, "not a host", 0, "/rpc").await.is_err());
    }
}

//! HTTP server adapter.
//!
//! # Responsibilities
//! - Put a [`RequestHandler`] behind axum/hyper as the catch-all service
//! - Wrap it in `TraceLayer` for per-request spans
//! - Stop accepting on the shutdown signal and drain in-flight requests
//!
//! # Design Decisions
//! - The listener is bound by the caller, so tests can use port 0
//! - Peer addresses flow in through `ConnectInfo`

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::app::RequestHandler;

/// Error type for server operations.
#[derive(Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// The accept loop failed.
    Serve(std::io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ServerError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Bind(e) | ServerError::Serve(e) => Some(e),
        }
    }
}

/// Bind a TCP listener on `address`.
pub async fn bind(address: &str) -> Result<TcpListener, ServerError> {
    let addr: SocketAddr = address.parse().map_err(|e| {
        ServerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })?;
    TcpListener::bind(addr).await.map_err(ServerError::Bind)
}

/// HTTP server serving one application.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(handler: RequestHandler) -> Self {
        Self {
            router: Self::build_router(handler),
        }
    }

    fn build_router(handler: RequestHandler) -> Router {
        Router::new()
            .fallback_service(handler)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr().map_err(ServerError::Serve)?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

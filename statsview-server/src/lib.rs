//! HTTP server exposing statsview viewers.
//!
//! The server is organized into separate concerns:
//! - `handler`: route handlers and the mapping of viewer errors to responses
//! - this module: routing, binding and shutdown
//!
//! Routes, relative to the configured prefix:
//! - `GET /view/{name}`: current sample of one viewer
//! - `GET /chart/{name}`: chart settings of one viewer
//! - `GET /charts`: chart settings of every viewer
//! - `POST /release`: forced heap release, when a reclaimer is attached

mod handler;

pub use handler::{ApiError, ReleaseReport};

use axum::routing::{get, post};
use axum::Router;
use statsview_core::{MemoryReclaimer, ServerConfig, ViewerRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// HTTP front of a [`ViewerRegistry`].
pub struct Server {
    config: ServerConfig,
    registry: Arc<ViewerRegistry>,
    reclaimer: Option<Arc<dyn MemoryReclaimer>>,
}

impl Server {
    pub fn new(config: ServerConfig, registry: ViewerRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            reclaimer: None,
        }
    }

    /// Enables `POST /release`, backed by `reclaimer`.
    pub fn with_reclaimer(mut self, reclaimer: Arc<dyn MemoryReclaimer>) -> Self {
        self.reclaimer = Some(reclaimer);
        self
    }

    /// Builds the router with every route mounted under the configured prefix.
    pub fn router(&self) -> Router {
        let mut routes = Router::new()
            .route("/view/{name}", get(handler::view))
            .route("/chart/{name}", get(handler::chart))
            .route("/charts", get(handler::charts))
            .with_state(Arc::clone(&self.registry));

        if let Some(reclaimer) = &self.reclaimer {
            routes = routes.merge(
                Router::new()
                    .route("/release", post(handler::release))
                    .with_state(Arc::clone(reclaimer)),
            );
        }

        let prefix = self.config.route_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            routes
        } else {
            Router::new().nest(prefix, routes)
        }
    }

    /// Serves on `listener` until `shutdown` is cancelled.
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(
            "Statsview listening on http://{}{}",
            addr, self.config.route_prefix
        );
        info!("Viewers: {}", self.registry.names().join(", "));

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Statsview server stopped");
        Ok(())
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn start(&self) -> Result<()> {
        let listener = self.bind().await?;

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutting down...");
                    trigger.cancel();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        });

        self.serve(listener, shutdown).await
    }

    /// Binds the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(&self.config.listen_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.config.listen_addr.clone(),
                source,
            })
    }

    pub fn registry(&self) -> &Arc<ViewerRegistry> {
        &self.registry
    }
}

/// Returns the local address of a bound listener as a base URL.
pub fn base_url(addr: SocketAddr, config: &ServerConfig) -> String {
    format!(
        "http://{}{}",
        addr,
        config.route_prefix.trim_end_matches('/')
    )
}

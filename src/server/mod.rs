pub mod handler;

use crate::ports::SearchEnginePort;
use crate::{Config, Error, Result};
use axum::{routing::get, Router};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub use handler::{handle_search, matches, AppState, GsaResponseBody, HealthStatus};

/// Build the application router
///
/// `/health` is routed explicitly; every other path goes through the GSA
/// dispatcher, which answers 404 for anything outside the configured prefix.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .fallback(handler::dispatch)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub struct Server {
    config: Arc<Config>,
    engine: Arc<dyn SearchEnginePort>,
    cancellation_token: CancellationToken,
}

impl Server {
    #[must_use]
    pub fn new(config: Config, engine: Arc<dyn SearchEnginePort>) -> Self {
        Self::new_with_arc(Arc::new(config), engine)
    }

    #[must_use]
    pub fn new_with_arc(config: Arc<Config>, engine: Arc<dyn SearchEnginePort>) -> Self {
        Self {
            config,
            engine,
            cancellation_token: CancellationToken::new(),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Service(format!("Failed to bind {addr}: {e}")))?;

        info!(
            "GSA adapter listening on {} (prefix {}, engine {})",
            addr,
            self.config.gsa.path_prefix,
            self.engine.name()
        );
        if !self.config.gsa.enabled {
            warn!("GSA endpoint is disabled, only /health will answer");
        }

        self.spawn_signal_handler();

        let app = router(AppState::new(
            Arc::clone(&self.config),
            Arc::clone(&self.engine),
        ));
        let shutdown_token = self.cancellation_token.clone();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
            .into_future();
        tokio::pin!(serve);

        // Once shutdown is requested, in-flight requests get a bounded grace period
        let shutdown_timeout = Duration::from_secs(self.config.server.graceful_shutdown_timeout_secs);
        let server_result = tokio::select! {
            result = &mut serve => result,
            () = self.cancellation_token.cancelled() => {
                info!("Shutdown signal received, draining in-flight requests");
                match tokio::time::timeout(shutdown_timeout, &mut serve).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("Graceful shutdown timeout exceeded, forcing shutdown");
                        Ok(())
                    }
                }
            }
        };

        server_result.map_err(|e| Error::Service(format!("HTTP server error: {e}")))?;
        info!("GSA adapter shutdown complete");
        Ok(())
    }

    fn spawn_signal_handler(&self) {
        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    error!("Failed to listen for SIGINT: {e}");
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        error!("Failed to setup SIGTERM handler: {e}");
                        std::future::pending::<()>().await;
                    }
                }
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                () = ctrl_c => info!("Received SIGINT, initiating graceful shutdown"),
                () = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
                () = shutdown_token.cancelled() => return,
            }

            shutdown_token.cancel();
        });
    }

    pub fn shutdown(&self) {
        warn!("Initiating server shutdown");
        self.cancellation_token.cancel();
    }

    /// Check if the server has been requested to shutdown
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Get the server configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("host", &self.config.server.host)
            .field("port", &self.config.server.port)
            .field("engine", &self.engine.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsa::{GsaRequestParams, SearchResponse};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct NoopEngine;

    #[async_trait]
    impl SearchEnginePort for NoopEngine {
        async fn search(&self, _params: &GsaRequestParams) -> Result<SearchResponse> {
            Ok(SearchResponse::default())
        }

        fn name(&self) -> &str {
            "noop"
        }
    }

    #[test]
    fn test_server_creation() {
        let server = Server::new(Config::default(), Arc::new(NoopEngine));
        assert!(!server.is_shutdown_requested());
        assert_eq!(server.config().gsa.path_prefix, "/gsa");
    }

    #[test]
    fn test_server_shutdown() {
        let server = Server::new(Config::default(), Arc::new(NoopEngine));
        server.shutdown();
        assert!(server.is_shutdown_requested());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut config = Config::default();
        config.server.port = 0;
        let server = Arc::new(Server::new(config, Arc::new(NoopEngine)));

        let running = Arc::clone(&server);
        let handle = tokio::spawn(async move { running.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked");
        assert!(result.is_ok());
    }
}

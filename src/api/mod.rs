//! HTTP API server for the debate gateway
//!
//! REST endpoints and every WebSocket upgrade share one listener; the
//! request path alone decides which handler runs.

pub mod debate;
pub mod health;
pub mod speech;
pub mod streaming;
pub mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::room::RoomHub;
use crate::vendor::{BatchSpeech, UpstreamConnector};

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Opens upstream streaming connections for relay sessions
    pub connector: Arc<dyn UpstreamConnector>,
    /// Batch transcription and synthesis
    pub speech: Arc<dyn BatchSpeech>,
    /// Debate room broadcast hub
    pub room: RoomHub,
    /// Language used for canned coaching replies
    pub coaching_language: String,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    connector: Arc<dyn UpstreamConnector>,
    speech: Arc<dyn BatchSpeech>,
    port: u16,
    static_dir: Option<PathBuf>,
    coaching_language: String,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(
        connector: Arc<dyn UpstreamConnector>,
        speech: Arc<dyn BatchSpeech>,
        port: u16,
    ) -> Self {
        Self {
            connector,
            speech,
            port,
            static_dir: None,
            coaching_language: "hi-IN".to_string(),
        }
    }

    /// Set the static files directory for serving the web UI
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Set the language for synthesized coaching replies
    #[must_use]
    pub fn coaching_language(mut self, language: String) -> Self {
        self.coaching_language = language;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let state = Arc::new(ApiState {
            connector: self.connector,
            speech: self.speech,
            room: RoomHub::new(),
            coaching_language: self.coaching_language,
        });

        ApiServer {
            state,
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Shared handler state
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(health::router())
            .merge(debate::router(self.state.clone()))
            .merge(speech::router(self.state.clone()))
            .merge(streaming::router(self.state.clone()));

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // CORS layer for cross-origin requests from the frontend dev server
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Serve on an already-bound listener
    ///
    /// # Errors
    ///
    /// Returns error if the server fails while running
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "debate gateway listening");

        self.serve(listener).await
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

//! Error types for the debate gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the debate gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Upstream streaming connection could not be opened or driven
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Vendor API returned a failure
    #[error("vendor error: {0}")]
    Vendor(String),

    /// Client sent a frame the relay cannot interpret
    #[error("{0}")]
    Protocol(String),

    /// Uploaded file could not be accepted
    #[error("upload error: {0}")]
    Upload(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// WebSocket error on the upstream connection
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Malformed vendor URL
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
}

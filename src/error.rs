//! Error type shared by every layer of the exporter.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Token acquisition or refresh failed. Aborts the whole run.
    #[error("authorization failed: {0}")]
    Auth(String),

    /// A declared source path is absent from every flattened record.
    #[error("missing field `{0}` in Spotify response")]
    MissingField(String),

    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Spotify answered {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Whether a single retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ExportError::Fetch(err) => err.is_timeout() || err.is_connect(),
            ExportError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

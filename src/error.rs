//! Error type shared by the renderer, writers and delivery surfaces

use thiserror::Error;

/// Anything that can abort a report run.
///
/// Missing or malformed input fields are deliberately absent here: they fall
/// back to placeholder values and never fail a run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid layout metrics: {0}")]
    Layout(String),

    #[error("report assembly error: {0}")]
    Assembly(String),

    #[error("branding asset unavailable: {0}")]
    Branding(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

// Unified Error Handling Module
//
// Centralized error types for the review host

use std::io;

use cm_app::EditorError;
use cm_canvas::CanvasError;
use cm_drawing::DocumentError;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Image error: {0}")]
    Canvas(#[from] CanvasError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Import error: {0}")]
    Import(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Object storage upload errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Presign request failed: {0}")]
    Presign(String),

    #[error("Upload of {file_name} failed: {reason}")]
    Transfer { file_name: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Review REST API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Operation not available: {0}")]
    Unsupported(String),
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

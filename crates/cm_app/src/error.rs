use cm_canvas::CanvasError;
use cm_drawing::DocumentError;
use thiserror::Error;

/// 编辑器错误
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("review has no layers to build pages from")]
    NoLayers,

    #[error("no uploaded location for {0}")]
    MissingUpload(String),
}

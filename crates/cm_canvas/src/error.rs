use thiserror::Error;

/// 画布/图像相关错误
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("empty image reference")]
    EmptyReference,

    #[error("unsupported image reference: {0}")]
    UnsupportedReference(String),

    #[error("malformed data url")]
    MalformedDataUrl,

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("png encode failed: {0}")]
    Encode(String),

    #[error("invalid buffer size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("invalid color: {0}")]
    InvalidColor(String),
}

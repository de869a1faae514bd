// 宿主侧模块声明
pub mod api;
pub mod error;
pub mod host;
pub mod import;
pub mod logging;
pub mod submit;
pub mod upload;

// 重新导出主要类型
pub use api::{HttpReviewClient, ImageFetcher, ReviewApi, load_review};
pub use error::{ApiError, AppError, AppResult, UploadError};
pub use host::ReviewSession;
pub use submit::{SubmitTarget, submit_review};
pub use upload::{PresignedUploader, Uploader};

pub use cm_app;
pub use cm_canvas;
pub use cm_drawing;
pub use cm_protocol;
pub use cm_settings;

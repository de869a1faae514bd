//! 本地图像文件导入
//!
//! 文件并发读取；整批完成后才返回结果，调用方据此做一次文档更新。

use std::path::{Path, PathBuf};

use cm_app::{BatchOutcome, LoadBatch};
use cm_canvas::{DataUrl, ImageRef};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// 读取单个图像文件为内联引用
pub async fn read_image(path: &Path) -> AppResult<ImageRef> {
    let bytes = tokio::fs::read(path).await?;
    let format = image::guess_format(&bytes)
        .map_err(|e| AppError::Import(format!("{}: {e}", path.display())))?;
    Ok(ImageRef::Inline(DataUrl::from_bytes(
        format.to_mime_type(),
        &bytes,
    )))
}

/// 读取一批图像文件，按给定顺序返回
///
/// 任一文件失败则整批失败。
pub async fn read_images(paths: Vec<PathBuf>) -> AppResult<Vec<ImageRef>> {
    let mut batch = LoadBatch::new(paths.len());
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let mut tasks = JoinSet::new();
    for (index, path) in paths.into_iter().enumerate() {
        tasks.spawn(async move {
            let result = read_image(&path).await.map_err(|e| e.to_string());
            (index, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.map_err(anyhow::Error::from)?;
        if let Some(outcome) = batch.record(index, result) {
            return match outcome {
                BatchOutcome::Complete(images) => {
                    debug!(count = images.len(), "image batch read");
                    Ok(images)
                }
                BatchOutcome::Failed(errors) => {
                    warn!(failed = errors.len(), "image batch failed");
                    Err(AppError::Import(errors.join("; ")))
                }
            };
        }
    }

    Err(AppError::Import(format!(
        "{} file(s) never completed",
        batch.remaining()
    )))
}

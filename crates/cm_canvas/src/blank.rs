use std::sync::OnceLock;

use tiny_skia::Pixmap;

use crate::codec::to_data_url;
use crate::{CANVAS_HEIGHT, CANVAS_WIDTH, CanvasError, Color, DataUrl};

static BLANK_INK: OnceLock<DataUrl> = OnceLock::new();

/// 生成纯色页面（PNG data URL）
pub fn blank_page(width: u32, height: u32, fill: Color) -> Result<DataUrl, CanvasError> {
    let mut pixmap = Pixmap::new(width, height).ok_or(CanvasError::InvalidSize { width, height })?;
    pixmap.fill(fill.to_skia());
    to_data_url(&pixmap)
}

/// 新建空白页的白色背景
pub fn white_page() -> Result<DataUrl, CanvasError> {
    blank_page(CANVAS_WIDTH, CANVAS_HEIGHT, Color::WHITE)
}

/// 透明墨迹层
///
/// 结果会被缓存，所有空白墨迹层共享同一个 `Arc`，比较时走指针快路径。
pub fn blank_ink_layer() -> Result<DataUrl, CanvasError> {
    if let Some(url) = BLANK_INK.get() {
        return Ok(url.clone());
    }
    let url = blank_page(CANVAS_WIDTH, CANVAS_HEIGHT, Color::TRANSPARENT)?;
    let _ = BLANK_INK.set(url.clone());
    Ok(url)
}

pub mod blank;
pub mod codec;
pub mod color;
pub mod error;
pub mod image_ref;
pub mod surface;

/// 逻辑画布宽度（与屏幕像素无关）
pub const CANVAS_WIDTH: u32 = 600;
/// 逻辑画布高度
pub const CANVAS_HEIGHT: u32 = 800;
/// 橡皮擦固定线宽
pub const ERASER_WIDTH: f32 = 20.0;

// 重新导出常用类型
pub use blank::{blank_ink_layer, blank_page, white_page};
pub use color::Color;
pub use error::CanvasError;
pub use image_ref::{DataUrl, ImageRef};
pub use surface::{DrawingSurface, InitOutcome, InkPoint, InkTool, LoadTicket};
pub use tiny_skia;

pub mod annotation;
pub mod document;
pub mod interaction;
pub mod page;
pub mod types;

pub use cm_canvas;

// 重新导出常用类型
pub use annotation::{Annotation, AnnotationId, Point, ScreenPoint, defaults};
pub use document::{DocumentError, ReviewDocument};
pub use interaction::{
    DRAG_THRESHOLD, HANDLE_DETECTION_RADIUS, HitTarget, Viewport, clamp_position, clamp_size,
    handle_position, is_drag_threshold_exceeded, is_near_handle,
};
pub use page::Page;
pub use types::{EditorMode, Interaction, ResizeHandle};

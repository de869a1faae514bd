use crate::types::ResizeHandle;
use crate::{AnnotationId, Point, ScreenPoint, defaults};

/// 点击/拖拽判定阈值（屏幕像素）
pub const DRAG_THRESHOLD: f64 = 3.0;

/// 手柄检测半径（逻辑单位）
pub const HANDLE_DETECTION_RADIUS: f64 = 8.0;

/// 检查是否超过拖拽阈值
#[inline]
pub fn is_drag_threshold_exceeded(start: ScreenPoint, current: ScreenPoint) -> bool {
    let dx = (current.x - start.x).abs();
    let dy = (current.y - start.y).abs();
    dx > DRAG_THRESHOLD || dy > DRAG_THRESHOLD
}

/// 渲染容器在屏幕上的位置与尺寸
///
/// 所有指针事件先经过它换算到逻辑坐标，因此存储的几何与显示分辨率无关。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    /// 1:1 显示
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: defaults::CANVAS_WIDTH,
            height: defaults::CANVAS_HEIGHT,
        }
    }
}

impl Viewport {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// 容器是否可用于换算
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    #[inline]
    pub fn scale_x(&self) -> f64 {
        defaults::CANVAS_WIDTH / self.width
    }

    #[inline]
    pub fn scale_y(&self) -> f64 {
        defaults::CANVAS_HEIGHT / self.height
    }

    /// 屏幕坐标 -> 逻辑坐标（容器无效时返回 None）
    pub fn to_logical(&self, p: ScreenPoint) -> Option<Point> {
        if !self.is_valid() {
            return None;
        }
        let logical = Point::new(
            (p.x - self.left) * self.scale_x(),
            (p.y - self.top) * self.scale_y(),
        );
        logical.is_finite().then_some(logical)
    }

    /// 逻辑坐标 -> 屏幕坐标
    pub fn to_screen(&self, p: Point) -> ScreenPoint {
        ScreenPoint::new(
            self.left + p.x / self.scale_x(),
            self.top + p.y / self.scale_y(),
        )
    }
}

/// 将左上角限制在画布边距内
pub fn clamp_position(position: Point, width: f64, height: f64) -> Point {
    let max_x = (defaults::CANVAS_WIDTH - defaults::MARGIN - width).max(defaults::MARGIN);
    let max_y = (defaults::CANVAS_HEIGHT - defaults::MARGIN - height).max(defaults::MARGIN);
    Point::new(
        position.x.clamp(defaults::MARGIN, max_x),
        position.y.clamp(defaults::MARGIN, max_y),
    )
}

/// 将尺寸限制在 [最小值, 左上角到边距的剩余空间]
pub fn clamp_size(position: Point, width: f64, height: f64) -> (f64, f64) {
    let max_width = (defaults::CANVAS_WIDTH - defaults::MARGIN - position.x).max(defaults::MIN_WIDTH);
    let max_height =
        (defaults::CANVAS_HEIGHT - defaults::MARGIN - position.y).max(defaults::MIN_HEIGHT);
    (
        width.clamp(defaults::MIN_WIDTH, max_width),
        height.clamp(defaults::MIN_HEIGHT, max_height),
    )
}

/// 手柄位置（逻辑坐标）
pub fn handle_position(position: Point, width: f64, height: f64, handle: ResizeHandle) -> Point {
    match handle {
        ResizeHandle::BottomRight => Point::new(position.x + width, position.y + height),
    }
}

/// 点是否落在手柄检测半径内
#[inline]
pub fn is_near_handle(p: Point, handle: Point) -> bool {
    let dx = p.x - handle.x;
    let dy = p.y - handle.y;
    dx * dx + dy * dy <= HANDLE_DETECTION_RADIUS * HANDLE_DETECTION_RADIUS
}

/// 指针命中目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// 已选中注释的调整手柄
    Handle(AnnotationId, ResizeHandle),
    /// 注释主体
    Body(AnnotationId),
    /// 空白画布
    Canvas,
}

#[cfg(test)]
mod tests {
    use super::{Viewport, clamp_position, clamp_size, is_drag_threshold_exceeded};
    use crate::{Point, ScreenPoint, defaults};

    #[test]
    fn test_drag_threshold() {
        let start = ScreenPoint::new(0.0, 0.0);
        assert!(!is_drag_threshold_exceeded(start, ScreenPoint::new(2.0, 2.0)));
        assert!(!is_drag_threshold_exceeded(start, ScreenPoint::new(3.0, -3.0)));
        assert!(is_drag_threshold_exceeded(start, ScreenPoint::new(4.0, 0.0)));
        assert!(is_drag_threshold_exceeded(start, ScreenPoint::new(0.0, -4.0)));
    }

    #[test]
    fn transform_is_resolution_independent() {
        let small = Viewport::new(10.0, 20.0, 300.0, 400.0);
        let large = Viewport::new(10.0, 20.0, 1200.0, 1600.0);

        // 相对位置 (0.25, 0.5)
        let a = small.to_logical(ScreenPoint::new(10.0 + 75.0, 20.0 + 200.0)).unwrap();
        let b = large.to_logical(ScreenPoint::new(10.0 + 300.0, 20.0 + 800.0)).unwrap();
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
        assert!((a.x - 150.0).abs() < 1e-9 && (a.y - 400.0).abs() < 1e-9);
    }

    #[test]
    fn screen_round_trip() {
        let vp = Viewport::new(5.0, 7.0, 450.0, 600.0);
        let p = Point::new(123.0, 456.0);
        let back = vp.to_logical(vp.to_screen(p)).unwrap();
        assert!((back.x - p.x).abs() < 1e-9 && (back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn degenerate_viewport_rejects_transform() {
        assert!(Viewport::new(0.0, 0.0, 0.0, 800.0).to_logical(ScreenPoint::default()).is_none());
        assert!(Viewport::new(0.0, 0.0, f64::NAN, 800.0).to_logical(ScreenPoint::default()).is_none());
    }

    #[test]
    fn test_clamp_position() {
        let p = clamp_position(Point::new(-100.0, 1000.0), 200.0, 50.0);
        assert_eq!(p, Point::new(defaults::MARGIN, defaults::CANVAS_HEIGHT - defaults::MARGIN - 50.0));
        let inside = clamp_position(Point::new(40.0, 40.0), 200.0, 50.0);
        assert_eq!(inside, Point::new(40.0, 40.0));
    }

    #[test]
    fn test_clamp_size() {
        let origin = Point::new(500.0, 700.0);
        assert_eq!(clamp_size(origin, 10.0, 10.0), (defaults::MIN_WIDTH, defaults::MIN_HEIGHT));
        assert_eq!(clamp_size(origin, 500.0, 500.0), (88.0, 88.0));
    }
}

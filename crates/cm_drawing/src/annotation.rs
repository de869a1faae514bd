use std::fmt;

use uuid::Uuid;

use crate::interaction::{clamp_position, clamp_size};

// ==================== 平台无关类型定义（core） ====================

/// 逻辑画布坐标（600×800 单位，与显示尺寸无关）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// 屏幕像素坐标（指针事件原始坐标）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 注释几何默认值
pub mod defaults {
    pub const CANVAS_WIDTH: f64 = cm_canvas::CANVAS_WIDTH as f64;
    pub const CANVAS_HEIGHT: f64 = cm_canvas::CANVAS_HEIGHT as f64;
    /// 注释与画布边缘的安全距离
    pub const MARGIN: f64 = 12.0;
    pub const MIN_WIDTH: f64 = 50.0;
    pub const MIN_HEIGHT: f64 = 30.0;
    pub const TEXT_WIDTH: f64 = 200.0;
    pub const TEXT_HEIGHT: f64 = 50.0;
    pub const TEXT_PLACEHOLDER: &str = "새 텍스트";
    pub const PEN_THICKNESS: f32 = 5.0;
    pub const MIN_PEN_THICKNESS: f32 = 1.0;
    pub const MAX_PEN_THICKNESS: f32 = 20.0;
}

/// 注释标识符（本地生成，提交前不带服务器身份）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "annotation-{}", self.0.simple())
    }
}

/// 文本注释
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    /// 左上角（逻辑坐标）
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub content: String,
}

impl Annotation {
    /// 按原样创建（不做限制，用于从服务器数据重建）
    pub fn new(position: Point, width: f64, height: f64, content: impl Into<String>) -> Self {
        Self {
            id: AnnotationId::new(),
            position,
            width,
            height,
            content: content.into(),
        }
    }

    /// 在指定位置创建默认尺寸、默认内容的注释，并限制在画布内
    pub fn placeholder(at: Point) -> Self {
        let mut annotation = Self::new(
            at,
            defaults::TEXT_WIDTH,
            defaults::TEXT_HEIGHT,
            defaults::TEXT_PLACEHOLDER,
        );
        annotation.clamp_into_canvas();
        annotation
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.position.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.position.y + self.height
    }

    /// 检查点是否在注释内
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.position.x && p.x <= self.right() && p.y >= self.position.y && p.y <= self.bottom()
    }

    /// 移动左上角（限制在画布边距内）
    ///
    /// 超出画布的尺寸（来自服务器的旧数据）同时被收缩。
    pub fn move_to(&mut self, position: Point) {
        if !position.is_finite() {
            return;
        }
        self.position = position;
        self.clamp_into_canvas();
    }

    /// 调整尺寸，右下角跟随指针（限制最小尺寸与剩余空间）
    ///
    /// 左上角先移入边距，为最小尺寸留出空间。
    pub fn resize_to(&mut self, width: f64, height: f64) {
        if !width.is_finite() || !height.is_finite() {
            return;
        }
        let right = self.position.x + width;
        let bottom = self.position.y + height;
        self.position = clamp_position(self.position, defaults::MIN_WIDTH, defaults::MIN_HEIGHT);
        let (width, height) = clamp_size(
            self.position,
            right - self.position.x,
            bottom - self.position.y,
        );
        self.width = width;
        self.height = height;
    }

    /// 规范化尺寸与位置，使整个边界框位于画布边距内
    pub fn clamp_into_canvas(&mut self) {
        let max_width = defaults::CANVAS_WIDTH - 2.0 * defaults::MARGIN;
        let max_height = defaults::CANVAS_HEIGHT - 2.0 * defaults::MARGIN;
        self.width = self.width.clamp(defaults::MIN_WIDTH, max_width);
        self.height = self.height.clamp(defaults::MIN_HEIGHT, max_height);
        self.position = clamp_position(self.position, self.width, self.height);
    }

    /// 边界框是否满足边距约束
    pub fn is_within_canvas(&self) -> bool {
        self.position.x >= defaults::MARGIN
            && self.position.y >= defaults::MARGIN
            && self.right() <= defaults::CANVAS_WIDTH - defaults::MARGIN
            && self.bottom() <= defaults::CANVAS_HEIGHT - defaults::MARGIN
            && self.width >= defaults::MIN_WIDTH
            && self.height >= defaults::MIN_HEIGHT
    }
}

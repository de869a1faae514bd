use cm_canvas::InkTool;

use crate::{AnnotationId, Point, ScreenPoint};

/// 编辑模式（工具栏可见状态）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorMode {
    /// 选择模式
    #[default]
    Select,
    /// 绘制模式（画笔/橡皮擦）
    Draw(InkTool),
    /// 添加文本
    Text,
    /// 更换背景
    Background,
}

impl EditorMode {
    /// 绘制表面是否接收指针输入
    pub fn is_drawing(&self) -> bool {
        matches!(self, Self::Draw(_))
    }
}

/// 调整大小手柄（目前只支持右下角）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    #[default]
    BottomRight,
}

/// 交互状态机
///
/// 单一状态值取代分散的布尔标志，非法组合（同时拖拽和调整大小等）无法表示。
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// 选择模式，无进行中的手势
    #[default]
    Idle,
    /// 在注释主体上按下，尚未超过拖拽阈值（抬起即视为点击）
    Pressing {
        annotation_id: AnnotationId,
        origin: ScreenPoint,
        offset: Point,
    },
    /// 正在移动注释；`offset` 为指针相对注释左上角的逻辑偏移
    Dragging {
        annotation_id: AnnotationId,
        offset: Point,
    },
    /// 正在调整注释大小
    Resizing {
        annotation_id: AnnotationId,
        handle: ResizeHandle,
    },
    /// 指针输入交给绘制表面
    Drawing { tool: InkTool },
    /// 下一次点击放置文本
    PlacingText,
    /// 等待文件选择以替换背景
    ChangingBackground,
}

impl Interaction {
    /// 对应的编辑模式
    pub fn mode(&self) -> EditorMode {
        match self {
            Self::Idle | Self::Pressing { .. } | Self::Dragging { .. } | Self::Resizing { .. } => {
                EditorMode::Select
            }
            Self::Drawing { tool } => EditorMode::Draw(*tool),
            Self::PlacingText => EditorMode::Text,
            Self::ChangingBackground => EditorMode::Background,
        }
    }

    /// 是否有进行中的注释手势
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            Self::Pressing { .. } | Self::Dragging { .. } | Self::Resizing { .. }
        )
    }

    /// 手势作用的注释
    pub fn gesture_target(&self) -> Option<AnnotationId> {
        match self {
            Self::Pressing { annotation_id, .. }
            | Self::Dragging { annotation_id, .. }
            | Self::Resizing { annotation_id, .. } => Some(*annotation_id),
            _ => None,
        }
    }
}

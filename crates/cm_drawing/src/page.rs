use cm_canvas::{CanvasError, ImageRef, blank_ink_layer, white_page};

use crate::interaction::{HitTarget, handle_position, is_near_handle};
use crate::types::ResizeHandle;
use crate::{Annotation, AnnotationId, Point};

/// 单页：背景 + 墨迹层 + 文本注释
///
/// 页码由页面在文档中的位置决定，不单独存储。
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub background: ImageRef,
    pub ink: ImageRef,
    /// 页内无序集合；绘制与命中测试以后加入者在上
    pub annotations: Vec<Annotation>,
}

impl Page {
    pub fn new(background: ImageRef, ink: ImageRef) -> Self {
        Self {
            background,
            ink,
            annotations: Vec::new(),
        }
    }

    /// 指定背景 + 空白透明墨迹层
    pub fn with_background(background: ImageRef) -> Result<Self, CanvasError> {
        Ok(Self::new(background, ImageRef::Inline(blank_ink_layer()?)))
    }

    /// 白色背景的空白页
    pub fn blank() -> Result<Self, CanvasError> {
        Self::with_background(ImageRef::Inline(white_page()?))
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn annotation_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    pub fn add_annotation(&mut self, annotation: Annotation) -> AnnotationId {
        let id = annotation.id;
        self.annotations.push(annotation);
        id
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        let pos = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(pos))
    }

    /// 命中测试
    ///
    /// 已选中注释的手柄优先，其次是自上而下的注释主体。
    pub fn hit_test(&self, p: Point, selected: Option<AnnotationId>) -> HitTarget {
        if let Some(selected) = selected.and_then(|id| self.annotation(id)) {
            let handle = ResizeHandle::BottomRight;
            let at = handle_position(selected.position, selected.width, selected.height, handle);
            if is_near_handle(p, at) {
                return HitTarget::Handle(selected.id, handle);
            }
        }

        self.annotations
            .iter()
            .rev()
            .find(|a| a.contains(p))
            .map_or(HitTarget::Canvas, |a| HitTarget::Body(a.id))
    }
}

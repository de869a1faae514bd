//! 墨迹绘制表面
//!
//! 单页、单层的透明墨迹缓冲区。表面独占实时缓冲区；对外只通过
//! `pointer_up` 返回的快照报告变化，调用方只持有快照，从不持有缓冲区本身。

use tiny_skia::{
    BlendMode, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, Stroke, Transform,
};
use tracing::{debug, warn};

use crate::codec::{decode_data_url, decode_pixmap, to_data_url};
use crate::{CANVAS_HEIGHT, CANVAS_WIDTH, Color, DataUrl, ERASER_WIDTH, ImageRef};

/// 墨迹工具
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InkTool {
    /// 画笔：按配置颜色与线宽正常叠加
    #[default]
    Pen,
    /// 橡皮擦：固定线宽，destination-out 合成
    Eraser,
}

/// 逻辑坐标系中的点
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InkPoint {
    pub x: f32,
    pub y: f32,
}

impl InkPoint {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 远程墨迹加载凭据
///
/// 异步加载完成后必须带着凭据回调 `finish_load`；若期间请求了其他来源，
/// 旧凭据失效，结果被丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    source: String,
    generation: u64,
}

impl LoadTicket {
    /// 需要获取的远程地址
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// `initialize` / `finish_load` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// 与上次加载的引用相同，未重绘
    Unchanged,
    /// 无墨迹数据，缓冲区已清空
    Cleared,
    /// 已解码并替换缓冲区
    Loaded,
    /// 远程引用，等待宿主获取字节
    Pending(LoadTicket),
    /// 解码失败，缓冲区保持不变
    Failed,
}

/// 进行中的笔画
#[derive(Debug)]
struct OpenStroke {
    /// 落笔前的缓冲区，每次移动都从它重绘整条路径
    base: Pixmap,
    points: Vec<InkPoint>,
    tool: InkTool,
    color: Color,
    width: f32,
}

/// 墨迹绘制表面
#[derive(Debug)]
pub struct DrawingSurface {
    /// 实时缓冲区；无法创建时所有操作均为空操作
    buffer: Option<Pixmap>,
    active: bool,
    tool: InkTool,
    color: Color,
    thickness: f32,
    stroke: Option<OpenStroke>,
    /// 最近一次成功加载或发出的引用（重复加载保护）
    loaded: Option<ImageRef>,
    pending: Option<LoadTicket>,
    generation: u64,
    /// 可见内容每变化一次加一
    revision: u64,
}

impl Default for DrawingSurface {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl DrawingSurface {
    /// 默认画笔线宽
    pub const DEFAULT_THICKNESS: f32 = 5.0;

    /// 创建指定逻辑尺寸的表面
    pub fn new(width: u32, height: u32) -> Self {
        let buffer = Pixmap::new(width, height);
        if buffer.is_none() {
            warn!(width, height, "drawing surface buffer unavailable");
        }
        Self {
            buffer,
            active: false,
            tool: InkTool::Pen,
            color: Color::RED,
            thickness: Self::DEFAULT_THICKNESS,
            stroke: None,
            loaded: None,
            pending: None,
            generation: 0,
            revision: 0,
        }
    }

    /// 缓冲区是否可用
    pub fn is_available(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn tool(&self) -> InkTool {
        self.tool
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 当前缓冲区（只读）
    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.buffer.as_ref()
    }

    pub fn loaded_reference(&self) -> Option<&ImageRef> {
        self.loaded.as_ref()
    }

    pub fn pending_load(&self) -> Option<&LoadTicket> {
        self.pending.as_ref()
    }

    /// 激活/停用表面
    ///
    /// 停用时未完成的笔画被撤回；调用方应先通过 `pointer_up` 提交。
    pub fn set_active(&mut self, active: bool) {
        if !active && self.stroke.is_some() {
            debug!("surface deactivated mid-stroke, reverting");
            self.cancel_stroke();
        }
        self.active = active;
    }

    pub fn set_tool(&mut self, tool: InkTool) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_thickness(&mut self, thickness: f32) {
        self.thickness = thickness.max(0.5);
    }

    /// 用墨迹引用初始化缓冲区
    ///
    /// 与上次成功加载（或正在加载）的引用相同时不做任何事，避免重复重绘。
    pub fn initialize(&mut self, ink: Option<&ImageRef>) -> InitOutcome {
        if self.buffer.is_none() {
            return InitOutcome::Unchanged;
        }

        let Some(ink) = ink else {
            if self.loaded.is_none() && self.pending.is_none() && !self.is_stroking() {
                return InitOutcome::Unchanged;
            }
            self.stroke = None;
            self.pending = None;
            self.loaded = None;
            self.clear_buffer();
            return InitOutcome::Cleared;
        };

        if self.loaded.as_ref() == Some(ink) {
            return InitOutcome::Unchanged;
        }
        if let (ImageRef::Remote(url), Some(pending)) = (ink, &self.pending)
            && pending.source == *url
        {
            return InitOutcome::Unchanged;
        }

        match ink {
            ImageRef::Inline(data) => {
                self.pending = None;
                match decode_data_url(data) {
                    Ok(pixmap) => {
                        self.replace_buffer(&pixmap);
                        self.loaded = Some(ink.clone());
                        InitOutcome::Loaded
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to decode inline ink layer");
                        InitOutcome::Failed
                    }
                }
            }
            ImageRef::Remote(url) => {
                self.generation += 1;
                let ticket = LoadTicket {
                    source: url.clone(),
                    generation: self.generation,
                };
                // 解码完成前先显示空白层
                self.stroke = None;
                self.loaded = None;
                self.clear_buffer();
                self.pending = Some(ticket.clone());
                debug!(source = %url, generation = ticket.generation, "ink load requested");
                InitOutcome::Pending(ticket)
            }
        }
    }

    /// 远程加载完成
    ///
    /// 凭据不是当前请求的凭据时（用户已切换页面）丢弃结果。
    pub fn finish_load(&mut self, ticket: &LoadTicket, bytes: &[u8]) -> InitOutcome {
        if self.pending.as_ref() != Some(ticket) {
            debug!(source = %ticket.source, "discarding stale ink load");
            return InitOutcome::Unchanged;
        }
        self.pending = None;

        match decode_pixmap(bytes) {
            Ok(pixmap) => {
                self.replace_buffer(&pixmap);
                self.loaded = Some(ImageRef::Remote(ticket.source.clone()));
                InitOutcome::Loaded
            }
            Err(e) => {
                warn!(source = %ticket.source, error = %e, "failed to decode remote ink layer");
                InitOutcome::Failed
            }
        }
    }

    /// 远程加载失败：保持缓冲区不变
    pub fn fail_load(&mut self, ticket: &LoadTicket) {
        if self.pending.as_ref() == Some(ticket) {
            warn!(source = %ticket.source, "ink load failed");
            self.pending = None;
        }
    }

    /// 清空为透明层，并把 `reference` 记为已加载，避免随后的重复加载
    pub fn clear_with(&mut self, reference: ImageRef) {
        if self.buffer.is_none() {
            return;
        }
        self.stroke = None;
        self.pending = None;
        self.clear_buffer();
        self.loaded = Some(reference);
    }

    /// 落笔
    ///
    /// 远程墨迹尚未解码时拒绝输入，否则笔画会被随后到达的墨迹覆盖。
    pub fn pointer_down(&mut self, point: InkPoint) -> bool {
        if !self.active {
            return false;
        }
        if let Some(pending) = &self.pending {
            debug!(source = %pending.source, "ink still loading, stroke refused");
            return false;
        }
        let Some(buffer) = self.buffer.as_ref() else {
            return false;
        };

        let (color, width) = match self.tool {
            InkTool::Pen => (self.color, self.thickness),
            InkTool::Eraser => (Color::rgb(0, 0, 0), ERASER_WIDTH),
        };
        self.stroke = Some(OpenStroke {
            base: buffer.clone(),
            points: vec![point],
            tool: self.tool,
            color,
            width,
        });
        self.render_stroke();
        true
    }

    /// 移动：延长当前路径
    pub fn pointer_move(&mut self, point: InkPoint) -> bool {
        if !self.active {
            return false;
        }
        let Some(stroke) = self.stroke.as_mut() else {
            return false;
        };
        stroke.points.push(point);
        self.render_stroke();
        true
    }

    /// 抬笔/离开：结束路径并返回展平后的快照
    pub fn pointer_up(&mut self) -> Option<DataUrl> {
        if !self.active {
            return None;
        }
        self.stroke.take()?;
        let buffer = self.buffer.as_ref()?;

        match to_data_url(buffer) {
            Ok(snapshot) => {
                self.loaded = Some(ImageRef::Inline(snapshot.clone()));
                Some(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "failed to snapshot ink layer");
                None
            }
        }
    }

    /// 撤回进行中的笔画
    pub fn cancel_stroke(&mut self) {
        if let (Some(stroke), Some(buffer)) = (self.stroke.take(), self.buffer.as_mut()) {
            buffer.data_mut().copy_from_slice(stroke.base.data());
            self.revision += 1;
        }
    }

    fn clear_buffer(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.fill(tiny_skia::Color::TRANSPARENT);
            self.revision += 1;
        }
    }

    /// "替换" 合成：清空后按缓冲区尺寸绘制图像
    fn replace_buffer(&mut self, image: &Pixmap) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };

        if image.width() == buffer.width() && image.height() == buffer.height() {
            buffer.data_mut().copy_from_slice(image.data());
        } else {
            buffer.fill(tiny_skia::Color::TRANSPARENT);
            let transform = Transform::from_scale(
                buffer.width() as f32 / image.width() as f32,
                buffer.height() as f32 / image.height() as f32,
            );
            let paint = PixmapPaint {
                blend_mode: BlendMode::Source,
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            buffer.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
        }
        self.revision += 1;
    }

    /// 从落笔前的缓冲区重绘整条路径
    fn render_stroke(&mut self) {
        let (Some(stroke), Some(buffer)) = (self.stroke.as_ref(), self.buffer.as_mut()) else {
            return;
        };
        buffer.data_mut().copy_from_slice(stroke.base.data());

        let mut paint = Paint::default();
        paint.anti_alias = true;
        match stroke.tool {
            InkTool::Pen => {
                paint.set_color(stroke.color.to_skia());
                paint.blend_mode = BlendMode::SourceOver;
            }
            InkTool::Eraser => {
                paint.set_color(tiny_skia::Color::BLACK);
                paint.blend_mode = BlendMode::DestinationOut;
            }
        }

        let first = stroke.points[0];
        let is_dot = stroke.points.iter().all(|p| *p == first);

        if is_dot {
            if let Some(path) = PathBuilder::from_circle(first.x, first.y, stroke.width / 2.0) {
                buffer.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        } else {
            let mut pb = PathBuilder::new();
            pb.move_to(first.x, first.y);
            for p in &stroke.points[1..] {
                pb.line_to(p.x, p.y);
            }
            if let Some(path) = pb.finish() {
                let style = Stroke {
                    width: stroke.width,
                    line_cap: LineCap::Round,
                    line_join: LineJoin::Round,
                    ..Stroke::default()
                };
                buffer.stroke_path(&path, &paint, &style, Transform::identity(), None);
            }
        }
        self.revision += 1;
    }
}

//! 文档 <-> 提交格式
//!
//! 页面被展平为两张平行列表：注释列表与图层列表，都以页码标记归属。
//! 内联栅格（新建页、替换的背景、新画的墨迹）需要先上传，远程引用原样透传。

use std::collections::HashSet;

use cm_canvas::{CanvasError, DataUrl, ImageRef, blank_ink_layer};
use cm_drawing::{Annotation, Page, Point, ReviewDocument};
use cm_protocol::{AnnotationPosition, ReviewAnnotation, ReviewDetail, ReviewLayer, ReviewSubmission};
use tracing::{debug, warn};

use crate::{EditorError, SessionContext};

/// 页面上的栅格层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Background,
    Ink,
}

/// 需要上传的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub page_index: usize,
    pub kind: LayerKind,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    /// 生成该文件的引用；回写前用它确认页面没有再被修改
    pub source: ImageRef,
}

/// 上传或透传
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterPayload {
    PassThrough(String),
    Upload(UploadFile),
}

/// 单页图层草稿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDraft {
    pub page_number: u32,
    pub background: RasterPayload,
    pub ink: RasterPayload,
}

/// 一个已完成的上传
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedLayer {
    pub page_index: usize,
    pub kind: LayerKind,
    pub source: ImageRef,
    pub url: String,
}

impl UploadedLayer {
    pub fn new(file: &UploadFile, url: impl Into<String>) -> Self {
        Self {
            page_index: file.page_index,
            kind: file.kind,
            source: file.source.clone(),
            url: url.into(),
        }
    }
}

/// 提交草稿：结构化注释 + 每页的 "上传或透传" 负载
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmissionDraft {
    pub annotations: Vec<ReviewAnnotation>,
    pub layers: Vec<LayerDraft>,
}

impl SubmissionDraft {
    /// 按页序展平文档
    pub fn from_document(
        document: &ReviewDocument,
        session: &SessionContext,
    ) -> Result<Self, EditorError> {
        let mut draft = Self::default();

        for (index, page) in document.pages().iter().enumerate() {
            let page_number = page_number(index);
            draft.annotations.extend(
                page.annotations
                    .iter()
                    .map(|a| annotation_to_wire(a, page_number)),
            );

            let stem = session.file_stem(index);
            draft.layers.push(LayerDraft {
                page_number,
                background: payload(
                    &page.background,
                    index,
                    LayerKind::Background,
                    &format!("{stem}-bg"),
                )?,
                ink: payload(&page.ink, index, LayerKind::Ink, &stem)?,
            });
        }

        debug!(
            pages = draft.layers.len(),
            annotations = draft.annotations.len(),
            uploads = draft.uploads().count(),
            "submission draft built"
        );
        Ok(draft)
    }

    /// 所有待上传文件
    pub fn uploads(&self) -> impl Iterator<Item = &UploadFile> {
        self.layers
            .iter()
            .flat_map(|l| [&l.background, &l.ink])
            .filter_map(|p| match p {
                RasterPayload::Upload(file) => Some(file),
                RasterPayload::PassThrough(_) => None,
            })
    }

    /// 代入上传结果，得到请求体
    ///
    /// 任何一个待上传文件缺少结果都会失败。
    pub fn finish(self, uploaded: &[UploadedLayer]) -> Result<ReviewSubmission, EditorError> {
        let resolve = |payload: RasterPayload| -> Result<String, EditorError> {
            match payload {
                RasterPayload::PassThrough(url) => Ok(url),
                RasterPayload::Upload(file) => uploaded
                    .iter()
                    .find(|u| u.page_index == file.page_index && u.kind == file.kind)
                    .map(|u| u.url.clone())
                    .ok_or(EditorError::MissingUpload(file.file_name)),
            }
        };

        let layers = self
            .layers
            .into_iter()
            .map(|layer| -> Result<ReviewLayer, EditorError> {
                Ok(ReviewLayer {
                    ink_image_ref: resolve(layer.ink)?,
                    background_image_ref: resolve(layer.background)?,
                    page_number: layer.page_number,
                })
            })
            .collect::<Result<Vec<_>, EditorError>>()?;

        Ok(ReviewSubmission {
            annotations: self.annotations,
            layers,
        })
    }
}

/// 把上传得到的地址写回文档
///
/// 只替换仍等于上传来源的图层，返回替换数量。
pub fn apply_uploaded(document: &mut ReviewDocument, uploaded: &[UploadedLayer]) -> usize {
    let mut replaced = 0;
    for u in uploaded {
        let Some(page) = document.page_mut(u.page_index) else {
            continue;
        };
        let slot = match u.kind {
            LayerKind::Background => &mut page.background,
            LayerKind::Ink => &mut page.ink,
        };
        if *slot == u.source {
            *slot = ImageRef::Remote(u.url.clone());
            replaced += 1;
        }
    }
    replaced
}

/// 从已保存的评审重建可编辑文档
///
/// 图层按页码升序排列后重新编号为数组下标；注释按原页码归入对应页。
pub fn document_from_review(detail: &ReviewDetail) -> Result<ReviewDocument, EditorError> {
    let mut layers: Vec<&ReviewLayer> = detail.layers.iter().collect();
    layers.sort_by_key(|l| l.page_number);

    let mut seen = HashSet::new();
    layers.retain(|l| {
        let first = seen.insert(l.page_number);
        if !first {
            warn!(page_number = l.page_number, "duplicate layer for page, ignored");
        }
        first
    });
    if layers.is_empty() {
        return Err(EditorError::NoLayers);
    }

    let orphans = detail
        .annotations
        .iter()
        .filter(|a| !seen.contains(&a.page_number))
        .count();
    if orphans > 0 {
        warn!(orphans, review_id = detail.id, "annotations reference missing pages");
    }

    let pages = layers
        .into_iter()
        .map(|layer| -> Result<Page, EditorError> {
            let mut page = Page::new(
                ImageRef::parse(&layer.background_image_ref)?,
                ink_reference(&layer.ink_image_ref)?,
            );
            page.annotations = detail
                .annotations
                .iter()
                .filter(|a| a.page_number == layer.page_number)
                .map(annotation_from_wire)
                .collect();
            Ok(page)
        })
        .collect::<Result<Vec<_>, EditorError>>()?;

    Ok(ReviewDocument::new(pages)?)
}

fn page_number(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// 空墨迹引用视为空白层
fn ink_reference(raw: &str) -> Result<ImageRef, CanvasError> {
    match ImageRef::parse(raw) {
        Err(CanvasError::EmptyReference) => Ok(ImageRef::Inline(blank_ink_layer()?)),
        other => other,
    }
}

fn annotation_to_wire(a: &Annotation, page_number: u32) -> ReviewAnnotation {
    ReviewAnnotation {
        content: a.content.clone(),
        position: AnnotationPosition {
            x: a.position.x,
            y: a.position.y,
        },
        width: a.width,
        height: a.height,
        page_number,
    }
}

fn annotation_from_wire(a: &ReviewAnnotation) -> Annotation {
    Annotation::new(
        Point::new(a.position.x, a.position.y),
        a.width,
        a.height,
        a.content.clone(),
    )
}

fn payload(
    image: &ImageRef,
    page_index: usize,
    kind: LayerKind,
    stem: &str,
) -> Result<RasterPayload, CanvasError> {
    match image {
        ImageRef::Remote(url) => Ok(RasterPayload::PassThrough(url.clone())),
        ImageRef::Inline(data) => Ok(RasterPayload::Upload(upload_file(
            data, page_index, kind, stem,
        )?)),
    }
}

fn upload_file(
    data: &DataUrl,
    page_index: usize,
    kind: LayerKind,
    stem: &str,
) -> Result<UploadFile, CanvasError> {
    let mime = data.mime().to_string();
    Ok(UploadFile {
        page_index,
        kind,
        file_name: format!("{stem}.{}", extension_for(&mime)),
        bytes: data.decode()?,
        mime,
        source: ImageRef::Inline(data.clone()),
    })
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "png",
    }
}

use std::fmt;

use cm_canvas::{
    Color, DrawingSurface, ImageRef, InitOutcome, InkPoint, InkTool, LoadTicket, blank_ink_layer,
};
use cm_drawing::{
    Annotation, AnnotationId, DocumentError, EditorMode, HitTarget, Interaction, Page, Point,
    ReviewDocument, ScreenPoint, Viewport, defaults, is_drag_threshold_exceeded,
};
use tracing::{debug, info, warn};

pub mod batch;
pub mod error;
pub mod serialize;
pub mod session;
pub mod submit;

pub use batch::{BatchOutcome, LoadBatch};
pub use error::EditorError;
pub use serialize::{
    LayerDraft, LayerKind, RasterPayload, SubmissionDraft, UploadFile, UploadedLayer,
    apply_uploaded, document_from_review,
};
pub use session::SessionContext;

/// Editor actions.
///
/// Pointer positions are raw screen pixels; the editor converts them through the
/// current [`Viewport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    PointerDown(ScreenPoint),
    /// Global move listener: keeps firing outside the canvas while a gesture is active.
    PointerMove(ScreenPoint),
    PointerUp(ScreenPoint),
    /// Pointer left the drawing surface.
    PointerLeave,
    /// Rendering container moved or resized.
    SetViewport(Viewport),
    /// Pen/eraser toolbar button (pressing the active tool again returns to select).
    SelectInkTool(InkTool),
    EnterTextMode,
    EnterBackgroundMode,
    /// File picker result; `None` when the user cancelled.
    ApplyBackground(Option<ImageRef>),
    SetPenColor(String),
    SetPenThickness(f32),
    /// Reset the active page's ink to a blank transparent layer.
    ClearInk,
    AddBlankPage,
    DeletePage(usize),
    SelectPage(usize),
    /// One completed import batch (single document update).
    AppendPages(Vec<ImageRef>),
    DeleteAnnotation(AnnotationId),
    SetAnnotationContent {
        id: AnnotationId,
        content: String,
    },
    InkLoaded {
        ticket: LoadTicket,
        bytes: Vec<u8>,
    },
    InkLoadFailed(LoadTicket),
    Submit,
    /// Every upload and the review request succeeded.
    SubmitSucceeded(Vec<UploadedLayer>),
    SubmitFailed(String),
}

/// User-facing notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LastPage,
    InvalidColor(String),
    PageCreationFailed(String),
    Submitted,
    SubmitFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastPage => write!(f, "The last remaining page cannot be deleted."),
            Self::InvalidColor(value) => write!(f, "'{value}' is not a valid pen color."),
            Self::PageCreationFailed(reason) => write!(f, "Could not create page: {reason}"),
            Self::Submitted => write!(f, "Review saved."),
            Self::SubmitFailed(reason) => write!(f, "Failed to save review: {reason}"),
        }
    }
}

/// Editor effects, executed by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Visible state changed.
    Redraw,
    /// Fetch remote ink bytes and report back with `InkLoaded`/`InkLoadFailed`.
    FetchInk(LoadTicket),
    /// Show the system file picker for a new background.
    OpenBackgroundPicker,
    /// Upload pending rasters, then create/update the review.
    Submit(SubmissionDraft),
    Notify(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PenSettings {
    color: Color,
    thickness: f32,
}

impl Default for PenSettings {
    fn default() -> Self {
        Self {
            color: Color::RED,
            thickness: defaults::PEN_THICKNESS,
        }
    }
}

/// Review editor model.
///
/// Owns the document, the interaction state machine and the live drawing surface.
/// The surface is bound to the active page and only reports ink through snapshots.
#[derive(Debug)]
pub struct EditorModel {
    document: ReviewDocument,
    session: SessionContext,
    interaction: Interaction,
    selected: Option<AnnotationId>,
    pen: PenSettings,
    surface: DrawingSurface,
    viewport: Viewport,
    submit: submit::Model,
}

impl EditorModel {
    /// Open a document; the returned effects load the first page's ink.
    pub fn open(document: ReviewDocument, session: SessionContext) -> (Self, Vec<Effect>) {
        let mut model = Self {
            document,
            session,
            interaction: Interaction::Idle,
            selected: None,
            pen: PenSettings::default(),
            surface: DrawingSurface::default(),
            viewport: Viewport::default(),
            submit: submit::Model::default(),
        };
        let effects = model.sync_surface();
        (model, effects)
    }

    pub fn document(&self) -> &ReviewDocument {
        &self.document
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn mode(&self) -> EditorMode {
        self.interaction.mode()
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    /// Annotation on the active page.
    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.document.active_page().annotation(id)
    }

    pub fn pen_color(&self) -> Color {
        self.pen.color
    }

    pub fn pen_thickness(&self) -> f32 {
        self.pen.thickness
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn submit(&self) -> &submit::Model {
        &self.submit
    }

    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::PointerDown(p) => self.pointer_down(p),
            Action::PointerMove(p) => self.pointer_move(p),
            Action::PointerUp(p) => self.pointer_up(p),

            Action::PointerLeave => {
                if self.commit_stroke() {
                    vec![Effect::Redraw]
                } else {
                    Vec::new()
                }
            }

            Action::SetViewport(viewport) => {
                if viewport.is_valid() {
                    self.viewport = viewport;
                } else {
                    debug!(?viewport, "ignoring degenerate viewport");
                }
                Vec::new()
            }

            Action::SelectInkTool(tool) => {
                let next = if self.interaction == (Interaction::Drawing { tool }) {
                    Interaction::Idle
                } else {
                    Interaction::Drawing { tool }
                };
                self.transition(next)
            }

            Action::EnterTextMode => self.transition(Interaction::PlacingText),

            Action::EnterBackgroundMode => {
                let mut effects = self.transition(Interaction::ChangingBackground);
                effects.push(Effect::OpenBackgroundPicker);
                effects
            }

            Action::ApplyBackground(image) => {
                let mut effects = self.transition(Interaction::Idle);
                if let Some(image) = image {
                    self.document.active_page_mut().background = image;
                    effects.push(Effect::Redraw);
                }
                effects
            }

            Action::SetPenColor(hex) => match Color::from_hex(&hex) {
                Ok(color) => {
                    self.pen.color = color;
                    self.surface.set_color(color);
                    Vec::new()
                }
                Err(e) => {
                    debug!(error = %e, "rejected pen color");
                    vec![Effect::Notify(Notice::InvalidColor(hex))]
                }
            },

            Action::SetPenThickness(thickness) => {
                if thickness.is_finite() {
                    self.pen.thickness =
                        thickness.clamp(defaults::MIN_PEN_THICKNESS, defaults::MAX_PEN_THICKNESS);
                    self.surface.set_thickness(self.pen.thickness);
                }
                Vec::new()
            }

            Action::ClearInk => self.clear_ink(),

            Action::AddBlankPage => match Page::blank() {
                Ok(page) => self.append_pages(vec![page]),
                Err(e) => vec![Effect::Notify(Notice::PageCreationFailed(e.to_string()))],
            },

            Action::AppendPages(images) => {
                match images
                    .into_iter()
                    .map(Page::with_background)
                    .collect::<Result<Vec<_>, _>>()
                {
                    Ok(pages) => self.append_pages(pages),
                    Err(e) => vec![Effect::Notify(Notice::PageCreationFailed(e.to_string()))],
                }
            }

            Action::DeletePage(index) => self.delete_page(index),

            Action::SelectPage(index) => {
                if index >= self.document.page_count() {
                    debug!(index, "select page out of range");
                    return Vec::new();
                }
                self.change_pages(|doc| doc.set_active(index))
            }

            Action::DeleteAnnotation(id) => {
                if self.document.active_page_mut().remove_annotation(id).is_none() {
                    return Vec::new();
                }
                if self.selected == Some(id) {
                    self.selected = None;
                }
                if self.interaction.gesture_target() == Some(id) {
                    self.interaction = Interaction::Idle;
                }
                vec![Effect::Redraw]
            }

            Action::SetAnnotationContent { id, content } => {
                match self.document.active_page_mut().annotation_mut(id) {
                    Some(annotation) if annotation.content != content => {
                        annotation.content = content;
                        vec![Effect::Redraw]
                    }
                    _ => Vec::new(),
                }
            }

            Action::InkLoaded { ticket, bytes } => match self.surface.finish_load(&ticket, &bytes) {
                InitOutcome::Loaded => vec![Effect::Redraw],
                _ => Vec::new(),
            },

            Action::InkLoadFailed(ticket) => {
                self.surface.fail_load(&ticket);
                Vec::new()
            }

            Action::Submit => {
                // Ignore re-entrant submits while one is in flight.
                if self.submit.is_in_flight() {
                    return Vec::new();
                }
                self.commit_stroke();

                match SubmissionDraft::from_document(&self.document, &self.session) {
                    Ok(draft) => {
                        self.submit.start();
                        info!(pages = draft.layers.len(), "submitting review");
                        vec![Effect::Submit(draft)]
                    }
                    Err(e) => {
                        warn!(error = %e, "could not prepare submission");
                        vec![Effect::Notify(Notice::SubmitFailed(e.to_string()))]
                    }
                }
            }

            Action::SubmitSucceeded(uploaded) => {
                self.submit.finish();
                let replaced = apply_uploaded(&mut self.document, &uploaded);
                info!(replaced, "review submitted");
                vec![Effect::Notify(Notice::Submitted)]
            }

            Action::SubmitFailed(reason) => {
                self.submit.finish();
                warn!(%reason, "review submission failed");
                vec![Effect::Notify(Notice::SubmitFailed(reason))]
            }
        }
    }

    fn pointer_down(&mut self, screen: ScreenPoint) -> Vec<Effect> {
        let Some(p) = self.viewport.to_logical(screen) else {
            return Vec::new();
        };

        match self.interaction {
            Interaction::Drawing { .. } => {
                if self.surface.pointer_down(ink_point(p)) {
                    vec![Effect::Redraw]
                } else {
                    Vec::new()
                }
            }

            Interaction::PlacingText => {
                let id = self
                    .document
                    .active_page_mut()
                    .add_annotation(Annotation::placeholder(p));
                self.selected = Some(id);
                self.interaction = Interaction::Idle;
                debug!(%id, x = p.x, y = p.y, "text annotation placed");
                vec![Effect::Redraw]
            }

            Interaction::ChangingBackground => Vec::new(),

            Interaction::Idle
            | Interaction::Pressing { .. }
            | Interaction::Dragging { .. }
            | Interaction::Resizing { .. } => {
                let page = self.document.active_page();
                match page.hit_test(p, self.selected) {
                    HitTarget::Handle(annotation_id, handle) => {
                        self.interaction = Interaction::Resizing {
                            annotation_id,
                            handle,
                        };
                        Vec::new()
                    }
                    HitTarget::Body(annotation_id) => {
                        let offset = page
                            .annotation(annotation_id)
                            .map(|a| Point::new(p.x - a.position.x, p.y - a.position.y))
                            .unwrap_or_default();
                        self.interaction = Interaction::Pressing {
                            annotation_id,
                            origin: screen,
                            offset,
                        };
                        Vec::new()
                    }
                    HitTarget::Canvas => {
                        self.interaction = Interaction::Idle;
                        if self.selected.take().is_some() {
                            vec![Effect::Redraw]
                        } else {
                            Vec::new()
                        }
                    }
                }
            }
        }
    }

    fn pointer_move(&mut self, screen: ScreenPoint) -> Vec<Effect> {
        let Some(p) = self.viewport.to_logical(screen) else {
            return Vec::new();
        };

        match self.interaction {
            Interaction::Drawing { .. } => {
                if self.surface.pointer_move(ink_point(p)) {
                    vec![Effect::Redraw]
                } else {
                    Vec::new()
                }
            }

            Interaction::Pressing {
                annotation_id,
                origin,
                offset,
            } => {
                if !is_drag_threshold_exceeded(origin, screen) {
                    return Vec::new();
                }
                self.selected = Some(annotation_id);
                self.interaction = Interaction::Dragging {
                    annotation_id,
                    offset,
                };
                self.drag_to(annotation_id, p, offset)
            }

            Interaction::Dragging {
                annotation_id,
                offset,
            } => self.drag_to(annotation_id, p, offset),

            Interaction::Resizing { annotation_id, .. } => {
                match self.document.active_page_mut().annotation_mut(annotation_id) {
                    Some(a) => {
                        a.resize_to(p.x - a.position.x, p.y - a.position.y);
                        vec![Effect::Redraw]
                    }
                    None => {
                        self.interaction = Interaction::Idle;
                        Vec::new()
                    }
                }
            }

            _ => Vec::new(),
        }
    }

    fn pointer_up(&mut self, _screen: ScreenPoint) -> Vec<Effect> {
        match self.interaction {
            Interaction::Drawing { .. } => {
                if self.commit_stroke() {
                    vec![Effect::Redraw]
                } else {
                    Vec::new()
                }
            }

            // Below the drag threshold: a click.
            Interaction::Pressing { annotation_id, .. } => {
                self.interaction = Interaction::Idle;
                self.selected = Some(annotation_id);
                vec![Effect::Redraw]
            }

            Interaction::Dragging { .. } | Interaction::Resizing { .. } => {
                self.interaction = Interaction::Idle;
                Vec::new()
            }

            _ => Vec::new(),
        }
    }

    fn drag_to(&mut self, id: AnnotationId, pointer: Point, offset: Point) -> Vec<Effect> {
        match self.document.active_page_mut().annotation_mut(id) {
            Some(a) => {
                a.move_to(Point::new(pointer.x - offset.x, pointer.y - offset.y));
                vec![Effect::Redraw]
            }
            None => {
                self.interaction = Interaction::Idle;
                Vec::new()
            }
        }
    }

    /// Move the state machine; leaving draw mode commits any open stroke.
    fn transition(&mut self, next: Interaction) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.interaction == next {
            return effects;
        }
        if self.commit_stroke() {
            effects.push(Effect::Redraw);
        }

        match next {
            Interaction::Drawing { tool } => {
                self.surface.set_tool(tool);
                self.surface.set_color(self.pen.color);
                self.surface.set_thickness(self.pen.thickness);
                self.surface.set_active(true);
            }
            _ => self.surface.set_active(false),
        }

        debug!(from = ?self.interaction.mode(), to = ?next.mode(), "mode change");
        self.interaction = next;
        effects
    }

    /// Close an open stroke and store its snapshot on the active page.
    fn commit_stroke(&mut self) -> bool {
        if !self.surface.is_stroking() {
            return false;
        }
        match self.surface.pointer_up() {
            Some(snapshot) => {
                self.document.active_page_mut().ink = ImageRef::Inline(snapshot);
                true
            }
            None => false,
        }
    }

    fn clear_ink(&mut self) -> Vec<Effect> {
        let blank = match blank_ink_layer() {
            Ok(blank) => ImageRef::Inline(blank),
            Err(e) => {
                warn!(error = %e, "could not create blank ink layer");
                return Vec::new();
            }
        };
        self.surface.cancel_stroke();
        self.surface.clear_with(blank.clone());
        self.document.active_page_mut().ink = blank;
        vec![Effect::Redraw]
    }

    fn append_pages(&mut self, pages: Vec<Page>) -> Vec<Effect> {
        if pages.is_empty() {
            return Vec::new();
        }
        self.change_pages(move |doc| {
            for page in pages {
                doc.push_page(page);
            }
            Ok(())
        })
    }

    fn delete_page(&mut self, index: usize) -> Vec<Effect> {
        self.change_pages(|doc| doc.remove_page(index).map(|_| ()))
    }

    /// Run a page-list mutation.
    ///
    /// Any in-progress gesture ends first and an open stroke is committed to the page
    /// it was drawn on; afterwards the editor is in select mode on the new active page.
    fn change_pages<F>(&mut self, mutate: F) -> Vec<Effect>
    where
        F: FnOnce(&mut ReviewDocument) -> Result<(), DocumentError>,
    {
        self.commit_stroke();
        let before = self.document.active_index();

        if let Err(e) = mutate(&mut self.document) {
            return match e {
                DocumentError::LastPage => vec![Effect::Notify(Notice::LastPage)],
                other => {
                    debug!(error = %other, "page change rejected");
                    Vec::new()
                }
            };
        }

        self.surface.set_active(false);
        self.interaction = Interaction::Idle;
        self.selected = None;
        debug!(
            from = before,
            to = self.document.active_index(),
            pages = self.document.page_count(),
            "active page changed"
        );

        let mut effects = self.sync_surface();
        if !effects.contains(&Effect::Redraw) {
            effects.push(Effect::Redraw);
        }
        effects
    }

    /// Bind the surface to the active page's ink.
    fn sync_surface(&mut self) -> Vec<Effect> {
        let ink = self.document.active_page().ink.clone();
        match self.surface.initialize(Some(&ink)) {
            InitOutcome::Pending(ticket) => vec![Effect::FetchInk(ticket), Effect::Redraw],
            InitOutcome::Loaded | InitOutcome::Cleared => vec![Effect::Redraw],
            InitOutcome::Unchanged | InitOutcome::Failed => Vec::new(),
        }
    }
}

fn ink_point(p: Point) -> InkPoint {
    InkPoint::new(p.x as f32, p.y as f32)
}

#[cfg(test)]
mod tests {
    use super::{Action, Effect, EditorModel, Notice, SessionContext, submit};
    use cm_canvas::{ImageRef, InkTool};
    use cm_drawing::{
        Annotation, EditorMode, Interaction, Page, Point, ReviewDocument, ScreenPoint, Viewport,
        defaults,
    };

    fn editor(pages: usize) -> EditorModel {
        let pages = (0..pages).map(|_| Page::blank().unwrap()).collect();
        let (model, _) = EditorModel::open(
            ReviewDocument::new(pages).unwrap(),
            SessionContext::new(42, 7),
        );
        model
    }

    fn at(x: f64, y: f64) -> ScreenPoint {
        ScreenPoint::new(x, y)
    }

    fn place_text(m: &mut EditorModel, x: f64, y: f64) -> cm_drawing::AnnotationId {
        m.reduce(Action::EnterTextMode);
        m.reduce(Action::PointerDown(at(x, y)));
        m.selected().unwrap()
    }

    fn drag(m: &mut EditorModel, from: ScreenPoint, to: ScreenPoint) {
        m.reduce(Action::PointerDown(from));
        m.reduce(Action::PointerMove(to));
        m.reduce(Action::PointerUp(to));
    }

    fn assert_inside_margins(a: &Annotation) {
        assert!(a.position.x >= defaults::MARGIN);
        assert!(a.position.y >= defaults::MARGIN);
        assert!(a.right() <= defaults::CANVAS_WIDTH - defaults::MARGIN);
        assert!(a.bottom() <= defaults::CANVAS_HEIGHT - defaults::MARGIN);
    }

    #[test]
    fn text_mode_places_annotation_and_returns_to_select() {
        let mut m = editor(1);
        let id = place_text(&mut m, 100.0, 120.0);

        assert_eq!(m.mode(), EditorMode::Select);
        let a = m.annotation(id).unwrap();
        assert_eq!(a.position, Point::new(100.0, 120.0));
        assert_eq!((a.width, a.height), (defaults::TEXT_WIDTH, defaults::TEXT_HEIGHT));
        assert_eq!(a.content, defaults::TEXT_PLACEHOLDER);
    }

    #[test]
    fn placement_is_independent_of_display_scale() {
        let mut small = editor(1);
        small.reduce(Action::SetViewport(Viewport::new(10.0, 10.0, 300.0, 400.0)));
        let a = place_text(&mut small, 10.0 + 60.0, 10.0 + 100.0);

        let mut large = editor(1);
        large.reduce(Action::SetViewport(Viewport::new(10.0, 10.0, 600.0, 800.0)));
        let b = place_text(&mut large, 10.0 + 120.0, 10.0 + 200.0);

        let pa = small.annotation(a).unwrap().position;
        let pb = large.annotation(b).unwrap().position;
        assert!((pa.x - pb.x).abs() < 1e-9 && (pa.y - pb.y).abs() < 1e-9);
        assert!((pa.x - 120.0).abs() < 1e-9 && (pa.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn drag_far_outside_canvas_is_clamped() {
        let mut m = editor(1);
        let id = place_text(&mut m, 100.0, 100.0);

        drag(&mut m, at(110.0, 110.0), at(5000.0, -3000.0));
        let a = m.annotation(id).unwrap();
        assert_inside_margins(a);
        assert_eq!(a.position.x, defaults::CANVAS_WIDTH - defaults::MARGIN - a.width);
        assert_eq!(a.position.y, defaults::MARGIN);
        assert_eq!(m.interaction(), Interaction::Idle);
    }

    #[test]
    fn drag_keeps_pointer_offset() {
        let mut m = editor(1);
        let id = place_text(&mut m, 100.0, 100.0);

        drag(&mut m, at(130.0, 110.0), at(230.0, 310.0));
        assert_eq!(m.annotation(id).unwrap().position, Point::new(200.0, 300.0));
    }

    #[test]
    fn small_movement_is_a_click() {
        let mut m = editor(1);
        let id = place_text(&mut m, 100.0, 100.0);
        m.reduce(Action::PointerDown(at(400.0, 600.0)));
        assert_eq!(m.selected(), None);

        drag(&mut m, at(120.0, 120.0), at(122.0, 121.0));
        assert_eq!(m.selected(), Some(id));
        assert_eq!(m.annotation(id).unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn resize_respects_minimum_and_canvas() {
        let mut m = editor(1);
        let id = place_text(&mut m, 100.0, 100.0);

        // Bottom-right handle of the selected annotation is at (300, 150).
        drag(&mut m, at(300.0, 150.0), at(0.0, 0.0));
        let a = m.annotation(id).unwrap();
        assert_eq!((a.width, a.height), (defaults::MIN_WIDTH, defaults::MIN_HEIGHT));

        drag(&mut m, at(150.0, 130.0), at(9000.0, 9000.0));
        assert_inside_margins(m.annotation(id).unwrap());
    }

    #[test]
    fn ink_tool_buttons_toggle() {
        let mut m = editor(1);
        m.reduce(Action::SelectInkTool(InkTool::Pen));
        assert_eq!(m.mode(), EditorMode::Draw(InkTool::Pen));
        assert!(m.surface().is_active());

        m.reduce(Action::SelectInkTool(InkTool::Eraser));
        assert_eq!(m.mode(), EditorMode::Draw(InkTool::Eraser));

        m.reduce(Action::SelectInkTool(InkTool::Eraser));
        assert_eq!(m.mode(), EditorMode::Select);
        assert!(!m.surface().is_active());
    }

    #[test]
    fn draw_mode_does_not_create_annotations() {
        let mut m = editor(1);
        m.reduce(Action::SelectInkTool(InkTool::Pen));
        m.reduce(Action::PointerDown(at(100.0, 100.0)));
        m.reduce(Action::PointerMove(at(200.0, 100.0)));
        let effects = m.reduce(Action::PointerUp(at(200.0, 100.0)));

        assert_eq!(effects, vec![Effect::Redraw]);
        assert!(m.document().active_page().annotations.is_empty());
        assert_eq!(
            m.surface().loaded_reference(),
            Some(&m.document().active_page().ink)
        );
    }

    #[test]
    fn eraser_removes_pen_ink_from_snapshot() {
        let mut m = editor(1);
        m.reduce(Action::SetPenColor("#0000FF".into()));
        m.reduce(Action::SelectInkTool(InkTool::Pen));
        drag(&mut m, at(100.0, 100.0), at(300.0, 100.0));
        let pixel = |m: &EditorModel| m.surface().pixmap().unwrap().pixel(200, 100).unwrap();
        assert!(pixel(&m).alpha() > 0);

        m.reduce(Action::SelectInkTool(InkTool::Eraser));
        drag(&mut m, at(100.0, 100.0), at(300.0, 100.0));
        assert_eq!(pixel(&m).alpha(), 0);
        assert!(matches!(m.document().active_page().ink, ImageRef::Inline(_)));
    }

    #[test]
    fn pointer_leave_commits_stroke() {
        let mut m = editor(1);
        let before = m.document().active_page().ink.clone();
        m.reduce(Action::SelectInkTool(InkTool::Pen));
        m.reduce(Action::PointerDown(at(50.0, 50.0)));
        m.reduce(Action::PointerMove(at(80.0, 90.0)));
        assert_eq!(m.reduce(Action::PointerLeave), vec![Effect::Redraw]);
        assert_ne!(m.document().active_page().ink, before);
        assert!(m.reduce(Action::PointerLeave).is_empty());
    }

    #[test]
    fn deleting_last_page_is_rejected() {
        let mut m = editor(1);
        assert_eq!(
            m.reduce(Action::DeletePage(0)),
            vec![Effect::Notify(Notice::LastPage)]
        );
        assert_eq!(m.document().page_count(), 1);
    }

    #[test]
    fn deleting_active_page_retargets_and_resets_mode() {
        let mut m = editor(3);
        m.reduce(Action::SelectPage(2));
        m.reduce(Action::EnterTextMode);
        m.reduce(Action::DeletePage(2));

        assert_eq!(m.document().page_count(), 2);
        assert_eq!(m.document().active_index(), 1);
        assert_eq!(m.mode(), EditorMode::Select);
    }

    #[test]
    fn page_switch_terminates_drag() {
        let mut m = editor(2);
        let id = place_text(&mut m, 100.0, 100.0);
        m.reduce(Action::PointerDown(at(120.0, 120.0)));
        m.reduce(Action::PointerMove(at(200.0, 200.0)));
        assert!(m.interaction().is_gesture());

        m.reduce(Action::SelectPage(1));
        assert_eq!(m.interaction(), Interaction::Idle);
        assert_eq!(m.selected(), None);

        m.reduce(Action::PointerMove(at(400.0, 400.0)));
        let moved = m.document().page(0).unwrap().annotation(id).unwrap().position;
        assert_eq!(moved, Point::new(180.0, 180.0));
    }

    #[test]
    fn open_stroke_is_committed_to_its_own_page() {
        let mut m = editor(2);
        let page1_ink = m.document().page(1).unwrap().ink.clone();
        m.reduce(Action::SelectInkTool(InkTool::Pen));
        m.reduce(Action::PointerDown(at(100.0, 100.0)));
        m.reduce(Action::PointerMove(at(150.0, 150.0)));

        m.reduce(Action::SelectPage(1));
        assert_ne!(m.document().page(0).unwrap().ink, page1_ink);
        assert_eq!(m.document().page(1).unwrap().ink, page1_ink);
        assert_eq!(m.mode(), EditorMode::Select);
    }

    #[test]
    fn remote_ink_is_fetched_and_stale_results_dropped() {
        let remote = |i: usize| ImageRef::Remote(format!("https://cdn.example/ink-{i}.png"));
        let pages = (0..2)
            .map(|i| Page::new(ImageRef::Remote(format!("https://cdn.example/scan-{i}.png")), remote(i)))
            .collect();
        let (mut m, effects) =
            EditorModel::open(ReviewDocument::new(pages).unwrap(), SessionContext::new(1, 2));
        let Some(Effect::FetchInk(first)) = effects.first().cloned() else {
            panic!("expected ink fetch, got {effects:?}");
        };
        assert_eq!(first.source(), "https://cdn.example/ink-0.png");

        let effects = m.reduce(Action::SelectPage(1));
        assert!(matches!(effects.first(), Some(Effect::FetchInk(t)) if t.source().ends_with("ink-1.png")));

        // Page 0's bytes arrive after the switch and must not be applied.
        let png = cm_canvas::codec::encode_png(&cm_canvas::tiny_skia::Pixmap::new(600, 800).unwrap()).unwrap();
        assert!(m.reduce(Action::InkLoaded { ticket: first, bytes: png }).is_empty());
    }

    fn saved_ink_png() -> Vec<u8> {
        let mut source = cm_canvas::DrawingSurface::default();
        source.set_active(true);
        source.set_thickness(10.0);
        source.pointer_down(cm_canvas::InkPoint::new(10.0, 10.0));
        source.pointer_up().unwrap().decode().unwrap()
    }

    fn ink_alpha(ink: &ImageRef, x: u32, y: u32) -> u8 {
        let ImageRef::Inline(data) = ink else {
            panic!("expected inline ink, got {ink:?}");
        };
        let pixmap = cm_canvas::codec::decode_data_url(data).unwrap();
        pixmap.pixel(x, y).unwrap().alpha()
    }

    #[test]
    fn drawing_before_saved_ink_loads_keeps_saved_ink() {
        let saved = ImageRef::Remote("https://cdn.example/ink-0.png".into());
        let page = Page::new(ImageRef::Remote("https://cdn.example/scan-0.png".into()), saved.clone());
        let (mut m, effects) =
            EditorModel::open(ReviewDocument::new(vec![page]).unwrap(), SessionContext::new(1, 2));
        let Some(Effect::FetchInk(ticket)) = effects.first().cloned() else {
            panic!("expected ink fetch, got {effects:?}");
        };

        m.reduce(Action::SelectInkTool(InkTool::Pen));
        drag(&mut m, at(100.0, 100.0), at(300.0, 100.0));
        assert_eq!(m.document().active_page().ink, saved);

        let effects = m.reduce(Action::InkLoaded {
            ticket,
            bytes: saved_ink_png(),
        });
        assert_eq!(effects, vec![Effect::Redraw]);
        let surface_alpha = |m: &EditorModel, x, y| m.surface().pixmap().unwrap().pixel(x, y).unwrap().alpha();
        assert!(surface_alpha(&m, 10, 10) > 0);
        assert_eq!(surface_alpha(&m, 200, 100), 0);
        assert_eq!(m.document().active_page().ink, saved);

        // Once loaded, new strokes land on top of the saved ink.
        drag(&mut m, at(100.0, 100.0), at(300.0, 100.0));
        let ink = &m.document().active_page().ink;
        assert!(ink_alpha(ink, 10, 10) > 0);
        assert_eq!(ink_alpha(ink, 200, 100), 255);
    }

    #[test]
    fn saved_annotation_inside_margin_is_normalized_by_edits() {
        let mut page = Page::blank().unwrap();
        let id = page.add_annotation(Annotation::new(Point::new(2.0, 2.0), 200.0, 50.0, "legacy"));
        let wide = page.add_annotation(Annotation::new(Point::new(0.0, 300.0), 650.0, 60.0, "wide"));
        let (mut m, _) =
            EditorModel::open(ReviewDocument::new(vec![page]).unwrap(), SessionContext::new(1, 2));

        // Click to select, then pull the bottom-right handle at (202, 52).
        drag(&mut m, at(100.0, 20.0), at(100.0, 20.0));
        assert_eq!(m.selected(), Some(id));
        drag(&mut m, at(202.0, 52.0), at(260.0, 90.0));
        let a = m.annotation(id).unwrap();
        assert_inside_margins(a);
        assert_eq!((a.right(), a.bottom()), (260.0, 90.0));

        drag(&mut m, at(100.0, 40.0), at(-400.0, -400.0));
        assert_inside_margins(m.annotation(id).unwrap());

        drag(&mut m, at(300.0, 330.0), at(320.0, 360.0));
        assert_inside_margins(m.annotation(wide).unwrap());
    }

    #[test]
    fn background_mode_reverts_on_cancel_and_apply() {
        let mut m = editor(1);
        let effects = m.reduce(Action::EnterBackgroundMode);
        assert_eq!(effects, vec![Effect::OpenBackgroundPicker]);
        assert_eq!(m.mode(), EditorMode::Background);

        m.reduce(Action::ApplyBackground(None));
        assert_eq!(m.mode(), EditorMode::Select);

        let replacement = ImageRef::Remote("https://cdn.example/new.png".into());
        m.reduce(Action::EnterBackgroundMode);
        m.reduce(Action::ApplyBackground(Some(replacement.clone())));
        assert_eq!(m.document().active_page().background, replacement);
        assert_eq!(m.mode(), EditorMode::Select);
    }

    #[test]
    fn pen_settings_are_validated() {
        let mut m = editor(1);
        m.reduce(Action::SetPenThickness(50.0));
        assert_eq!(m.pen_thickness(), defaults::MAX_PEN_THICKNESS);
        m.reduce(Action::SetPenThickness(0.0));
        assert_eq!(m.pen_thickness(), defaults::MIN_PEN_THICKNESS);

        let effects = m.reduce(Action::SetPenColor("blue".into()));
        assert_eq!(effects, vec![Effect::Notify(Notice::InvalidColor("blue".into()))]);
        assert_eq!(m.pen_color(), cm_canvas::Color::RED);
    }

    #[test]
    fn annotation_delete_and_edit() {
        let mut m = editor(1);
        let id = place_text(&mut m, 100.0, 100.0);
        m.reduce(Action::SetAnnotationContent {
            id,
            content: "sign error".into(),
        });
        assert_eq!(m.annotation(id).unwrap().content, "sign error");

        m.reduce(Action::DeleteAnnotation(id));
        assert!(m.annotation(id).is_none());
        assert_eq!(m.selected(), None);
    }

    #[test]
    fn append_pages_updates_once_and_activates_last() {
        let mut m = editor(1);
        let images = (0..3)
            .map(|i| ImageRef::Remote(format!("https://cdn.example/extra-{i}.png")))
            .collect();
        m.reduce(Action::AppendPages(images));
        assert_eq!(m.document().page_count(), 4);
        assert_eq!(m.document().active_index(), 3);

        m.reduce(Action::AddBlankPage);
        assert_eq!(m.document().page_count(), 5);
        assert_eq!(m.document().active_index(), 4);
    }

    #[test]
    fn clear_ink_resets_layer() {
        let mut m = editor(1);
        let blank = m.document().active_page().ink.clone();
        m.reduce(Action::SelectInkTool(InkTool::Pen));
        drag(&mut m, at(10.0, 10.0), at(300.0, 300.0));
        assert_ne!(m.document().active_page().ink, blank);

        m.reduce(Action::ClearInk);
        assert_eq!(m.document().active_page().ink, blank);
        assert_eq!(m.surface().pixmap().unwrap().pixel(150, 150).unwrap().alpha(), 0);
    }

    #[test]
    fn submit_is_not_reentrant_and_recovers_from_failure() {
        let mut m = editor(2);
        let effects = m.reduce(Action::Submit);
        assert!(matches!(effects.as_slice(), [Effect::Submit(draft)] if draft.layers.len() == 2));
        assert_eq!(m.submit().phase(), submit::Phase::InFlight);

        assert!(m.reduce(Action::Submit).is_empty());

        let before = m.document().clone();
        let effects = m.reduce(Action::SubmitFailed("upload failed".into()));
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::SubmitFailed("upload failed".into()))]
        );
        assert_eq!(m.submit().phase(), submit::Phase::Idle);
        assert_eq!(m.document(), &before);
    }

    #[test]
    fn successful_submit_writes_back_uploaded_urls() {
        let mut m = editor(1);
        let Some(Effect::Submit(draft)) = m.reduce(Action::Submit).pop() else {
            panic!("expected submit effect");
        };
        let uploaded: Vec<_> = draft
            .uploads()
            .map(|f| super::UploadedLayer::new(f, format!("https://cdn.example/{}", f.file_name)))
            .collect();
        assert_eq!(uploaded.len(), 2);

        let effects = m.reduce(Action::SubmitSucceeded(uploaded));
        assert_eq!(effects, vec![Effect::Notify(Notice::Submitted)]);
        let page = m.document().active_page();
        assert_eq!(page.background, ImageRef::Remote("https://cdn.example/42-7-0-bg.png".into()));
        assert_eq!(page.ink, ImageRef::Remote("https://cdn.example/42-7-0.png".into()));
    }
}

//! 编辑器宿主
//!
//! `ReviewSession` 把编辑器的 Effect 交给协作者执行，并把结果作为 Action 送回，
//! 直到没有后续动作为止。墨迹下载先排队，由 `load_pending_ink` 执行。

use std::collections::VecDeque;
use std::path::PathBuf;

use cm_app::{Action, Effect, EditorModel, Notice, SessionContext, document_from_review};
use cm_canvas::{Color, ImageRef, LoadTicket};
use cm_drawing::{EditorMode, ReviewDocument};
use cm_protocol::{LoadState, ReviewDetail};
use cm_settings::{ConfigManager, Settings};
use tracing::{debug, info, warn};

use crate::api::{ImageFetcher, ReviewApi, load_review};
use crate::error::{AppError, AppResult};
use crate::import::{read_image, read_images};
use crate::submit::{SubmitTarget, submit_review};
use crate::upload::Uploader;

/// 一次评审编辑会话
pub struct ReviewSession<U, A> {
    editor: EditorModel,
    uploader: U,
    api: A,
    target: SubmitTarget,
    review: LoadState<ReviewDetail>,
    notices: Vec<Notice>,
    redraws: u64,
    ink_queue: VecDeque<LoadTicket>,
}

impl<U, A> ReviewSession<U, A>
where
    U: Uploader,
    A: ReviewApi + ImageFetcher,
{
    /// 新建评审：每个答案图片一页
    pub async fn open_new(
        backgrounds: &[String],
        answer_id: u64,
        context: SessionContext,
        settings: &Settings,
        uploader: U,
        api: A,
    ) -> AppResult<Self> {
        let refs = backgrounds
            .iter()
            .map(|s| ImageRef::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        let document = ReviewDocument::from_backgrounds(refs)?;
        info!(pages = document.page_count(), answer_id, "opening new review");

        Self::start(
            document,
            context,
            settings,
            uploader,
            api,
            SubmitTarget::Create { answer_id },
            LoadState::NotLoaded,
        )
        .await
    }

    /// 编辑已保存的评审
    pub async fn open_existing(
        review_id: u64,
        context: SessionContext,
        settings: &Settings,
        uploader: U,
        api: A,
    ) -> AppResult<Self> {
        let detail = api.fetch_review(review_id).await?;
        let document = document_from_review(&detail)?;
        info!(
            review_id,
            pages = document.page_count(),
            annotations = detail.annotations.len(),
            "opening saved review"
        );

        Self::start(
            document,
            context,
            settings,
            uploader,
            api,
            SubmitTarget::Update { review_id },
            LoadState::Loaded(detail),
        )
        .await
    }

    async fn start(
        document: ReviewDocument,
        context: SessionContext,
        settings: &Settings,
        uploader: U,
        api: A,
        target: SubmitTarget,
        review: LoadState<ReviewDetail>,
    ) -> AppResult<Self> {
        let (editor, effects) = EditorModel::open(document, context);
        let mut session = Self {
            editor,
            uploader,
            api,
            target,
            review,
            notices: Vec::new(),
            redraws: 0,
            ink_queue: VecDeque::new(),
        };

        session.apply_pen_settings(settings).await;
        session.run_effects(effects).await;
        Ok(session)
    }

    async fn apply_pen_settings(&mut self, settings: &Settings) {
        self.dispatch_all([
            Action::SetPenColor(settings.pen_color.clone()),
            Action::SetPenThickness(settings.pen_thickness),
        ])
        .await;
    }

    /// 修改画笔并写入配置文件，下次打开编辑器时沿用
    pub async fn update_pen_settings(
        &mut self,
        config: &ConfigManager,
        color: &str,
        thickness: f32,
    ) -> AppResult<()> {
        Color::from_hex(color)?;
        config.update(|s| {
            s.pen_color = color.to_string();
            s.pen_thickness = thickness;
        })?;
        let settings = config.get();
        self.apply_pen_settings(&settings).await;
        Ok(())
    }

    pub fn editor(&self) -> &EditorModel {
        &self.editor
    }

    pub fn target(&self) -> SubmitTarget {
        self.target
    }

    /// 已保存评审的元数据（新建评审时为 `NotLoaded`）
    pub fn review(&self) -> &LoadState<ReviewDetail> {
        &self.review
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// 编辑器是否在等待背景文件
    pub fn is_background_picker_open(&self) -> bool {
        self.editor.mode() == EditorMode::Background
    }

    /// 请求过的重绘次数
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// 送入一个动作并执行所有后续 Effect
    pub async fn dispatch(&mut self, action: Action) {
        let effects = self.editor.reduce(action);
        self.run_effects(effects).await;
    }

    pub async fn dispatch_all<I>(&mut self, actions: I)
    where
        I: IntoIterator<Item = Action>,
    {
        for action in actions {
            self.dispatch(action).await;
        }
    }

    /// 排队中的墨迹下载数
    pub fn pending_ink_loads(&self) -> usize {
        self.ink_queue.len()
    }

    /// 执行排队的墨迹下载
    ///
    /// 页面在墨迹到达前就可显示和编辑；用户已切走的页面的结果由编辑器丢弃。
    pub async fn load_pending_ink(&mut self) {
        while let Some(ticket) = self.ink_queue.pop_front() {
            let action = match self.api.fetch_image(ticket.source()).await {
                Ok(bytes) => Action::InkLoaded { ticket, bytes },
                Err(e) => {
                    warn!(source = ticket.source(), error = %e, "ink fetch failed");
                    Action::InkLoadFailed(ticket)
                }
            };
            let effects = self.editor.reduce(action);
            self.run_effects(effects).await;
        }
    }

    /// 读取本地文件为新页面（整批一次更新）
    pub async fn import_pages(&mut self, paths: Vec<PathBuf>) -> AppResult<()> {
        match read_images(paths).await {
            Ok(images) => {
                self.dispatch(Action::AppendPages(images)).await;
                Ok(())
            }
            Err(e) => {
                self.notices.push(Notice::PageCreationFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// 文件选择结果：`None` 表示用户取消
    pub async fn choose_background(&mut self, path: Option<PathBuf>) -> AppResult<()> {
        let image = match path {
            Some(path) => match read_image(&path).await {
                Ok(image) => Some(image),
                Err(e) => {
                    self.dispatch(Action::ApplyBackground(None)).await;
                    return Err(e);
                }
            },
            None => None,
        };
        self.dispatch(Action::ApplyBackground(image)).await;
        Ok(())
    }

    /// 重新获取评审元数据
    pub async fn refresh_review(&mut self) {
        let SubmitTarget::Update { review_id } = self.target else {
            return;
        };
        self.review = LoadState::Loading;
        self.review = load_review(&self.api, review_id).await;
    }

    /// 删除已保存的评审
    pub async fn delete_review(&self) -> AppResult<()> {
        match self.target {
            SubmitTarget::Update { review_id } => {
                self.api.delete_review(review_id).await?;
                info!(review_id, "review deleted");
                Ok(())
            }
            SubmitTarget::Create { .. } => Err(AppError::Api(crate::error::ApiError::Unsupported(
                "review has not been saved yet".to_string(),
            ))),
        }
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            let follow_up = match effect {
                Effect::Redraw => {
                    self.redraws += 1;
                    None
                }

                Effect::OpenBackgroundPicker => {
                    debug!("background picker requested");
                    None
                }

                Effect::Notify(notice) => {
                    debug!(%notice, "notice");
                    self.notices.push(notice);
                    None
                }

                Effect::FetchInk(ticket) => {
                    debug!(source = ticket.source(), "ink fetch queued");
                    self.ink_queue.push_back(ticket);
                    None
                }

                Effect::Submit(draft) => {
                    match submit_review(&self.uploader, &self.api, self.target, draft).await {
                        Ok(uploaded) => Some(Action::SubmitSucceeded(uploaded)),
                        Err(e) => Some(Action::SubmitFailed(e.to_string())),
                    }
                }
            };

            if let Some(action) = follow_up {
                queue.extend(self.editor.reduce(action));
            }
        }
    }
}

//! 提交流程：先上传所有内联栅格，全部成功后才调用评审 API
//!
//! 任何一步失败都返回错误，调用方的文档保持不变，可以直接重试。

use cm_app::{SubmissionDraft, UploadedLayer};
use tracing::{debug, info};

use crate::api::ReviewApi;
use crate::error::AppResult;
use crate::upload::Uploader;

/// 创建或更新
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTarget {
    /// 为答案新建评审
    Create { answer_id: u64 },
    /// 更新已有评审
    Update { review_id: u64 },
}

/// 上传草稿中的文件并提交评审，返回完成的上传
pub async fn submit_review<U, A>(
    uploader: &U,
    api: &A,
    target: SubmitTarget,
    draft: SubmissionDraft,
) -> AppResult<Vec<UploadedLayer>>
where
    U: Uploader,
    A: ReviewApi,
{
    let mut uploaded = Vec::new();
    for file in draft.uploads() {
        let url = uploader.upload(file).await?;
        debug!(file = %file.file_name, %url, "layer uploaded");
        uploaded.push(UploadedLayer::new(file, url));
    }

    let body = draft.finish(&uploaded)?;
    match target {
        SubmitTarget::Create { answer_id } => api.create_review(answer_id, &body).await?,
        SubmitTarget::Update { review_id } => api.update_review(review_id, &body).await?,
    }

    info!(
        ?target,
        uploads = uploaded.len(),
        annotations = body.annotations.len(),
        layers = body.layers.len(),
        "review stored"
    );
    Ok(uploaded)
}

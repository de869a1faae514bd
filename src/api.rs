//! 评审 REST 客户端

use std::future::Future;

use cm_protocol::{LoadState, ReviewDetail, ReviewSubmission};
use cm_settings::Settings;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::ApiError;

/// 评审 API
pub trait ReviewApi {
    /// `POST review/answers/{answer_id}/reviews`
    fn create_review(
        &self,
        answer_id: u64,
        body: &ReviewSubmission,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `PUT review/reviews/{review_id}`
    fn update_review(
        &self,
        review_id: u64,
        body: &ReviewSubmission,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET review/review-detail/{review_id}`
    fn fetch_review(&self, review_id: u64)
    -> impl Future<Output = Result<ReviewDetail, ApiError>> + Send;

    /// `DELETE review/reviews/{review_id}`
    fn delete_review(&self, review_id: u64) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// 远程图像字节获取（墨迹层加载）
pub trait ImageFetcher {
    fn fetch_image(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;
}

/// 获取评审详情并映射为加载状态
pub async fn load_review<A: ReviewApi>(api: &A, review_id: u64) -> LoadState<ReviewDetail> {
    let result = api.fetch_review(review_id).await;
    if let Err(e) = &result {
        warn!(review_id, error = %e, "review detail fetch failed");
    }
    LoadState::from_result(result)
}

/// reqwest 实现
#[derive(Debug)]
pub struct HttpReviewClient {
    client: reqwest::Client,
    settings: Settings,
    token: RwLock<Option<String>>,
}

impl HttpReviewClient {
    pub fn new(client: reqwest::Client, settings: &Settings) -> Self {
        Self {
            client,
            settings: settings.clone(),
            token: RwLock::new(None),
        }
    }

    /// 按配置的超时构建客户端
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self::new(client, settings))
    }

    /// 设置（或清除）Bearer 令牌
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.settings.api_url(path);
        debug!(%method, %url, "api request");
        let builder = self.client.request(method, url);
        match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// 非 2xx 转为 `ApiError::Status`
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

impl ReviewApi for HttpReviewClient {
    async fn create_review(&self, answer_id: u64, body: &ReviewSubmission) -> Result<(), ApiError> {
        let path = format!("review/answers/{answer_id}/reviews");
        let response = self.request(reqwest::Method::POST, &path).json(body).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn update_review(&self, review_id: u64, body: &ReviewSubmission) -> Result<(), ApiError> {
        let path = format!("review/reviews/{review_id}");
        let response = self.request(reqwest::Method::PUT, &path).json(body).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn fetch_review(&self, review_id: u64) -> Result<ReviewDetail, ApiError> {
        let path = format!("review/review-detail/{review_id}");
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        let text = check(response).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn delete_review(&self, review_id: u64) -> Result<(), ApiError> {
        let path = format!("review/reviews/{review_id}");
        let response = self.request(reqwest::Method::DELETE, &path).send().await?;
        check(response).await?;
        Ok(())
    }
}

impl ImageFetcher for HttpReviewClient {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(url).send().await?;
        Ok(check(response).await?.bytes().await?.to_vec())
    }
}

//! 栅格图层上传
//!
//! 先向 API 申请预签名地址，再把字节 PUT 到对象存储；
//! 返回的公开地址为 `{storage_base_url}/{file_name}`。

use std::future::Future;

use cm_app::UploadFile;
use cm_settings::Settings;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use crate::error::UploadError;

/// 上传协作者：给定文件，返回稳定的远程地址
pub trait Uploader {
    fn upload(&self, file: &UploadFile) -> impl Future<Output = Result<String, UploadError>> + Send;
}

/// 预签名接口的响应：纯字符串或 `{ "url": ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PresignResponse {
    Url(String),
    Object { url: String },
}

impl PresignResponse {
    fn parse(body: &str) -> String {
        match serde_json::from_str::<PresignResponse>(body) {
            Ok(Self::Url(url)) | Ok(Self::Object { url }) => url,
            Err(_) => body.trim().to_string(),
        }
    }
}

/// 基于预签名 URL 的上传器
#[derive(Debug, Clone)]
pub struct PresignedUploader {
    client: reqwest::Client,
    presign_endpoint: String,
    settings: Settings,
}

impl PresignedUploader {
    pub fn new(client: reqwest::Client, settings: &Settings) -> Self {
        Self {
            client,
            presign_endpoint: settings.api_url("s3/upload-url"),
            settings: settings.clone(),
        }
    }

    async fn presign(&self, file_name: &str) -> Result<String, UploadError> {
        let response = self
            .client
            .get(&self.presign_endpoint)
            .query(&[("filename", file_name)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Presign(format!("{status}: {body}")));
        }

        let url = PresignResponse::parse(&body);
        if url.is_empty() {
            return Err(UploadError::Presign("empty presigned url".to_string()));
        }
        Ok(url)
    }
}

impl Uploader for PresignedUploader {
    async fn upload(&self, file: &UploadFile) -> Result<String, UploadError> {
        let target = self.presign(&file.file_name).await?;
        debug!(file = %file.file_name, bytes = file.bytes.len(), "uploading layer");

        let response = self
            .client
            .put(&target)
            .header(CONTENT_TYPE, file.mime.as_str())
            .body(file.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Transfer {
                file_name: file.file_name.clone(),
                reason: status.to_string(),
            });
        }
        Ok(self.settings.storage_url(&file.file_name))
    }
}

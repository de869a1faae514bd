#![allow(dead_code)]

use std::collections::HashMap;

use cm_review::cm_app::UploadFile;
use cm_review::cm_protocol::{ReviewDetail, ReviewSubmission};
use cm_review::{ApiError, ImageFetcher, ReviewApi, UploadError, Uploader};
use parking_lot::Mutex;

pub const STORAGE: &str = "https://bucket.example";

/// Records uploads; fails for file names containing `fail_on`.
#[derive(Default)]
pub struct FakeUploader {
    pub uploaded: Mutex<Vec<UploadFile>>,
    pub fail_on: Option<String>,
}

impl FakeUploader {
    pub fn failing_on(pattern: &str) -> Self {
        Self {
            fail_on: Some(pattern.to_string()),
            ..Self::default()
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.uploaded.lock().iter().map(|f| f.file_name.clone()).collect()
    }
}

impl Uploader for FakeUploader {
    async fn upload(&self, file: &UploadFile) -> Result<String, UploadError> {
        if self.fail_on.as_deref().is_some_and(|p| file.file_name.contains(p)) {
            return Err(UploadError::Transfer {
                file_name: file.file_name.clone(),
                reason: "503 Service Unavailable".to_string(),
            });
        }
        self.uploaded.lock().push(file.clone());
        Ok(format!("{STORAGE}/{}", file.file_name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(u64, ReviewSubmission),
    Update(u64, ReviewSubmission),
    Fetch(u64),
    Delete(u64),
}

/// In-memory review API.
#[derive(Default)]
pub struct FakeApi {
    pub calls: Mutex<Vec<Call>>,
    pub detail: Option<ReviewDetail>,
    pub images: HashMap<String, Vec<u8>>,
}

impl FakeApi {
    pub fn with_detail(detail: ReviewDetail) -> Self {
        Self {
            detail: Some(detail),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn submissions(&self) -> Vec<ReviewSubmission> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(_, body) | Call::Update(_, body) => Some(body),
                _ => None,
            })
            .collect()
    }
}

impl ReviewApi for FakeApi {
    async fn create_review(&self, answer_id: u64, body: &ReviewSubmission) -> Result<(), ApiError> {
        self.calls.lock().push(Call::Create(answer_id, body.clone()));
        Ok(())
    }

    async fn update_review(&self, review_id: u64, body: &ReviewSubmission) -> Result<(), ApiError> {
        self.calls.lock().push(Call::Update(review_id, body.clone()));
        Ok(())
    }

    async fn fetch_review(&self, review_id: u64) -> Result<ReviewDetail, ApiError> {
        self.calls.lock().push(Call::Fetch(review_id));
        self.detail.clone().ok_or(ApiError::Status {
            status: 404,
            body: "review not found".to_string(),
        })
    }

    async fn delete_review(&self, review_id: u64) -> Result<(), ApiError> {
        self.calls.lock().push(Call::Delete(review_id));
        Ok(())
    }
}

impl ImageFetcher for FakeApi {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.images.get(url).cloned().ok_or(ApiError::Status {
            status: 404,
            body: url.to_string(),
        })
    }
}

/// 600×800 PNG with one opaque pixel at (10, 10).
pub fn ink_png() -> Vec<u8> {
    use cm_review::cm_canvas::tiny_skia::{ColorU8, Pixmap};

    let mut pixmap = Pixmap::new(600, 800).unwrap();
    let idx = 10 * 600 + 10;
    pixmap.pixels_mut()[idx] = ColorU8::from_rgba(0, 0, 255, 255).premultiply();
    cm_review::cm_canvas::codec::encode_png(&pixmap).unwrap()
}

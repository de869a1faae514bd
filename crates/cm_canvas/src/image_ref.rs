use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::CanvasError;

/// 已上传（远程）引用的前缀
pub const REMOTE_PREFIXES: [&str; 2] = ["https://", "http://"];

const DATA_PREFIX: &str = "data:";
const BASE64_SUFFIX: &str = ";base64";

/// 内联图像负载（data URL）
///
/// 内部使用 `Arc<str>`，克隆与相等比较都很便宜（先比较指针）。
#[derive(Clone)]
pub struct DataUrl(Arc<str>);

impl DataUrl {
    /// 解析 data URL 字符串
    pub fn parse(s: &str) -> Result<Self, CanvasError> {
        if !s.starts_with(DATA_PREFIX) || !s.contains(',') {
            return Err(CanvasError::MalformedDataUrl);
        }
        Ok(Self(Arc::from(s)))
    }

    /// 从原始字节构造 base64 data URL
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let encoded = STANDARD.encode(bytes);
        Self(Arc::from(format!("{DATA_PREFIX}{mime}{BASE64_SUFFIX},{encoded}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn header(&self) -> &str {
        let end = self.0.find(',').unwrap_or(self.0.len());
        &self.0[DATA_PREFIX.len()..end]
    }

    /// MIME 类型；缺省时为 `application/octet-stream`
    pub fn mime(&self) -> &str {
        let mime = self.header().split(';').next().unwrap_or_default();
        if mime.is_empty() {
            "application/octet-stream"
        } else {
            mime
        }
    }

    /// 解码负载字节
    pub fn decode(&self) -> Result<Vec<u8>, CanvasError> {
        let payload = self
            .0
            .split_once(',')
            .map(|(_, p)| p)
            .ok_or(CanvasError::MalformedDataUrl)?;
        if self.header().ends_with(BASE64_SUFFIX) {
            Ok(STANDARD.decode(payload.trim())?)
        } else {
            Ok(payload.as_bytes().to_vec())
        }
    }

    /// 编码后的长度（字节）
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for DataUrl {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for DataUrl {}

impl fmt::Debug for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 负载可能有数 MB，只打印摘要
        f.debug_struct("DataUrl")
            .field("mime", &self.mime())
            .field("len", &self.0.len())
            .finish()
    }
}

/// 图像引用：远程 URL（已上传）或内联负载（待上传）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Remote(String),
    Inline(DataUrl),
}

impl ImageRef {
    /// 解析引用字符串
    ///
    /// 以远程前缀开头视为已上传；`data:` 视为内联；其他形式无法上传，拒绝。
    pub fn parse(s: &str) -> Result<Self, CanvasError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CanvasError::EmptyReference);
        }
        if REMOTE_PREFIXES.iter().any(|p| s.starts_with(p)) {
            return Ok(Self::Remote(s.to_string()));
        }
        if s.starts_with(DATA_PREFIX) {
            return DataUrl::parse(s).map(Self::Inline);
        }
        Err(CanvasError::UnsupportedReference(s.chars().take(32).collect()))
    }

    /// 是否已上传
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Remote(url) => url,
            Self::Inline(data) => data.as_str(),
        }
    }
}

impl From<DataUrl> for ImageRef {
    fn from(data: DataUrl) -> Self {
        Self::Inline(data)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::Inline(data) => write!(f, "<inline {} ({} bytes)>", data.mime(), data.len()),
        }
    }
}

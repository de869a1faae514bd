//! tracing 初始化

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// 安装 fmt 订阅者
///
/// `RUST_LOG` 优先于 `default_filter`。已安装过时返回 `false`。
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .try_init()
        .is_ok()
}

use std::path::PathBuf;

// Endpoints
pub fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

pub fn default_storage_base_url() -> String {
    "http://localhost:9000/checkmate".to_string()
}

// Pen defaults
pub fn default_pen_color() -> String {
    "#FF0000".to_string()
}

pub fn default_pen_thickness() -> f32 {
    5.0
}

pub const MIN_PEN_THICKNESS: f32 = 1.0;
pub const MAX_PEN_THICKNESS: f32 = 20.0;

// HTTP
pub fn default_request_timeout_secs() -> u64 {
    30
}

// Logging
pub fn default_log_filter() -> String {
    "info".to_string()
}

/// 用户主目录；找不到时退回程序目录，再退回当前目录
pub fn default_home_dir() -> PathBuf {
    if let Ok(home_dir) = std::env::var("HOME") {
        return PathBuf::from(home_dir);
    }
    if let Ok(home_dir) = std::env::var("USERPROFILE") {
        return PathBuf::from(home_dir);
    }

    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        return exe_dir.to_path_buf();
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

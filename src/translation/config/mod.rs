//! 编排配置管理模块
//!
//! 提供统一的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, OrchestratorConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 语言对
    pub const DEFAULT_SOURCE_LANG: &str = "en";
    pub const DEFAULT_TARGET_LANG: &str = "zh";

    // 项目服务
    pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8070";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    // 并发上限，零或负数表示不限
    pub const DEFAULT_ENGINE_CONCURRENCY: i64 = 8;
    pub const DEFAULT_PERSISTENCE_CONCURRENCY: i64 = 16;

    // 批量运行中未完成段落的上限，零表示不限
    pub const DEFAULT_MAX_PENDING_SEGMENTS: usize = 256;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "mt-config.toml",
        "translation-config.toml",
        ".mt-config.toml",
        "mt-config.json",
        "~/.config/multi-translator/config.toml",
        "/etc/multi-translator/config.toml",
    ];

    // 按顺序尝试的 .env 文件
    pub const ENV_FILES: &[&str] = &[".env.local", ".env.development", ".env.production", ".env"];
}

/// 便利函数
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}

/// 加载配置，失败时退回默认值
pub fn load_orchestrator_config() -> OrchestratorConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.into_config(),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            OrchestratorConfig::default()
        }
    }
}

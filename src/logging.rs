//! 日志初始化
//!
//! 安装 tracing-subscriber 的 fmt 订阅者。重复初始化不会报错，
//! 已存在全局订阅者时保持原样。

use std::sync::OnceLock;

use tracing::Level;

use crate::env::{core, EnvVar};

static LOGGER_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// 解析日志级别，无法识别时退回 INFO
pub fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

/// 以指定级别初始化日志
///
/// 返回本次调用是否安装了订阅者。
pub fn init(level: &str) -> bool {
    let no_color = core::NoColor::get().unwrap_or(false);
    init_with(parse_level(level), !no_color)
}

/// 按 `MT_LOG_LEVEL` 与 `NO_COLOR` 初始化日志
pub fn init_from_env() -> bool {
    let level = core::LogLevel::get().unwrap_or_else(|e| {
        eprintln!("{}, falling back to info", e);
        "info".to_string()
    });
    init(&level)
}

fn init_with(level: Level, ansi: bool) -> bool {
    *LOGGER_INITIALIZED.get_or_init(|| {
        let installed = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .with_ansi(ansi)
            .try_init()
            .is_ok();

        if installed {
            tracing::debug!("日志已初始化，级别 {}", level);
        }
        installed
    })
}

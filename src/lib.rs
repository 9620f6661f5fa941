//! # Multi Translator Library
//!
//! 多引擎翻译编排库：把待翻译段落同时分发给多个可插拔的翻译引擎，
//! 有界并发、部分失败容忍、退避重试，批量运行结束时汇总失败。
//!
//! ## 模块组织
//!
//! - `translation` - 编排核心、段落管道、失败报告、项目服务
//! - `env` - 类型安全的环境变量
//! - `logging` - 日志初始化

pub mod env;
pub mod logging;
pub mod translation;

// Re-export commonly used items for convenience
pub use translation::{
    Engine, OrchestratorConfig, ProjectRun, SegmentOutcome, TranslationError, TranslationOrchestrator,
    TranslationResult,
};

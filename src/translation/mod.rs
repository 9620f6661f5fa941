//! 翻译编排模块
//!
//! 提供多引擎翻译编排功能，采用清晰的模块化架构：
//! - **core**: 编排器、并发限制器、重试执行器和引擎接口
//! - **pipeline**: 段落流（XLIFF 读取、标记处理）
//! - **report**: 失败记录与汇总通知
//! - **storage**: 项目服务接口与 HTTP 客户端
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use multi_translator::translation::{
//!     ConfigManager, TracingSignals, TranslationOrchestrator, XliffSegments,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::new()?.into_config();
//! let engines = Vec::new(); // 由调用方提供具体引擎
//! let orchestrator = Arc::new(TranslationOrchestrator::with_http_service(
//!     &config,
//!     engines,
//!     Arc::new(TracingSignals),
//! )?);
//!
//! let run = orchestrator
//!     .translate_project("demo", XliffSegments::from_path("demo.xlf")?, None)
//!     .await?;
//! println!("翻译了 {} 个段落", run.segments);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块 - 语言对、服务地址、并发与重试参数
pub mod config;

/// 编排核心模块 - 编排器、限制器、重试与引擎接口
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 段落管道模块 - 导出文档的流式读取和标记处理
pub mod pipeline;

/// 失败报告模块 - 失败记录器和汇总通知器
pub mod report;

/// 存储模块 - 项目服务接口和 HTTP 客户端
pub mod storage;

// ============================================================================
// 核心API导出 - 主要的公共接口
// ============================================================================

/// 编排器及其结果
pub use self::core::{ProjectRun, SegmentOutcome, StatsSnapshot, TranslationOrchestrator};

/// 扩展点：引擎、信号接收端、项目服务
pub use self::core::{Engine, SignalSink, TracingSignals};
pub use storage::{HttpProjectService, ProjectService};

/// 数据类型
pub use self::core::{Match, Segment, SegmentId, Term};

/// 并发与重试
pub use self::core::{run_with_retry, ConcurrencyLimiter, RetryOptions};

/// 配置管理相关组件
pub use config::{constants, ConfigManager, OrchestratorConfig};

/// 错误处理相关类型
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};

// ============================================================================
// 高级API导出
// ============================================================================

/// 失败报告
pub use report::{FailureNotification, FailureNotifier, FailureRecord, FailureRecorder};

/// 段落流
pub use pipeline::{strip_markup, XliffSegments};

/// 项目服务请求类型
pub use storage::{SegmentData, SegmentRequest, SetMatchesRequest, SetTargetRequest};

//! 编排核心模块
//!
//! 多引擎翻译编排的核心部分：把一个段落同时交给多个独立配置的翻译引擎，
//! 在有界并发下运行，容忍部分失败，对瞬时错误退避重试。
//!
//! ## 架构设计
//!
//! - **类型** (`types.rs`): 段落标识、术语、候选译文
//! - **引擎接口** (`engine.rs`): 可插拔的翻译后端
//! - **并发限制器** (`limiter.rs`): 按类别限制同时进行的异步任务数，FIFO 排队
//! - **重试执行器** (`retry.rs`): 固定次数、线性退避加抖动
//! - **信号接口** (`signals.rs`): 与表现层之间唯一的窄接口
//! - **编排器** (`orchestrator.rs`): 单段分发、单段请求、整项目批量
//!
//! ## 模块依赖关系
//!
//! ```text
//! TranslationOrchestrator (orchestrator.rs)
//!     ├── ConcurrencyLimiter × 2 (limiter.rs)
//!     ├── run_with_retry (retry.rs)
//!     ├── Engine × N (engine.rs)
//!     ├── ProjectService (storage/project.rs)
//!     ├── FailureRecorder / FailureNotifier (report/)
//!     └── SignalSink (signals.rs)
//! ```

pub mod engine;
pub mod limiter;
pub mod orchestrator;
pub mod retry;
pub mod signals;
pub mod types;

/// 翻译引擎接口
pub use engine::Engine;

/// 有界并发限制器
pub use limiter::ConcurrencyLimiter;

/// 翻译编排器及其结果类型
pub use orchestrator::{
    OrchestratorStats, ProjectRun, SegmentOutcome, StatsSnapshot, TranslationOrchestrator,
};

/// 重试执行器
pub use retry::{run_with_retry, RetryOptions};

/// 表现层信号
pub use signals::{SignalSink, TracingSignals};

/// 共享数据类型
pub use types::{Match, Segment, SegmentId, Term};

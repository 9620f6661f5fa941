//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。
//!
//! 注意：错误分类只用于日志和统计，不参与重试判断，
//! 所有失败在重试执行器中一视同仁。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 项目服务返回非 Success 状态
    #[error("项目服务错误: {0}")]
    ServiceError(String),

    /// 翻译引擎调用失败
    #[error("引擎 {engine} 调用失败: {message}")]
    EngineError { engine: String, message: String },

    /// 引擎不具备所需能力
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 文档解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 超时错误
    #[error("操作超时: {0}")]
    TimeoutError(String),

    /// 并发错误
    #[error("并发操作错误: {0}")]
    ConcurrencyError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 创建引擎错误
    pub fn engine<E: fmt::Display, M: fmt::Display>(engine: E, message: M) -> Self {
        TranslationError::EngineError {
            engine: engine.to_string(),
            message: message.to_string(),
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::ServiceError(_) => ErrorSeverity::Error,
            TranslationError::EngineError { .. } => ErrorSeverity::Warning,
            TranslationError::Unsupported(_) => ErrorSeverity::Info,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::TimeoutError(_) => ErrorSeverity::Warning,
            TranslationError::ConcurrencyError(_) => ErrorSeverity::Warning,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NetworkError(_) => ErrorCategory::Network,
            TranslationError::ServiceError(_) => ErrorCategory::Service,
            TranslationError::EngineError { .. } => ErrorCategory::Engine,
            TranslationError::Unsupported(_) => ErrorCategory::Input,
            TranslationError::InvalidInput(_) => ErrorCategory::Input,
            TranslationError::ParseError(_) => ErrorCategory::Parsing,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
            TranslationError::TimeoutError(_) => ErrorCategory::Timeout,
            TranslationError::ConcurrencyError(_) => ErrorCategory::Concurrency,
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        match &mut self {
            TranslationError::EngineError { message, .. } => {
                *message = format!("{} (上下文: {})", message, context);
            }
            TranslationError::ConfigError(msg)
            | TranslationError::NetworkError(msg)
            | TranslationError::ServiceError(msg)
            | TranslationError::Unsupported(msg)
            | TranslationError::InvalidInput(msg)
            | TranslationError::ParseError(msg)
            | TranslationError::SerializationError(msg)
            | TranslationError::TimeoutError(msg)
            | TranslationError::ConcurrencyError(msg)
            | TranslationError::InternalError(msg) => {
                *msg = format!("{} (上下文: {})", msg, context);
            }
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Service,
    Engine,
    Input,
    Parsing,
    Serialization,
    Timeout,
    Concurrency,
    Internal,
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::NetworkError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return TranslationError::TimeoutError(format!("HTTP请求超时: {}", error));
        }
        match error.status() {
            Some(status) => TranslationError::NetworkError(format!(
                "HTTP status {}: {}",
                status.as_u16(),
                error
            )),
            None => TranslationError::NetworkError(format!("HTTP请求失败: {}", error)),
        }
    }
}

impl From<tokio::time::error::Elapsed> for TranslationError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        TranslationError::TimeoutError(format!("异步操作超时: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 记录并返回错误
    pub fn log_error<T>(error: TranslationError) -> TranslationResult<T> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }

        Err(error)
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::InvalidInput(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let error = TranslationError::engine("DeepL", "HTTP status 503");
        assert_eq!(error.to_string(), "引擎 DeepL 调用失败: HTTP status 503");
        assert_eq!(error.category(), ErrorCategory::Engine);
    }

    #[test]
    fn test_with_context_keeps_variant() {
        let error = TranslationError::ServiceError("busy".to_string()).with_context("setMatches");
        match error {
            TranslationError::ServiceError(msg) => {
                assert!(msg.contains("busy"));
                assert!(msg.contains("setMatches"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Warning);
        assert_eq!(
            TranslationError::ParseError("x".into()).severity(),
            ErrorSeverity::Error
        );
        assert_eq!(
            TranslationError::InvalidInput("x".into()).severity(),
            ErrorSeverity::Info
        );
    }

    #[test]
    fn test_log_error_returns_err() {
        let result: TranslationResult<()> =
            helpers::log_error(helpers::validation_error("缺少 segment"));
        assert!(matches!(result, Err(TranslationError::InvalidInput(_))));
    }
}

//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，配置管理器在加载文件后用它覆盖配置项

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量已设置时返回解析结果
    fn get_optional() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "MT_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.trim().to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 约定：任何非空值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 编排相关环境变量
pub mod orchestration {
    use super::*;

    /// 源语言
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "MT_SOURCE_LANG";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("en".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Source language code of the project (e.g. en, en-US)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language(value, Self::NAME)
        }
    }

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "MT_TARGET_LANG";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("zh".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Target language code of the project (e.g. zh, pt-BR)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language(value, Self::NAME)
        }
    }

    /// 项目服务地址
    pub struct ServiceUrl;
    impl EnvVar<String> for ServiceUrl {
        const NAME: &'static str = "MT_SERVICE_URL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("http://localhost:8070".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Project service base URL";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Service URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 引擎调用并发上限
    pub struct EngineConcurrency;
    impl EnvVar<i64> for EngineConcurrency {
        const NAME: &'static str = "MT_ENGINE_CONCURRENCY";
        const DEFAULT: Option<i64> = Some(8);
        const DESCRIPTION: &'static str =
            "Maximum concurrent engine calls (0 or negative for unbounded)";

        fn parse(value: &str) -> EnvResult<i64> {
            parse_limit(value, Self::NAME)
        }
    }

    /// 持久化调用并发上限
    pub struct PersistenceConcurrency;
    impl EnvVar<i64> for PersistenceConcurrency {
        const NAME: &'static str = "MT_PERSISTENCE_CONCURRENCY";
        const DEFAULT: Option<i64> = Some(16);
        const DESCRIPTION: &'static str =
            "Maximum concurrent setMatches calls (0 or negative for unbounded)";

        fn parse(value: &str) -> EnvResult<i64> {
            parse_limit(value, Self::NAME)
        }
    }

    /// 引擎调用重试次数
    pub struct EngineRetryAttempts;
    impl EnvVar<u32> for EngineRetryAttempts {
        const NAME: &'static str = "MT_ENGINE_RETRY_ATTEMPTS";
        const DEFAULT: Option<u32> = Some(3);
        const DESCRIPTION: &'static str = "Attempts per engine call, including the first";

        fn parse(value: &str) -> EnvResult<u32> {
            parse_attempts(value, Self::NAME)
        }
    }

    /// 持久化调用重试次数
    pub struct PersistenceRetryAttempts;
    impl EnvVar<u32> for PersistenceRetryAttempts {
        const NAME: &'static str = "MT_PERSISTENCE_RETRY_ATTEMPTS";
        const DEFAULT: Option<u32> = Some(3);
        const DESCRIPTION: &'static str = "Attempts per setMatches call, including the first";

        fn parse(value: &str) -> EnvResult<u32> {
            parse_attempts(value, Self::NAME)
        }
    }

    /// 项目服务请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "MT_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(60));
        const DESCRIPTION: &'static str = "Project service request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be greater than 0".to_string(),
                });
            }

            if seconds > 600 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout too long (max 600 seconds)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }

    /// 批量运行中允许的未完成段落数
    pub struct MaxPendingSegments;
    impl EnvVar<usize> for MaxPendingSegments {
        const NAME: &'static str = "MT_MAX_PENDING_SEGMENTS";
        const DEFAULT: Option<usize> = Some(256);
        const DESCRIPTION: &'static str =
            "Pending segment operations before the document reader pauses (0 for unbounded)";

        fn parse(value: &str) -> EnvResult<usize> {
            value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid non-negative number".to_string(),
            })
        }
    }
}

/// 辅助函数
fn parse_language(value: &str, var_name: &str) -> EnvResult<String> {
    let lang = value.trim();
    let valid = !lang.is_empty()
        && lang.len() <= 16
        && lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(lang.to_string())
    } else {
        Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid language code '{}'", value),
        })
    }
}

fn parse_limit(value: &str, var_name: &str) -> EnvResult<i64> {
    value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid integer".to_string(),
    })
}

fn parse_attempts(value: &str, var_name: &str) -> EnvResult<u32> {
    let attempts: u32 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if attempts == 0 {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "At least one attempt is required".to_string(),
        });
    }

    if attempts > 20 {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum 20", attempts),
        });
    }

    Ok(attempts)
}

fn doc_line<T: fmt::Debug>(docs: &mut String, name: &str, description: &str, default: Option<T>) {
    docs.push_str(&format!("- `{}`: {} (default: {:?})\n", name, description, default));
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    use orchestration::*;

    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    doc_line(&mut docs, core::LogLevel::NAME, core::LogLevel::DESCRIPTION, Some("info"));
    doc_line(&mut docs, core::NoColor::NAME, core::NoColor::DESCRIPTION, core::NoColor::DEFAULT);

    docs.push_str("\n## Orchestration Configuration\n\n");
    doc_line(&mut docs, SourceLang::NAME, SourceLang::DESCRIPTION, Some("en"));
    doc_line(&mut docs, TargetLang::NAME, TargetLang::DESCRIPTION, Some("zh"));
    doc_line(&mut docs, ServiceUrl::NAME, ServiceUrl::DESCRIPTION, Some("http://localhost:8070"));
    doc_line(&mut docs, EngineConcurrency::NAME, EngineConcurrency::DESCRIPTION, EngineConcurrency::DEFAULT);
    doc_line(
        &mut docs,
        PersistenceConcurrency::NAME,
        PersistenceConcurrency::DESCRIPTION,
        PersistenceConcurrency::DEFAULT,
    );
    doc_line(
        &mut docs,
        EngineRetryAttempts::NAME,
        EngineRetryAttempts::DESCRIPTION,
        EngineRetryAttempts::DEFAULT,
    );
    doc_line(
        &mut docs,
        PersistenceRetryAttempts::NAME,
        PersistenceRetryAttempts::DESCRIPTION,
        PersistenceRetryAttempts::DEFAULT,
    );
    doc_line(&mut docs, RequestTimeout::NAME, RequestTimeout::DESCRIPTION, RequestTimeout::DEFAULT);
    doc_line(
        &mut docs,
        MaxPendingSegments::NAME,
        MaxPendingSegments::DESCRIPTION,
        MaxPendingSegments::DEFAULT,
    );

    docs
}

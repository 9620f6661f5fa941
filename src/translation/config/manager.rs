//! 配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::core::retry::RetryOptions;
use crate::translation::error::{TranslationError, TranslationResult};

/// 编排层配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    // 语言对
    pub source_lang: String,
    pub target_lang: String,

    // 项目服务
    pub service_url: String,
    pub request_timeout_secs: u64,

    // 并发上限
    pub engine_concurrency: i64,
    pub persistence_concurrency: i64,

    // 批量运行
    pub max_pending_segments: usize,

    // 重试策略（TOML 表，须位于标量字段之后）
    pub engine_retry: RetryOptions,
    pub persistence_retry: RetryOptions,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),

            service_url: constants::DEFAULT_SERVICE_URL.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            engine_concurrency: constants::DEFAULT_ENGINE_CONCURRENCY,
            persistence_concurrency: constants::DEFAULT_PERSISTENCE_CONCURRENCY,

            max_pending_segments: constants::DEFAULT_MAX_PENDING_SEGMENTS,

            engine_retry: RetryOptions::ENGINE,
            persistence_retry: RetryOptions::PERSISTENCE,
        }
    }
}

impl OrchestratorConfig {
    /// 创建带指定语言对的默认配置
    pub fn with_languages(source_lang: &str, target_lang: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            ..Self::default()
        }
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.source_lang.trim().is_empty() || self.target_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("源语言和目标语言不能为空".to_string()));
        }

        if !self.service_url.starts_with("http://") && !self.service_url.starts_with("https://") {
            return Err(TranslationError::ConfigError(format!(
                "项目服务地址必须以 http:// 或 https:// 开头: {}",
                self.service_url
            )));
        }

        if self.engine_retry.attempts == 0 || self.persistence_retry.attempts == 0 {
            return Err(TranslationError::ConfigError("重试次数至少为1".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时必须大于0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 只覆盖已设置的变量；无法解析的值记录警告后忽略。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{orchestration, EnvResult, EnvVar};

        fn report<T>(result: EnvResult<Option<T>>) -> Option<T> {
            result.unwrap_or_else(|e| {
                tracing::warn!("忽略无效的环境变量: {}", e);
                None
            })
        }

        if let Some(lang) = report(orchestration::SourceLang::get_optional()) {
            self.source_lang = lang;
        }

        if let Some(lang) = report(orchestration::TargetLang::get_optional()) {
            self.target_lang = lang;
        }

        if let Some(url) = report(orchestration::ServiceUrl::get_optional()) {
            self.service_url = url;
            tracing::info!("环境变量覆盖项目服务地址: {}", self.service_url);
        }

        if let Some(limit) = report(orchestration::EngineConcurrency::get_optional()) {
            self.engine_concurrency = limit;
        }

        if let Some(limit) = report(orchestration::PersistenceConcurrency::get_optional()) {
            self.persistence_concurrency = limit;
        }

        if let Some(attempts) = report(orchestration::EngineRetryAttempts::get_optional()) {
            self.engine_retry.attempts = attempts;
        }

        if let Some(attempts) = report(orchestration::PersistenceRetryAttempts::get_optional()) {
            self.persistence_retry.attempts = attempts;
        }

        if let Some(timeout) = report(orchestration::RequestTimeout::get_optional()) {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Some(pending) = report(orchestration::MaxPendingSegments::get_optional()) {
            self.max_pending_segments = pending;
        }
    }

    /// 转换为Duration类型
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: OrchestratorConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器：.env → 配置文件 → 环境变量覆盖 → 验证
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 只从指定文件加载，不读取环境变量
    pub fn from_file<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        let config = Self::load_from_file(path.as_ref())?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn into_config(self) -> OrchestratorConfig {
        self.config
    }

    /// 从搜索路径加载配置
    fn load_config() -> TranslationResult<OrchestratorConfig> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            let candidate = Path::new(expanded_path.as_ref());
            if candidate.exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(candidate);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(OrchestratorConfig::default())
    }

    /// 从指定文件加载配置，按扩展名选择 TOML 或 JSON
    fn load_from_file(path: &Path) -> TranslationResult<OrchestratorConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> TranslationResult<()> {
        let config = OrchestratorConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

//! 项目服务接口
//!
//! 外部的项目/翻译记忆服务，只作为请求/响应端点使用。
//! 每个操作都有明确的请求结构，必填字段在类型层面体现。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::translation::core::types::{Match, SegmentId, Term};
use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 成功响应的状态值
pub const STATUS_SUCCESS: &str = "Success";

/// 定位单个段落的请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRequest {
    pub project: String,
    pub file: String,
    pub unit: String,
    pub segment: String,
}

impl SegmentRequest {
    pub fn new(
        project: impl Into<String>,
        file: impl Into<String>,
        unit: impl Into<String>,
        segment: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            file: file.into(),
            unit: unit.into(),
            segment: segment.into(),
        }
    }

    /// 校验所有标识都已提供
    pub fn validate(&self) -> TranslationResult<()> {
        let missing: Vec<&str> = [
            ("project", &self.project),
            ("file", &self.file),
            ("unit", &self.unit),
            ("segment", &self.segment),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(helpers::validation_error(format!(
                "段落请求缺少必填字段: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn segment_id(&self) -> SegmentId {
        SegmentId::new(&self.file, &self.unit, &self.segment)
    }
}

/// `getSegment` 的返回数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentData {
    pub source: String,
    pub plain_text: String,
    #[serde(default)]
    pub terms: Vec<Term>,
}

/// `setMatches` 请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMatchesRequest {
    pub project: String,
    pub file: String,
    pub unit: String,
    pub segment: String,
    pub src_lang: String,
    pub tgt_lang: String,
    pub matches: Vec<Match>,
}

impl SetMatchesRequest {
    pub fn segment_id(&self) -> SegmentId {
        SegmentId::new(&self.file, &self.unit, &self.segment)
    }
}

/// `setTarget` 请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTargetRequest {
    pub project: String,
    pub file: String,
    pub unit: String,
    pub segment: String,
    pub target: String,
}

/// 服务响应的公共部分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ServiceStatus {
    /// 非 Success 状态转换为 `ServiceError`
    pub fn check(&self) -> TranslationResult<()> {
        if self.status == STATUS_SUCCESS {
            Ok(())
        } else {
            Err(TranslationError::ServiceError(
                self.reason
                    .clone()
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| format!("status {}", self.status)),
            ))
        }
    }
}

/// 持久化/项目服务
#[async_trait]
pub trait ProjectService: Send + Sync {
    async fn set_matches(&self, request: &SetMatchesRequest) -> TranslationResult<()>;

    async fn set_target(&self, request: &SetTargetRequest) -> TranslationResult<()>;

    async fn get_segment(&self, request: &SegmentRequest) -> TranslationResult<SegmentData>;
}

//! 失败记录器
//!
//! 累积一次运行中的结构化失败记录（项目 + 段落 + 引擎 + 规范化消息）。
//! 记录只在运行开始和结束时清空，不跨运行保留。

use std::fmt;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::translation::core::types::SegmentId;

/// 所有引擎都失败时使用的引擎名
pub const ALL_ENGINES_FAILED: &str = "All Engines Failed";
/// 段落任务本身异常时使用的引擎名
pub const SEGMENT_TRANSLATION: &str = "SegmentTranslation";
/// 持久化失败时使用的引擎名
pub const SET_MATCHES: &str = "setMTMatches";

/// 一次失败调用的规范化记录
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub engine: String,
    pub project: String,
    pub segment: SegmentId,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl FailureRecord {
    /// 是否为"所有引擎失败"类记录
    pub fn is_all_engines_failed(&self) -> bool {
        self.engine == ALL_ENGINES_FAILED
    }

    /// 日志行格式：`[project] [engine] file/unit/id: message`
    pub fn log_line(&self) -> String {
        format!(
            "[{}] [{}] {}: {}",
            self.project, self.engine, self.segment, self.message
        )
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    project: Option<String>,
    records: Vec<FailureRecord>,
}

/// 失败记录器
///
/// 在同一次批量运行的所有段落任务之间共享，只追加不修改。
#[derive(Debug, Default)]
pub struct FailureRecorder {
    state: Mutex<RecorderState>,
}

impl FailureRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 开始一次运行：清空记录并设置活动项目
    ///
    /// 已有活动项目时返回 `false`，状态保持不变。
    pub fn begin_run(&self, project: &str) -> bool {
        let mut state = self.lock();
        if state.project.is_some() {
            return false;
        }
        state.records.clear();
        state.project = Some(project.to_string());
        true
    }

    /// 结束运行：取走全部记录并清除活动项目
    pub fn end_run(&self) -> Vec<FailureRecord> {
        let mut state = self.lock();
        state.project = None;
        std::mem::take(&mut state.records)
    }

    pub fn active_project(&self) -> Option<String> {
        self.lock().project.clone()
    }

    /// 记录一次失败
    ///
    /// `project` 为 `None` 时使用当前活动项目。
    pub fn record<E>(&self, engine: &str, segment: &SegmentId, error: &E, project: Option<&str>)
    where
        E: fmt::Display + ?Sized,
    {
        let message = normalize_message(&error.to_string());
        let mut state = self.lock();
        let project = project
            .map(str::to_string)
            .or_else(|| state.project.clone())
            .unwrap_or_default();

        tracing::warn!("[{}] [{}] {}: {}", project, engine, segment, message);

        state.records.push(FailureRecord {
            engine: engine.to_string(),
            project,
            segment: segment.clone(),
            message,
            recorded_at: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前记录的副本
    pub fn snapshot(&self) -> Vec<FailureRecord> {
        self.lock().records.clone()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.records.clear();
        state.project = None;
    }
}

fn status_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)\bstatus\s*[:=]?\s*(\d{3})\b").ok())
        .as_ref()
}

/// 规范化失败消息
///
/// 消息中出现 `status[:=]? <三位状态码>` 且尚未带状态描述时，
/// 在末尾追加括号描述，例如 429 → `(Too Many Requests)`。只用于日志。
pub fn normalize_message(raw: &str) -> String {
    let message = raw.trim().to_string();

    let Some(code) = status_pattern()
        .and_then(|p| p.captures(&message))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
    else {
        return message;
    };

    let Some(reason) = reqwest::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
    else {
        return message;
    };

    if message.to_lowercase().contains(&reason.to_lowercase()) {
        message
    } else {
        format!("{} ({})", message, reason)
    }
}

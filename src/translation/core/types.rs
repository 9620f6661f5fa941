//! 编排层共享的数据类型

use std::fmt;

use serde::{Deserialize, Serialize};

/// 段落标识：`file/unit/id` 三段式键
///
/// 只用作查找和日志键，创建后不再修改。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId {
    pub file: String,
    pub unit: String,
    pub id: String,
}

impl SegmentId {
    pub fn new(file: impl Into<String>, unit: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            unit: unit.into(),
            id: id.into(),
        }
    }

    /// 空标识，用于无法归属到具体段落的失败记录
    pub fn empty() -> Self {
        Self::default()
    }

    /// 三个字段是否都已填写
    pub fn is_complete(&self) -> bool {
        !self.file.is_empty() && !self.unit.is_empty() && !self.id.is_empty()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.file, self.unit, self.id)
    }
}

/// 术语提示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub source: String,
    pub target: String,
}

impl Term {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// 单个引擎返回的翻译候选
///
/// 编排层不解读其内容，只原样交给持久化接口。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// 产生该候选的引擎名
    pub origin: String,
    pub source: String,
    pub target: String,
}

impl Match {
    pub fn new(
        origin: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// 从导出文档中抽取的一个待翻译段落
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    /// 带内联标记的原文
    pub source: String,
    pub terms: Vec<Term>,
}

//! 翻译引擎接口
//!
//! 编排层只依赖这组能力：获取候选译文、是否直接处理带标记内容、
//! 是否支持修复译文中的标记。具体引擎（云端 MT、LLM 等）由使用方实现。
//!
//! ## 使用示例
//! ```rust,ignore
//! struct Upper;
//!
//! #[async_trait]
//! impl Engine for Upper {
//!     fn name(&self) -> &str { "Upper" }
//!     fn handles_tags(&self) -> bool { false }
//!     async fn get_match(&self, source: &str, _terms: &[Term]) -> TranslationResult<Match> {
//!         Ok(Match::new(self.name(), source, source.to_uppercase()))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::translation::core::types::{Match, Term};
use crate::translation::error::{TranslationError, TranslationResult};

/// 可插拔的翻译后端
///
/// 实现需要是 `Send + Sync`，编排器会在多个段落任务之间共享同一个实例。
/// 从编排器的角度看，引擎是无状态的。
#[async_trait]
pub trait Engine: Send + Sync {
    /// 诊断名称，用于日志和失败记录
    fn name(&self) -> &str;

    /// 是否直接处理带内联标记的内容；否则编排器先剥离标记
    fn handles_tags(&self) -> bool;

    /// 是否支持 `fix_tags`
    fn fixes_matches(&self) -> bool {
        false
    }

    /// 为原文生成一个候选译文
    async fn get_match(&self, source: &str, terms: &[Term]) -> TranslationResult<Match>;

    /// 修复译文中的内联标记，使之与原文一致
    async fn fix_tags(&self, source: &str, target: &str) -> TranslationResult<String> {
        let _ = (source, target);
        Err(TranslationError::Unsupported(format!(
            "{} 不支持修复标记",
            self.name()
        )))
    }
}

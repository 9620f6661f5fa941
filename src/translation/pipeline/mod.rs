//! 段落管道模块
//!
//! 从导出文档中流式抽取段落，并为不处理标记的引擎准备纯文本

pub mod markup;
pub mod xliff;

// 重新导出主要类型
pub use markup::{escape_text, strip_markup, unescape};
pub use xliff::XliffSegments;

//! 内联标记处理
//!
//! 不处理标记的引擎只接收纯文本：去掉所有标签并还原五个 XML 实体。

use std::sync::OnceLock;

use regex::Regex;

fn tag_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^<>]*>").ok()).as_ref()
}

/// 去掉所有标签，返回纯文本
pub fn strip_markup(source: &str) -> String {
    let without_tags = match tag_pattern() {
        Some(pattern) => pattern.replace_all(source, ""),
        None => source.into(),
    };
    unescape(&without_tags)
}

/// 还原 XML 预定义实体，`&amp;` 最后处理
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// 转义文本节点中的特殊字符
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

//! 失败汇总与通知
//!
//! 运行结束时把累积的失败记录汇总成一条通知：按引擎计数的摘要行、
//! 每条记录一行的详细日志，以及可选的标题。无论失败多少次，
//! 一次运行只发出一条通知。

use std::sync::Arc;

use crate::translation::core::signals::SignalSink;
use crate::translation::report::recorder::FailureRecord;

/// 汇总后的失败通知
#[derive(Debug, Clone, PartialEq)]
pub struct FailureNotification {
    /// 调用方提供的面向用户的标题
    pub headline: Option<String>,
    /// `Detected K error(s). Engines: X (n1), Y (n2).`
    pub summary: String,
    /// 每条记录一行
    pub details: Vec<String>,
    /// 按首次出现顺序排列的引擎失败计数
    pub engine_counts: Vec<(String, usize)>,
}

impl FailureNotification {
    /// 从失败记录构建通知，记录为空时返回 `None`
    pub fn from_records(records: &[FailureRecord], headline: Option<String>) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let engine_counts = count_by_engine(records);
        let engines = engine_counts
            .iter()
            .map(|(engine, count)| format!("{} ({})", engine, count))
            .collect::<Vec<_>>()
            .join(", ");
        let summary = format!(
            "Detected {} error(s). Engines: {}.",
            records.len(),
            engines
        );
        let details = records.iter().map(FailureRecord::log_line).collect();

        Some(Self {
            headline,
            summary,
            details,
            engine_counts,
        })
    }
}

fn count_by_engine(records: &[FailureRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in records {
        match counts.iter_mut().find(|(engine, _)| *engine == record.engine) {
            Some((_, count)) => *count += 1,
            None => counts.push((record.engine.clone(), 1)),
        }
    }
    counts
}

/// "所有引擎失败"类记录的数量
pub fn count_untranslated(records: &[FailureRecord]) -> usize {
    records.iter().filter(|r| r.is_all_engines_failed()).count()
}

/// 未翻译段落的用户提示，数量为 0 时不生成
pub fn untranslated_headline(count: usize) -> Option<String> {
    (count > 0).then(|| format!("{} segment(s) were not translated due to errors.", count))
}

/// 失败通知器
#[derive(Clone)]
pub struct FailureNotifier {
    sink: Arc<dyn SignalSink>,
}

impl FailureNotifier {
    pub fn new(sink: Arc<dyn SignalSink>) -> Self {
        Self { sink }
    }

    /// 汇总并发出一条通知；没有记录时什么也不做
    ///
    /// 返回是否发出了通知。
    pub fn notify(&self, records: &[FailureRecord], headline: Option<String>) -> bool {
        let Some(notification) = FailureNotification::from_records(records, headline) else {
            return false;
        };

        tracing::warn!("{}", notification.summary);
        for line in &notification.details {
            tracing::warn!("{}", line);
        }

        self.sink.notify(&notification);
        true
    }
}

//! 表现层信号接口
//!
//! 编排器唯一会"回话"给界面的地方。所有信号都是发出即忘的：
//! 编排器不阻塞在信号上，也不从表现层读取任何状态。

use crate::translation::core::types::SegmentId;
use crate::translation::report::FailureNotification;

/// 表现层信号接收端
pub trait SignalSink: Send + Sync {
    /// 开始忙碌指示
    fn begin_work(&self) {}

    /// 结束忙碌指示
    fn end_work(&self) {}

    /// 更新状态栏文字
    fn set_status(&self, text: &str) {
        let _ = text;
    }

    /// 刷新指定段落的候选译文
    fn refresh_matches(&self, segment: &SegmentId) {
        let _ = segment;
    }

    /// 清除等待指示
    fn clear_waiting(&self) {}

    /// 单段操作的即时错误提示
    fn show_error(&self, message: &str) {
        let _ = message;
    }

    /// 汇总后的失败通知，每次运行最多一次
    fn notify(&self, notification: &FailureNotification);
}

/// 只写日志的信号接收端，适用于无界面环境
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSignals;

impl SignalSink for TracingSignals {
    fn begin_work(&self) {
        tracing::debug!("begin work");
    }

    fn end_work(&self) {
        tracing::debug!("end work");
    }

    fn set_status(&self, text: &str) {
        tracing::info!("{}", text);
    }

    fn refresh_matches(&self, segment: &SegmentId) {
        tracing::debug!("refresh matches for {}", segment);
    }

    fn show_error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn notify(&self, notification: &FailureNotification) {
        if let Some(headline) = &notification.headline {
            tracing::warn!("{}", headline);
        }
        tracing::warn!("{}", notification.summary);
        for line in &notification.details {
            tracing::warn!("{}", line);
        }
    }
}

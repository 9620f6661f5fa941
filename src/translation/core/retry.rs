//! 重试执行器
//!
//! 固定次数重试，线性退避加随机抖动：
//! 第 n 次失败后等待 `initial_delay_ms * n + random(0, jitter_ms)` 毫秒。
//! 不区分可重试与不可重试的错误，尝试次数本身限定了代价。
//! 用尽后原样返回最后一次的错误。

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

/// 重试参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryOptions {
    /// 总尝试次数（含第一次）
    pub attempts: u32,
    /// 基础延迟（毫秒），按尝试序号线性增长
    pub initial_delay_ms: u64,
    /// 随机抖动上限（毫秒）
    pub jitter_ms: u64,
}

impl RetryOptions {
    /// 引擎调用的预设
    pub const ENGINE: RetryOptions = RetryOptions {
        attempts: 3,
        initial_delay_ms: 500,
        jitter_ms: 250,
    };

    /// 持久化调用的预设，服务端在大批量写入时可能短暂繁忙，延迟稍长
    pub const PERSISTENCE: RetryOptions = RetryOptions {
        attempts: 3,
        initial_delay_ms: 800,
        jitter_ms: 400,
    };

    pub fn new(attempts: u32, initial_delay_ms: u64, jitter_ms: u64) -> Self {
        Self {
            attempts,
            initial_delay_ms,
            jitter_ms,
        }
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时间
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        let base = self.initial_delay_ms.saturating_mul(u64::from(attempt));
        Duration::from_millis(base.saturating_add(jitter))
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::ENGINE
    }
}

/// 带重试地执行异步任务
///
/// `task` 接收当前尝试序号（从 1 开始），每次调用都要返回新的 future。
/// `attempts` 为 0 时按 1 次处理。
pub async fn run_with_retry<T, E, F, Fut>(
    mut task: F,
    options: &RetryOptions,
    label: &str,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let attempts = options.attempts.max(1);
    let mut attempt = 1;

    loop {
        match task(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!("{} 在第 {} 次尝试后成功", label, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt >= attempts => {
                tracing::debug!("{} 已尝试 {} 次，放弃: {}", label, attempts, e);
                return Err(e);
            }
            Err(e) => {
                let delay = options.delay_for(attempt);
                tracing::debug!(
                    "{} 失败，{}ms后重试 (尝试 {}/{}): {}",
                    label,
                    delay.as_millis(),
                    attempt + 1,
                    attempts,
                    e
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

//! 有界并发限制器
//!
//! 限制同一类异步任务的同时执行数量，超出的请求按 FIFO 顺序排队。
//! 底层使用 `tokio::sync::Semaphore`，其许可按请求顺序公平分配。
//!
//! - 限制器只负责准入，不吞掉也不转换任务的结果或错误
//! - `limit <= 0` 表示不限制
//! - 不设超时，卡住的任务会一直占用槽位，需要上界的调用方应在提交前自行包装

use std::future::Future;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::Semaphore;

/// 有界并发限制器
///
/// 可廉价克隆，克隆体共享同一组许可和计数。
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    name: Arc<str>,
    limit: Option<usize>,
    semaphore: Option<Arc<Semaphore>>,
    active: Arc<AtomicUsize>,
    waiting: Arc<AtomicUsize>,
}

impl ConcurrencyLimiter {
    /// 创建限制器，`limit` 为 0 或负数时不限制并发
    pub fn new(name: &str, limit: i64) -> Self {
        let limit = usize::try_from(limit).ok().filter(|l| *l > 0);
        Self {
            name: Arc::from(name),
            limit,
            semaphore: limit.map(|l| Arc::new(Semaphore::new(l))),
            active: Arc::new(AtomicUsize::new(0)),
            waiting: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 不限制并发的限制器
    pub fn unbounded(name: &str) -> Self {
        Self::new(name, 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 并发上限，`None` 表示不限制
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// 当前正在执行的任务数
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// 当前排队等待的任务数
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// 在限制器的准入控制下执行任务，原样返回任务的结果
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let _permit = match &self.semaphore {
            Some(semaphore) => {
                let queued = CountGuard::enter(&self.waiting);
                let acquired = semaphore.acquire().await;
                drop(queued);
                match acquired {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        // 信号量从不关闭，这里只做兜底
                        tracing::warn!("限制器 {} 获取许可失败，直接执行: {}", self.name, e);
                        None
                    }
                }
            }
            None => None,
        };

        let _active = CountGuard::enter(&self.active);
        tracing::trace!(
            "限制器 {} 准入任务，当前活跃 {}",
            self.name,
            self.active.load(Ordering::Relaxed)
        );
        task.await
    }
}

/// 计数守卫，离开作用域或 future 被丢弃时归还计数
struct CountGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> CountGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for CountGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use futures::future::join_all;

    #[test]
    fn test_non_positive_limit_is_unbounded() {
        assert_eq!(ConcurrencyLimiter::new("a", 0).limit(), None);
        assert_eq!(ConcurrencyLimiter::new("b", -3).limit(), None);
        assert_eq!(ConcurrencyLimiter::new("c", 4).limit(), Some(4));
    }

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let limiter = ConcurrencyLimiter::new("passthrough", 1);
        let ok: Result<u32, String> = limiter.run(async { Ok(7) }).await;
        let err: Result<u32, String> = limiter.run(async { Err("boom".to_string()) }).await;
        assert_eq!(ok, Ok(7));
        assert_eq!(err, Err("boom".to_string()));
        assert_eq!(limiter.active(), 0);
    }

    #[tokio::test]
    async fn test_never_exceeds_limit_and_admits_fifo() {
        let limiter = ConcurrencyLimiter::new("fifo", 2);
        let peak = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(Mutex::new(Vec::new()));

        let tasks = (0..8).map(|i| {
            let limiter = limiter.clone();
            let peak = Arc::clone(&peak);
            let started = Arc::clone(&started);
            async move {
                let watched = limiter.clone();
                limiter
                    .run(async move {
                        peak.fetch_max(watched.active(), Ordering::SeqCst);
                        started.lock().unwrap().push(i);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        i
                    })
                    .await
            }
        });

        let results = join_all(tasks).await;
        assert_eq!(results, (0..8).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(*started.lock().unwrap(), (0..8).collect::<Vec<_>>());
        assert_eq!(limiter.active(), 0);
        assert_eq!(limiter.waiting(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_queued_task_releases_waiting_slot() {
        let limiter = ConcurrencyLimiter::new("cancel", 1);

        let holder = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter
                    .run(tokio::time::sleep(Duration::from_millis(50)))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        let queued = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.run(async { 1 }).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(limiter.active(), 1);
        assert_eq!(limiter.waiting(), 1);

        queued.abort();
        assert!(queued.await.unwrap_err().is_cancelled());
        holder.await.unwrap();

        assert_eq!(limiter.active(), 0);
        assert_eq!(limiter.waiting(), 0);

        // 许可仍然可用
        assert_eq!(limiter.run(async { 2 }).await, 2);
    }

    #[tokio::test]
    async fn test_unbounded_runs_everything_at_once() {
        let limiter = ConcurrencyLimiter::unbounded("free");
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..6).map(|_| {
            let limiter = limiter.clone();
            let peak = Arc::clone(&peak);
            async move {
                let watched = limiter.clone();
                limiter
                    .run(async move {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        peak.fetch_max(watched.active(), Ordering::SeqCst);
                    })
                    .await
            }
        });
        join_all(tasks).await;

        assert_eq!(peak.load(Ordering::SeqCst), 6);
    }
}

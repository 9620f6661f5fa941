//! 翻译编排器
//!
//! 持有已配置的引擎列表，把一个段落同时分发给所有引擎，收集成功的候选译文并持久化。
//!
//! ## 三条路径
//!
//! - **单段分发** (`dispatch_segment`): 扇出到所有引擎，等待全部结束，部分成功即视为成功
//! - **单段请求** (`translate_segment`): 校验请求、加载段落、分发，失败立即通知
//! - **整项目批量** (`translate_project`): 流式读取段落，延迟等待，结束时汇总成一条通知
//!
//! ## 资源模型
//!
//! 引擎调用和持久化调用各自经过独立的并发限制器与重试策略。
//! 批量运行的段落任务由 `JoinSet` 跟踪，未完成任务数达到上限时暂停读取文档。
//!
//! ```text
//! XliffSegments ──▶ translate_project / translate_file ──▶ JoinSet
//!                                          └── dispatch_segment
//!                                                ├── dispatch 限制器 ─▶ 重试 ─▶ Engine × N
//!                                                └── persistence 限制器 ─▶ 重试 ─▶ setMatches
//! ```

use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};

use futures::future::join_all;
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::translation::config::OrchestratorConfig;
use crate::translation::core::engine::Engine;
use crate::translation::core::limiter::ConcurrencyLimiter;
use crate::translation::core::retry::{run_with_retry, RetryOptions};
use crate::translation::core::signals::SignalSink;
use crate::translation::core::types::{Match, Segment, SegmentId};
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::pipeline::markup::strip_markup;
use crate::translation::pipeline::xliff::XliffSegments;
use crate::translation::report::{
    count_untranslated, untranslated_headline, FailureNotifier, FailureRecord, FailureRecorder,
    ALL_ENGINES_FAILED, SEGMENT_TRANSLATION, SET_MATCHES,
};
use crate::translation::storage::{
    HttpProjectService, ProjectService, SegmentRequest, SetMatchesRequest, SetTargetRequest,
};

/// 单个段落的分发结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentOutcome {
    /// 成功返回的候选译文
    pub matches: Vec<Match>,
    /// 重试用尽后仍失败的引擎名
    pub failures: Vec<String>,
}

impl SegmentOutcome {
    /// 至少有一个引擎参与且全部失败
    pub fn all_failed(&self) -> bool {
        self.matches.is_empty() && !self.failures.is_empty()
    }
}

/// 整项目批量运行的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectRun {
    /// 已分发的段落数
    pub segments: usize,
    /// 本次运行的全部失败记录
    pub failures: Vec<FailureRecord>,
    pub had_failures: bool,
}

/// 运行统计
#[derive(Debug, Default)]
pub struct OrchestratorStats {
    pub segments_dispatched: AtomicUsize,
    pub matches_produced: AtomicUsize,
    pub engine_failures: AtomicUsize,
    pub matches_persisted: AtomicUsize,
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub segments_dispatched: usize,
    pub matches_produced: usize,
    pub engine_failures: usize,
    pub matches_persisted: usize,
}

impl OrchestratorStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            segments_dispatched: self.segments_dispatched.load(Ordering::Relaxed),
            matches_produced: self.matches_produced.load(Ordering::Relaxed),
            engine_failures: self.engine_failures.load(Ordering::Relaxed),
            matches_persisted: self.matches_persisted.load(Ordering::Relaxed),
        }
    }
}

/// 翻译编排器
pub struct TranslationOrchestrator {
    engines: Vec<Arc<dyn Engine>>,
    service: Arc<dyn ProjectService>,
    signals: Arc<dyn SignalSink>,
    notifier: FailureNotifier,

    dispatch_limiter: ConcurrencyLimiter,
    persistence_limiter: ConcurrencyLimiter,
    engine_retry: RetryOptions,
    persistence_retry: RetryOptions,

    /// 批量运行共享的失败记录器
    recorder: FailureRecorder,
    visible_segment: Mutex<Option<SegmentId>>,

    source_lang: String,
    target_lang: String,
    max_pending_segments: usize,

    stats: OrchestratorStats,
}

impl TranslationOrchestrator {
    pub fn new(
        config: &OrchestratorConfig,
        engines: Vec<Arc<dyn Engine>>,
        service: Arc<dyn ProjectService>,
        signals: Arc<dyn SignalSink>,
    ) -> Self {
        tracing::info!(
            "创建翻译编排器: {} 个引擎, {} -> {}",
            engines.len(),
            config.source_lang,
            config.target_lang
        );

        Self {
            engines,
            service,
            notifier: FailureNotifier::new(Arc::clone(&signals)),
            signals,
            dispatch_limiter: ConcurrencyLimiter::new("dispatch", config.engine_concurrency),
            persistence_limiter: ConcurrencyLimiter::new(
                "persistence",
                config.persistence_concurrency,
            ),
            engine_retry: config.engine_retry,
            persistence_retry: config.persistence_retry,
            recorder: FailureRecorder::new(),
            visible_segment: Mutex::new(None),
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
            max_pending_segments: config.max_pending_segments,
            stats: OrchestratorStats::default(),
        }
    }

    /// 使用 HTTP 项目服务创建编排器
    pub fn with_http_service(
        config: &OrchestratorConfig,
        engines: Vec<Arc<dyn Engine>>,
        signals: Arc<dyn SignalSink>,
    ) -> TranslationResult<Self> {
        config.validate()?;
        let service = HttpProjectService::from_config(config)?;
        Ok(Self::new(config, engines, Arc::new(service), signals))
    }

    // ========================================================================
    // 访问器
    // ========================================================================

    pub fn engines(&self) -> &[Arc<dyn Engine>] {
        &self.engines
    }

    pub fn dispatch_limiter(&self) -> &ConcurrencyLimiter {
        &self.dispatch_limiter
    }

    pub fn persistence_limiter(&self) -> &ConcurrencyLimiter {
        &self.persistence_limiter
    }

    pub fn recorder(&self) -> &FailureRecorder {
        &self.recorder
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// 正在批量翻译的项目
    pub fn active_project(&self) -> Option<String> {
        self.recorder.active_project()
    }

    pub fn visible_segment(&self) -> Option<SegmentId> {
        self.visible_segment
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 设置当前打开的段落，持久化成功后只刷新这个段落
    pub fn set_visible_segment(&self, segment: Option<SegmentId>) {
        *self
            .visible_segment
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = segment;
    }

    fn is_visible(&self, segment: &SegmentId) -> bool {
        self.visible_segment
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(false, |visible| visible == segment)
    }

    /// 段落可见时刷新候选译文并清除等待提示
    fn refresh_if_visible(&self, segment: &SegmentId) {
        if self.is_visible(segment) {
            self.signals.refresh_matches(segment);
            self.signals.clear_waiting();
        }
    }

    // ========================================================================
    // 单段分发
    // ========================================================================

    /// 把段落分发给所有引擎，并持久化成功的候选译文
    ///
    /// 失败写入 `recorder`，不会返回错误。
    pub async fn dispatch_segment(
        &self,
        project: &str,
        segment: &Segment,
        recorder: &FailureRecorder,
    ) -> SegmentOutcome {
        let plain_text = if self.engines.iter().any(|engine| !engine.handles_tags()) {
            strip_markup(&segment.source)
        } else {
            String::new()
        };
        self.dispatch_with_plain_text(project, segment, &plain_text, recorder)
            .await
    }

    async fn dispatch_with_plain_text(
        &self,
        project: &str,
        segment: &Segment,
        plain_text: &str,
        recorder: &FailureRecorder,
    ) -> SegmentOutcome {
        let mut outcome = SegmentOutcome::default();
        if self.engines.is_empty() {
            tracing::debug!("未配置引擎，跳过段落 {}", segment.id);
            return outcome;
        }

        self.stats.segments_dispatched.fetch_add(1, Ordering::Relaxed);

        let calls = self.engines.iter().map(|engine| {
            let input = if engine.handles_tags() {
                segment.source.as_str()
            } else {
                plain_text
            };
            let label = format!("{} {}", engine.name(), segment.id);

            async move {
                tracing::debug!("分发 {}", label);
                let result = self
                    .dispatch_limiter
                    .run(run_with_retry(
                        move |_| engine.get_match(input, &segment.terms),
                        &self.engine_retry,
                        &label,
                    ))
                    .await;
                (engine, result)
            }
        });

        for (engine, result) in join_all(calls).await {
            match result {
                Ok(candidate) => outcome.matches.push(candidate),
                Err(e) => {
                    recorder.record(engine.name(), &segment.id, &e, Some(project));
                    outcome.failures.push(engine.name().to_string());
                }
            }
        }

        self.stats
            .matches_produced
            .fetch_add(outcome.matches.len(), Ordering::Relaxed);
        self.stats
            .engine_failures
            .fetch_add(outcome.failures.len(), Ordering::Relaxed);

        if outcome.matches.is_empty() {
            recorder.record(
                ALL_ENGINES_FAILED,
                &segment.id,
                &format!("all {} engine(s) failed", self.engines.len()),
                Some(project),
            );
            return outcome;
        }

        let request = SetMatchesRequest {
            project: project.to_string(),
            file: segment.id.file.clone(),
            unit: segment.id.unit.clone(),
            segment: segment.id.id.clone(),
            src_lang: self.source_lang.clone(),
            tgt_lang: self.target_lang.clone(),
            matches: outcome.matches.clone(),
        };
        self.set_matches(&request, recorder).await;

        outcome
    }

    // ========================================================================
    // 持久化
    // ========================================================================

    /// 经持久化限制器与重试保存候选译文
    ///
    /// 失败记为 `setMTMatches`，返回是否保存成功。
    pub async fn set_matches(&self, request: &SetMatchesRequest, recorder: &FailureRecorder) -> bool {
        let segment = request.segment_id();
        let label = format!("setMatches {}", segment);

        let result = self
            .persistence_limiter
            .run(run_with_retry(
                move |_| self.service.set_matches(request),
                &self.persistence_retry,
                &label,
            ))
            .await;

        match result {
            Ok(()) => {
                self.stats
                    .matches_persisted
                    .fetch_add(request.matches.len(), Ordering::Relaxed);
                self.refresh_if_visible(&segment);
                true
            }
            Err(e) => {
                recorder.record(SET_MATCHES, &segment, &e, Some(&request.project));
                false
            }
        }
    }

    // ========================================================================
    // 单段请求
    // ========================================================================

    /// 翻译界面上当前打开的一个段落
    ///
    /// 请求缺少标识时立即报错，不联系任何引擎。引擎失败会立刻发出汇总通知。
    pub async fn translate_segment(&self, request: SegmentRequest) -> TranslationResult<SegmentOutcome> {
        if let Err(e) = request.validate() {
            self.signals.show_error(&e.to_string());
            return helpers::log_error(e);
        }

        let segment_id = request.segment_id();
        self.set_visible_segment(Some(segment_id.clone()));
        self.signals.begin_work();

        let result = self.translate_requested_segment(&request, segment_id).await;

        if let Err(e) = &result {
            self.signals.show_error(&e.to_string());
        }
        self.signals.clear_waiting();
        self.signals.end_work();
        result.or_else(helpers::log_error)
    }

    async fn translate_requested_segment(
        &self,
        request: &SegmentRequest,
        segment_id: SegmentId,
    ) -> TranslationResult<SegmentOutcome> {
        let data = self.service.get_segment(request).await?;
        let segment = Segment {
            id: segment_id,
            source: data.source,
            terms: data.terms,
        };

        let recorder = FailureRecorder::new();
        let outcome = self
            .dispatch_with_plain_text(&request.project, &segment, &data.plain_text, &recorder)
            .await;

        let records = recorder.end_run();
        let headline = outcome
            .all_failed()
            .then(|| format!("Segment {} was not translated.", segment.id));
        self.notifier.notify(&records, headline);

        Ok(outcome)
    }

    /// 用支持修复的引擎修正候选译文中的标记，并写回目标译文
    pub async fn fix_match_tags(&self, request: SegmentRequest, target: &str) -> TranslationResult<String> {
        if let Err(e) = request.validate() {
            self.signals.show_error(&e.to_string());
            return helpers::log_error(e);
        }

        let Some(engine) = self.engines.iter().find(|engine| engine.fixes_matches()) else {
            let e = TranslationError::Unsupported("没有支持修复标记的引擎".to_string());
            self.signals.show_error(&e.to_string());
            return helpers::log_error(e);
        };

        self.signals.begin_work();
        let result = self.fix_tags_with(engine.as_ref(), &request, target).await;
        if let Err(e) = &result {
            self.signals.show_error(&e.to_string());
        }
        self.signals.end_work();
        result.or_else(helpers::log_error)
    }

    async fn fix_tags_with(
        &self,
        engine: &dyn Engine,
        request: &SegmentRequest,
        target: &str,
    ) -> TranslationResult<String> {
        let segment_id = request.segment_id();
        let data = self.service.get_segment(request).await?;

        let source = data.source.as_str();
        let label = format!("{} fixTags {}", engine.name(), segment_id);
        let fixed = self
            .dispatch_limiter
            .run(run_with_retry(
                move |_| engine.fix_tags(source, target),
                &self.engine_retry,
                &label,
            ))
            .await?;

        let update = SetTargetRequest {
            project: request.project.clone(),
            file: request.file.clone(),
            unit: request.unit.clone(),
            segment: request.segment.clone(),
            target: fixed.clone(),
        };
        let update = &update;
        let label = format!("setTarget {}", segment_id);
        self.persistence_limiter
            .run(run_with_retry(
                move |_| self.service.set_target(update),
                &self.persistence_retry,
                &label,
            ))
            .await?;

        self.refresh_if_visible(&segment_id);
        Ok(fixed)
    }

    // ========================================================================
    // 整项目批量
    // ========================================================================

    /// 翻译整个项目
    ///
    /// 边读取段落边分发，不等待前面的段落完成；所有失败在结束时汇总成一条通知。
    /// 文档结构错误会中止运行并直接返回，不发出汇总通知。
    ///
    /// `segments` 在驱动运行的异步任务上被同步迭代，读取文件的迭代器会阻塞该任务，
    /// 读取磁盘文档时应使用 [`translate_file`](Self::translate_file)。
    /// 返回的 future 仅在 `segments` 迭代器为 `Send` 时才是 `Send`。
    pub async fn translate_project<I>(
        self: &Arc<Self>,
        project: &str,
        segments: I,
        resume_segment: Option<SegmentId>,
    ) -> TranslationResult<ProjectRun>
    where
        I: IntoIterator<Item = TranslationResult<Segment>>,
    {
        self.run_project(project, stream::iter(segments), resume_segment)
            .await
    }

    /// 翻译磁盘上的 XLIFF 导出文档
    ///
    /// 文档在阻塞线程池中读取，段落经有界通道送回，读取不会占用异步工作线程。
    pub async fn translate_file<P: AsRef<Path>>(
        self: &Arc<Self>,
        project: &str,
        path: P,
        resume_segment: Option<SegmentId>,
    ) -> TranslationResult<ProjectRun> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let (tx, rx) = mpsc::channel(self.max_pending_segments.max(1));

        let reader = tokio::task::spawn_blocking(move || {
            let segments = match XliffSegments::from_path(&path) {
                Ok(segments) => segments,
                Err(e) => {
                    let _ = tx.blocking_send(Err(e));
                    return;
                }
            };
            for item in segments {
                // 接收端已关闭说明运行结束或被拒绝
                if tx.blocking_send(item).is_err() {
                    break;
                }
            }
        });

        let segments = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        let result = self.run_project(project, segments, resume_segment).await;

        if let Err(e) = reader.await {
            tracing::warn!("文档读取任务异常结束: {}", e);
        }
        result
    }

    async fn run_project<S>(
        self: &Arc<Self>,
        project: &str,
        segments: S,
        resume_segment: Option<SegmentId>,
    ) -> TranslationResult<ProjectRun>
    where
        S: Stream<Item = TranslationResult<Segment>>,
    {
        if !self.recorder.begin_run(project) {
            let active = self.recorder.active_project().unwrap_or_default();
            return Err(TranslationError::ConcurrencyError(format!(
                "项目 {} 的批量翻译仍在进行",
                active
            )));
        }

        tracing::info!("开始批量翻译项目 {}", project);
        if resume_segment.is_some() {
            self.set_visible_segment(resume_segment);
        }
        self.signals.begin_work();

        let mut segments = pin!(segments);
        let mut pending: JoinSet<TranslationResult<SegmentOutcome>> = JoinSet::new();
        let mut dispatched = 0usize;

        while let Some(item) = segments.next().await {
            let segment = match item {
                Ok(segment) => segment,
                Err(e) => {
                    tracing::error!("项目 {} 文档解析失败，中止运行: {}", project, e);
                    pending.shutdown().await;
                    self.recorder.clear();
                    self.signals.end_work();
                    return Err(e);
                }
            };

            if self.max_pending_segments > 0 {
                while pending.len() >= self.max_pending_segments {
                    match pending.join_next().await {
                        Some(joined) => self.reap(joined),
                        None => break,
                    }
                }
            }

            dispatched += 1;
            self.signals
                .set_status(&format!("Translating segment {}", dispatched));

            let orchestrator = Arc::clone(self);
            let project = project.to_string();
            pending.spawn(async move {
                if !segment.id.is_complete() {
                    return Err(TranslationError::InvalidInput(format!(
                        "段落标识不完整: {}",
                        segment.id
                    )));
                }
                let outcome = orchestrator
                    .dispatch_segment(&project, &segment, &orchestrator.recorder)
                    .await;
                Ok(outcome)
            });
        }

        while let Some(joined) = pending.join_next().await {
            self.reap(joined);
        }

        let failures = self.recorder.end_run();
        let had_failures = !failures.is_empty();
        let headline = untranslated_headline(count_untranslated(&failures));
        self.notifier.notify(&failures, headline);

        self.signals
            .set_status(&format!("Translated {} segments", dispatched));
        self.signals.end_work();
        tracing::info!(
            "项目 {} 翻译完成: {} 个段落, {} 条失败记录",
            project,
            dispatched,
            failures.len()
        );

        Ok(ProjectRun {
            segments: dispatched,
            failures,
            had_failures,
        })
    }

    /// 处理一个结束的段落任务，任务本身出错时记为 `SegmentTranslation`
    fn reap(&self, joined: Result<TranslationResult<SegmentOutcome>, JoinError>) {
        match joined {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                self.recorder
                    .record(SEGMENT_TRANSLATION, &SegmentId::empty(), &e, None)
            }
            Err(e) => {
                self.recorder
                    .record(SEGMENT_TRANSLATION, &SegmentId::empty(), &e, None)
            }
        }
    }
}

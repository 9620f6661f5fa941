// 集成测试公共模块
//
// 提供脚本化的模拟引擎、记录信号的接收端和内存项目服务

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use multi_translator::translation::core::engine::Engine;
use multi_translator::translation::core::signals::SignalSink;
use multi_translator::translation::core::types::{Match, Segment, SegmentId, Term};
use multi_translator::translation::report::FailureNotification;
use multi_translator::translation::storage::{
    ProjectService, SegmentData, SegmentRequest, SetMatchesRequest, SetTargetRequest,
};
use multi_translator::translation::{
    OrchestratorConfig, RetryOptions, TranslationError, TranslationOrchestrator, TranslationResult,
};

// ============================================================================
// 模拟引擎
// ============================================================================

/// 引擎行为脚本
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(String),
    /// 前 n 次失败，之后成功
    FailTimes(u32, String),
}

/// 多个引擎共享的并发计量
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct MockEngine {
    name: String,
    handles_tags: bool,
    fixes: bool,
    behavior: Behavior,
    delay: Option<Duration>,
    gauge: Option<Arc<ConcurrencyGauge>>,
    calls: AtomicU32,
    inputs: Mutex<Vec<String>>,
}

impl MockEngine {
    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            handles_tags: false,
            fixes: false,
            behavior,
            delay: None,
            gauge: None,
            calls: AtomicU32::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Succeed)
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self::with_behavior(name, Behavior::Fail(message.to_string()))
    }

    pub fn flaky(name: &str, failures: u32) -> Self {
        Self::with_behavior(name, Behavior::FailTimes(failures, "temporary outage".to_string()))
    }

    pub fn handling_tags(mut self) -> Self {
        self.handles_tags = true;
        self
    }

    pub fn fixing_tags(mut self) -> Self {
        self.fixes = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn handles_tags(&self) -> bool {
        self.handles_tags
    }

    fn fixes_matches(&self) -> bool {
        self.fixes
    }

    async fn get_match(&self, source: &str, _terms: &[Term]) -> TranslationResult<Match> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.inputs.lock().unwrap().push(source.to_string());

        if let Some(gauge) = &self.gauge {
            gauge.enter();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gauge) = &self.gauge {
            gauge.exit();
        }

        let failure = match &self.behavior {
            Behavior::Succeed => None,
            Behavior::Fail(message) => Some(message.clone()),
            Behavior::FailTimes(n, message) if call <= *n => Some(message.clone()),
            Behavior::FailTimes(..) => None,
        };

        match failure {
            Some(message) => Err(TranslationError::engine(&self.name, message)),
            None => Ok(Match::new(
                &self.name,
                source,
                format!("[{}] {}", self.name, source),
            )),
        }
    }

    async fn fix_tags(&self, _source: &str, target: &str) -> TranslationResult<String> {
        Ok(format!("{}<ph id=\"fixed\"/>", target))
    }
}

// ============================================================================
// 记录信号
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    BeginWork,
    EndWork,
    Status(String),
    Refresh(SegmentId),
    ClearWaiting,
    Error(String),
}

#[derive(Default)]
pub struct RecordingSignals {
    events: Mutex<Vec<Signal>>,
    notifications: Mutex<Vec<FailureNotification>>,
}

impl RecordingSignals {
    pub fn events(&self) -> Vec<Signal> {
        self.events.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<FailureNotification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Signal::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn refreshed(&self) -> Vec<SegmentId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Signal::Refresh(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Signal::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, signal: &Signal) -> usize {
        self.events().iter().filter(|e| *e == signal).count()
    }

    fn push(&self, signal: Signal) {
        self.events.lock().unwrap().push(signal);
    }
}

impl SignalSink for RecordingSignals {
    fn begin_work(&self) {
        self.push(Signal::BeginWork);
    }

    fn end_work(&self) {
        self.push(Signal::EndWork);
    }

    fn set_status(&self, text: &str) {
        self.push(Signal::Status(text.to_string()));
    }

    fn refresh_matches(&self, segment: &SegmentId) {
        self.push(Signal::Refresh(segment.clone()));
    }

    fn clear_waiting(&self) {
        self.push(Signal::ClearWaiting);
    }

    fn show_error(&self, message: &str) {
        self.push(Signal::Error(message.to_string()));
    }

    fn notify(&self, notification: &FailureNotification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }
}

// ============================================================================
// 内存项目服务
// ============================================================================

#[derive(Default)]
pub struct MemoryProjectService {
    saved: Mutex<Vec<SetMatchesRequest>>,
    targets: Mutex<Vec<SetTargetRequest>>,
    segments: Mutex<HashMap<SegmentId, SegmentData>>,
    set_matches_calls: AtomicU32,
    /// 剩余需要注入的 setMatches 失败次数
    failures_to_inject: AtomicU32,
    always_fail: AtomicBool,
}

impl MemoryProjectService {
    pub fn with_segment(self, id: SegmentId, source: &str, plain_text: &str) -> Self {
        self.segments.lock().unwrap().insert(
            id,
            SegmentData {
                source: source.to_string(),
                plain_text: plain_text.to_string(),
                terms: vec![Term::new("Hello", "你好")],
            },
        );
        self
    }

    pub fn fail_next(&self, times: u32) {
        self.failures_to_inject.store(times, Ordering::SeqCst);
    }

    pub fn fail_always(&self) {
        self.always_fail.store(true, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<SetMatchesRequest> {
        self.saved.lock().unwrap().clone()
    }

    pub fn targets(&self) -> Vec<SetTargetRequest> {
        self.targets.lock().unwrap().clone()
    }

    pub fn set_matches_calls(&self) -> u32 {
        self.set_matches_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectService for MemoryProjectService {
    async fn set_matches(&self, request: &SetMatchesRequest) -> TranslationResult<()> {
        self.set_matches_calls.fetch_add(1, Ordering::SeqCst);

        if self.always_fail.load(Ordering::SeqCst) {
            return Err(TranslationError::ServiceError("server busy, status 429".to_string()));
        }
        let injected = self
            .failures_to_inject
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(TranslationError::NetworkError("connection reset".to_string()));
        }

        self.saved.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn set_target(&self, request: &SetTargetRequest) -> TranslationResult<()> {
        self.targets.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn get_segment(&self, request: &SegmentRequest) -> TranslationResult<SegmentData> {
        self.segments
            .lock()
            .unwrap()
            .get(&request.segment_id())
            .cloned()
            .ok_or_else(|| TranslationError::ServiceError("Segment not found".to_string()))
    }
}

// ============================================================================
// 构建辅助
// ============================================================================

/// 重试延迟压到 1ms 的配置
pub fn fast_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::with_languages("en", "zh");
    config.engine_retry = RetryOptions::new(3, 1, 0);
    config.persistence_retry = RetryOptions::new(3, 1, 0);
    config
}

pub struct TestEnvironment {
    pub orchestrator: Arc<TranslationOrchestrator>,
    pub service: Arc<MemoryProjectService>,
    pub signals: Arc<RecordingSignals>,
}

impl TestEnvironment {
    pub fn new(engines: Vec<Arc<dyn Engine>>) -> Self {
        Self::with_config(fast_config(), engines, MemoryProjectService::default())
    }

    pub fn with_config(
        config: OrchestratorConfig,
        engines: Vec<Arc<dyn Engine>>,
        service: MemoryProjectService,
    ) -> Self {
        let service = Arc::new(service);
        let signals = Arc::new(RecordingSignals::default());
        let orchestrator = Arc::new(TranslationOrchestrator::new(
            &config,
            engines,
            service.clone(),
            signals.clone(),
        ));

        Self {
            orchestrator,
            service,
            signals,
        }
    }
}

pub fn segment(file: &str, unit: &str, id: &str, source: &str) -> Segment {
    Segment {
        id: SegmentId::new(file, unit, id),
        source: source.to_string(),
        terms: Vec::new(),
    }
}

/// `count` 个文档顺序的段落
pub fn document(count: usize) -> Vec<TranslationResult<Segment>> {
    (1..=count)
        .map(|i| Ok(segment("doc.docx", "u1", &i.to_string(), &format!("Sentence {}.", i))))
        .collect()
}

/// 共享同一个模拟引擎，便于之后检查调用情况
pub fn shared(engine: &Arc<MockEngine>) -> Arc<dyn Engine> {
    engine.clone()
}

pub fn boxed(engine: MockEngine) -> Arc<dyn Engine> {
    Arc::new(engine)
}

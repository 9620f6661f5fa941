//! 单段请求与标记修复集成测试

use std::sync::Arc;

use multi_translator::translation::storage::SegmentRequest;
use multi_translator::translation::{SegmentId, TranslationError};

mod common {
    include!("common/mod.rs");
}

use common::{boxed, fast_config, shared, MemoryProjectService, MockEngine, Signal, TestEnvironment};

const SOURCE: &str = r#"Press <pc id="1">OK</pc>"#;

fn service_with_segment() -> MemoryProjectService {
    MemoryProjectService::default().with_segment(SegmentId::new("f", "u", "s"), SOURCE, "Press OK")
}

fn request() -> SegmentRequest {
    SegmentRequest::new("proj", "f", "u", "s")
}

#[tokio::test]
async fn test_incomplete_request_is_rejected_before_any_work() {
    let engine = Arc::new(MockEngine::succeeding("Engine A"));
    let env = TestEnvironment::new(vec![shared(&engine)]);

    let result = env
        .orchestrator
        .translate_segment(SegmentRequest::new("proj", "f", "", "s"))
        .await;

    assert!(matches!(result, Err(TranslationError::InvalidInput(_))));
    assert_eq!(engine.calls(), 0);
    assert_eq!(env.signals.errors().len(), 1);
    assert_eq!(env.signals.count(&Signal::BeginWork), 0);

    println!("✅ Invalid request test passed");
}

#[tokio::test]
async fn test_segment_request_translates_and_refreshes() {
    let plain = Arc::new(MockEngine::succeeding("Plain"));
    let rich = Arc::new(MockEngine::succeeding("Rich").handling_tags());
    let env = TestEnvironment::with_config(
        fast_config(),
        vec![shared(&plain), shared(&rich)],
        service_with_segment(),
    );

    let outcome = env.orchestrator.translate_segment(request()).await.unwrap();

    assert_eq!(outcome.matches.len(), 2);
    // 纯文本来自服务端，不在本地重新剥离
    assert_eq!(plain.inputs(), vec!["Press OK".to_string()]);
    assert_eq!(rich.inputs(), vec![SOURCE.to_string()]);

    let saved = env.service.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].project, "proj");

    let id = SegmentId::new("f", "u", "s");
    assert_eq!(env.orchestrator.visible_segment(), Some(id.clone()));
    assert_eq!(env.signals.refreshed(), vec![id.clone()]);
    // 持久化后的刷新与请求结束各清除一次等待提示
    assert_eq!(env.signals.count(&Signal::ClearWaiting), 2);
    let events = env.signals.events();
    let refresh_at = events
        .iter()
        .position(|e| *e == Signal::Refresh(id.clone()))
        .unwrap();
    assert_eq!(events[refresh_at + 1], Signal::ClearWaiting);
    assert_eq!(env.signals.count(&Signal::EndWork), 1);
    assert!(env.signals.notifications().is_empty());

    println!("✅ Segment request test passed");
}

#[tokio::test]
async fn test_segment_request_reports_failures_immediately() {
    let env = TestEnvironment::with_config(
        fast_config(),
        vec![
            boxed(MockEngine::failing("Engine A", "boom")),
            boxed(MockEngine::failing("Engine B", "HTTP status 429")),
        ],
        service_with_segment(),
    );

    let outcome = env.orchestrator.translate_segment(request()).await.unwrap();
    assert!(outcome.all_failed());

    let notifications = env.signals.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications[0].headline.as_deref(),
        Some("Segment f/u/s was not translated.")
    );
    assert!(notifications[0].summary.contains("Detected 3 error(s)"));

    // 单段请求不占用批量运行的记录器
    assert!(env.orchestrator.recorder().is_empty());
    assert_eq!(env.orchestrator.active_project(), None);

    println!("✅ Segment failure notification test passed");
}

#[tokio::test]
async fn test_missing_segment_surfaces_service_error() {
    let env = TestEnvironment::new(vec![boxed(MockEngine::succeeding("Engine A"))]);

    let result = env.orchestrator.translate_segment(request()).await;

    assert!(matches!(result, Err(TranslationError::ServiceError(_))));
    assert_eq!(env.signals.errors().len(), 1);
    assert_eq!(env.signals.count(&Signal::ClearWaiting), 1);
    assert_eq!(env.signals.count(&Signal::EndWork), 1);
    assert_eq!(env.service.set_matches_calls(), 0);

    println!("✅ Missing segment test passed");
}

#[tokio::test]
async fn test_fix_match_tags_writes_target() {
    let env = TestEnvironment::with_config(
        fast_config(),
        vec![
            boxed(MockEngine::succeeding("Plain")),
            boxed(MockEngine::succeeding("Fixer").fixing_tags()),
        ],
        service_with_segment(),
    );
    env.orchestrator
        .set_visible_segment(Some(SegmentId::new("f", "u", "s")));

    let fixed = env
        .orchestrator
        .fix_match_tags(request(), "按 OK")
        .await
        .unwrap();

    assert_eq!(fixed, "按 OK<ph id=\"fixed\"/>");
    let targets = env.service.targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].target, fixed);
    assert_eq!(env.signals.refreshed(), vec![SegmentId::new("f", "u", "s")]);
    assert_eq!(env.signals.count(&Signal::ClearWaiting), 1);
    assert_eq!(env.signals.count(&Signal::EndWork), 1);

    println!("✅ Fix match tags test passed");
}

#[tokio::test]
async fn test_fix_match_tags_without_capable_engine() {
    let env = TestEnvironment::with_config(
        fast_config(),
        vec![boxed(MockEngine::succeeding("Plain"))],
        service_with_segment(),
    );

    let result = env.orchestrator.fix_match_tags(request(), "按 OK").await;

    assert!(matches!(result, Err(TranslationError::Unsupported(_))));
    assert!(env.service.targets().is_empty());
    assert_eq!(env.signals.errors().len(), 1);

    println!("✅ Missing fixer test passed");
}

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// tests/pipeline.rs - 批量分析流程测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{FALLBACK, FakeTransport, PRIMARY, Reply, gateway_config, image_files};
use solscan::{
  model::{ClassificationLabel, NotificationKind, RecordStatus},
  network::NetworkGateway,
  pipeline::{
    NO_DEFECT_MESSAGE, NOT_SOLAR_MESSAGE, NOT_THERMAL_MESSAGE, Pipeline, PipelineConfig,
    PipelineError,
  },
  store::{MemoryFeed, MemoryStore},
};

type TestPipeline = Pipeline<FakeTransport, Arc<MemoryStore>, Arc<MemoryStore>, Arc<MemoryFeed>>;

struct Harness {
  pipeline: TestPipeline,
  store: Arc<MemoryStore>,
  feed: Arc<MemoryFeed>,
  dir: tempfile::TempDir,
}

fn harness_with(transport: FakeTransport, store: MemoryStore, with_fallback: bool) -> Harness {
  let store = Arc::new(store);
  let feed = Arc::new(MemoryFeed::new());
  let gateway = NetworkGateway::new(transport, gateway_config(with_fallback));
  let pipeline = Pipeline::new(gateway, Arc::clone(&store), Arc::clone(&store), Arc::clone(&feed));
  Harness {
    pipeline,
    store,
    feed,
    dir: tempfile::tempdir().unwrap(),
  }
}

fn harness(transport: FakeTransport) -> Harness {
  harness_with(transport, MemoryStore::new(), false)
}

#[tokio::test]
async fn not_solar_image_is_skipped() {
  let h = harness(FakeTransport::new().classify_label("roof.jpg", "not_solar"));
  let images = image_files(h.dir.path(), &["roof.jpg"]);

  let output = h.pipeline.run(images, "inspector").await.unwrap();

  assert_eq!(output.analysis_results.len(), 1);
  let result = &output.analysis_results[0];
  assert!(result.analysis.skip);
  assert!(result.records.is_empty());
  assert_eq!(
    result.analysis.classification.as_ref().map(|c| c.label),
    Some(ClassificationLabel::NotSolar)
  );

  let notifications = h.feed.all();
  assert_eq!(notifications.len(), 1);
  assert_eq!(notifications[0].kind, NotificationKind::Warning);
  assert_eq!(notifications[0].message, NOT_SOLAR_MESSAGE);

  assert!(h.pipeline.gateway().transport().calls_to("/detect/").is_empty());
  assert!(h.store.saved_records().is_empty());
  assert_eq!(output.primary_notification_id, None);
}

#[tokio::test]
async fn not_thermal_image_uses_its_own_message() {
  let h = harness(FakeTransport::new().classify_label("photo.jpg", "Not-Thermal"));
  let images = image_files(h.dir.path(), &["photo.jpg"]);

  let output = h.pipeline.run(images, "inspector").await.unwrap();

  assert!(output.analysis_results[0].analysis.skip);
  assert_eq!(h.feed.all()[0].message, NOT_THERMAL_MESSAGE);
}

#[tokio::test]
async fn detections_are_grouped_per_class() {
  let h = harness(FakeTransport::new().detect_classes(
    "panel.jpg",
    &["single-cell", "single-cell", "substring"],
  ));
  let images = image_files(h.dir.path(), &["panel.jpg"]);

  let output = h.pipeline.run(images, "inspector").await.unwrap();

  let result = &output.analysis_results[0];
  assert!(!result.analysis.skip);
  assert_eq!(result.analysis.detections.len(), 3);

  let records = &result.records;
  assert_eq!(records.len(), 2);
  assert_eq!(records[0].defect_class, "single-cell");
  assert_eq!(records[0].all_detections.len(), 2);
  assert_eq!(records[1].defect_class, "substring");
  assert_eq!(records[1].all_detections.len(), 1);
  assert!(records.iter().all(|r| r.persisted_id.is_some()));
  assert!(records.iter().all(|r| r.image_url.starts_with("memory://assets/")));

  assert_eq!(h.store.saved_records().len(), 2);
  assert_eq!(output.primary_notification_id, records[0].persisted_id);

  let detected: Vec<_> = h
    .feed
    .all()
    .into_iter()
    .filter(|n| n.kind == NotificationKind::Detected)
    .collect();
  assert_eq!(detected.len(), 2);
  assert!(
    detected
      .iter()
      .all(|n| records.iter().any(|r| r.persisted_id.as_deref() == Some(n.id.as_str())))
  );
}

#[tokio::test]
async fn primary_detect_timeout_falls_back_once() {
  let transport = FakeTransport::new()
    .detect_classes("panel.jpg", &["dust-deposit", "short-circuit"])
    .hang_detect_on(PRIMARY);
  let h = harness_with(transport, MemoryStore::new(), true);
  let images = image_files(h.dir.path(), &["panel.jpg"]);

  let output = h.pipeline.run(images, "inspector").await.unwrap();

  let result = &output.analysis_results[0];
  assert!(result.analysis.failure.is_none());
  assert_eq!(result.analysis.detections.len(), 2);
  assert_eq!(result.records.len(), 2);
  assert_eq!(h.store.saved_records().len(), 2);

  let transport = h.pipeline.gateway().transport();
  assert_eq!(transport.calls_to("primary.test:8000/detect/").len(), 1);
  assert_eq!(transport.calls_to("fallback.test:8000/detect/").len(), 1);
  assert!(transport.calls_to(&format!("{}/classify/", FALLBACK)).is_empty());
}

#[tokio::test]
async fn empty_detections_give_hidden_info() {
  let h = harness(FakeTransport::new());
  let images = image_files(h.dir.path(), &["clean.jpg"]);

  let output = h.pipeline.run(images, "inspector").await.unwrap();

  let result = &output.analysis_results[0];
  assert!(!result.analysis.skip);
  assert!(result.analysis.detections.is_empty());
  assert_eq!(result.records.len(), 1);
  assert!(result.records[0].is_no_defect());
  assert_eq!(
    result.records[0].primary_detection.description,
    NO_DEFECT_MESSAGE
  );

  let notifications = h.feed.all();
  assert_eq!(notifications.len(), 1);
  assert_eq!(notifications[0].kind, NotificationKind::Info);
  assert_eq!(notifications[0].message, NO_DEFECT_MESSAGE);
  assert!(h.feed.default_feed().is_empty());

  assert!(h.store.saved_records().is_empty());
  assert_eq!(output.primary_notification_id, None);
}

#[tokio::test]
async fn failing_detect_on_both_endpoints_becomes_network_error() {
  let transport = FakeTransport::new().detect("panel.jpg", Reply::Status(500));
  let h = harness_with(transport, MemoryStore::new(), true);
  let images = image_files(h.dir.path(), &["panel.jpg"]);

  let output = h.pipeline.run(images, "inspector").await.unwrap();

  let result = &output.analysis_results[0];
  assert!(result.analysis.is_failed());
  assert!(result.analysis.classification.is_some());
  assert_eq!(result.records.len(), 1);
  assert!(result.records[0].is_network_error());
  assert_eq!(result.records[0].persisted_id, None);
  assert_eq!(h.pipeline.gateway().transport().calls_to("/detect/").len(), 2);

  assert_eq!(h.feed.all()[0].kind, NotificationKind::Warning);
  assert!(h.store.saved_records().is_empty());
}

#[tokio::test]
async fn classify_failure_only_affects_its_image() {
  let transport = FakeTransport::new()
    .detect_classes("a.jpg", &["dust-deposit"])
    .classify("b.jpg", Reply::Status(500))
    .detect_classes("c.jpg", &["partial-shading"]);
  let h = harness(transport);
  let images = image_files(h.dir.path(), &["a.jpg", "b.jpg", "c.jpg"]);

  let output = h.pipeline.run(images, "inspector").await.unwrap();

  let names: Vec<&str> = output
    .analysis_results
    .iter()
    .map(|r| r.analysis.input.display_name.as_str())
    .collect();
  assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);

  let [a, b, c] = &output.analysis_results[..] else {
    panic!("expected three results");
  };
  assert_eq!(a.records[0].defect_class, "dust-deposit");
  assert!(b.analysis.is_failed());
  assert!(b.analysis.classification.is_none());
  assert!(b.records[0].is_network_error());
  assert_eq!(c.records[0].defect_class, "partial-shading");

  // 分类失败的图像不会进入检测
  let detect_files: Vec<Option<String>> = h
    .pipeline
    .gateway()
    .transport()
    .calls_to("/detect/")
    .into_iter()
    .map(|call| call.file_name)
    .collect();
  assert_eq!(detect_files.len(), 2);
  assert!(!detect_files.contains(&Some("b.jpg".to_string())));

  assert_eq!(output.primary_notification_id, a.records[0].persisted_id);
}

#[tokio::test]
async fn upload_failure_aborts_the_batch() {
  let store = MemoryStore::new().fail_upload_of("b.jpg");
  let h = harness_with(FakeTransport::new(), store, false);
  let images = image_files(h.dir.path(), &["a.jpg", "b.jpg"]);

  let err = h.pipeline.run(images, "inspector").await.unwrap_err();

  assert!(matches!(err, PipelineError::Upload(_)));
  assert!(h.pipeline.gateway().transport().calls().is_empty());
  assert!(h.feed.all().is_empty());
}

#[tokio::test]
async fn batch_size_is_checked() {
  let h = harness(FakeTransport::new());

  let err = h.pipeline.run(Vec::new(), "inspector").await.unwrap_err();
  assert!(matches!(err, PipelineError::NoImages));

  let names = ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg", "6.jpg"];
  let images = image_files(h.dir.path(), &names);
  let err = h.pipeline.run(images.clone(), "inspector").await.unwrap_err();
  assert!(matches!(
    err,
    PipelineError::TooManyImages { count: 6, limit: 5 }
  ));
  assert!(h.store.uploads().is_empty());

  let unlimited = harness(FakeTransport::new());
  let pipeline = unlimited.pipeline.with_config(PipelineConfig {
    max_images: None,
    ..PipelineConfig::default()
  });
  let output = pipeline.run(images, "inspector").await.unwrap();
  assert_eq!(output.analysis_results.len(), 6);
}

#[tokio::test]
async fn persistence_failure_keeps_the_record() {
  let transport = FakeTransport::new().detect_classes("panel.jpg", &["short-circuit", "substring"]);
  let store = MemoryStore::new().fail_save_of("short-circuit");
  let h = harness_with(transport, store, false);
  let images = image_files(h.dir.path(), &["panel.jpg"]);

  let output = h.pipeline.run(images, "inspector").await.unwrap();

  let records = &output.analysis_results[0].records;
  assert_eq!(records.len(), 2);
  assert_eq!(records[0].persisted_id, None);
  assert!(records[1].persisted_id.is_some());
  assert_eq!(h.store.saved_records().len(), 1);
  assert_eq!(output.primary_notification_id, records[1].persisted_id);
}

#[tokio::test]
async fn records_resolve_once() {
  let h = harness(FakeTransport::new().detect_classes("panel.jpg", &["dust-deposit"]));
  let images = image_files(h.dir.path(), &["panel.jpg"]);
  let output = h.pipeline.run(images, "inspector").await.unwrap();
  let mut record = output.analysis_results[0].records[0].clone();

  h.pipeline.resolve(&mut record, RecordStatus::Resolved).unwrap();
  assert_eq!(record.status, RecordStatus::Resolved);
  let latest = &h.feed.all()[0];
  assert_eq!(latest.kind, NotificationKind::Resolved);
  assert_eq!(latest.related_record, record.persisted_id);

  let err = h
    .pipeline
    .resolve(&mut record, RecordStatus::Unresolved)
    .unwrap_err();
  assert!(matches!(err, PipelineError::Record(_)));
}

#[tokio::test]
async fn local_precheck_overrides_flat_matrix() {
  let flat = vec![30.0; 768];
  let transport = FakeTransport::new().classify(
    "frame.png",
    Reply::Json(json!({ "label": "solar", "thermal_data": flat })),
  );
  let h = harness(transport);
  let pipeline = h.pipeline.with_config(PipelineConfig {
    local_precheck: true,
    ..PipelineConfig::default()
  });
  let images = image_files(h.dir.path(), &["frame.png"]);

  let output = pipeline.run(images, "inspector").await.unwrap();

  let result = &output.analysis_results[0];
  assert!(result.analysis.skip);
  assert_eq!(
    result.analysis.classification.as_ref().map(|c| c.label),
    Some(ClassificationLabel::NotSolar)
  );
  assert!(pipeline.gateway().transport().calls_to("/detect/").is_empty());
}

#[tokio::test]
async fn history_is_newest_first() {
  let transport = FakeTransport::new()
    .detect_classes("a.jpg", &["dust-deposit"])
    .detect_classes("b.jpg", &["substring"]);
  let h = harness(transport);

  let first = image_files(h.dir.path(), &["a.jpg"]);
  h.pipeline.run(first, "inspector").await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = image_files(h.dir.path(), &["b.jpg"]);
  h.pipeline.run(second, "inspector").await.unwrap();

  let history = h.pipeline.history("inspector").await.unwrap();
  let classes: Vec<&str> = history.iter().map(|r| r.defect_class.as_str()).collect();
  assert_eq!(classes, vec!["substring", "dust-deposit"]);

  assert!(h.pipeline.history("someone-else").await.unwrap().is_empty());
  assert!(h.pipeline.history("  ").await.is_err());
}

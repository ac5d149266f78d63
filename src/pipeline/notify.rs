// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/pipeline/notify.rs - 通知构造
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

use chrono::Utc;

use crate::model::{
  ClassificationLabel, DefectRecord, Notification, NotificationKind, RecordStatus, catalog,
  unique_id,
};

pub const NOT_SOLAR_MESSAGE: &str = "No solar panel detected.";
pub const NOT_THERMAL_MESSAGE: &str = "The image is not a thermal scan.";
pub const NO_DEFECT_MESSAGE: &str = "No defects detected on this solar panel";
pub const NETWORK_REMEDIATION: &str =
  "Check the server address and your connection, then try again.";

pub fn skip_message(label: ClassificationLabel) -> &'static str {
  match label {
    ClassificationLabel::NotThermal => NOT_THERMAL_MESSAGE,
    _ => NOT_SOLAR_MESSAGE,
  }
}

fn notification(
  id: String,
  kind: NotificationKind,
  title: String,
  message: String,
) -> Notification {
  Notification {
    id,
    kind,
    priority: None,
    timestamp: Utc::now(),
    title,
    message,
    related_record: None,
    in_default_feed: true,
  }
}

/// 已持久化的缺陷，通知 ID 与文档 ID 相同
pub fn detected(persisted_id: &str, record: &DefectRecord) -> Notification {
  let name = catalog::display_name(&record.defect_class);
  Notification {
    priority: record.primary_detection.priority_level(),
    related_record: Some(persisted_id.to_string()),
    ..notification(
      persisted_id.to_string(),
      NotificationKind::Detected,
      format!("{} detected", name),
      format!(
        "{} found in {} ({} detection(s))",
        name,
        record.source_image,
        record.all_detections.len()
      ),
    )
  }
}

pub fn skipped(source_image: &str, label: ClassificationLabel) -> Notification {
  notification(
    unique_id(),
    NotificationKind::Warning,
    format!("{} skipped", source_image),
    skip_message(label).to_string(),
  )
}

/// 不出现在默认列表中
pub fn no_defect(record: &DefectRecord) -> Notification {
  Notification {
    related_record: Some(record.id.clone()),
    in_default_feed: false,
    ..notification(
      unique_id(),
      NotificationKind::Info,
      format!("{} is clean", record.source_image),
      NO_DEFECT_MESSAGE.to_string(),
    )
  }
}

pub fn network_failure(source_image: &str, reason: &str) -> Notification {
  notification(
    unique_id(),
    NotificationKind::Warning,
    format!("Analysis failed for {}", source_image),
    format!("{} {}", reason, NETWORK_REMEDIATION),
  )
}

pub fn status_changed(record: &DefectRecord) -> Notification {
  let kind = match record.status {
    RecordStatus::Resolved => NotificationKind::Resolved,
    _ => NotificationKind::Unresolved,
  };
  let name = catalog::display_name(&record.defect_class);
  Notification {
    priority: record.primary_detection.priority_level(),
    related_record: Some(
      record
        .persisted_id
        .clone()
        .unwrap_or_else(|| record.id.clone()),
    ),
    ..notification(
      unique_id(),
      kind,
      format!("{} {:?}", name, record.status),
      format!("{} on {} marked {:?}", name, record.source_image, record.status),
    )
  }
}

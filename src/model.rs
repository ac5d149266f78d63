// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/model.rs - 数据模型
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

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 网络失败时用于展示的伪检测类别
pub const NETWORK_ERROR_CLASS: &str = "Network Error";
/// 未发现缺陷时的合成记录类别
pub const NO_DEFECT_CLASS: &str = "No Defect";

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

static ID_COUNTER: AtomicU32 = AtomicU32::new(0);

/// 生成进程内唯一的标识符（时间戳 + 计数器）
pub fn unique_id() -> String {
  let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
  format!("{:x}{:04x}", Utc::now().timestamp_micros(), counter)
}

/// 用户选择的待分析图像
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImageInput {
  pub local_path: PathBuf,
  pub display_name: String,
  pub mime_type: String,
  pub byte_size: u64,
}

impl RawImageInput {
  pub fn new(
    local_path: impl Into<PathBuf>,
    display_name: impl Into<String>,
    mime_type: impl Into<String>,
    byte_size: u64,
  ) -> Self {
    Self {
      local_path: local_path.into(),
      display_name: display_name.into(),
      mime_type: mime_type.into(),
      byte_size,
    }
  }

  /// 从本地文件构造，文件名作为显示名称，MIME 类型由扩展名推断
  pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)?;
    let display_name = path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());

    Ok(Self::new(
      path,
      display_name,
      mime_type_for(path),
      metadata.len(),
    ))
  }

  /// 图像来源标识，供 URI 关键字回退使用
  pub fn source_uri(&self) -> String {
    let absolute = std::path::absolute(&self.local_path).unwrap_or_else(|_| self.local_path.clone());
    url::Url::from_file_path(&absolute)
      .map(|url| url.to_string())
      .unwrap_or_else(|_| self.local_path.display().to_string())
  }
}

fn mime_type_for(path: &Path) -> &'static str {
  let extension = path
    .extension()
    .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
  match extension.as_deref() {
    Some("png") => "image/png",
    Some("jpg") | Some("jpeg") => "image/jpeg",
    Some("bmp") => "image/bmp",
    Some("webp") => "image/webp",
    _ => DEFAULT_MIME_TYPE,
  }
}

/// 存储服务返回的资源，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
  pub storage_id: String,
  pub asset_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationLabel {
  Solar,
  NotSolar,
  NotThermal,
}

impl ClassificationLabel {
  /// 宽松解析服务端标签，忽略大小写以及 `-`、`_`、空格的差异
  pub fn parse(text: &str) -> Option<Self> {
    let normalized: String = text
      .trim()
      .chars()
      .filter(|c| !matches!(c, '-' | '_' | ' '))
      .flat_map(char::to_lowercase)
      .collect();

    match normalized.as_str() {
      "solar" | "solarpanel" | "panel" | "pv" => Some(Self::Solar),
      "notsolar" | "nonsolar" | "nosolar" | "nosolarpanel" => Some(Self::NotSolar),
      "notthermal" | "nonthermal" | "nothermal" => Some(Self::NotThermal),
      _ => None,
    }
  }

  pub fn is_skip(&self) -> bool {
    !matches!(self, Self::Solar)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationOutcome {
  pub label: ClassificationLabel,
  pub raw_response: Value,
}

/// 检测服务返回的单个缺陷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
  #[serde(rename = "bbox", default)]
  pub bounding_box: [f32; 4], // [x_min, y_min, x_max, y_max]
  #[serde(rename = "class")]
  pub defect_class: String,
  #[serde(default)]
  pub confidence: f32,
  #[serde(rename = "priority", default)]
  pub priority_raw: String,
  #[serde(default)]
  pub stress_factors: Vec<String>,
  #[serde(default)]
  pub power_loss: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub recommendations: Vec<String>,
}

impl Detection {
  pub fn new(defect_class: impl Into<String>) -> Self {
    Self {
      bounding_box: [0.0; 4],
      defect_class: defect_class.into(),
      confidence: 0.0,
      priority_raw: String::new(),
      stress_factors: Vec::new(),
      power_loss: String::new(),
      category: String::new(),
      description: String::new(),
      recommendations: Vec::new(),
    }
  }

  /// 网络失败的伪检测，携带补救提示
  pub fn network_error(reason: impl Into<String>) -> Self {
    Self {
      priority_raw: "N/A".to_string(),
      category: "Network".to_string(),
      description: reason.into(),
      recommendations: vec![
        "Check the analysis server address in settings".to_string(),
        "Make sure the analysis server is running and reachable".to_string(),
        "Retry the analysis".to_string(),
      ],
      ..Self::new(NETWORK_ERROR_CLASS)
    }
  }

  pub fn no_defect() -> Self {
    Self {
      priority_raw: "N/A".to_string(),
      description: "No defects detected on this solar panel".to_string(),
      ..Self::new(NO_DEFECT_CLASS)
    }
  }

  pub fn priority_level(&self) -> Option<u8> {
    priority_level(&self.priority_raw)
  }
}

/// 解析优先级文本：优先取开头的数字，否则按 High/Medium/Low 映射
pub fn priority_level(raw: &str) -> Option<u8> {
  let raw = raw.trim();
  let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
  if !digits.is_empty() {
    return digits.parse().ok();
  }

  let lower = raw.to_ascii_lowercase();
  if lower.starts_with("critical") || lower.starts_with("high") {
    Some(1)
  } else if lower.starts_with("medium") {
    Some(2)
  } else if lower.starts_with("low") {
    Some(3)
  } else {
    None
  }
}

/// 单张图像的分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerImageAnalysis {
  pub input: RawImageInput,
  pub uploaded_asset: UploadedAsset,
  pub classification: Option<ClassificationOutcome>,
  pub detections: Vec<Detection>,
  pub skip: bool,
  /// 网络或读取失败原因，存在时该图像为硬失败
  pub failure: Option<String>,
}

impl PerImageAnalysis {
  pub fn is_failed(&self) -> bool {
    self.failure.is_some()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
  Pending,
  Resolved,
  Unresolved,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
  #[error("不允许的状态转换: {from:?} -> {to:?}")]
  InvalidTransition { from: RecordStatus, to: RecordStatus },
}

/// 面向用户的缺陷记录，每个 (图像, 缺陷类别) 对应一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectRecord {
  pub id: String,
  pub source_image: String,
  pub image_url: String,
  pub defect_class: String,
  pub priority: String,
  pub primary_detection: Detection,
  pub all_detections: Vec<Detection>,
  pub persisted_id: Option<String>,
  pub status: RecordStatus,
  pub created_at: DateTime<Utc>,
}

impl DefectRecord {
  /// 由同一类别的检测列表构造记录，列表为空时返回 `None`
  pub fn from_group(
    source_image: impl Into<String>,
    image_url: impl Into<String>,
    detections: Vec<Detection>,
  ) -> Option<Self> {
    let primary_detection = detections.first()?.clone();
    Some(Self {
      id: unique_id(),
      source_image: source_image.into(),
      image_url: image_url.into(),
      defect_class: primary_detection.defect_class.clone(),
      priority: primary_detection.priority_raw.clone(),
      primary_detection,
      all_detections: detections,
      persisted_id: None,
      status: RecordStatus::Pending,
      created_at: Utc::now(),
    })
  }

  pub fn is_no_defect(&self) -> bool {
    self.defect_class == NO_DEFECT_CLASS
  }

  pub fn is_network_error(&self) -> bool {
    self.defect_class == NETWORK_ERROR_CLASS
  }

  /// 仅待处理的记录可以转为已解决或未解决
  pub fn transition(&mut self, to: RecordStatus) -> Result<(), RecordError> {
    match (self.status, to) {
      (RecordStatus::Pending, RecordStatus::Resolved | RecordStatus::Unresolved) => {
        self.status = to;
        Ok(())
      }
      (from, to) => Err(RecordError::InvalidTransition { from, to }),
    }
  }

  pub fn attach_persisted_id(&mut self, id: impl Into<String>) {
    self.persisted_id = Some(id.into());
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
  Detected,
  Info,
  Warning,
  Resolved,
  Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: String,
  pub kind: NotificationKind,
  pub priority: Option<u8>,
  pub timestamp: DateTime<Utc>,
  pub title: String,
  pub message: String,
  pub related_record: Option<String>,
  /// 为 `false` 时不出现在默认通知列表中
  pub in_default_feed: bool,
}

pub mod catalog;

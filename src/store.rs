// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/store.rs - 存储、持久化与通知
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

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{DefectRecord, Notification, RawImageInput, RecordStatus, UploadedAsset};

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("参数无效: {0}")]
  InvalidArgument(String),
  #[error("存储服务拒绝请求: {0}")]
  Rejected(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerdeError(#[from] serde_json::Error),
}

/// 持久化后返回的文档标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDefect {
  pub id: String,
  pub status: RecordStatus,
}

pub trait Storage: Send + Sync + 'static {
  fn upload(
    &self,
    input: &RawImageInput,
  ) -> impl Future<Output = Result<UploadedAsset, StoreError>> + Send;
}

pub trait Persistence: Send + Sync + 'static {
  fn save_defect(
    &self,
    user_id: &str,
    record: &DefectRecord,
  ) -> impl Future<Output = Result<SavedDefect, StoreError>> + Send;

  /// 按创建时间从新到旧返回
  fn fetch_history(
    &self,
    user_id: &str,
  ) -> impl Future<Output = Result<Vec<DefectRecord>, StoreError>> + Send;
}

/// 通知投递，不关心结果
pub trait NotificationSink: Send + Sync + 'static {
  fn add(&self, notification: Notification);
}

impl<T: Storage> Storage for Arc<T> {
  fn upload(
    &self,
    input: &RawImageInput,
  ) -> impl Future<Output = Result<UploadedAsset, StoreError>> + Send {
    (**self).upload(input)
  }
}

impl<T: Persistence> Persistence for Arc<T> {
  fn save_defect(
    &self,
    user_id: &str,
    record: &DefectRecord,
  ) -> impl Future<Output = Result<SavedDefect, StoreError>> + Send {
    (**self).save_defect(user_id, record)
  }

  fn fetch_history(
    &self,
    user_id: &str,
  ) -> impl Future<Output = Result<Vec<DefectRecord>, StoreError>> + Send {
    (**self).fetch_history(user_id)
  }
}

impl<T: NotificationSink> NotificationSink for Arc<T> {
  fn add(&self, notification: Notification) {
    (**self).add(notification)
  }
}

pub(crate) fn require_user(user_id: &str) -> Result<(), StoreError> {
  if user_id.trim().is_empty() {
    return Err(StoreError::InvalidArgument("缺少用户 ID".to_string()));
  }
  Ok(())
}

mod feed;
mod folder;
mod memory;

pub use self::feed::{MemoryFeed, TracingFeed};
pub use self::folder::{DefectDocument, FolderStore};
pub use self::memory::MemoryStore;

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/store/memory.rs - 内存存储
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

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::{
  model::{DefectRecord, RawImageInput, UploadedAsset, unique_id},
  store::{Persistence, SavedDefect, Storage, StoreError, require_user},
};

#[derive(Default)]
struct Inner {
  uploads: Vec<(RawImageInput, UploadedAsset)>,
  records: Vec<(String, DefectRecord)>,
  fail_uploads: HashSet<String>,
  fail_classes: HashSet<String>,
}

/// 进程内的存储与持久化实现，可注入失败
#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// 上传显示名为 `display_name` 的图像时失败
  pub fn fail_upload_of(self, display_name: impl Into<String>) -> Self {
    self.lock().fail_uploads.insert(display_name.into());
    self
  }

  /// 保存该类别的记录时失败
  pub fn fail_save_of(self, defect_class: impl Into<String>) -> Self {
    self.lock().fail_classes.insert(defect_class.into());
    self
  }

  pub fn uploads(&self) -> Vec<UploadedAsset> {
    self.lock().uploads.iter().map(|(_, asset)| asset.clone()).collect()
  }

  pub fn saved_records(&self) -> Vec<DefectRecord> {
    self.lock().records.iter().map(|(_, record)| record.clone()).collect()
  }
}

impl Storage for MemoryStore {
  async fn upload(&self, input: &RawImageInput) -> Result<UploadedAsset, StoreError> {
    let mut inner = self.lock();
    if inner.fail_uploads.contains(&input.display_name) {
      return Err(StoreError::Rejected(format!("上传 {} 失败", input.display_name)));
    }

    let storage_id = unique_id();
    let asset = UploadedAsset {
      asset_url: format!("memory://assets/{}", storage_id),
      storage_id,
    };
    inner.uploads.push((input.clone(), asset.clone()));
    debug!("内存存储上传 {} -> {}", input.display_name, asset.storage_id);
    Ok(asset)
  }
}

impl Persistence for MemoryStore {
  async fn save_defect(
    &self,
    user_id: &str,
    record: &DefectRecord,
  ) -> Result<SavedDefect, StoreError> {
    require_user(user_id)?;
    let mut inner = self.lock();
    if inner.fail_classes.contains(&record.defect_class) {
      return Err(StoreError::Rejected(format!(
        "保存 {} 失败",
        record.defect_class
      )));
    }

    let id = unique_id();
    let mut stored = record.clone();
    stored.attach_persisted_id(id.clone());
    inner.records.push((user_id.to_string(), stored));

    Ok(SavedDefect {
      id,
      status: record.status,
    })
  }

  async fn fetch_history(&self, user_id: &str) -> Result<Vec<DefectRecord>, StoreError> {
    require_user(user_id)?;
    let mut history: Vec<DefectRecord> = self
      .lock()
      .records
      .iter()
      .rev()
      .filter(|(owner, _)| owner == user_id)
      .map(|(_, record)| record.clone())
      .collect();
    history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(history)
  }
}

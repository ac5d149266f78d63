// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/store/folder.rs - 目录存储
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

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{DefectRecord, RawImageInput, UploadedAsset, unique_id},
  store::{Persistence, SavedDefect, Storage, StoreError, require_user},
};

const ASSETS_DIR: &str = "assets";
const RECORDS_DIR: &str = "records";
/// 文件名冲突时重新生成标识符的次数上限
const MAX_NAME_ATTEMPTS: usize = 8;

/// 落盘的缺陷文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectDocument {
  pub id: String,
  pub user_id: String,
  pub file_name: String,
  pub image_url: String,
  pub defect_class: String,
  pub priority: String,
  pub description: String,
  pub created_at: DateTime<Utc>,
  pub record: DefectRecord,
}

impl DefectDocument {
  fn new(id: String, user_id: &str, record: &DefectRecord) -> Self {
    let mut record = record.clone();
    record.attach_persisted_id(id.clone());
    Self {
      user_id: user_id.to_string(),
      file_name: record.source_image.clone(),
      image_url: record.image_url.clone(),
      defect_class: record.defect_class.clone(),
      priority: record.priority.clone(),
      description: record.primary_detection.description.clone(),
      created_at: record.created_at,
      id,
      record,
    }
  }
}

/// 以 `folder:///path` 指定根目录：
/// 图像复制到 `assets/`，记录按日期写入 `records/YYYY/MM/DD/HH-MM-SS-<id>.json`。
/// 记录文件只新建不覆盖，多个实例共享同一目录时互不干扰。
pub struct FolderStore {
  directory: PathBuf,
}

impl FromUrlWithScheme for FolderStore {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for FolderStore {
  type Error = StoreError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(StoreError::SchemeMismatch);
    }

    let path = urlencoding::decode(url.path())
      .map(|p| p.into_owned())
      .unwrap_or_else(|_| url.path().to_string());
    Ok(Self::new(path))
  }
}

impl FolderStore {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn record_dir(&self, created_at: &DateTime<Utc>) -> PathBuf {
    self
      .directory
      .join(RECORDS_DIR)
      .join(created_at.year().to_string())
      .join(format!("{:02}", created_at.month()))
      .join(format!("{:02}", created_at.day()))
  }

  fn record_file_name(created_at: &DateTime<Utc>, id: &str) -> String {
    format!("{}-{}.json", created_at.format("%H-%M-%S"), id)
  }

  /// 以独占方式新建记录文件；同名文件已存在时换一个标识符重试
  async fn write_document(
    &self,
    user_id: &str,
    record: &DefectRecord,
  ) -> Result<(DefectDocument, PathBuf), StoreError> {
    let directory = self.record_dir(&record.created_at);
    tokio::fs::create_dir_all(&directory).await?;

    let mut attempt = 0;
    loop {
      attempt += 1;
      let document = DefectDocument::new(unique_id(), user_id, record);
      let path = directory.join(Self::record_file_name(&document.created_at, &document.id));
      let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await;

      match file {
        Ok(mut file) => {
          file.write_all(&serde_json::to_vec_pretty(&document)?).await?;
          file.flush().await?;
          return Ok((document, path));
        }
        Err(err)
          if err.kind() == std::io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS =>
        {
          debug!("记录文件 {} 已存在，重新生成标识符", path.display());
        }
        Err(err) => return Err(err.into()),
      }
    }
  }

  async fn read_document(path: &Path) -> Option<DefectDocument> {
    let text = match tokio::fs::read_to_string(path).await {
      Ok(text) => text,
      Err(err) => {
        warn!("无法读取记录 {}: {}", path.display(), err);
        return None;
      }
    };
    match serde_json::from_str(&text) {
      Ok(document) => Some(document),
      Err(err) => {
        warn!("跳过无法解析的记录 {}: {}", path.display(), err);
        None
      }
    }
  }

  /// 读取全部记录文档
  pub async fn documents(&self) -> Result<Vec<DefectDocument>, StoreError> {
    let root = self.directory.join(RECORDS_DIR);
    if !tokio::fs::try_exists(&root).await? {
      return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    let mut pending = vec![root];
    while let Some(directory) = pending.pop() {
      let mut entries = tokio::fs::read_dir(&directory).await?;
      while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
          pending.push(path);
        } else if path.extension().is_some_and(|ext| ext == "json")
          && let Some(document) = Self::read_document(&path).await
        {
          documents.push(document);
        }
      }
    }
    Ok(documents)
  }
}

impl Storage for FolderStore {
  async fn upload(&self, input: &RawImageInput) -> Result<UploadedAsset, StoreError> {
    let assets = self.directory.join(ASSETS_DIR);
    tokio::fs::create_dir_all(&assets).await?;

    let storage_id = unique_id();
    let file_name = match input.local_path.extension() {
      Some(ext) => format!("{}.{}", storage_id, ext.to_string_lossy()),
      None => storage_id.clone(),
    };
    let target = assets.join(file_name);
    tokio::fs::copy(&input.local_path, &target).await?;

    let absolute = std::path::absolute(&target)?;
    let asset_url = url::Url::from_file_path(&absolute)
      .map(|url| url.to_string())
      .unwrap_or_else(|_| absolute.display().to_string());
    debug!("上传 {} -> {}", input.display_name, target.display());

    Ok(UploadedAsset {
      storage_id,
      asset_url,
    })
  }
}

impl Persistence for FolderStore {
  async fn save_defect(
    &self,
    user_id: &str,
    record: &DefectRecord,
  ) -> Result<SavedDefect, StoreError> {
    require_user(user_id)?;

    let (document, path) = self.write_document(user_id, record).await?;
    info!("保存缺陷记录 {} 到 {}", document.id, path.display());

    Ok(SavedDefect {
      id: document.id,
      status: record.status,
    })
  }

  async fn fetch_history(&self, user_id: &str) -> Result<Vec<DefectRecord>, StoreError> {
    require_user(user_id)?;

    let mut documents: Vec<DefectDocument> = self
      .documents()
      .await?
      .into_iter()
      .filter(|document| document.user_id == user_id)
      .collect();
    documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

    Ok(documents.into_iter().map(|document| document.record).collect())
  }
}

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/pipeline.rs - 批量分析流程
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

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::{
  model::{
    ClassificationLabel, ClassificationOutcome, DefectRecord, Detection, PerImageAnalysis,
    RawImageInput, RecordError, RecordStatus, UploadedAsset,
  },
  network::{EndpointRole, MultipartImage, NetworkGateway, Transport},
  store::{NotificationSink, Persistence, Storage, StoreError},
  thermal::SolarPanelClassifier,
};

/// 单批次允许的图像数量
pub const DEFAULT_MAX_IMAGES: usize = 5;

const TASK_ABORTED: &str = "task aborted";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
  pub max_images: Option<usize>,
  /// 检测前使用本地启发式再确认一次
  pub local_precheck: bool,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      max_images: Some(DEFAULT_MAX_IMAGES),
      local_precheck: false,
    }
  }
}

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("没有待分析的图像")]
  NoImages,
  #[error("图像数量 {count} 超过上限 {limit}")]
  TooManyImages { count: usize, limit: usize },
  #[error("上传失败: {0}")]
  Upload(#[from] StoreError),
  #[error("记录状态错误: {0}")]
  Record(#[from] RecordError),
}

/// 单张图像在并发阶段的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
  Skipped {
    classification: ClassificationOutcome,
  },
  Detected {
    classification: ClassificationOutcome,
    detections: Vec<Detection>,
    served_by: EndpointRole,
  },
  Failed {
    classification: Option<ClassificationOutcome>,
    reason: String,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
  pub analysis: PerImageAnalysis,
  pub records: Vec<DefectRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
  /// 与输入顺序一致
  pub analysis_results: Vec<ImageResult>,
  pub primary_notification_id: Option<String>,
}

pub struct Pipeline<T, S, P, N> {
  gateway: Arc<NetworkGateway<T>>,
  classifier: Arc<SolarPanelClassifier>,
  storage: S,
  persistence: P,
  notifications: N,
  config: PipelineConfig,
}

async fn process_image<T: Transport>(
  gateway: &NetworkGateway<T>,
  classifier: &SolarPanelClassifier,
  local_precheck: bool,
  image: &RawImageInput,
) -> ImageOutcome {
  let payload = match MultipartImage::from_input(image).await {
    Ok(payload) => payload,
    Err(err) => {
      error!("读取图像 {} 失败: {}", image.display_name, err);
      return ImageOutcome::Failed {
        classification: None,
        reason: err.to_string(),
      };
    }
  };

  let classification = match gateway.classify(&payload).await {
    Ok(classification) => classification,
    Err(err) => {
      error!("分类 {} 失败: {}", image.display_name, err);
      return ImageOutcome::Failed {
        classification: None,
        reason: err.to_string(),
      };
    }
  };

  if classification.label.is_skip() {
    info!("跳过 {}: {:?}", image.display_name, classification.label);
    return ImageOutcome::Skipped { classification };
  }

  if local_precheck
    && !classifier.is_solar_panel(&classification.raw_response, Some(&image.source_uri()))
  {
    info!("本地启发式判定 {} 不是光伏面板", image.display_name);
    return ImageOutcome::Skipped {
      classification: ClassificationOutcome {
        label: ClassificationLabel::NotSolar,
        raw_response: classification.raw_response,
      },
    };
  }

  match gateway.detect(&payload).await {
    Ok(outcome) => {
      debug!(
        "{} 检测到 {} 个缺陷 ({:?})",
        image.display_name,
        outcome.detections.len(),
        outcome.served_by
      );
      ImageOutcome::Detected {
        classification,
        detections: outcome.detections,
        served_by: outcome.served_by,
      }
    }
    Err(err) => ImageOutcome::Failed {
      classification: Some(classification),
      reason: err.to_string(),
    },
  }
}

impl<T, S, P, N> Pipeline<T, S, P, N>
where
  T: Transport,
  S: Storage,
  P: Persistence,
  N: NotificationSink,
{
  pub fn new(gateway: NetworkGateway<T>, storage: S, persistence: P, notifications: N) -> Self {
    Self {
      gateway: Arc::new(gateway),
      classifier: Arc::new(SolarPanelClassifier::default()),
      storage,
      persistence,
      notifications,
      config: PipelineConfig::default(),
    }
  }

  pub fn with_config(mut self, config: PipelineConfig) -> Self {
    self.config = config;
    self
  }

  pub fn with_classifier(mut self, classifier: SolarPanelClassifier) -> Self {
    self.classifier = Arc::new(classifier);
    self
  }

  pub fn gateway(&self) -> &NetworkGateway<T> {
    &self.gateway
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  fn check_batch(&self, images: &[RawImageInput]) -> Result<(), PipelineError> {
    if images.is_empty() {
      return Err(PipelineError::NoImages);
    }
    if let Some(limit) = self.config.max_images
      && images.len() > limit
    {
      return Err(PipelineError::TooManyImages {
        count: images.len(),
        limit,
      });
    }
    Ok(())
  }

  /// 上传、并发分析、归并、持久化并发出通知
  pub async fn run(
    &self,
    images: Vec<RawImageInput>,
    user_id: &str,
  ) -> Result<PipelineOutput, PipelineError> {
    self.check_batch(&images)?;

    let mut assets = Vec::with_capacity(images.len());
    for image in &images {
      let asset = self.storage.upload(image).await.inspect_err(|err| {
        error!("上传 {} 失败，终止本批次: {}", image.display_name, err);
      })?;
      assets.push(asset);
    }
    info!("已上传 {} 张图像", assets.len());

    let outcomes = self.analyze_all(&images).await;

    let mut analysis_results = Vec::with_capacity(images.len());
    let mut primary_notification_id = None;
    for ((image, asset), outcome) in images.into_iter().zip(assets).zip(outcomes) {
      let result = self
        .settle(image, asset, outcome, user_id, &mut primary_notification_id)
        .await;
      analysis_results.push(result);
    }

    Ok(PipelineOutput {
      analysis_results,
      primary_notification_id,
    })
  }

  /// 每张图像一个任务，结果按输入顺序返回
  async fn analyze_all(&self, images: &[RawImageInput]) -> Vec<ImageOutcome> {
    let mut tasks = JoinSet::new();
    for (index, image) in images.iter().cloned().enumerate() {
      let gateway = Arc::clone(&self.gateway);
      let classifier = Arc::clone(&self.classifier);
      let local_precheck = self.config.local_precheck;
      tasks.spawn(async move {
        let outcome = process_image(&gateway, &classifier, local_precheck, &image).await;
        (index, outcome)
      });
    }

    let mut slots: Vec<Option<ImageOutcome>> = (0..images.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((index, outcome)) => slots[index] = Some(outcome),
        Err(err) => error!("分析任务异常退出: {}", err),
      }
    }

    slots
      .into_iter()
      .map(|slot| {
        slot.unwrap_or_else(|| ImageOutcome::Failed {
          classification: None,
          reason: TASK_ABORTED.to_string(),
        })
      })
      .collect()
  }

  async fn settle(
    &self,
    image: RawImageInput,
    asset: UploadedAsset,
    outcome: ImageOutcome,
    user_id: &str,
    primary_notification_id: &mut Option<String>,
  ) -> ImageResult {
    let source = image.display_name.clone();
    let url = asset.asset_url.clone();

    let (classification, detections, skip, failure, mut records) = match outcome {
      ImageOutcome::Skipped { classification } => {
        self
          .notifications
          .add(notify::skipped(&source, classification.label));
        (Some(classification), Vec::new(), true, None, Vec::new())
      }
      ImageOutcome::Detected {
        classification,
        detections,
        ..
      } => {
        let records = if detections.is_empty() {
          let records: Vec<DefectRecord> = no_defect_record(&source, &url).into_iter().collect();
          for record in &records {
            self.notifications.add(notify::no_defect(record));
          }
          records
        } else {
          reduce_detections(&source, &url, &detections)
        };
        (Some(classification), detections, false, None, records)
      }
      ImageOutcome::Failed {
        classification,
        reason,
      } => {
        warn!("{} 分析失败: {}", source, reason);
        self
          .notifications
          .add(notify::network_failure(&source, &reason));
        let records: Vec<DefectRecord> = network_error_record(&source, &url, &reason)
          .into_iter()
          .collect();
        let detections = records
          .iter()
          .map(|record| record.primary_detection.clone())
          .collect();
        (classification, detections, false, Some(reason), records)
      }
    };

    for record in records
      .iter_mut()
      .filter(|r| !r.is_no_defect() && !r.is_network_error())
    {
      match self.persistence.save_defect(user_id, record).await {
        Ok(saved) => {
          record.attach_persisted_id(saved.id.clone());
          self.notifications.add(notify::detected(&saved.id, record));
          primary_notification_id.get_or_insert(saved.id);
        }
        Err(err) => error!(
          "保存 {} 的 {} 记录失败: {}",
          source, record.defect_class, err
        ),
      }
    }

    ImageResult {
      analysis: PerImageAnalysis {
        input: image,
        uploaded_asset: asset,
        classification,
        detections,
        skip,
        failure,
      },
      records,
    }
  }

  /// 变更记录状态并发出对应通知
  pub fn resolve(
    &self,
    record: &mut DefectRecord,
    status: RecordStatus,
  ) -> Result<(), PipelineError> {
    record.transition(status)?;
    self.notifications.add(notify::status_changed(record));
    Ok(())
  }

  pub async fn history(&self, user_id: &str) -> Result<Vec<DefectRecord>, StoreError> {
    self.persistence.fetch_history(user_id).await
  }
}

mod notify;
mod reduce;

pub use self::notify::{
  NETWORK_REMEDIATION, NO_DEFECT_MESSAGE, NOT_SOLAR_MESSAGE, NOT_THERMAL_MESSAGE, skip_message,
};
pub use self::reduce::{group_by_class, network_error_record, no_defect_record, reduce_detections};

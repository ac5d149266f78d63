// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/network/gateway.rs - 分类/检测服务网关
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
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};
use url::Url;

use crate::{
  config::GatewayConfig,
  model::{ClassificationLabel, ClassificationOutcome, Detection},
  network::transport::{MultipartImage, Transport, TransportError},
};

const CLASSIFY_PATH: &str = "classify/";
const DETECT_PATH: &str = "detect/";
const HEALTH_PATH: &str = "health";
const DEFECT_INFO_PATH: &str = "defect-info/";

const LABEL_FIELDS: [&str; 3] = ["label", "class", "prediction"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
  Primary,
  Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectOutcome {
  pub detections: Vec<Detection>,
  pub served_by: EndpointRole,
}

/// 在基础地址后拼接路径，基础地址缺少结尾 `/` 时补上
pub fn endpoint(base: &Url, path: &str) -> Result<Url, TransportError> {
  let mut base = base.clone();
  if !base.path().ends_with('/') {
    let with_slash = format!("{}/", base.path());
    base.set_path(&with_slash);
  }
  Ok(base.join(path)?)
}

pub fn parse_label(response: &Value) -> Result<ClassificationLabel, TransportError> {
  LABEL_FIELDS
    .iter()
    .filter_map(|field| response.get(field).and_then(Value::as_str))
    .find_map(ClassificationLabel::parse)
    .ok_or_else(|| TransportError::InvalidResponse(format!("无法识别的分类结果: {}", response)))
}

/// 缺少 `detections` 视为空列表，格式错误则报错
pub fn parse_detections(response: &Value) -> Result<Vec<Detection>, TransportError> {
  let mut detections: Vec<Detection> = match response.get("detections") {
    None | Some(Value::Null) => Vec::new(),
    Some(value) => serde_json::from_value(value.clone())
      .map_err(|err| TransportError::InvalidResponse(format!("检测结果格式错误: {}", err)))?,
  };
  detections
    .iter_mut()
    .for_each(Detection::enrich_from_catalog);
  Ok(detections)
}

pub struct NetworkGateway<T> {
  transport: T,
  config: GatewayConfig,
}

impl<T: Transport> NetworkGateway<T> {
  pub fn new(transport: T, config: GatewayConfig) -> Self {
    Self { transport, config }
  }

  pub fn config(&self) -> &GatewayConfig {
    &self.config
  }

  pub fn transport(&self) -> &T {
    &self.transport
  }

  async fn timed<F>(limit: Duration, request: F) -> Result<Value, TransportError>
  where
    F: Future<Output = Result<Value, TransportError>>,
  {
    tokio::time::timeout(limit, request)
      .await
      .map_err(|_| TransportError::Timeout(limit))?
  }

  /// 仅请求主服务，不做回退
  pub async fn classify(
    &self,
    image: &MultipartImage,
  ) -> Result<ClassificationOutcome, TransportError> {
    let url = endpoint(&self.config.primary, CLASSIFY_PATH)?;
    let response = Self::timed(
      self.config.request_timeout,
      self.transport.post_multipart(&url, image),
    )
    .await?;
    let label = parse_label(&response)?;
    info!("{} 分类结果: {:?}", image.file_name, label);

    Ok(ClassificationOutcome {
      label,
      raw_response: response,
    })
  }

  async fn detect_at(
    &self,
    base: &Url,
    image: &MultipartImage,
  ) -> Result<Vec<Detection>, TransportError> {
    let url = endpoint(base, DETECT_PATH)?;
    let response = Self::timed(
      self.config.request_timeout,
      self.transport.post_multipart(&url, image),
    )
    .await?;
    parse_detections(&response)
  }

  /// 主服务失败时向回退服务重试一次
  pub async fn detect(&self, image: &MultipartImage) -> Result<DetectOutcome, TransportError> {
    let primary_error = match self.detect_at(&self.config.primary, image).await {
      Ok(detections) => {
        return Ok(DetectOutcome {
          detections,
          served_by: EndpointRole::Primary,
        });
      }
      Err(err) => err,
    };
    warn!("主服务检测 {} 失败: {}", image.file_name, primary_error);

    let Some(fallback) = &self.config.fallback else {
      return Err(primary_error);
    };

    match self.detect_at(fallback, image).await {
      Ok(detections) => {
        info!("{} 由回退服务完成检测", image.file_name);
        Ok(DetectOutcome {
          detections,
          served_by: EndpointRole::Fallback,
        })
      }
      Err(err) => {
        error!("回退服务检测 {} 同样失败: {}", image.file_name, err);
        Err(err)
      }
    }
  }

  /// 依次检查主服务与回退服务，返回第一个可用的端点
  pub async fn health(&self) -> Result<EndpointRole, TransportError> {
    let mut candidates = vec![(EndpointRole::Primary, &self.config.primary)];
    if let Some(fallback) = &self.config.fallback {
      candidates.push((EndpointRole::Fallback, fallback));
    }

    let mut last_error = None;
    for (role, base) in candidates {
      let url = endpoint(base, HEALTH_PATH)?;
      match Self::timed(self.config.health_timeout, self.transport.get(&url)).await {
        Ok(_) => {
          info!("{:?} 服务可用: {}", role, base);
          return Ok(role);
        }
        Err(err) => {
          warn!("{:?} 服务不可用: {}", role, err);
          last_error = Some(err);
        }
      }
    }
    Err(last_error.unwrap_or_else(|| TransportError::InvalidResponse("没有可用端点".to_string())))
  }

  /// 查询服务端的缺陷类别说明
  pub async fn defect_info(&self, defect_class: &str) -> Result<Value, TransportError> {
    let path = format!("{}{}", DEFECT_INFO_PATH, urlencoding::encode(defect_class));
    let url = endpoint(&self.config.primary, &path)?;
    Self::timed(self.config.request_timeout, self.transport.get(&url)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn endpoint_keeps_base_path() {
    let base = Url::parse("http://10.0.0.2:8000").unwrap();
    assert_eq!(
      endpoint(&base, DETECT_PATH).unwrap().as_str(),
      "http://10.0.0.2:8000/detect/"
    );

    let base = Url::parse("https://example.com/api").unwrap();
    assert_eq!(
      endpoint(&base, HEALTH_PATH).unwrap().as_str(),
      "https://example.com/api/health"
    );
  }

  #[test]
  fn labels_are_lenient() {
    assert_eq!(
      parse_label(&json!({ "label": "Not_Solar" })).unwrap(),
      ClassificationLabel::NotSolar
    );
    assert_eq!(
      parse_label(&json!({ "prediction": "not-thermal" })).unwrap(),
      ClassificationLabel::NotThermal
    );
    assert!(parse_label(&json!({ "label": "banana" })).is_err());
  }

  #[test]
  fn detections_are_parsed_and_enriched() {
    let response = json!({
      "status": "success",
      "detections": [
        { "class": "short-circuit", "confidence": 0.91, "bbox": [1.0, 2.0, 30.0, 40.0] }
      ]
    });
    let detections = parse_detections(&response).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].priority_raw, "High");
    assert_eq!(detections[0].bounding_box, [1.0, 2.0, 30.0, 40.0]);

    assert!(parse_detections(&json!({})).unwrap().is_empty());
    assert!(parse_detections(&json!({ "detections": "oops" })).is_err());
  }
}

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// tests/common/mod.rs - 集成测试公共设施
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

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};
use url::Url;

use solscan::{
  config::GatewayConfig,
  model::RawImageInput,
  network::{MultipartImage, Transport, TransportError},
};

pub const PRIMARY: &str = "http://primary.test:8000";
pub const FALLBACK: &str = "http://fallback.test:8000";
pub const TEST_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub enum Reply {
  Json(Value),
  Status(u16),
  /// 永不返回，由网关超时打断
  Hang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
  pub url: String,
  pub file_name: Option<String>,
}

#[derive(Default)]
struct Script {
  classify: HashMap<String, Reply>,
  detect: HashMap<String, Reply>,
  hang_hosts: HashSet<String>,
  hang_detect_hosts: HashSet<String>,
  down_hosts: HashSet<String>,
}

/// 按文件名预设响应的传输层
#[derive(Default)]
pub struct FakeTransport {
  script: Mutex<Script>,
  calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn classify(self, file_name: &str, reply: Reply) -> Self {
    self.lock_script().classify.insert(file_name.to_string(), reply);
    self
  }

  pub fn classify_label(self, file_name: &str, label: &str) -> Self {
    self.classify(file_name, Reply::Json(json!({ "label": label })))
  }

  pub fn detect(self, file_name: &str, reply: Reply) -> Self {
    self.lock_script().detect.insert(file_name.to_string(), reply);
    self
  }

  pub fn detect_classes(self, file_name: &str, classes: &[&str]) -> Self {
    let detections: Vec<Value> = classes
      .iter()
      .enumerate()
      .map(|(i, class)| {
        json!({
          "bbox": [0.1, 0.1, 0.4, 0.4],
          "class": class,
          "confidence": 0.9 - i as f64 * 0.1,
          "priority": "2 - Medium",
        })
      })
      .collect();
    self.detect(file_name, Reply::Json(json!({ "detections": detections })))
  }

  /// 发往该主机的请求全部挂起
  pub fn hang_host(self, base: &str) -> Self {
    self.lock_script().hang_hosts.insert(host_of(base));
    self
  }

  /// 仅该主机的检测请求挂起
  pub fn hang_detect_on(self, base: &str) -> Self {
    self.lock_script().hang_detect_hosts.insert(host_of(base));
    self
  }

  /// 发往该主机的请求全部返回 503
  pub fn down_host(self, base: &str) -> Self {
    self.lock_script().down_hosts.insert(host_of(base));
    self
  }

  fn lock_script(&self) -> std::sync::MutexGuard<'_, Script> {
    self.script.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn calls_to(&self, fragment: &str) -> Vec<Call> {
    self
      .calls()
      .into_iter()
      .filter(|call| call.url.contains(fragment))
      .collect()
  }

  fn record(&self, url: &Url, file_name: Option<&str>) {
    self
      .calls
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(Call {
        url: url.to_string(),
        file_name: file_name.map(str::to_string),
      });
  }

  fn reply_for(&self, url: &Url, file_name: &str) -> Reply {
    let script = self.lock_script();
    let host = url.host_str().unwrap_or_default().to_string();
    if script.hang_hosts.contains(&host) {
      return Reply::Hang;
    }
    if script.down_hosts.contains(&host) {
      return Reply::Status(503);
    }

    if url.path().ends_with("/classify/") {
      script
        .classify
        .get(file_name)
        .cloned()
        .unwrap_or_else(|| Reply::Json(json!({ "label": "solar" })))
    } else if url.path().ends_with("/detect/") {
      if script.hang_detect_hosts.contains(&host) {
        return Reply::Hang;
      }
      script
        .detect
        .get(file_name)
        .cloned()
        .unwrap_or_else(|| Reply::Json(json!({ "detections": [] })))
    } else {
      Reply::Status(404)
    }
  }
}

fn host_of(base: &str) -> String {
  Url::parse(base)
    .ok()
    .and_then(|url| url.host_str().map(str::to_string))
    .unwrap_or_default()
}

async fn respond(reply: Reply) -> Result<Value, TransportError> {
  match reply {
    Reply::Json(value) => Ok(value),
    Reply::Status(code) => Err(TransportError::Status(code)),
    Reply::Hang => {
      std::future::pending::<()>().await;
      Ok(Value::Null)
    }
  }
}

impl Transport for FakeTransport {
  async fn post_multipart(&self, url: &Url, image: &MultipartImage) -> Result<Value, TransportError> {
    self.record(url, Some(&image.file_name));
    let reply = self.reply_for(url, &image.file_name);
    respond(reply).await
  }

  async fn get(&self, url: &Url) -> Result<Value, TransportError> {
    self.record(url, None);
    let reply = {
      let script = self.lock_script();
      let host = url.host_str().unwrap_or_default().to_string();
      if script.hang_hosts.contains(&host) {
        Reply::Hang
      } else if script.down_hosts.contains(&host) {
        Reply::Status(503)
      } else {
        Reply::Json(json!({ "status": "ok" }))
      }
    };
    respond(reply).await
  }
}

pub fn gateway_config(with_fallback: bool) -> GatewayConfig {
  let mut config =
    GatewayConfig::new(Url::parse(PRIMARY).unwrap()).with_request_timeout(TEST_TIMEOUT);
  config.health_timeout = TEST_TIMEOUT;
  if with_fallback {
    config.with_fallback(Url::parse(FALLBACK).unwrap())
  } else {
    config
  }
}

/// 在目录中写入占位图像文件
pub fn image_files(directory: &Path, names: &[&str]) -> Vec<RawImageInput> {
  names
    .iter()
    .map(|name| {
      let path = directory.join(name);
      std::fs::write(&path, format!("fake image {}", name)).unwrap();
      RawImageInput::from_path(&path).unwrap()
    })
    .collect()
}

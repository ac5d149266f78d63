// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/config.rs - 服务端地址配置
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

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_SERVER_IP: &str = "192.168.1.10";
pub const DEFAULT_BACKEND_PORT: u16 = 8000;
pub const DEFAULT_CAMERA_PORT: u16 = 5000;

/// 分类与检测请求的超时
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);
/// 健康检查的超时
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("URL 错误: {0}")]
  UrlError(#[from] url::ParseError),
}

/// 持久化的服务端地址，字段名与移动端保存的 JSON 保持一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ServerConfig {
  pub server_ip: String,
  #[serde(deserialize_with = "lenient_port")]
  pub backend_port: u16,
  /// 只做读写往返，本程序不访问摄像头
  #[serde(deserialize_with = "lenient_port")]
  pub camera_port: u16,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      server_ip: DEFAULT_SERVER_IP.to_string(),
      backend_port: DEFAULT_BACKEND_PORT,
      camera_port: DEFAULT_CAMERA_PORT,
    }
  }
}

/// 端口可以是数字或字符串
fn lenient_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Port {
    Number(u16),
    Text(String),
  }

  match Port::deserialize(deserializer)? {
    Port::Number(port) => Ok(port),
    Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
  }
}

impl ServerConfig {
  pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let mut config: Self = serde_json::from_str(&text)?;
    if config.server_ip.trim().is_empty() {
      config.server_ip = DEFAULT_SERVER_IP.to_string();
    }
    Ok(config)
  }

  /// 读取失败时回退到默认配置
  pub fn load(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref();
    match Self::try_load(path) {
      Ok(config) => {
        info!("加载配置 {}", path.display());
        config
      }
      Err(err) => {
        warn!("无法加载配置 {}，使用默认值: {}", path.display(), err);
        Self::default()
      }
    }
  }

  /// 只保存地址与端口
  pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(self)?)?;
    Ok(())
  }

  pub fn backend_url(&self) -> Result<Url, ConfigError> {
    Ok(Url::parse(&format!(
      "http://{}:{}",
      self.server_ip, self.backend_port
    ))?)
  }
}

/// 网关使用的端点与超时
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
  pub primary: Url,
  pub fallback: Option<Url>,
  pub request_timeout: Duration,
  pub health_timeout: Duration,
}

impl GatewayConfig {
  pub fn new(primary: Url) -> Self {
    Self {
      primary,
      fallback: None,
      request_timeout: REQUEST_TIMEOUT,
      health_timeout: HEALTH_TIMEOUT,
    }
  }

  pub fn with_fallback(mut self, fallback: Url) -> Self {
    self.fallback = Some(fallback);
    self
  }

  pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout = timeout;
    self
  }

  pub fn from_server(config: &ServerConfig) -> Result<Self, ConfigError> {
    Ok(Self::new(config.backend_url()?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_build_backend_url() {
    let config = ServerConfig::default();
    assert_eq!(config.backend_url().unwrap().as_str(), "http://192.168.1.10:8000/");

    let config = ServerConfig {
      server_ip: "10.0.0.2".to_string(),
      backend_port: 9000,
      ..ServerConfig::default()
    };
    assert_eq!(config.backend_url().unwrap().as_str(), "http://10.0.0.2:9000/");
  }

  #[test]
  fn string_ports_and_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "SERVER_IP": "10.0.0.2", "BACKEND_PORT": "9000" }"#).unwrap();

    let config = ServerConfig::load(&path);
    assert_eq!(config.server_ip, "10.0.0.2");
    assert_eq!(config.backend_port, 9000);
    assert_eq!(config.camera_port, DEFAULT_CAMERA_PORT);
  }

  #[test]
  fn broken_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(ServerConfig::load(&path), ServerConfig::default());
    assert_eq!(ServerConfig::load(dir.path().join("missing.json")), ServerConfig::default());
  }

  #[test]
  fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let config = ServerConfig {
      server_ip: "127.0.0.1".to_string(),
      backend_port: 8080,
      camera_port: 5050,
    };
    config.save(&path).unwrap();
    assert_eq!(ServerConfig::try_load(&path).unwrap(), config);
  }
}

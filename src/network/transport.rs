// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/network/transport.rs - HTTP 传输层
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

use reqwest::{
  Client,
  header::ACCEPT,
  multipart::{Form, Part},
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::model::RawImageInput;

/// 上传图像使用的表单字段名
pub const FILE_FIELD: &str = "file";

#[derive(Error, Debug)]
pub enum TransportError {
  #[error("请求超时 ({0:?})")]
  Timeout(Duration),
  #[error("服务端返回状态码 {0}")]
  Status(u16),
  #[error("HTTP 错误: {0}")]
  Http(#[from] reqwest::Error),
  #[error("响应格式错误: {0}")]
  InvalidResponse(String),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("URL 错误: {0}")]
  Url(#[from] url::ParseError),
}

/// 以 multipart 方式上传的单张图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartImage {
  pub file_name: String,
  pub mime_type: String,
  pub bytes: Vec<u8>,
}

impl MultipartImage {
  pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
    Self {
      file_name: file_name.into(),
      mime_type: mime_type.into(),
      bytes,
    }
  }

  pub async fn from_input(input: &RawImageInput) -> Result<Self, TransportError> {
    let bytes = tokio::fs::read(&input.local_path).await?;
    Ok(Self::new(
      input.display_name.clone(),
      input.mime_type.clone(),
      bytes,
    ))
  }
}

/// 远程服务的最小传输接口，超时由调用方控制
pub trait Transport: Send + Sync + 'static {
  fn post_multipart(
    &self,
    url: &Url,
    image: &MultipartImage,
  ) -> impl Future<Output = Result<Value, TransportError>> + Send;

  fn get(&self, url: &Url) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

pub struct HttpTransport {
  client: Client,
}

impl HttpTransport {
  pub fn new() -> Result<Self, TransportError> {
    Ok(Self {
      client: Client::builder().build()?,
    })
  }

  pub fn with_client(client: Client) -> Self {
    Self { client }
  }
}

async fn json_body(response: reqwest::Response) -> Result<Value, TransportError> {
  let status = response.status();
  if !status.is_success() {
    return Err(TransportError::Status(status.as_u16()));
  }

  let text = response.text().await?;
  if text.trim().is_empty() {
    return Ok(Value::Null);
  }
  serde_json::from_str(&text).map_err(|err| TransportError::InvalidResponse(err.to_string()))
}

impl Transport for HttpTransport {
  async fn post_multipart(&self, url: &Url, image: &MultipartImage) -> Result<Value, TransportError> {
    debug!("POST {} ({}, {} 字节)", url, image.file_name, image.bytes.len());
    let part = Part::bytes(image.bytes.clone())
      .file_name(image.file_name.clone())
      .mime_str(&image.mime_type)?;
    let form = Form::new().part(FILE_FIELD, part);

    let response = self
      .client
      .post(url.clone())
      .header(ACCEPT, "application/json")
      .multipart(form)
      .send()
      .await?;
    json_body(response).await
  }

  async fn get(&self, url: &Url) -> Result<Value, TransportError> {
    debug!("GET {}", url);
    let response = self
      .client
      .get(url.clone())
      .header(ACCEPT, "application/json")
      .send()
      .await?;
    json_body(response).await
  }
}

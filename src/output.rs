// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/output.rs - 输出定义
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

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::FromUrl;
#[cfg(feature = "save_image_file")]
use crate::FromUrlWithScheme;
use crate::pipeline::ImageResult;

/// 将单张图像的分析结果输出到某处，返回生成的文件（若有）
pub trait Render<Output>: Sized {
  type Error;
  fn render_result(&self, result: &Output) -> Result<Option<PathBuf>, Self::Error>;
}

#[cfg(feature = "save_image_file")]
mod annotate;
#[cfg(feature = "save_image_file")]
pub use self::annotate::{AnnotateError, AnnotatedImageOutput, annotate, save_annotated};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "save_image_file")]
  #[error("标注图输出错误: {0}")]
  AnnotateError(#[from] AnnotateError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  #[cfg(feature = "save_image_file")]
  AnnotatedImageOutput(AnnotatedImageOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "save_image_file")]
      AnnotatedImageOutput::SCHEME => {
        let output = AnnotatedImageOutput::from_url(url)?;
        Ok(OutputWrapper::AnnotatedImageOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Render<ImageResult> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, result: &ImageResult) -> Result<Option<PathBuf>, Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::AnnotatedImageOutput(output) => {
        output.render_result(result).map_err(OutputError::from)
      }
      #[cfg(not(feature = "save_image_file"))]
      _ => {
        let _ = result;
        Ok(None)
      }
    }
  }
}

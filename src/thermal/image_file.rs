// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/image_file.rs - 灰度热成像文件输入
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

use image::{ImageBuffer, ImageReader, Luma};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  thermal::matrix::{MatrixError, SENSOR_RANGE, ThermalMatrix},
};

#[derive(Error, Debug)]
pub enum ThermalImageInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("温度范围参数无效: {0}")]
  InvalidRange(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像加载错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("温度矩阵错误: {0}")]
  MatrixError(#[from] MatrixError),
}

/// 将灰度热成像快照按线性映射还原为温度矩阵。
///
/// URI 形如 `image:///path/to/frame.png?min=20&max=120`。
/// 按 16 位灰度的全量程映射：像素值 0 对应 `min`，`u16::MAX` 对应 `max`，
/// 与图像中实际出现的最暗、最亮像素无关。
pub struct ThermalImageInput {
  image: ImageBuffer<Luma<u16>, Vec<u16>>,
  min: f64,
  max: f64,
}

impl FromUrlWithScheme for ThermalImageInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ThermalImageInput {
  type Error = ThermalImageInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ThermalImageInputError::SchemeMismatch);
    }

    let mut min = *SENSOR_RANGE.start();
    let mut max = *SENSOR_RANGE.end();
    for (key, value) in url.query_pairs() {
      let target = match &*key {
        "min" => &mut min,
        "max" => &mut max,
        _ => continue,
      };
      *target = value
        .parse()
        .map_err(|_| ThermalImageInputError::InvalidRange(format!("{}={}", key, value)))?;
    }
    if !(min.is_finite() && max.is_finite() && min < max) {
      return Err(ThermalImageInputError::InvalidRange(format!(
        "min={} max={}",
        min, max
      )));
    }

    let path = urlencoding::decode(url.path())
      .map(|p| p.into_owned())
      .unwrap_or_else(|_| url.path().to_string());
    let image = ImageReader::open(&path)?.decode()?.into_luma16();
    info!(
      "读取热成像文件 {} ({}x{})",
      path,
      image.width(),
      image.height()
    );

    Ok(Self { image, min, max })
  }
}

impl ThermalImageInput {
  pub fn into_matrix(self) -> Result<ThermalMatrix, ThermalImageInputError> {
    let (width, height) = self.image.dimensions();
    let span = self.max - self.min;
    let values = self
      .image
      .pixels()
      .map(|pixel| self.min + f64::from(pixel[0]) / f64::from(u16::MAX) * span)
      .collect();

    Ok(ThermalMatrix::from_flat(
      values,
      height as usize,
      width as usize,
    )?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn grayscale_maps_to_temperature() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    let image = ImageBuffer::from_fn(4, 2, |x, _| Luma([if x < 2 { 0u16 } else { u16::MAX }]));
    image.save(&path).unwrap();

    let url = Url::parse(&format!("image://{}?min=20&max=60", path.display())).unwrap();
    let matrix = ThermalImageInput::from_url(&url).unwrap().into_matrix().unwrap();

    assert_eq!((matrix.rows(), matrix.cols()), (2, 4));
    assert_eq!(matrix.get(0, 0), Some(20.0));
    assert_eq!(matrix.get(1, 3), Some(60.0));
  }

  #[test]
  fn mapping_uses_full_gray_scale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mid.png");
    let image = ImageBuffer::from_fn(2, 2, |x, _| Luma([if x == 0 { 16384u16 } else { 49151 }]));
    image.save(&path).unwrap();

    let url = Url::parse(&format!("image://{}?min=20&max=120", path.display())).unwrap();
    let matrix = ThermalImageInput::from_url(&url).unwrap().into_matrix().unwrap();

    // 图像未铺满量程，温度也不会铺满 [min, max]
    let darkest = matrix.get(0, 0).unwrap();
    let brightest = matrix.get(0, 1).unwrap();
    assert!((darkest - 45.0).abs() < 0.01, "{}", darkest);
    assert!((brightest - 95.0).abs() < 0.01, "{}", brightest);
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("folder:///tmp/frame.png").unwrap();
    assert!(matches!(
      ThermalImageInput::from_url(&url),
      Err(ThermalImageInputError::SchemeMismatch)
    ));
  }

  #[test]
  fn inverted_range_is_rejected() {
    let url = Url::parse("image:///tmp/frame.png?min=80&max=20").unwrap();
    assert!(matches!(
      ThermalImageInput::from_url(&url),
      Err(ThermalImageInputError::InvalidRange(_))
    ));
  }
}

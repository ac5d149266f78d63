// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/output/annotate.rs - 缺陷标注图输出
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

use image::{ImageReader, Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
  rect::Rect,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Detection, catalog::class_color},
  output::Render,
  pipeline::ImageResult,
};

const BOX_THICKNESS: i32 = 2;
/// 左上角类别色块的边长
const TAG_SIZE: u32 = 6;

#[derive(Error, Debug)]
pub enum AnnotateError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 将边框转换为像素坐标；全部分量不超过 1 时视为归一化坐标
fn pixel_box(bbox: &[f32; 4], width: u32, height: u32) -> Option<Rect> {
  if width == 0 || height == 0 {
    return None;
  }
  let normalized = bbox.iter().all(|v| (0.0..=1.0).contains(v));
  let (sx, sy) = if normalized {
    (width as f32, height as f32)
  } else {
    (1.0, 1.0)
  };

  let max_x = width as i32 - 1;
  let max_y = height as i32 - 1;
  let x_min = ((bbox[0] * sx).floor() as i32).clamp(0, max_x);
  let y_min = ((bbox[1] * sy).floor() as i32).clamp(0, max_y);
  let x_max = ((bbox[2] * sx).ceil() as i32).clamp(0, max_x);
  let y_max = ((bbox[3] * sy).ceil() as i32).clamp(0, max_y);

  if x_min >= x_max || y_min >= y_max {
    return None;
  }
  Some(Rect::at(x_min, y_min).of_size((x_max - x_min + 1) as u32, (y_max - y_min + 1) as u32))
}

/// 在图像上绘制所有检测框，颜色按缺陷类别区分
pub fn annotate(image: &mut RgbImage, detections: &[Detection]) -> usize {
  let (width, height) = image.dimensions();
  let mut drawn = 0;

  for detection in detections {
    let Some(rect) = pixel_box(&detection.bounding_box, width, height) else {
      continue;
    };
    let color = Rgb(class_color(&detection.defect_class));

    for thickness in 0..BOX_THICKNESS {
      let w = rect.width() as i32 - 2 * thickness;
      let h = rect.height() as i32 - 2 * thickness;
      if w <= 0 || h <= 0 {
        break;
      }
      let inner =
        Rect::at(rect.left() + thickness, rect.top() + thickness).of_size(w as u32, h as u32);
      draw_hollow_rect_mut(image, inner, color);
    }

    let tag = Rect::at(rect.left(), rect.top())
      .of_size(TAG_SIZE.min(rect.width()), TAG_SIZE.min(rect.height()));
    draw_filled_rect_mut(image, tag, color);
    drawn += 1;
  }

  drawn
}

pub fn save_annotated(
  source: &Path,
  detections: &[Detection],
  target: &Path,
) -> Result<usize, AnnotateError> {
  let mut image = ImageReader::open(source)?.decode()?.into_rgb8();
  let drawn = annotate(&mut image, detections);
  image.save(target)?;
  Ok(drawn)
}

/// 以 `annotate:///path` 指定输出目录
pub struct AnnotatedImageOutput {
  directory: PathBuf,
  always: bool,
}

impl FromUrlWithScheme for AnnotatedImageOutput {
  const SCHEME: &'static str = "annotate";
}

impl FromUrl for AnnotatedImageOutput {
  type Error = AnnotateError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(AnnotateError::SchemeMismatch);
    }

    let always = url.query_pairs().any(|(k, _)| k == "always");
    Ok(Self {
      directory: PathBuf::from(url.path()),
      always,
    })
  }
}

impl AnnotatedImageOutput {
  fn target_path(&self, source: &Path) -> PathBuf {
    let stem = source
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_else(|| "image".to_string());
    self.directory.join(format!("{}-annotated.png", stem))
  }
}

impl Render<ImageResult> for AnnotatedImageOutput {
  type Error = AnnotateError;

  fn render_result(&self, result: &ImageResult) -> Result<Option<PathBuf>, Self::Error> {
    let analysis = &result.analysis;
    if analysis.skip || analysis.is_failed() {
      return Ok(None);
    }
    if analysis.detections.is_empty() && !self.always {
      debug!("{} 没有缺陷，不输出标注图", analysis.input.display_name);
      return Ok(None);
    }

    std::fs::create_dir_all(&self.directory)?;
    let target = self.target_path(&analysis.input.local_path);
    let drawn = save_annotated(&analysis.input.local_path, &analysis.detections, &target)?;
    info!("标注 {} 个缺陷 -> {}", drawn, target.display());
    Ok(Some(target))
  }
}

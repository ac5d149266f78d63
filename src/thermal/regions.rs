// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/regions.rs - 均匀温度区域
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

use crate::thermal::matrix::ThermalMatrix;

pub const WINDOW_SIZE: usize = 4;
pub const UNIFORMITY_THRESHOLD: f64 = 1.5;
pub const MIN_UNIFORM_REGIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformRegion {
  /// 窗口左上角
  pub row: usize,
  pub col: usize,
  pub mean: f64,
  pub std_dev: f64,
}

/// 以不重叠的 4x4 窗口扫描，标准差低于阈值的窗口视为均匀。
///
/// 窗口标准差取总体标准差（除以 n 而非 n - 1），
/// 阈值附近的窗口比按样本标准差计算时更容易判为均匀。
pub fn uniform_regions(matrix: &ThermalMatrix) -> Vec<UniformRegion> {
  let mut regions = Vec::new();
  if matrix.rows() < WINDOW_SIZE || matrix.cols() < WINDOW_SIZE {
    return regions;
  }

  for row in (0..=matrix.rows() - WINDOW_SIZE).step_by(WINDOW_SIZE) {
    for col in (0..=matrix.cols() - WINDOW_SIZE).step_by(WINDOW_SIZE) {
      let window: Vec<f64> = (row..row + WINDOW_SIZE)
        .flat_map(|r| matrix.row(r)[col..col + WINDOW_SIZE].iter().copied())
        .collect();

      let n = window.len() as f64;
      let mean = window.iter().sum::<f64>() / n;
      let std_dev = (window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

      if std_dev < UNIFORMITY_THRESHOLD {
        regions.push(UniformRegion {
          row,
          col,
          mean,
          std_dev,
        });
      }
    }
  }
  regions
}

pub fn has_uniform_regions(matrix: &ThermalMatrix) -> bool {
  uniform_regions(matrix).len() >= MIN_UNIFORM_REGIONS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flat_matrix_is_uniform() {
    let matrix = ThermalMatrix::from_rows(&vec![vec![30.0; 8]; 8]).unwrap();
    assert_eq!(uniform_regions(&matrix).len(), 4);
    assert!(has_uniform_regions(&matrix));
  }

  #[test]
  fn alternating_pixels_are_not_uniform() {
    let rows: Vec<Vec<f64>> = (0..8)
      .map(|r| (0..8).map(|c| if (r + c) % 2 == 0 { 25.0 } else { 45.0 }).collect())
      .collect();
    let matrix = ThermalMatrix::from_rows(&rows).unwrap();
    assert!(uniform_regions(&matrix).is_empty());
  }

  #[test]
  fn window_spread_uses_population_std_dev() {
    // 30 与 32.95 交替：总体标准差 1.475，样本标准差约 1.523
    let rows: Vec<Vec<f64>> = (0..4)
      .map(|r| (0..4).map(|c| if (r + c) % 2 == 0 { 30.0 } else { 32.95 }).collect())
      .collect();
    let matrix = ThermalMatrix::from_rows(&rows).unwrap();

    let regions = uniform_regions(&matrix);
    assert_eq!(regions.len(), 1);
    assert!((regions[0].std_dev - 1.475).abs() < 1e-9);
  }

  #[test]
  fn partial_windows_are_ignored() {
    let matrix = ThermalMatrix::from_rows(&vec![vec![30.0; 7]; 3]).unwrap();
    assert!(uniform_regions(&matrix).is_empty());
  }
}

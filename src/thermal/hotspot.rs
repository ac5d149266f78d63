// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/hotspot.rs - 热斑检测
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

use std::collections::VecDeque;

use crate::thermal::{matrix::ThermalMatrix, stats::TemperatureStats};

const HOTSPOT_SIGMA: f64 = 1.5;
const MAX_PANEL_HOTSPOTS: usize = 10;
const MAX_AREA_RATIO: f64 = 0.15;

/// 四连通的高温区域
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
  /// 按访问顺序记录的像素 `(row, col)`
  pub pixels: Vec<(usize, usize)>,
  pub size: usize,
  pub mean_temp: f64,
  pub max_temp: f64,
  /// `(row, col)` 均值
  pub centroid: (f64, f64),
}

pub fn hotspot_threshold(stats: &TemperatureStats) -> f64 {
  stats.mean + HOTSPOT_SIGMA * stats.std_dev
}

/// 高于 `均值 + 1.5σ` 的像素按四连通做洪水填充
pub fn find_hotspots(matrix: &ThermalMatrix, stats: &TemperatureStats) -> Vec<Hotspot> {
  let rows = matrix.rows();
  let cols = matrix.cols();
  let threshold = hotspot_threshold(stats);
  let values = matrix.values();
  let mut visited = vec![false; values.len()];
  let mut hotspots = Vec::new();

  for start in 0..values.len() {
    if visited[start] || values[start] <= threshold {
      continue;
    }

    let mut pixels = Vec::new();
    let mut queue = VecDeque::from([start]);
    visited[start] = true;

    while let Some(index) = queue.pop_front() {
      let (r, c) = (index / cols, index % cols);
      pixels.push((r, c));

      let mut neighbours = [None; 4];
      if r + 1 < rows {
        neighbours[0] = Some(index + cols);
      }
      if r > 0 {
        neighbours[1] = Some(index - cols);
      }
      if c + 1 < cols {
        neighbours[2] = Some(index + 1);
      }
      if c > 0 {
        neighbours[3] = Some(index - 1);
      }

      for next in neighbours.into_iter().flatten() {
        if !visited[next] && values[next] > threshold {
          visited[next] = true;
          queue.push_back(next);
        }
      }
    }

    let size = pixels.len();
    let total: f64 = pixels.iter().map(|&(r, c)| values[r * cols + c]).sum();
    let max_temp = pixels
      .iter()
      .map(|&(r, c)| values[r * cols + c])
      .fold(f64::NEG_INFINITY, f64::max);
    let (sum_r, sum_c) = pixels
      .iter()
      .fold((0.0, 0.0), |(sr, sc), &(r, c)| (sr + r as f64, sc + c as f64));

    hotspots.push(Hotspot {
      size,
      mean_temp: total / size as f64,
      max_temp,
      centroid: (sum_r / size as f64, sum_c / size as f64),
      pixels,
    });
  }

  hotspots
}

/// 热斑数量在 1 到 10 之间，且面积占比较小或分布符合面板特征
pub fn has_typical_hotspots(
  hotspots: &[Hotspot],
  matrix: &ThermalMatrix,
  patterned_distribution: bool,
) -> bool {
  if hotspots.is_empty() || hotspots.len() > MAX_PANEL_HOTSPOTS {
    return false;
  }

  let area: usize = hotspots.iter().map(|spot| spot.size).sum();
  let ratio = area as f64 / matrix.len() as f64;
  patterned_distribution || ratio < MAX_AREA_RATIO
}

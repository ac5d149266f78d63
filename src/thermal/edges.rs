// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/edges.rs - 自适应阈值边缘检测
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

use crate::thermal::{matrix::ThermalMatrix, stats::TemperatureStats};

const BASE_THRESHOLD: f64 = 1.5;
const STD_DEV_FACTOR: f64 = 0.15;
const HALF_WINDOW: isize = 1;

/// 二值边缘图，与输入矩阵同尺寸
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
  rows: usize,
  cols: usize,
  edges: Vec<bool>,
}

impl EdgeMap {
  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn is_edge(&self, row: usize, col: usize) -> bool {
    row < self.rows && col < self.cols && self.edges[row * self.cols + col]
  }

  pub fn count(&self) -> usize {
    self.edges.iter().filter(|e| **e).count()
  }

  /// 按行优先顺序遍历边缘点 `(row, col)`
  pub fn points(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
    self
      .edges
      .iter()
      .enumerate()
      .filter(|(_, edge)| **edge)
      .map(|(index, _)| (index / self.cols, index % self.cols))
  }
}

pub fn edge_threshold(stats: &TemperatureStats) -> f64 {
  BASE_THRESHOLD.max(stats.std_dev * STD_DEV_FACTOR)
}

/// 3x3 窗口加权中心差分，仅处理内部像素，矩阵外的值按 0 计
pub fn detect_edges(matrix: &ThermalMatrix, stats: &TemperatureStats) -> EdgeMap {
  let rows = matrix.rows();
  let cols = matrix.cols();
  let threshold = edge_threshold(stats);
  let mut edges = vec![false; rows * cols];

  for i in 1..rows.saturating_sub(1) {
    for j in 1..cols.saturating_sub(1) {
      let (r, c) = (i as isize, j as isize);
      let mut grad_x = 0.0;
      let mut grad_y = 0.0;

      for di in -HALF_WINDOW..=HALF_WINDOW {
        for dj in -HALF_WINDOW..=HALF_WINDOW {
          if di == 0 && dj == 0 {
            continue;
          }
          let weight = 1.0 / (4.0 * (di.abs() + dj.abs()) as f64);
          let (y, x) = (r + di, c + dj);
          grad_x += (matrix.value_or_zero(y, x + 1) - matrix.value_or_zero(y, x - 1)) * weight;
          grad_y += (matrix.value_or_zero(y + 1, x) - matrix.value_or_zero(y - 1, x)) * weight;
        }
      }

      if grad_x.hypot(grad_y) > threshold {
        edges[i * cols + j] = true;
      }
    }
  }

  EdgeMap { rows, cols, edges }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn matrix_from(rows: Vec<Vec<f64>>) -> ThermalMatrix {
    ThermalMatrix::from_rows(&rows).unwrap()
  }

  #[test]
  fn flat_field_has_no_edges() {
    let matrix = matrix_from(vec![vec![30.0; 8]; 8]);
    let stats = TemperatureStats::from_values(matrix.values()).unwrap();
    let edges = detect_edges(&matrix, &stats);
    // 边界处的补零会在第 1 行/列产生响应
    assert!(!edges.is_edge(4, 4));
    assert!(!edges.is_edge(0, 0));
  }

  #[test]
  fn step_produces_vertical_band() {
    let rows: Vec<Vec<f64>> = (0..10)
      .map(|_| (0..10).map(|c| if c < 5 { 25.0 } else { 45.0 }).collect())
      .collect();
    let matrix = matrix_from(rows);
    let stats = TemperatureStats::from_values(matrix.values()).unwrap();
    let edges = detect_edges(&matrix, &stats);

    for row in 2..8 {
      assert!(edges.is_edge(row, 4));
      assert!(edges.is_edge(row, 5));
      assert!(!edges.is_edge(row, 7));
    }
  }

  #[test]
  fn tiny_matrix_has_no_interior() {
    let matrix = matrix_from(vec![vec![25.0, 90.0]]);
    let stats = TemperatureStats::from_values(matrix.values()).unwrap();
    assert_eq!(detect_edges(&matrix, &stats).count(), 0);
  }
}

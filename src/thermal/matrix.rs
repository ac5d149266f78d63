// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/matrix.rs - 温度矩阵
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

use std::ops::RangeInclusive;

use thiserror::Error;

/// 传感器可接受的温度范围（摄氏度）
pub const SENSOR_RANGE: RangeInclusive<f64> = 20.0..=120.0;
/// MLX90640 的默认分辨率
pub const MLX90640_ROWS: usize = 24;
pub const MLX90640_COLS: usize = 32;

#[derive(Error, Debug, PartialEq)]
pub enum MatrixError {
  #[error("温度矩阵为空")]
  Empty,
  #[error("第 {row} 行有 {found} 列，期望 {expected} 列")]
  Ragged {
    row: usize,
    expected: usize,
    found: usize,
  },
  #[error("一维数据长度 {len} 无法按 {rows}x{cols} 重排")]
  Shape { len: usize, rows: usize, cols: usize },
}

/// 行优先存储的矩形温度网格
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalMatrix {
  rows: usize,
  cols: usize,
  data: Box<[f64]>,
}

impl ThermalMatrix {
  pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MatrixError> {
    let expected = rows.first().map(Vec::len).unwrap_or(0);
    if expected == 0 {
      return Err(MatrixError::Empty);
    }

    let mut data = Vec::with_capacity(rows.len() * expected);
    for (index, row) in rows.iter().enumerate() {
      if row.len() != expected {
        return Err(MatrixError::Ragged {
          row: index,
          expected,
          found: row.len(),
        });
      }
      data.extend_from_slice(row);
    }

    Ok(Self {
      rows: rows.len(),
      cols: expected,
      data: data.into_boxed_slice(),
    })
  }

  pub fn from_flat(values: Vec<f64>, rows: usize, cols: usize) -> Result<Self, MatrixError> {
    if values.is_empty() || rows == 0 || cols == 0 {
      return Err(MatrixError::Empty);
    }
    if values.len() != rows * cols {
      return Err(MatrixError::Shape {
        len: values.len(),
        rows,
        cols,
      });
    }

    Ok(Self {
      rows,
      cols,
      data: values.into_boxed_slice(),
    })
  }

  /// 校验原始网格：非空、各行等长、数值有限，且至少一个像素落在传感器范围内。
  /// 不合法时返回 `false`，从不 panic。
  pub fn validate(rows: &[Vec<f64>]) -> bool {
    let Some(expected) = rows.first().map(Vec::len) else {
      return false;
    };
    if expected == 0 || rows.iter().any(|row| row.len() != expected) {
      return false;
    }

    let mut in_range = false;
    for value in rows.iter().flatten() {
      if !value.is_finite() {
        return false;
      }
      in_range |= SENSOR_RANGE.contains(value);
    }
    in_range
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn get(&self, row: usize, col: usize) -> Option<f64> {
    if row < self.rows && col < self.cols {
      Some(self.data[row * self.cols + col])
    } else {
      None
    }
  }

  /// 越界坐标按 0 处理
  pub fn value_or_zero(&self, row: isize, col: isize) -> f64 {
    if row < 0 || col < 0 {
      return 0.0;
    }
    self.get(row as usize, col as usize).unwrap_or(0.0)
  }

  pub fn row(&self, row: usize) -> &[f64] {
    &self.data[row * self.cols..(row + 1) * self.cols]
  }

  pub fn values(&self) -> &[f64] {
    &self.data
  }
}

impl TryFrom<&[Vec<f64>]> for ThermalMatrix {
  type Error = MatrixError;

  fn try_from(rows: &[Vec<f64>]) -> Result<Self, Self::Error> {
    Self::from_rows(rows)
  }
}

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/stats.rs - 温度统计
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

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureStats {
  pub min: f64,
  pub max: f64,
  pub mean: f64,
  pub median: f64,
  /// 总体标准差
  pub std_dev: f64,
  pub q1: f64,
  pub q3: f64,
  pub iqr: f64,
}

impl TemperatureStats {
  pub fn from_values(values: &[f64]) -> Option<Self> {
    if values.is_empty() {
      return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
      (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
      sorted[n / 2]
    };
    let q1 = sorted[n / 4];
    let q3 = sorted[3 * n / 4];

    Some(Self {
      min: sorted[0],
      max: sorted[n - 1],
      mean,
      median,
      std_dev: variance.sqrt(),
      q1,
      q3,
      iqr: q3 - q1,
    })
  }

  pub fn range(&self) -> f64 {
    self.max - self.min
  }

  /// 均值为 0 时无定义
  pub fn coefficient_of_variation(&self) -> Option<f64> {
    if self.mean == 0.0 {
      None
    } else {
      Some(self.std_dev / self.mean)
    }
  }
}

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/confidence.rs - 置信度评分
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

use crate::thermal::stats::TemperatureStats;

pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

pub const GRID_WEIGHT: f64 = 0.30;
pub const RECTANGULAR_WEIGHT: f64 = 0.15;
pub const UNIFORM_WEIGHT: f64 = 0.20;
pub const GRADIENT_WEIGHT: f64 = 0.20;
pub const HOTSPOT_WEIGHT: f64 = 0.15;

const BOOST: f64 = 1.1;
const PENALTY: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
  pub has_grid_pattern: bool,
  pub has_rectangular_regions: bool,
  pub has_uniform_regions: bool,
  pub has_characteristic_gradient: bool,
  pub has_hotspots: bool,
  pub temp_stats: Option<TemperatureStats>,
}

/// 加权求和后按温度范围与变异系数调整，结果限制在 [0, 1]
pub fn confidence_score(inputs: &ConfidenceInputs) -> f64 {
  let mut score = [
    (inputs.has_grid_pattern, GRID_WEIGHT),
    (inputs.has_rectangular_regions, RECTANGULAR_WEIGHT),
    (inputs.has_uniform_regions, UNIFORM_WEIGHT),
    (inputs.has_characteristic_gradient, GRADIENT_WEIGHT),
    (inputs.has_hotspots, HOTSPOT_WEIGHT),
  ]
  .iter()
  .filter(|(fired, _)| *fired)
  .map(|(_, weight)| weight)
  .sum::<f64>();

  if let Some(stats) = &inputs.temp_stats {
    let range = stats.range();
    if (5.0..=40.0).contains(&range) {
      score *= BOOST;
    } else if !(2.0..=60.0).contains(&range) {
      score *= PENALTY;
    }

    if let Some(cv) = stats.coefficient_of_variation() {
      if (0.05..=0.3).contains(&cv) {
        score *= BOOST;
      } else if !(0.01..=0.5).contains(&cv) {
        score *= PENALTY;
      }
    }
  }

  score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn inputs(flags: [bool; 5], stats: Option<TemperatureStats>) -> ConfidenceInputs {
    ConfidenceInputs {
      has_grid_pattern: flags[0],
      has_rectangular_regions: flags[1],
      has_uniform_regions: flags[2],
      has_characteristic_gradient: flags[3],
      has_hotspots: flags[4],
      temp_stats: stats,
    }
  }

  #[test]
  fn weights_sum_to_one() {
    assert!((confidence_score(&inputs([true; 5], None)) - 1.0).abs() < 1e-12);
    assert_eq!(confidence_score(&inputs([false; 5], None)), 0.0);
  }

  #[test]
  fn score_is_monotone_in_detectors() {
    let stats = TemperatureStats::from_values(&[25.0, 30.0, 35.0, 40.0]);
    let mut flags = [false; 5];
    let mut previous = confidence_score(&inputs(flags, stats));
    for index in 0..flags.len() {
      flags[index] = true;
      let next = confidence_score(&inputs(flags, stats));
      assert!(next >= previous, "{} < {}", next, previous);
      assert!((0.0..=1.0).contains(&next));
      previous = next;
    }
  }

  #[test]
  fn statistics_adjust_the_score() {
    // 范围 20，变异系数 10/35：两次提升
    let typical = TemperatureStats::from_values(&[25.0, 45.0]);
    let score = confidence_score(&inputs([true, false, true, true, false], typical));
    assert!((score - 0.7 * 1.1 * 1.1).abs() < 1e-9);

    // 范围 0，变异系数 0：两次惩罚
    let flat = TemperatureStats::from_values(&[30.0, 30.0]);
    let score = confidence_score(&inputs([false, false, true, true, false], flat));
    assert!((score - 0.4 * 0.9 * 0.9).abs() < 1e-9);
  }

  #[test]
  fn zero_mean_skips_variation() {
    let zero = TemperatureStats::from_values(&[-5.0, 5.0]);
    let score = confidence_score(&inputs([true, false, false, false, false], zero));
    // 范围 10 提升一次
    assert!((score - 0.3 * 1.1).abs() < 1e-9);
  }
}

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/hough.rs - 霍夫直线检测与网格判定
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

use std::f64::consts::{FRAC_PI_2, FRAC_PI_6, FRAC_PI_8, PI};

use tracing::debug;

use crate::thermal::edges::EdgeMap;

const THETA_STEPS: usize = 90;
const THETA_STEP_DEGREES: f64 = 2.0;
const MIN_VOTES: u32 = 3;
const PEAK_RADIUS: isize = 2;
const MAX_LINES: usize = 10;

/// 角度分组容差
const AXIS_TOLERANCE: f64 = FRAC_PI_6;
const MAX_PARALLEL_STD_DEV: f64 = FRAC_PI_8;

pub const GRID_MIN_LINES: usize = 3;
pub const GRID_MIN_PARALLELISM: f64 = 0.7;

/// 法线式直线 `x cos θ + y sin θ = ρ`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
  pub rho: i32,
  /// 弧度，范围 [0, π)
  pub theta: f64,
  pub votes: u32,
}

struct Accumulator {
  rho_max: i32,
  votes: Vec<u32>,
}

impl Accumulator {
  fn rho_bins(&self) -> usize {
    (2 * self.rho_max + 1) as usize
  }

  fn at(&self, rho_index: usize, theta_index: usize) -> u32 {
    self.votes[rho_index * THETA_STEPS + theta_index]
  }

  /// θ 越过 [0°, 180°) 的边界时 ρ 取反
  fn neighbour(&self, rho: i32, theta_index: isize) -> Option<(usize, usize)> {
    let steps = THETA_STEPS as isize;
    let (rho, theta_index) = if theta_index < 0 {
      (-rho, theta_index + steps)
    } else if theta_index >= steps {
      (-rho, theta_index - steps)
    } else {
      (rho, theta_index)
    };

    if rho.abs() > self.rho_max {
      return None;
    }
    Some(((rho + self.rho_max) as usize, theta_index as usize))
  }

  /// 局部极大：邻域内无更高票数，票数相同时按扫描顺序保留最先者
  fn is_peak(&self, rho_index: usize, theta_index: usize) -> bool {
    let votes = self.at(rho_index, theta_index);
    let rho = rho_index as i32 - self.rho_max;

    for dr in -PEAK_RADIUS..=PEAK_RADIUS {
      for dt in -PEAK_RADIUS..=PEAK_RADIUS {
        if dr == 0 && dt == 0 {
          continue;
        }
        let Some((nr, nt)) = self.neighbour(rho + dr as i32, theta_index as isize + dt) else {
          continue;
        };
        let other = self.at(nr, nt);
        if other > votes || (other == votes && (nr, nt) < (rho_index, theta_index)) {
          return false;
        }
      }
    }
    true
  }
}

fn theta_of(index: usize) -> f64 {
  (index as f64 * THETA_STEP_DEGREES).to_radians()
}

/// 检测最多 10 条直线，按票数从高到低排列
pub fn detect_lines(edges: &EdgeMap) -> Vec<Line> {
  let rows = edges.rows() as f64;
  let cols = edges.cols() as f64;
  let rho_max = (rows * rows + cols * cols).sqrt().ceil() as i32;

  let trig: Vec<(f64, f64)> = (0..THETA_STEPS)
    .map(|t| {
      let theta = theta_of(t);
      (theta.cos(), theta.sin())
    })
    .collect();

  let mut accumulator = Accumulator {
    rho_max,
    votes: vec![0; (2 * rho_max + 1) as usize * THETA_STEPS],
  };

  for (y, x) in edges.points() {
    for (t, (cos, sin)) in trig.iter().enumerate() {
      let rho = (x as f64 * cos + y as f64 * sin).round() as i32;
      if rho.abs() <= rho_max {
        accumulator.votes[(rho + rho_max) as usize * THETA_STEPS + t] += 1;
      }
    }
  }

  let mut lines = Vec::new();
  for r in 0..accumulator.rho_bins() {
    for t in 0..THETA_STEPS {
      let votes = accumulator.at(r, t);
      if votes >= MIN_VOTES && accumulator.is_peak(r, t) {
        lines.push(Line {
          rho: r as i32 - rho_max,
          theta: theta_of(t),
          votes,
        });
      }
    }
  }

  // 稳定排序，票数相同保持扫描顺序
  lines.sort_by(|a, b| b.votes.cmp(&a.votes));
  lines.truncate(MAX_LINES);
  debug!("霍夫变换检测到 {} 条直线", lines.len());
  lines
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineGroups {
  /// 法线接近 x 轴（θ ≈ 0 或 π）的直线
  pub vertical: Vec<Line>,
  /// 法线接近 y 轴（θ ≈ π/2）的直线
  pub horizontal: Vec<Line>,
}

pub fn categorize_lines(lines: &[Line]) -> LineGroups {
  let mut groups = LineGroups::default();
  for line in lines {
    let theta = line.theta.rem_euclid(PI);
    let from_x_axis = theta.min(PI - theta);
    if from_x_axis < AXIS_TOLERANCE {
      groups.vertical.push(*line);
    } else if (FRAC_PI_2 - theta).abs() < AXIS_TOLERANCE {
      groups.horizontal.push(*line);
    }
  }
  groups
}

/// 轴向圆形标准差，0° 与 178° 视为接近
fn axial_std_dev(lines: &[Line]) -> f64 {
  let n = lines.len() as f64;
  let (sum_cos, sum_sin) = lines.iter().fold((0.0, 0.0), |(c, s), line| {
    (c + (2.0 * line.theta).cos(), s + (2.0 * line.theta).sin())
  });
  let resultant = ((sum_cos / n).hypot(sum_sin / n)).min(1.0);
  if resultant <= f64::EPSILON {
    return f64::INFINITY;
  }
  (-2.0 * resultant.ln()).max(0.0).sqrt() / 2.0
}

/// 平行度评分，范围 [0, 1]，少于两条直线时为 0
pub fn parallelism(lines: &[Line]) -> f64 {
  if lines.len() < 2 {
    return 0.0;
  }
  1.0 - (axial_std_dev(lines) / MAX_PARALLEL_STD_DEV).min(1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridAnalysis {
  pub lines: Vec<Line>,
  pub groups: LineGroups,
  pub vertical_parallelism: f64,
  pub horizontal_parallelism: f64,
}

impl GridAnalysis {
  pub fn from_edges(edges: &EdgeMap) -> Self {
    let lines = detect_lines(edges);
    let groups = categorize_lines(&lines);
    let vertical_parallelism = parallelism(&groups.vertical);
    let horizontal_parallelism = parallelism(&groups.horizontal);
    Self {
      lines,
      groups,
      vertical_parallelism,
      horizontal_parallelism,
    }
  }

  /// 两个方向各有至少 3 条近似平行的直线
  pub fn is_grid(&self) -> bool {
    self.groups.vertical.len() >= GRID_MIN_LINES
      && self.groups.horizontal.len() >= GRID_MIN_LINES
      && self.vertical_parallelism > GRID_MIN_PARALLELISM
      && self.horizontal_parallelism > GRID_MIN_PARALLELISM
  }
}

/// 边缘图中是否存在横竖两组各至少 3 条、且彼此平行的直线。
///
/// 已知局限：边缘带宽约 4 像素，仅保留得票最多的 `MAX_LINES` 条直线。
/// 单元格较大的方形棋盘（如 48x48 的 4x4 棋盘）可以识别；
/// 24x32 传感器画面上的 3x3、4x4 粗棋盘则识别不出，
/// 较长的水平线与穿过边缘带的斜线占满名额，竖直组为空。
pub fn has_grid_pattern(edges: &EdgeMap) -> bool {
  GridAnalysis::from_edges(edges).is_grid()
}

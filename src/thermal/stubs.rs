// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/stubs.rs - 占位检测器
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

/// 尚未实现真实算法的子检测器，返回固定结果。
///
/// 默认值与现有行为一致：矩形区域不通过，特征梯度、热斑空间分布
/// 以及处理后热力图均通过。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorStubs {
  pub rectangular_regions: bool,
  pub characteristic_gradient: bool,
  pub hotspot_distribution: bool,
  pub processed_heatmap: bool,
}

impl Default for DetectorStubs {
  fn default() -> Self {
    Self {
      rectangular_regions: false,
      characteristic_gradient: true,
      hotspot_distribution: true,
      processed_heatmap: true,
    }
  }
}

impl DetectorStubs {
  /// 所有占位检测器均不通过，只保留真实算法的贡献
  pub fn strict() -> Self {
    Self {
      rectangular_regions: false,
      characteristic_gradient: false,
      hotspot_distribution: false,
      processed_heatmap: false,
    }
  }
}

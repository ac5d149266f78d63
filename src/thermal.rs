// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal.rs - 热成像模式分析
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

use serde_json::Value;

/// 使用默认占位配置判断载荷是否来自光伏面板热成像
pub fn classify_is_solar_panel(payload: &Value, uri: &str) -> bool {
  SolarPanelClassifier::default().is_solar_panel(payload, Some(uri))
}

mod classifier;
mod confidence;
mod edges;
mod hotspot;
mod hough;
mod matrix;
mod payload;
mod regions;
mod stats;
mod stubs;
mod uri;

#[cfg(feature = "read_image_file")]
mod image_file;

pub use self::classifier::{Evidence, MatrixAnalysis, SolarPanelClassifier, Verdict};
pub use self::confidence::{CONFIDENCE_THRESHOLD, ConfidenceInputs, confidence_score};
pub use self::edges::{EdgeMap, detect_edges};
pub use self::hotspot::{Hotspot, find_hotspots, has_typical_hotspots};
pub use self::hough::{
  GridAnalysis, Line, LineGroups, categorize_lines, detect_lines, has_grid_pattern, parallelism,
};
pub use self::matrix::{MLX90640_COLS, MLX90640_ROWS, MatrixError, SENSOR_RANGE, ThermalMatrix};
pub use self::payload::{PayloadEvidence, ThermalPayload};
pub use self::regions::{UniformRegion, has_uniform_regions, uniform_regions};
pub use self::stats::TemperatureStats;
pub use self::stubs::DetectorStubs;
pub use self::uri::estimate_from_uri;

#[cfg(feature = "read_image_file")]
pub use self::image_file::{ThermalImageInput, ThermalImageInputError};

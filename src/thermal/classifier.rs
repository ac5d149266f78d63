// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/classifier.rs - 光伏面板判定
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
use tracing::{debug, info, warn};

use crate::thermal::{
  confidence::{CONFIDENCE_THRESHOLD, ConfidenceInputs, confidence_score},
  edges::detect_edges,
  hotspot::{Hotspot, find_hotspots, has_typical_hotspots},
  hough::GridAnalysis,
  matrix::ThermalMatrix,
  payload::{PayloadEvidence, ThermalPayload},
  regions::has_uniform_regions,
  stats::TemperatureStats,
  stubs::DetectorStubs,
  uri::estimate_from_uri,
};

/// 缺陷分类相关的关键字
const TAXONOMY_KEYWORDS: [&str; 13] = [
  "cell",
  "defect",
  "bypass",
  "diode",
  "hotspot",
  "substring",
  "circuit",
  "crack",
  "shadow",
  "shading",
  "dust",
  "solar",
  "panel",
];

const STRUCTURED_KEYWORDS: [&str; 4] = ["solar", "panel", "module", "pv"];

/// 判定依据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
  Annotations,
  Labels,
  Matrix,
  /// 矩阵字段存在但不合法，按放行处理
  InvalidMatrix,
  Heatmap,
  Structured,
  Uri,
  Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
  pub is_solar_panel: bool,
  pub evidence: Evidence,
}

impl Verdict {
  fn new(is_solar_panel: bool, evidence: Evidence) -> Self {
    Self {
      is_solar_panel,
      evidence,
    }
  }
}

/// 单个矩阵的几何分析结果
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixAnalysis {
  pub stats: TemperatureStats,
  pub grid: GridAnalysis,
  pub hotspots: Vec<Hotspot>,
  pub inputs: ConfidenceInputs,
  pub confidence: f64,
}

impl MatrixAnalysis {
  pub fn is_solar_panel(&self) -> bool {
    self.confidence >= CONFIDENCE_THRESHOLD
  }
}

#[derive(Debug, Clone, Default)]
pub struct SolarPanelClassifier {
  stubs: DetectorStubs,
}

impl SolarPanelClassifier {
  pub fn new(stubs: DetectorStubs) -> Self {
    Self { stubs }
  }

  pub fn stubs(&self) -> &DetectorStubs {
    &self.stubs
  }

  pub fn is_solar_panel(&self, payload: &Value, source_uri: Option<&str>) -> bool {
    self.evaluate(payload, source_uri).is_solar_panel
  }

  /// 按证据优先级依次判断，命中即返回
  pub fn evaluate(&self, payload: &Value, source_uri: Option<&str>) -> Verdict {
    let evidence = PayloadEvidence::from_json(payload);

    if evidence.annotated {
      debug!("载荷带有缺陷标注");
      return Verdict::new(true, Evidence::Annotations);
    }

    if let Some(label) = evidence
      .labels
      .iter()
      .find(|label| TAXONOMY_KEYWORDS.iter().any(|k| label.contains(k)))
    {
      debug!("标签 {} 命中缺陷关键字", label);
      return Verdict::new(true, Evidence::Labels);
    }

    match &evidence.thermal {
      ThermalPayload::Matrix(rows) if !rows.is_empty() => {
        return match self.analyze_rows(rows) {
          Some(analysis) => {
            info!(
              "温度矩阵分析完成: 置信度 {:.3}, 网格 {}, 热斑 {}",
              analysis.confidence,
              analysis.inputs.has_grid_pattern,
              analysis.hotspots.len()
            );
            Verdict::new(analysis.is_solar_panel(), Evidence::Matrix)
          }
          None => {
            warn!("温度矩阵不合法，默认放行");
            Verdict::new(true, Evidence::InvalidMatrix)
          }
        };
      }
      ThermalPayload::Matrix(_) | ThermalPayload::Malformed(_) => {
        warn!("温度矩阵为空或无法解析，默认放行");
        return Verdict::new(true, Evidence::InvalidMatrix);
      }
      ThermalPayload::Heatmap => {
        return Verdict::new(self.stubs.processed_heatmap, Evidence::Heatmap);
      }
      ThermalPayload::Structured(text) => {
        let found = STRUCTURED_KEYWORDS.iter().any(|k| text.contains(k));
        return Verdict::new(found, Evidence::Structured);
      }
      ThermalPayload::Empty => {}
    }

    if let Some(uri) = source_uri
      && !uri.is_empty()
    {
      return Verdict::new(estimate_from_uri(uri), Evidence::Uri);
    }

    debug!("没有可判定的信号，默认视为光伏面板");
    Verdict::new(true, Evidence::Default)
  }

  fn analyze_rows(&self, rows: &[Vec<f64>]) -> Option<MatrixAnalysis> {
    if !ThermalMatrix::validate(rows) {
      return None;
    }
    let matrix = ThermalMatrix::from_rows(rows).ok()?;
    self.analyze_matrix(&matrix)
  }

  /// 运行全部几何检测器并计算置信度，矩阵为空时返回 `None`
  pub fn analyze_matrix(&self, matrix: &ThermalMatrix) -> Option<MatrixAnalysis> {
    let stats = TemperatureStats::from_values(matrix.values())?;

    let edges = detect_edges(matrix, &stats);
    let grid = GridAnalysis::from_edges(&edges);
    let hotspots = find_hotspots(matrix, &stats);

    let inputs = ConfidenceInputs {
      has_grid_pattern: grid.is_grid(),
      has_rectangular_regions: self.stubs.rectangular_regions,
      has_uniform_regions: has_uniform_regions(matrix),
      has_characteristic_gradient: self.stubs.characteristic_gradient,
      has_hotspots: has_typical_hotspots(&hotspots, matrix, self.stubs.hotspot_distribution),
      temp_stats: Some(stats),
    };
    let confidence = confidence_score(&inputs);

    Some(MatrixAnalysis {
      stats,
      grid,
      hotspots,
      inputs,
      confidence,
    })
  }
}

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/model/catalog.rs - 缺陷类别目录
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

use crate::model::Detection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefectInfo {
  pub key: &'static str,
  pub display_name: &'static str,
  pub stress_factors: &'static [&'static str],
  pub priority: &'static str,
  pub power_loss: &'static str,
  pub category: &'static str,
  /// 异常类别（Class of Abnormality）
  pub abnormality: &'static str,
  pub description: &'static str,
  pub recommendations: &'static [&'static str],
  /// 标注框颜色
  pub color: [u8; 3],
}

const RED: [u8; 3] = [255, 0, 0];
const GREEN: [u8; 3] = [0, 128, 0];
const BLUE: [u8; 3] = [0, 0, 255];
const ORANGE: [u8; 3] = [255, 165, 0];

pub const DEFECT_CATALOG: [DefectInfo; 4] = [
  DefectInfo {
    key: "partial-shading",
    display_name: "Partial Shading",
    stress_factors: &["Environmental", "External Objects"],
    priority: "Medium",
    power_loss: "15-25%",
    category: "Environmental",
    abnormality: "Thermal Stress",
    description: "Occurs when a portion of the solar panel is shaded by objects like trees, buildings, or debris, causing temperature differences and reduced efficiency.",
    recommendations: &[
      "Remove or trim nearby vegetation causing shade",
      "Consider repositioning panels if possible",
      "Install micro-inverters or power optimizers",
      "Regular cleaning and maintenance schedule",
      "Monitor shading patterns throughout the day",
    ],
    color: GREEN,
  },
  DefectInfo {
    key: "dust-deposit",
    display_name: "Dust Deposit",
    stress_factors: &["Environmental", "Maintenance"],
    priority: "Low",
    power_loss: "3-15%",
    category: "Maintenance",
    abnormality: "Surface Contamination",
    description: "Accumulation of dust, dirt, or other particles on the surface of solar panels, reducing light transmission and power output.",
    recommendations: &[
      "Implement regular cleaning schedule",
      "Install automated cleaning systems",
      "Monitor local air quality and adjust cleaning frequency",
      "Use anti-soiling coatings",
      "Document cleaning history and efficiency impact",
    ],
    color: BLUE,
  },
  DefectInfo {
    key: "short-circuit",
    display_name: "Short Circuit",
    stress_factors: &["Electrical", "Manufacturing"],
    priority: "High",
    power_loss: "50-100%",
    category: "Electrical",
    abnormality: "Circuit Failure",
    description: "Electrical malfunction where current follows an unintended path, potentially causing severe damage and safety hazards.",
    recommendations: &[
      "Immediate system shutdown",
      "Professional inspection required",
      "Replace affected components",
      "Check wiring and connections",
      "Install surge protection devices",
      "Update maintenance protocol",
    ],
    color: RED,
  },
  DefectInfo {
    key: "bypass-diode_failure",
    display_name: "Bypass Diode Failure",
    stress_factors: &["Electrical", "Temperature"],
    priority: "High",
    power_loss: "30-40%",
    category: "Component",
    abnormality: "Diode Malfunction",
    description: "Failure of bypass diodes that normally protect solar cells from hot spots and reverse current flow.",
    recommendations: &[
      "Replace failed bypass diodes",
      "Check junction box integrity",
      "Thermal imaging inspection",
      "Verify string configuration",
      "Monitor voltage characteristics",
      "Professional repair required",
    ],
    color: ORANGE,
  },
];

/// 按类别名查找（忽略大小写）
pub fn lookup(defect_class: &str) -> Option<&'static DefectInfo> {
  let wanted = defect_class.trim().to_ascii_lowercase();
  DEFECT_CATALOG.iter().find(|info| info.key == wanted)
}

pub fn display_name(defect_class: &str) -> &str {
  lookup(defect_class)
    .map(|info| info.display_name)
    .unwrap_or(defect_class)
}

/// 标注框颜色，`bypass-diode` 前缀的类别统一使用橙色，未知类别为红色
pub fn class_color(defect_class: &str) -> [u8; 3] {
  if let Some(info) = lookup(defect_class) {
    return info.color;
  }
  if defect_class.to_ascii_lowercase().starts_with("bypass-diode") {
    return ORANGE;
  }
  RED
}

impl Detection {
  /// 用目录信息补全服务端未返回的字段
  pub fn enrich_from_catalog(&mut self) {
    let Some(info) = lookup(&self.defect_class) else {
      return;
    };

    if self.priority_raw.is_empty() {
      self.priority_raw = info.priority.to_string();
    }
    if self.power_loss.is_empty() {
      self.power_loss = info.power_loss.to_string();
    }
    if self.category.is_empty() {
      self.category = info.category.to_string();
    }
    if self.description.is_empty() {
      self.description = info.description.to_string();
    }
    if self.stress_factors.is_empty() {
      self.stress_factors = info.stress_factors.iter().map(|s| s.to_string()).collect();
    }
    if self.recommendations.is_empty() {
      self.recommendations = info.recommendations.iter().map(|s| s.to_string()).collect();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_ignores_case() {
    let info = lookup("Short-Circuit").expect("short-circuit should be catalogued");
    assert_eq!(info.priority, "High");
    assert!(lookup("single-cell").is_none());
  }

  #[test]
  fn enrich_keeps_server_fields() {
    let mut detection = Detection::new("dust-deposit");
    detection.priority_raw = "2 - Medium".to_string();
    detection.enrich_from_catalog();

    assert_eq!(detection.priority_raw, "2 - Medium");
    assert_eq!(detection.power_loss, "3-15%");
    assert_eq!(detection.recommendations.len(), 5);
  }

  #[test]
  fn bypass_diode_variants_are_orange() {
    assert_eq!(class_color("bypass-diode"), ORANGE);
    assert_eq!(class_color("bypass-diode_failure"), ORANGE);
    assert_eq!(class_color("substring"), RED);
  }
}

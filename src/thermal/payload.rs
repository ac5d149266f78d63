// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/payload.rs - 原始载荷适配
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
use tracing::{debug, warn};

use crate::thermal::matrix::{MLX90640_COLS, MLX90640_ROWS};

/// 温度矩阵字段，按优先级排列
pub const MATRIX_FIELDS: [&str; 4] = ["thermal_data", "temperature_matrix", "pixels", "raw_data"];
pub const HEATMAP_FIELDS: [&str; 2] = ["thermalImageData", "heatmap"];
pub const STRUCTURED_FIELDS: [&str; 2] = ["results", "analysis"];

const LABEL_LIST_FIELDS: [&str; 3] = ["labels", "classes", "tags"];
const BOX_LIST_FIELDS: [&str; 4] = ["boxes", "predictions", "bboxes", "detections"];
const BOX_NAME_FIELDS: [&str; 3] = ["class", "label", "name"];

/// 载荷中的温度数据形态
#[derive(Debug, Clone, PartialEq)]
pub enum ThermalPayload {
  /// 二维温度网格（尚未校验）
  Matrix(Vec<Vec<f64>>),
  /// 存在矩阵字段但无法解析
  Malformed(String),
  /// 仅有渲染后的热力图
  Heatmap,
  /// 先前分析留下的文本
  Structured(String),
  Empty,
}

/// 从 JSON 载荷中提取的全部证据
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadEvidence {
  /// 载荷显式携带缺陷或标注
  pub annotated: bool,
  /// 标签、类别以及检测框名称，已转为小写
  pub labels: Vec<String>,
  pub thermal: ThermalPayload,
}

impl PayloadEvidence {
  pub fn from_json(payload: &Value) -> Self {
    let Some(object) = payload.as_object() else {
      return Self {
        annotated: false,
        labels: Vec::new(),
        thermal: ThermalPayload::Empty,
      };
    };

    let annotated = has_items(object.get("defects"))
      || has_items(object.get("annotations"))
      || has_items(payload.pointer("/results/defects"))
      || has_items(payload.pointer("/analysis/defects"));

    let mut labels = Vec::new();
    for field in LABEL_LIST_FIELDS {
      collect_strings(object.get(field), &mut labels);
    }
    for field in BOX_LIST_FIELDS {
      if let Some(Value::Array(items)) = object.get(field) {
        for item in items {
          for name in BOX_NAME_FIELDS {
            if let Some(Value::String(text)) = item.get(name) {
              labels.push(text.to_lowercase());
            }
          }
        }
      }
    }

    Self {
      annotated,
      labels,
      thermal: ThermalPayload::from_json(payload),
    }
  }
}

impl ThermalPayload {
  pub fn from_json(payload: &Value) -> Self {
    for field in MATRIX_FIELDS {
      if let Some(value) = payload.get(field)
        && !value.is_null()
      {
        debug!("在字段 {} 中找到温度数据", field);
        return match matrix_from_value(value) {
          Ok(rows) => ThermalPayload::Matrix(rows),
          Err(reason) => {
            warn!("字段 {} 的温度数据无法解析: {}", field, reason);
            ThermalPayload::Malformed(reason)
          }
        };
      }
    }

    if HEATMAP_FIELDS
      .iter()
      .any(|field| payload.get(field).is_some_and(|v| !v.is_null()))
    {
      return ThermalPayload::Heatmap;
    }

    for field in STRUCTURED_FIELDS {
      if let Some(value) = payload.get(field)
        && !value.is_null()
      {
        let text = match value {
          Value::String(text) => text.to_lowercase(),
          other => other.to_string().to_lowercase(),
        };
        return ThermalPayload::Structured(text);
      }
    }

    ThermalPayload::Empty
  }
}

fn has_items(value: Option<&Value>) -> bool {
  match value {
    Some(Value::Array(items)) => !items.is_empty(),
    Some(Value::Object(map)) => !map.is_empty(),
    _ => false,
  }
}

fn collect_strings(value: Option<&Value>, out: &mut Vec<String>) {
  match value {
    Some(Value::String(text)) => out.push(text.to_lowercase()),
    Some(Value::Array(items)) => {
      for item in items {
        if let Value::String(text) = item {
          out.push(text.to_lowercase());
        }
      }
    }
    _ => {}
  }
}

/// 接受二维数组、长度为 768 的一维数组，以及二者的 JSON 字符串形式
fn matrix_from_value(value: &Value) -> Result<Vec<Vec<f64>>, String> {
  match value {
    Value::String(text) => {
      let parsed: Value =
        serde_json::from_str(text).map_err(|err| format!("JSON 解析失败: {}", err))?;
      if parsed.is_string() {
        return Err("嵌套的字符串载荷".to_string());
      }
      matrix_from_value(&parsed)
    }
    Value::Array(items) if items.is_empty() => Ok(Vec::new()),
    Value::Array(items) if items[0].is_array() => items
      .iter()
      .enumerate()
      .map(|(index, row)| numbers(row).ok_or_else(|| format!("第 {} 行包含非数值", index)))
      .collect(),
    Value::Array(_) => {
      let flat = numbers(value).ok_or_else(|| "一维数据包含非数值".to_string())?;
      if flat.len() != MLX90640_ROWS * MLX90640_COLS {
        return Err(format!(
          "一维数据长度 {} 不是 {}x{}",
          flat.len(),
          MLX90640_ROWS,
          MLX90640_COLS
        ));
      }
      Ok(flat.chunks(MLX90640_COLS).map(<[f64]>::to_vec).collect())
    }
    other => Err(format!("不支持的类型: {}", json_kind(other))),
  }
}

fn numbers(value: &Value) -> Option<Vec<f64>> {
  value.as_array()?.iter().map(Value::as_f64).collect()
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/thermal/uri.rs - 基于图像 URI 的关键字估计
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

use tracing::{debug, warn};

const NEGATIVE_KEYWORDS: [&str; 4] = ["screenshot", "profile", "avatar", "capturedesk"];

const POSITIVE_KEYWORDS: [&str; 13] = [
  "solar",
  "panel",
  "pv",
  "photovoltaic",
  "module",
  "thermal",
  "infrared",
  "array",
  "bypass",
  "diode",
  "cell",
  "substring",
  "mlx",
];

/// 本应用自身快照流程产生的路径
const WORKFLOW_KEYWORDS: [&str; 2] = ["snapshot", "camera"];

const PLAIN_KEYWORDS: [&str; 4] = ["solar", "panel", "thermal", "mlx"];

/// `first` 之后某处出现 `second`
fn ordered_pair(text: &str, first: &str, second: &str) -> bool {
  text
    .find(first)
    .is_some_and(|start| text[start + first.len()..].contains(second))
}

fn strong_sensor_pattern(text: &str) -> bool {
  text.contains("mlx90640") || ordered_pair(text, "thermal", "data") || ordered_pair(text, "ir", "map")
}

/// 最后的兜底判断：仅依据图像来源标识中的关键字
pub fn estimate_from_uri(uri: &str) -> bool {
  let decoded = match urlencoding::decode(uri) {
    Ok(decoded) => decoded.to_lowercase(),
    Err(err) => {
      warn!("URI 解码失败，使用原始字符串: {}", err);
      let plain = uri.to_lowercase();
      return PLAIN_KEYWORDS.iter().any(|k| plain.contains(k));
    }
  };

  if NEGATIVE_KEYWORDS.iter().any(|k| decoded.contains(k)) {
    debug!("URI 含有非光伏关键字: {}", decoded);
    return false;
  }

  if strong_sensor_pattern(&decoded) {
    debug!("URI 匹配 MLX90640 数据特征: {}", decoded);
    return true;
  }

  let matched: Vec<&str> = POSITIVE_KEYWORDS
    .iter()
    .copied()
    .filter(|k| decoded.contains(k))
    .collect();
  if !matched.is_empty() {
    debug!("URI 关键字匹配: {}", matched.join(", "));
    return true;
  }

  WORKFLOW_KEYWORDS.iter().any(|k| decoded.contains(k))
}

// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/pipeline/reduce.rs - 检测结果归并
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

use crate::model::{DefectRecord, Detection};

/// 按缺陷类别分组，类别顺序与组内顺序均保持首次出现的顺序
pub fn group_by_class(detections: &[Detection]) -> Vec<(String, Vec<Detection>)> {
  let mut groups: Vec<(String, Vec<Detection>)> = Vec::new();
  for detection in detections {
    match groups
      .iter_mut()
      .find(|(class, _)| *class == detection.defect_class)
    {
      Some((_, members)) => members.push(detection.clone()),
      None => groups.push((detection.defect_class.clone(), vec![detection.clone()])),
    }
  }
  groups
}

/// 每个类别生成一条记录，首个检测作为主检测
pub fn reduce_detections(
  source_image: &str,
  image_url: &str,
  detections: &[Detection],
) -> Vec<DefectRecord> {
  group_by_class(detections)
    .into_iter()
    .filter_map(|(_, members)| DefectRecord::from_group(source_image, image_url, members))
    .collect()
}

/// 未发现缺陷时的合成记录
pub fn no_defect_record(source_image: &str, image_url: &str) -> Option<DefectRecord> {
  DefectRecord::from_group(source_image, image_url, vec![Detection::no_defect()])
}

/// 网络失败时的合成记录
pub fn network_error_record(
  source_image: &str,
  image_url: &str,
  reason: &str,
) -> Option<DefectRecord> {
  DefectRecord::from_group(
    source_image,
    image_url,
    vec![Detection::network_error(reason)],
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn detection(class: &str, confidence: f32) -> Detection {
    Detection {
      confidence,
      ..Detection::new(class)
    }
  }

  #[test]
  fn grouping_keeps_first_seen_order() {
    let detections = vec![
      detection("A", 0.1),
      detection("B", 0.2),
      detection("A", 0.3),
      detection("C", 0.4),
    ];
    let records = reduce_detections("panel.jpg", "file:///panel.jpg", &detections);

    let classes: Vec<&str> = records.iter().map(|r| r.defect_class.as_str()).collect();
    assert_eq!(classes, vec!["A", "B", "C"]);
    assert_eq!(records[0].primary_detection.confidence, 0.1);
    assert_eq!(records[0].all_detections.len(), 2);
    assert_eq!(records[0].all_detections[1].confidence, 0.3);
    assert!(records.iter().all(|r| r.source_image == "panel.jpg"));
  }

  #[test]
  fn empty_input_gives_no_records() {
    assert!(reduce_detections("x", "y", &[]).is_empty());
  }

  #[test]
  fn synthetic_records() {
    let record = no_defect_record("x", "y").unwrap();
    assert!(record.is_no_defect());
    let record = network_error_record("x", "y", "timeout").unwrap();
    assert!(record.is_network_error());
    assert_eq!(record.primary_detection.description, "timeout");
  }
}

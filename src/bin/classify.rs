// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/bin/classify.rs - 本地光伏面板判定工具
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

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use serde_json::Value;
use tracing::info;
use url::Url;

use solscan::thermal::{DetectorStubs, SolarPanelClassifier};
#[cfg(feature = "read_image_file")]
use solscan::{FromUrl, FromUrlWithScheme, thermal::ThermalImageInput};

/// 使用本地热图启发式判断输入是否为光伏面板
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源
  /// 支持格式:
  /// - 分类服务响应: file:///path/to/response.json
  /// - 灰度热成像: image:///path/to/frame.png?min=20&max=120
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 附加的来源 URI，仅在载荷没有其它信号时使用
  #[arg(long, value_name = "URI")]
  pub uri: Option<String>,
  /// 未实现的检测器一律视为未命中
  #[arg(long)]
  pub strict: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("输入来源: {}", args.input);

  let stubs = if args.strict {
    DetectorStubs::strict()
  } else {
    DetectorStubs::default()
  };
  let classifier = SolarPanelClassifier::new(stubs);

  match args.input.scheme() {
    "file" => {
      let path = args
        .input
        .to_file_path()
        .map_err(|_| anyhow!("无效的文件路径: {}", args.input))?;
      let payload: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
      let verdict = classifier.evaluate(&payload, args.uri.as_deref());
      println!(
        "{}: is_solar_panel={} ({:?})",
        path.display(),
        verdict.is_solar_panel,
        verdict.evidence
      );
    }
    #[cfg(feature = "read_image_file")]
    ThermalImageInput::SCHEME => {
      let matrix = ThermalImageInput::from_url(&args.input)?.into_matrix()?;
      let Some(analysis) = classifier.analyze_matrix(&matrix) else {
        bail!("温度矩阵为空");
      };
      println!(
        "{}x{}: is_solar_panel={} confidence={:.3}",
        matrix.rows(),
        matrix.cols(),
        analysis.is_solar_panel(),
        analysis.confidence
      );
      println!(
        "  temperature: min={:.1} max={:.1} mean={:.2} std={:.2}",
        analysis.stats.min, analysis.stats.max, analysis.stats.mean, analysis.stats.std_dev
      );
      println!(
        "  grid={} lines={} (v={}, h={}) hotspots={}",
        analysis.inputs.has_grid_pattern,
        analysis.grid.lines.len(),
        analysis.grid.groups.vertical.len(),
        analysis.grid.groups.horizontal.len(),
        analysis.hotspots.len()
      );
    }
    scheme => bail!("不支持的输入方案: {}", scheme),
  }

  Ok(())
}

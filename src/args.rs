// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// Solscan 光伏热斑巡检
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 待分析的图像文件
  #[arg(value_name = "IMAGE", required = true)]
  pub images: Vec<PathBuf>,

  /// 服务器配置文件（SERVER_IP / BACKEND_PORT / CAMERA_PORT）
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// 主推理服务地址，优先于配置文件
  #[arg(long, value_name = "URL")]
  pub server: Option<Url>,

  /// 检测与健康检查的备用地址
  #[arg(long, value_name = "URL")]
  pub fallback: Option<Url>,

  /// 存储位置
  /// 支持格式:
  /// - 目录: folder:///var/tmp/solscan
  #[arg(long, default_value = "folder:///var/tmp/solscan", value_name = "STORE")]
  pub store: Url,

  /// 记录所属用户
  #[arg(long, default_value = "local", value_name = "USER")]
  pub user: String,

  /// 单次请求超时（秒）
  #[arg(long, value_name = "SECONDS")]
  pub timeout: Option<u64>,

  /// 单批次最多图像数量，0 表示无限制
  #[arg(long, default_value = "5", value_name = "COUNT")]
  pub max_images: usize,

  /// 检测前使用本地热图启发式再确认
  #[arg(long)]
  pub local_precheck: bool,

  /// 开始前检查服务是否可用
  #[arg(long)]
  pub health_check: bool,

  /// 标注图输出
  /// 支持格式:
  /// - annotate:///path/to/dir
  /// - annotate:///path/to/dir?always
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<Url>,
}

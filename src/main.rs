// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use solscan::{
  FromUrl,
  config::{GatewayConfig, ServerConfig},
  model::RawImageInput,
  network::{HttpTransport, NetworkGateway},
  output::{OutputWrapper, Render},
  pipeline::{Pipeline, PipelineConfig},
  store::{FolderStore, TracingFeed},
};

fn gateway_config(args: &args::Args) -> Result<GatewayConfig> {
  let mut config = match (&args.server, &args.config) {
    (Some(server), _) => GatewayConfig::new(server.clone()),
    (None, Some(path)) => GatewayConfig::from_server(&ServerConfig::load(path))?,
    (None, None) => GatewayConfig::from_server(&ServerConfig::default())?,
  };
  if let Some(fallback) = &args.fallback {
    config = config.with_fallback(fallback.clone());
  }
  if let Some(seconds) = args.timeout {
    config = config.with_request_timeout(Duration::from_secs(seconds));
  }
  Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  let gateway_config = gateway_config(&args)?;
  info!("推理服务: {}", gateway_config.primary);
  if let Some(fallback) = &gateway_config.fallback {
    info!("备用服务: {}", fallback);
  }
  info!("存储位置: {}", args.store);

  let gateway = NetworkGateway::new(HttpTransport::new()?, gateway_config);
  if args.health_check {
    let role = gateway.health().await.context("服务不可用")?;
    info!("健康检查通过: {:?}", role);
  }

  let store = Arc::new(FolderStore::from_url(&args.store)?);
  let pipeline = Pipeline::new(gateway, Arc::clone(&store), store, TracingFeed).with_config(
    PipelineConfig {
      max_images: (args.max_images > 0).then_some(args.max_images),
      local_precheck: args.local_precheck,
    },
  );

  let images = args
    .images
    .iter()
    .map(|path| {
      RawImageInput::from_path(path).with_context(|| format!("无法读取 {}", path.display()))
    })
    .collect::<Result<Vec<_>>>()?;

  info!("开始分析 {} 张图像...", images.len());
  let now = std::time::Instant::now();
  let output = pipeline.run(images, &args.user).await?;
  info!("分析完成，耗时: {:.2?}", now.elapsed());

  for result in &output.analysis_results {
    let analysis = &result.analysis;
    if analysis.skip {
      info!("{}: 已跳过", analysis.input.display_name);
    } else if let Some(failure) = &analysis.failure {
      warn!("{}: 失败 ({})", analysis.input.display_name, failure);
    } else {
      let classes: Vec<&str> = result
        .records
        .iter()
        .map(|record| record.defect_class.as_str())
        .collect();
      info!("{}: {}", analysis.input.display_name, classes.join(", "));
    }
  }
  if let Some(id) = &output.primary_notification_id {
    info!("主通知: {}", id);
  }

  if let Some(url) = &args.output {
    let renderer = OutputWrapper::from_url(url)?;
    for result in &output.analysis_results {
      match renderer.render_result(result) {
        Ok(Some(path)) => info!("输出 {}", path.display()),
        Ok(None) => {}
        Err(err) => warn!("{} 输出失败: {}", result.analysis.input.display_name, err),
      }
    }
  }

  Ok(())
}

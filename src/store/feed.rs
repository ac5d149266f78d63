// 该文件是 Solscan （光伏热斑巡检） 项目的一部分。
// src/store/feed.rs - 通知列表
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

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::{
  model::{Notification, NotificationKind},
  store::NotificationSink,
};

/// 内存中的通知列表，最新的在前
#[derive(Default)]
pub struct MemoryFeed {
  notifications: Mutex<Vec<Notification>>,
}

impl MemoryFeed {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
    self
      .notifications
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  pub fn all(&self) -> Vec<Notification> {
    self.lock().clone()
  }

  /// 默认展示列表，不含标记为隐藏的通知
  pub fn default_feed(&self) -> Vec<Notification> {
    self
      .lock()
      .iter()
      .filter(|n| n.in_default_feed)
      .cloned()
      .collect()
  }

  pub fn get(&self, id: &str) -> Option<Notification> {
    self.lock().iter().find(|n| n.id == id).cloned()
  }

  pub fn remove(&self, id: &str) -> Option<Notification> {
    let mut notifications = self.lock();
    let index = notifications.iter().position(|n| n.id == id)?;
    Some(notifications.remove(index))
  }

  /// 修改通知类型，例如标记为已解决
  pub fn update_kind(&self, id: &str, kind: NotificationKind) -> bool {
    match self.lock().iter_mut().find(|n| n.id == id) {
      Some(notification) => {
        notification.kind = kind;
        true
      }
      None => false,
    }
  }
}

impl NotificationSink for MemoryFeed {
  fn add(&self, notification: Notification) {
    self.lock().insert(0, notification);
  }
}

/// 仅将通知写入日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFeed;

impl NotificationSink for TracingFeed {
  fn add(&self, notification: Notification) {
    match notification.kind {
      NotificationKind::Warning => warn!(
        "[{:?}] {}: {}",
        notification.kind, notification.title, notification.message
      ),
      _ => info!(
        "[{:?}] {}: {} (优先级 {:?})",
        notification.kind, notification.title, notification.message, notification.priority
      ),
    }
  }
}

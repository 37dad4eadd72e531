//! 页面会话
//!
//! 一个页面加载对应一个会话：计时器、高亮登记表、提示容器都挂在这里，
//! 页面卸载或导航时由宿主调用 [`PageSession::cleanup`] 释放。

use super::timers::{TimerAction, TimerSet};
use crate::autofill::highlight::HighlightManager;
use crate::autofill::toast::{Severity, ToastId, ToastManager, ToastTimings};
use crate::dom::{Document, EventKind, ListenerId, NodeId};
use crate::error::DomError;
use serde::Serialize;
use tracing::{debug, info};

/// 会话时长参数（毫秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub highlight_ms: u64,
    pub toast_ms: u64,
    pub toast_exit_ms: u64,
    pub toast_enter_ms: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            highlight_ms: 1000,
            toast_ms: 3000,
            toast_exit_ms: 250,
            toast_enter_ms: 10,
        }
    }
}

/// 一次清理做了什么
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub timers_cancelled: usize,
    pub styles_restored: usize,
    pub listeners_detached: usize,
    pub toasts_removed: usize,
    pub containers_removed: usize,
}

impl CleanupReport {
    /// 没有任何状态需要清理
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// 页面会话
#[derive(Debug)]
pub struct PageSession {
    options: SessionOptions,
    timers: TimerSet,
    highlights: HighlightManager,
    toasts: ToastManager,
}

impl Default for PageSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl PageSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            timers: TimerSet::new(),
            highlights: HighlightManager::new(options.highlight_ms),
            toasts: ToastManager::new(ToastTimings {
                enter_ms: options.toast_enter_ms,
                duration_ms: options.toast_ms,
                exit_ms: options.toast_exit_ms,
            }),
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    pub fn highlights(&self) -> &HighlightManager {
        &self.highlights
    }

    pub fn toasts(&self) -> &ToastManager {
        &self.toasts
    }

    /// 当前虚拟时间
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// 高亮元素
    pub fn highlight(&mut self, doc: &mut Document, node: NodeId) -> Result<u64, DomError> {
        self.highlights.highlight(doc, &mut self.timers, node)
    }

    /// 显示提示
    pub fn show_toast(
        &mut self,
        doc: &mut Document,
        message: &str,
        severity: Severity,
    ) -> Result<ToastId, DomError> {
        self.toasts.show(doc, &mut self.timers, message, severity)
    }

    /// 手动关闭提示
    pub fn dismiss_toast(&mut self, doc: &mut Document, id: ToastId) -> Result<bool, DomError> {
        self.toasts.dismiss(doc, &mut self.timers, id)
    }

    /// 推进虚拟时钟 `elapsed_ms`，按到期顺序执行计时器，返回执行数量
    pub fn advance(&mut self, doc: &mut Document, elapsed_ms: u64) -> usize {
        let until = self.timers.now().saturating_add(elapsed_ms);
        let mut fired = 0;
        while let Some((_, action)) = self.timers.pop_due(until) {
            if let Err(e) = self.fire(doc, action) {
                debug!("计时器动作 {:?} 执行失败: {}", action, e);
            }
            fired += 1;
        }
        self.timers.advance_clock(until);
        fired
    }

    /// 一直推进到没有计时器为止（离线模式使用）
    pub fn settle(&mut self, doc: &mut Document) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.timers.next_deadline() {
            let elapsed = deadline.saturating_sub(self.timers.now());
            fired += self.advance(doc, elapsed);
        }
        fired
    }

    fn fire(&mut self, doc: &mut Document, action: TimerAction) -> Result<(), DomError> {
        match action {
            TimerAction::RevertHighlight { node, session } => {
                self.highlights.on_revert(doc, node, session)?;
            }
            TimerAction::ToastEnter(id) => self.toasts.on_enter(doc, id)?,
            TimerAction::ToastDismiss(id) => {
                self.toasts.dismiss(doc, &mut self.timers, id)?;
            }
            TimerAction::ToastRemove(id) => self.toasts.on_remove(doc, id)?,
        }
        Ok(())
    }

    /// 处理页面事件；事件不归本会话处理时返回 false
    pub fn handle_event(
        &mut self,
        doc: &mut Document,
        listener: ListenerId,
        event: EventKind,
    ) -> Result<bool, DomError> {
        match event {
            EventKind::Click => self.toasts.handle_click(doc, &mut self.timers, listener),
            _ => Ok(false),
        }
    }

    /// 清理：取消计时器、恢复样式、移除监听器和容器。重复调用是空操作。
    pub fn cleanup(&mut self, doc: &mut Document) -> Result<CleanupReport, DomError> {
        let timers_cancelled = self.timers.cancel_all();
        let styles_restored = self.highlights.restore_all(doc, &mut self.timers)?;
        let toasts = self.toasts.clear(doc, &mut self.timers)?;

        let report = CleanupReport {
            timers_cancelled,
            styles_restored,
            listeners_detached: toasts.listeners_detached,
            toasts_removed: toasts.toasts_removed,
            containers_removed: toasts.containers_removed,
        };
        if report.is_noop() {
            debug!("会话无残留状态，跳过清理");
        } else {
            info!(
                "✓ 清理完成: {} 个计时器, {} 个元素样式, {} 个提示",
                report.timers_cancelled, report.styles_restored, report.toasts_removed
            );
        }
        Ok(report)
    }

    /// 没有任何待处理状态
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.highlights.is_empty() && self.toasts.is_empty()
    }
}

//! 提示条（toast）
//!
//! 所有提示放在一个按需创建的容器里；最后一条提示移除后容器也随之移除。
//! 入场、自动消失、退场三个计时器都登记在会话的 [`TimerSet`] 中，
//! 清理时可以一次性取消。

use crate::dom::{Document, EventKind, ListenerId, NodeId};
use crate::error::DomError;
use crate::session::timers::{TimerAction, TimerId, TimerSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 提示编号
pub type ToastId = u64;

/// 容器元素 id
pub const CONTAINER_ID: &str = "job-autofill-toast-container";

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    fn background(self) -> &'static str {
        match self {
            Severity::Success => "#4CAF50",
            Severity::Info => "#2196F3",
            Severity::Warning => "#FF9800",
            Severity::Error => "#F44336",
        }
    }
}

/// 提示的三个时长（毫秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastTimings {
    pub enter_ms: u64,
    pub duration_ms: u64,
    pub exit_ms: u64,
}

impl Default for ToastTimings {
    fn default() -> Self {
        Self {
            enter_ms: 10,
            duration_ms: 3000,
            exit_ms: 250,
        }
    }
}

/// 一条提示
#[derive(Debug, Clone, PartialEq)]
pub struct ToastEntry {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
    pub node: NodeId,
    listener: Option<ListenerId>,
    timers: Vec<TimerId>,
    dismissing: bool,
}

impl ToastEntry {
    /// 是否正在播放退场动画
    pub fn is_dismissing(&self) -> bool {
        self.dismissing
    }
}

/// 清理提示时的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToastClearReport {
    pub toasts_removed: usize,
    pub listeners_detached: usize,
    pub containers_removed: usize,
}

/// 提示管理器
#[derive(Debug, Default)]
pub struct ToastManager {
    timings: ToastTimings,
    container: Option<NodeId>,
    entries: Vec<ToastEntry>,
    next_id: ToastId,
}

impl ToastManager {
    pub fn new(timings: ToastTimings) -> Self {
        Self {
            timings,
            ..Default::default()
        }
    }

    /// 显示一条提示，返回提示编号
    pub fn show(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerSet,
        message: &str,
        severity: Severity,
    ) -> Result<ToastId, DomError> {
        let container = self.ensure_container(doc)?;

        self.next_id += 1;
        let id = self.next_id;

        let node = doc.create_element("div");
        doc.set_attr(
            node,
            "class",
            Some(&format!("job-autofill-toast job-autofill-toast-{}", severity.as_str())),
        )?;
        doc.set_attr(node, "data-toast-id", Some(&id.to_string()))?;
        doc.set_attr(node, "role", Some("status"))?;
        doc.set_text(node, message)?;
        for (prop, value) in [
            ("padding", "12px 16px"),
            ("border-radius", "6px"),
            ("color", "#fff"),
            ("background", severity.background()),
            ("box-shadow", "0 4px 12px rgba(0, 0, 0, 0.15)"),
            ("font", "14px/1.4 sans-serif"),
            ("cursor", "pointer"),
            ("pointer-events", "auto"),
            ("opacity", "0"),
            ("transform", "translateX(100%)"),
            ("transition", "opacity 0.25s ease, transform 0.25s ease"),
        ] {
            doc.set_style(node, prop, Some(value))?;
        }
        doc.append_child(container, node)?;
        let listener = doc.add_listener(node, EventKind::Click)?;

        let enter = timers.schedule(self.timings.enter_ms, TimerAction::ToastEnter(id));
        let dismiss = timers.schedule(self.timings.duration_ms, TimerAction::ToastDismiss(id));

        debug!("显示提示 #{} [{}]: {}", id, severity.as_str(), message);
        self.entries.push(ToastEntry {
            id,
            message: message.to_string(),
            severity,
            node,
            listener: Some(listener),
            timers: vec![enter, dismiss],
            dismissing: false,
        });
        Ok(id)
    }

    fn ensure_container(&mut self, doc: &mut Document) -> Result<NodeId, DomError> {
        if let Some(container) = self.container.filter(|&c| doc.is_attached(c)) {
            return Ok(container);
        }
        let container = doc.create_element("div");
        doc.set_attr(container, "id", Some(CONTAINER_ID))?;
        for (prop, value) in [
            ("position", "fixed"),
            ("top", "20px"),
            ("right", "20px"),
            ("z-index", "2147483647"),
            ("display", "flex"),
            ("flex-direction", "column"),
            ("gap", "8px"),
            ("pointer-events", "none"),
        ] {
            doc.set_style(container, prop, Some(value))?;
        }
        let body = doc.body();
        doc.append_child(body, container)?;
        self.container = Some(container);
        Ok(container)
    }

    /// 入场动画
    pub fn on_enter(&mut self, doc: &mut Document, id: ToastId) -> Result<(), DomError> {
        let Some(entry) = self.entries.iter().find(|e| e.id == id && !e.dismissing) else {
            return Ok(());
        };
        doc.set_style(entry.node, "opacity", Some("1"))?;
        doc.set_style(entry.node, "transform", Some("translateX(0)"))?;
        Ok(())
    }

    /// 开始退场；提示不存在或已在退场时返回 false
    pub fn dismiss(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerSet,
        id: ToastId,
    ) -> Result<bool, DomError> {
        let exit_ms = self.timings.exit_ms;
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        if entry.dismissing {
            return Ok(false);
        }
        entry.dismissing = true;
        for timer in entry.timers.drain(..) {
            timers.cancel(timer);
        }
        if let Some(listener) = entry.listener.take() {
            doc.remove_listener(listener);
        }
        doc.set_style(entry.node, "opacity", Some("0"))?;
        doc.set_style(entry.node, "transform", Some("translateX(100%)"))?;
        entry
            .timers
            .push(timers.schedule(exit_ms, TimerAction::ToastRemove(id)));
        Ok(true)
    }

    /// 退场结束：移除元素，最后一条时连同容器一起移除
    pub fn on_remove(&mut self, doc: &mut Document, id: ToastId) -> Result<(), DomError> {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return Ok(());
        };
        let entry = self.entries.remove(pos);
        if let Some(listener) = entry.listener {
            doc.remove_listener(listener);
        }
        if doc.is_attached(entry.node) {
            doc.remove(entry.node)?;
        }
        if self.entries.is_empty() {
            self.remove_containers(doc)?;
        }
        Ok(())
    }

    /// 点击提示即关闭；监听器不属于任何提示时返回 false
    pub fn handle_click(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerSet,
        listener: ListenerId,
    ) -> Result<bool, DomError> {
        let Some(id) = self
            .entries
            .iter()
            .find(|e| e.listener == Some(listener))
            .map(|e| e.id)
        else {
            return Ok(false);
        };
        self.dismiss(doc, timers, id)
    }

    /// 立即移除全部提示和容器，不播放动画
    pub fn clear(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerSet,
    ) -> Result<ToastClearReport, DomError> {
        let mut report = ToastClearReport::default();
        for entry in std::mem::take(&mut self.entries) {
            for timer in entry.timers {
                timers.cancel(timer);
            }
            if let Some(listener) = entry.listener {
                if doc.remove_listener(listener) {
                    report.listeners_detached += 1;
                }
            }
            if doc.is_attached(entry.node) {
                doc.remove(entry.node)?;
            }
            report.toasts_removed += 1;
        }
        report.containers_removed += self.remove_containers(doc)?;
        Ok(report)
    }

    /// 移除本会话的容器，以及之前运行留在页面上的同名容器；返回移除个数
    fn remove_containers(&mut self, doc: &mut Document) -> Result<usize, DomError> {
        let mut removed = 0;
        if let Some(container) = self.container.take() {
            if doc.is_attached(container) {
                doc.remove(container)?;
                removed += 1;
            }
        }
        while let Some(stale) = doc.element_by_id(CONTAINER_ID) {
            debug!("移除残留的提示容器 #{}", stale);
            doc.remove(stale)?;
            removed += 1;
        }
        Ok(removed)
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn entries(&self) -> &[ToastEntry] {
        &self.entries
    }

    /// 当前提示文本（按显示顺序）
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.container.is_none()
    }
}

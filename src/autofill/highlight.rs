//! 填充高亮
//!
//! 每个元素一个状态机：空闲 → 高亮（保存样式快照、分配会话号、加描边）
//! → 1000ms 后恢复（仅当会话号仍然一致）→ 空闲。
//!
//! 快照保存在旁路表里，不挂到元素上。同一元素在恢复前再次高亮时，
//! 新会话保存的是"已高亮"的样式，旧计时器因会话号不匹配而失效，
//! 于是定时恢复可能停留在高亮样式上。扁平登记表始终保留第一次的原始快照，
//! 清理时用它强制恢复。

use crate::dom::{Document, NodeId};
use crate::error::DomError;
use crate::session::timers::{TimerAction, TimerId, TimerSet};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// 高亮时改写的样式属性
pub const HIGHLIGHT_PROPS: [&str; 4] = ["outline", "box-shadow", "border", "transition"];

const HIGHLIGHT_STYLE: [(&str, &str); 4] = [
    ("outline", "2px solid #4CAF50"),
    ("box-shadow", "0 0 8px rgba(76, 175, 80, 0.6)"),
    ("border", "1px solid #4CAF50"),
    ("transition", "outline 0.3s ease, box-shadow 0.3s ease"),
];

/// 高亮前的内联样式快照（None 表示原来没有设置）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleSnapshot {
    values: Vec<(String, Option<String>)>,
}

impl StyleSnapshot {
    pub fn capture(doc: &Document, node: NodeId) -> Result<Self, DomError> {
        let el = doc.get(node)?;
        let values = HIGHLIGHT_PROPS
            .iter()
            .map(|prop| (prop.to_string(), el.inline_style(prop).map(str::to_string)))
            .collect();
        Ok(Self { values })
    }

    pub fn restore(&self, doc: &mut Document, node: NodeId) -> Result<(), DomError> {
        for (prop, value) in &self.values {
            doc.set_style(node, prop, value.as_deref())?;
        }
        Ok(())
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(p, _)| p == prop)
            .and_then(|(_, v)| v.as_deref())
    }
}

#[derive(Debug, Clone)]
struct HighlightSession {
    session: u64,
    snapshot: StyleSnapshot,
    timer: TimerId,
}

/// 高亮管理器
#[derive(Debug)]
pub struct HighlightManager {
    duration_ms: u64,
    next_session: u64,
    active: HashMap<NodeId, HighlightSession>,
    modified: BTreeMap<NodeId, StyleSnapshot>,
}

impl Default for HighlightManager {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl HighlightManager {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            next_session: 0,
            active: HashMap::new(),
            modified: BTreeMap::new(),
        }
    }

    /// 高亮元素并登记恢复计时器，返回会话号
    pub fn highlight(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerSet,
        node: NodeId,
    ) -> Result<u64, DomError> {
        let snapshot = StyleSnapshot::capture(doc, node)?;
        self.next_session += 1;
        let session = self.next_session;

        self.modified.entry(node).or_insert_with(|| snapshot.clone());
        for (prop, value) in HIGHLIGHT_STYLE {
            doc.set_style(node, prop, Some(value))?;
        }

        let timer = timers.schedule(
            self.duration_ms,
            TimerAction::RevertHighlight { node, session },
        );
        self.active.insert(
            node,
            HighlightSession {
                session,
                snapshot,
                timer,
            },
        );
        debug!("高亮元素 #{} (会话 {})", node, session);
        Ok(session)
    }

    /// 计时器到期；会话号不一致时什么也不做，返回 false
    pub fn on_revert(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        session: u64,
    ) -> Result<bool, DomError> {
        match self.active.get(&node) {
            Some(current) if current.session == session => {}
            _ => {
                debug!("元素 #{} 的会话 {} 已过期，跳过恢复", node, session);
                return Ok(false);
            }
        }
        if let Some(current) = self.active.remove(&node) {
            current.snapshot.restore(doc, node)?;
            // 恢复到的不是原始样式时保留登记，清理时仍可复原
            if self.modified.get(&node) == Some(&current.snapshot) {
                self.modified.remove(&node);
            }
        }
        Ok(true)
    }

    /// 强制恢复所有改过样式的元素并取消计时器，返回恢复数量
    pub fn restore_all(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerSet,
    ) -> Result<usize, DomError> {
        for (_, current) in self.active.drain() {
            timers.cancel(current.timer);
        }
        let modified = std::mem::take(&mut self.modified);
        let mut restored = 0;
        for (node, snapshot) in modified {
            match snapshot.restore(doc, node) {
                Ok(()) => restored += 1,
                Err(e) => debug!("恢复元素 #{} 样式失败: {}", node, e),
            }
        }
        Ok(restored)
    }

    /// 元素当前的会话号
    pub fn session_of(&self, node: NodeId) -> Option<u64> {
        self.active.get(&node).map(|s| s.session)
    }

    pub fn is_highlighted(&self, node: NodeId) -> bool {
        self.active.contains_key(&node)
    }

    /// 扁平登记表中的原始快照
    pub fn original_snapshot(&self, node: NodeId) -> Option<&StyleSnapshot> {
        self.modified.get(&node)
    }

    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.modified.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn page() -> (Document, NodeId) {
        let mut doc = Document::new("https://example.com");
        let body = doc.body();
        let input = doc.insert(Some(body), Element::new("input").with_style("border", "1px solid #ccc"));
        (doc, input)
    }

    #[test]
    fn test_highlight_then_timer_revert() {
        let (mut doc, input) = page();
        let mut timers = TimerSet::new();
        let mut highlights = HighlightManager::default();

        let session = highlights.highlight(&mut doc, &mut timers, input).unwrap();
        assert_eq!(doc.style_value(input, "outline").as_deref(), Some("2px solid #4CAF50"));
        assert_eq!(timers.next_deadline(), Some(1000));

        let (_, action) = timers.pop_due(1000).unwrap();
        assert_eq!(action, TimerAction::RevertHighlight { node: input, session });
        assert!(highlights.on_revert(&mut doc, input, session).unwrap());

        assert_eq!(doc.style_value(input, "outline"), None);
        assert_eq!(doc.style_value(input, "border").as_deref(), Some("1px solid #ccc"));
        assert!(highlights.is_empty());
    }

    #[test]
    fn test_stale_session_is_ignored() {
        let (mut doc, input) = page();
        let mut timers = TimerSet::new();
        let mut highlights = HighlightManager::default();

        let first = highlights.highlight(&mut doc, &mut timers, input).unwrap();
        timers.advance_clock(500);
        let second = highlights.highlight(&mut doc, &mut timers, input).unwrap();
        assert_ne!(first, second);

        assert!(!highlights.on_revert(&mut doc, input, first).unwrap());
        assert_eq!(highlights.session_of(input), Some(second));

        // 第二次快照拍到的是高亮样式，定时恢复后仍保留描边
        assert!(highlights.on_revert(&mut doc, input, second).unwrap());
        assert_eq!(doc.style_value(input, "outline").as_deref(), Some("2px solid #4CAF50"));
        assert!(!highlights.is_highlighted(input));
        assert_eq!(highlights.modified_count(), 1);

        assert_eq!(highlights.restore_all(&mut doc, &mut timers).unwrap(), 1);
        assert_eq!(doc.style_value(input, "outline"), None);
    }

    #[test]
    fn test_restore_all_uses_first_snapshot() {
        let (mut doc, input) = page();
        let mut timers = TimerSet::new();
        let mut highlights = HighlightManager::default();

        highlights.highlight(&mut doc, &mut timers, input).unwrap();
        highlights.highlight(&mut doc, &mut timers, input).unwrap();
        assert_eq!(
            highlights.original_snapshot(input).and_then(|s| s.get("border")),
            Some("1px solid #ccc")
        );

        assert_eq!(highlights.restore_all(&mut doc, &mut timers).unwrap(), 1);
        assert_eq!(doc.style_value(input, "outline"), None);
        assert_eq!(doc.style_value(input, "border").as_deref(), Some("1px solid #ccc"));
        // 第二个计时器被取消，第一个仍在等待但会话已不存在
        assert_eq!(timers.len(), 1);
        assert_eq!(highlights.restore_all(&mut doc, &mut timers).unwrap(), 0);
    }
}

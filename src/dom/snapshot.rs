//! 浏览器页面快照 -> 页面模型
//!
//! 快照由页面内脚本生成：节点按文档序排列，`id` 即在页面侧引用表中的下标。

use super::document::{Document, Element, NodeId, SelectOption};
use super::style::{ComputedStyle, Rect, Viewport};
use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::collections::BTreeMap;

/// 页面快照
#[derive(Debug, Clone, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub viewport: Viewport,
    pub nodes: Vec<SnapshotNode>,
}

/// 快照中的单个元素
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: String,
    pub style: ComputedStyle,
    pub rect: Rect,
    #[serde(default)]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default)]
    pub selected_index: Option<i64>,
}

impl Document {
    /// 从快照构建文档，节点编号与页面侧引用表一一对应
    pub fn from_snapshot(snapshot: PageSnapshot) -> AppResult<Self> {
        let mut doc = Document::empty(snapshot.url, snapshot.viewport);
        for (index, node) in snapshot.nodes.into_iter().enumerate() {
            if node.id != index {
                return Err(AppError::snapshot_invalid(format!(
                    "节点编号不连续: 期望 {}, 实际 {}",
                    index, node.id
                )));
            }
            if let Some(parent) = node.parent {
                if parent >= index {
                    return Err(AppError::snapshot_invalid(format!(
                        "节点 {} 的父节点 {} 出现在其后",
                        index, parent
                    )));
                }
            } else if index != 0 {
                return Err(AppError::snapshot_invalid(format!(
                    "只有根节点可以没有父节点 (节点 {})",
                    index
                )));
            }

            let mut element = Element::new(node.tag.as_str());
            for (name, value) in &node.attrs {
                element = element.with_attr(name.as_str(), value.as_str());
            }
            element = element
                .with_value(node.value)
                .with_text(node.text)
                .with_rect(node.rect)
                .with_computed(node.style);
            if let Some(options) = node.options {
                let selected = node
                    .selected_index
                    .filter(|&i| i >= 0)
                    .map(|i| i as usize);
                element = element.with_options(options).with_selected(selected);
            }
            doc.insert(node.parent, element);
        }
        if doc.is_empty() {
            return Err(AppError::snapshot_invalid("快照中没有任何节点"));
        }
        Ok(doc)
    }
}

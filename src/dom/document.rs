//! 页面模型 - 元素树 + 变更日志
//!
//! 引擎的所有启发式都跑在这个模型上。加载内容（HTML 导入、浏览器快照、测试构造）
//! 不记日志；引擎发起的修改全部写入变更日志，由宿主回放到真实页面。

use super::style::{parse_inline_style, serialize_inline_style, ComputedStyle, Rect, Viewport, NON_RENDERED_TAGS};
use crate::error::DomError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 节点编号（即节点在文档数组中的下标）
pub type NodeId = usize;

/// 监听器编号
pub type ListenerId = u64;

/// 引擎会派发或监听的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
    Blur,
    Click,
    BeforeUnload,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Blur => "blur",
            EventKind::Click => "click",
            EventKind::BeforeUnload => "beforeunload",
        }
    }
}

/// `<select>` 的选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub disabled: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: false,
        }
    }
}

/// 已注册的监听器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listener {
    pub id: ListenerId,
    pub node: NodeId,
    pub event: EventKind,
}

/// 引擎对页面的一次修改
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    Create { node: NodeId, tag: String },
    Append { parent: NodeId, node: NodeId },
    Remove { node: NodeId },
    SetValue { node: NodeId, value: String },
    SelectOption { node: NodeId, index: usize },
    Dispatch { node: NodeId, event: EventKind },
    SetStyle { node: NodeId, prop: String, value: Option<String> },
    SetAttr { node: NodeId, name: String, value: Option<String> },
    SetText { node: NodeId, text: String },
    Listen { listener: ListenerId, node: NodeId, event: EventKind },
    Unlisten { listener: ListenerId },
}

/// 元素
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    value: String,
    options: Vec<SelectOption>,
    selected_index: Option<usize>,
    rect: Option<Rect>,
    computed: Option<ComputedStyle>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// 设置属性；`style` 会被解析为内联样式，`value` 同时作为初始值
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match name.as_str() {
            "style" => self.style = parse_inline_style(&value),
            "value" => {
                self.value = value.clone();
                self.attrs.insert(name, value);
            }
            _ => {
                self.attrs.insert(name, value);
            }
        }
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_style(mut self, prop: impl Into<String>, value: impl Into<String>) -> Self {
        self.style
            .insert(prop.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn with_computed(mut self, computed: ComputedStyle) -> Self {
        self.computed = Some(computed);
        self
    }

    pub fn with_option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(SelectOption::new(value, label));
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_selected(mut self, index: Option<usize>) -> Self {
        self.selected_index = index;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// 内联样式序列化结果（没有样式时为 None）
    pub fn style_attr(&self) -> Option<String> {
        if self.style.is_empty() {
            None
        } else {
            Some(serialize_inline_style(&self.style))
        }
    }

    pub fn inline_style(&self, prop: &str) -> Option<&str> {
        self.style.get(prop).map(String::as_str)
    }

    /// 元素自身的文本（不含子元素）
    pub fn own_text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selected_index(&self) -> Option<usize> {
        if self.tag != "select" || self.options.is_empty() {
            return None;
        }
        Some(self.selected_index.unwrap_or(0))
    }

    /// 当前值；`<select>` 取选中项的 value
    pub fn value(&self) -> &str {
        if self.tag == "select" {
            return self
                .selected_index()
                .and_then(|idx| self.options.get(idx))
                .map(|opt| opt.value.as_str())
                .unwrap_or("");
        }
        &self.value
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// `type` 属性（小写），缺省为 text
    pub fn input_type(&self) -> String {
        self.attr("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string())
    }

    pub fn is_disabled(&self) -> bool {
        self.has_attr("disabled") || self.attr("aria-disabled") == Some("true")
    }

    pub fn is_readonly(&self) -> bool {
        self.has_attr("readonly")
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// 文档
#[derive(Debug, Clone)]
pub struct Document {
    url: String,
    viewport: Viewport,
    nodes: Vec<Element>,
    root: NodeId,
    listeners: BTreeMap<ListenerId, Listener>,
    next_listener: ListenerId,
    journal: Vec<Mutation>,
}

impl Document {
    /// 创建只有 `<html><body>` 的空文档
    pub fn new(url: impl Into<String>) -> Self {
        let mut doc = Self::empty(url, Viewport::default());
        let html = doc.insert(None, Element::new("html"));
        doc.insert(Some(html), Element::new("body"));
        doc
    }

    /// 创建没有任何节点的文档（快照导入用）
    pub fn empty(url: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            url: url.into(),
            viewport,
            nodes: Vec::new(),
            root: 0,
            listeners: BTreeMap::new(),
            next_listener: 1,
            journal: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn scroll_to(&mut self, scroll_y: f64) {
        self.viewport.scroll_y = scroll_y.max(0.0);
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 第一个 `<body>`，没有则返回根节点
    pub fn body(&self) -> NodeId {
        self.all_elements()
            .into_iter()
            .find(|&id| self.nodes[id].tag == "body")
            .unwrap_or(self.root)
    }

    // ========== 加载内容（不记日志） ==========

    /// 载入一个元素；`parent` 为 None 且文档为空时成为根节点
    pub fn insert(&mut self, parent: Option<NodeId>, mut element: Element) -> NodeId {
        let id = self.nodes.len();
        element.parent = parent.filter(|&p| p < self.nodes.len());
        element.children.clear();
        if let Some(p) = element.parent {
            self.nodes[p].children.push(id);
        }
        self.nodes.push(element);
        id
    }

    /// 追加元素自身文本
    pub fn push_text(&mut self, node: NodeId, text: &str) {
        if let Some(el) = self.nodes.get_mut(node) {
            el.text.push_str(text);
        }
    }

    /// 设置布局盒子
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(el) = self.nodes.get_mut(node) {
            el.rect = Some(rect);
        }
    }

    // ========== 查询 ==========

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node)
    }

    pub fn get(&self, node: NodeId) -> Result<&Element, DomError> {
        self.nodes.get(node).ok_or(DomError::NodeNotFound(node))
    }

    fn attached_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        if node >= self.nodes.len() {
            return Err(DomError::NodeNotFound(node));
        }
        if !self.is_attached(node) {
            return Err(DomError::Detached(node));
        }
        Ok(&mut self.nodes[node])
    }

    /// 节点是否仍挂在文档树上
    pub fn is_attached(&self, node: NodeId) -> bool {
        if node >= self.nodes.len() {
            return false;
        }
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current].parent {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// 祖先链（由近及远，不含自身）
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(node).and_then(|el| el.parent);
        while let Some(p) = current {
            out.push(p);
            current = self.nodes[p].parent;
        }
        out
    }

    /// `ancestor` 是否为 `node` 本身或其祖先
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).contains(&ancestor)
    }

    /// 文档序的全部后代（不含自身）
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(node) {
            Some(el) => el.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    /// 文档序的全部已挂载元素（含根）
    pub fn all_elements(&self) -> Vec<NodeId> {
        if self.nodes.is_empty() {
            return Vec::new();
        }
        let mut out = vec![self.root];
        out.extend(self.descendants(self.root));
        out
    }

    /// 按标签查找已挂载元素
    pub fn elements_by_tag(&self, tags: &[&str]) -> Vec<NodeId> {
        self.all_elements()
            .into_iter()
            .filter(|&id| tags.contains(&self.nodes[id].tag.as_str()))
            .collect()
    }

    /// 按 id 属性查找
    pub fn element_by_id(&self, id_value: &str) -> Option<NodeId> {
        self.all_elements()
            .into_iter()
            .find(|&id| self.nodes[id].attr("id") == Some(id_value))
    }

    /// 文本内容（自身 + 后代，空白折叠）
    pub fn text_content(&self, node: NodeId) -> String {
        let Some(el) = self.nodes.get(node) else {
            return String::new();
        };
        let mut parts = vec![el.text.as_str()];
        for id in self.descendants(node) {
            parts.push(self.nodes[id].text.as_str());
        }
        parts
            .iter()
            .flat_map(|p| p.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn value(&self, node: NodeId) -> String {
        self.nodes
            .get(node)
            .map(|el| el.value().to_string())
            .unwrap_or_default()
    }

    pub fn style_value(&self, node: NodeId, prop: &str) -> Option<String> {
        self.nodes
            .get(node)
            .and_then(|el| el.inline_style(prop))
            .map(str::to_string)
    }

    /// 自身及所有祖先都没有 `display:none`，且不是默认不渲染的标签
    pub fn is_rendered(&self, node: NodeId) -> bool {
        let Some(_) = self.nodes.get(node) else {
            return false;
        };
        std::iter::once(node)
            .chain(self.ancestors(node))
            .all(|id| !self.own_style(id).is_display_none())
    }

    /// 只看元素自身的样式（快照样式优先，其次内联样式）
    fn own_style(&self, node: NodeId) -> ComputedStyle {
        let el = &self.nodes[node];
        if let Some(computed) = &el.computed {
            return computed.clone();
        }
        let mut style = ComputedStyle::default();
        if NON_RENDERED_TAGS.contains(&el.tag.as_str()) || el.has_attr("hidden") {
            style.display = "none".to_string();
        }
        if el.tag == "input" && el.input_type() == "hidden" {
            style.display = "none".to_string();
        }
        if let Some(display) = el.inline_style("display") {
            style.display = display.to_ascii_lowercase();
        }
        if let Some(visibility) = el.inline_style("visibility") {
            style.visibility = visibility.to_ascii_lowercase();
        }
        if let Some(opacity) = el.inline_style("opacity").and_then(|o| o.parse::<f64>().ok()) {
            style.opacity = opacity;
        }
        if let Some(z) = el.inline_style("z-index").and_then(|z| z.parse::<i32>().ok()) {
            style.z_index = z;
        }
        style
    }

    /// 计算样式：`display:none` 与 `visibility` 沿祖先链继承
    pub fn computed_style(&self, node: NodeId) -> Option<ComputedStyle> {
        self.nodes.get(node)?;
        let mut style = self.own_style(node);
        if !self.is_rendered(node) {
            style.display = "none".to_string();
        }
        let own_visibility_set = self.nodes[node].computed.is_some()
            || self.nodes[node].inline_style("visibility").is_some();
        if !own_visibility_set {
            for id in self.ancestors(node) {
                let ancestor = &self.nodes[id];
                if ancestor.computed.is_some() || ancestor.inline_style("visibility").is_some() {
                    style.visibility = self.own_style(id).visibility;
                    break;
                }
            }
        }
        Some(style)
    }

    /// 布局盒子；未渲染的元素返回空盒子
    pub fn bounding_rect(&self, node: NodeId) -> Rect {
        if !self.is_rendered(node) {
            return Rect::default();
        }
        self.nodes
            .get(node)
            .and_then(|el| el.rect)
            .unwrap_or_default()
    }

    /// 命中测试：返回该点最上层的元素（z-index 优先，其次文档序靠后者）
    pub fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId> {
        self.all_elements()
            .into_iter()
            .enumerate()
            .filter(|&(_, id)| self.bounding_rect(id).contains(x, y))
            .filter(|&(_, id)| {
                self.computed_style(id)
                    .map(|s| !s.is_hidden())
                    .unwrap_or(false)
            })
            .max_by_key(|&(order, id)| (self.own_style(id).z_index, order))
            .map(|(_, id)| id)
    }

    // ========== 引擎修改（记日志） ==========

    /// 创建游离元素
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = self.insert(None, Element::new(tag));
        self.journal.push(Mutation::Create {
            node: id,
            tag: self.nodes[id].tag.clone(),
        });
        id
    }

    /// 追加子节点（先从原父节点摘下）
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        if parent >= self.nodes.len() {
            return Err(DomError::NodeNotFound(parent));
        }
        if node >= self.nodes.len() {
            return Err(DomError::NodeNotFound(node));
        }
        self.detach(node);
        self.nodes[node].parent = Some(parent);
        self.nodes[parent].children.push(node);
        self.journal.push(Mutation::Append { parent, node });
        Ok(())
    }

    /// 把节点（连同子树）移出文档
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        if node >= self.nodes.len() {
            return Err(DomError::NodeNotFound(node));
        }
        if !self.is_attached(node) {
            return Err(DomError::Detached(node));
        }
        self.detach(node);
        self.journal.push(Mutation::Remove { node });
        Ok(())
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(p) = self.nodes[node].parent.take() {
            self.nodes[p].children.retain(|&c| c != node);
        }
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        let el = self.attached_mut(node)?;
        if !matches!(el.tag.as_str(), "input" | "textarea") {
            return Err(DomError::Unsupported {
                node,
                tag: el.tag.clone(),
                operation: "set_value",
            });
        }
        el.value = value.to_string();
        self.journal.push(Mutation::SetValue {
            node,
            value: value.to_string(),
        });
        Ok(())
    }

    pub fn select_option(&mut self, node: NodeId, index: usize) -> Result<(), DomError> {
        let el = self.attached_mut(node)?;
        if el.tag != "select" || index >= el.options.len() {
            return Err(DomError::Unsupported {
                node,
                tag: el.tag.clone(),
                operation: "select_option",
            });
        }
        el.selected_index = Some(index);
        self.journal.push(Mutation::SelectOption { node, index });
        Ok(())
    }

    pub fn dispatch_event(&mut self, node: NodeId, event: EventKind) -> Result<(), DomError> {
        self.attached_mut(node)?;
        self.journal.push(Mutation::Dispatch { node, event });
        Ok(())
    }

    pub fn set_style(
        &mut self,
        node: NodeId,
        prop: &str,
        value: Option<&str>,
    ) -> Result<(), DomError> {
        let el = self
            .nodes
            .get_mut(node)
            .ok_or(DomError::NodeNotFound(node))?;
        let prop = prop.to_ascii_lowercase();
        match value {
            Some(v) => {
                el.style.insert(prop.clone(), v.to_string());
            }
            None => {
                el.style.remove(&prop);
            }
        }
        self.journal.push(Mutation::SetStyle {
            node,
            prop,
            value: value.map(str::to_string),
        });
        Ok(())
    }

    pub fn set_attr(
        &mut self,
        node: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), DomError> {
        let el = self
            .nodes
            .get_mut(node)
            .ok_or(DomError::NodeNotFound(node))?;
        let name = name.to_ascii_lowercase();
        match value {
            Some(v) => {
                el.attrs.insert(name.clone(), v.to_string());
            }
            None => {
                el.attrs.remove(&name);
            }
        }
        self.journal.push(Mutation::SetAttr {
            node,
            name,
            value: value.map(str::to_string),
        });
        Ok(())
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        let el = self
            .nodes
            .get_mut(node)
            .ok_or(DomError::NodeNotFound(node))?;
        el.text = text.to_string();
        self.journal.push(Mutation::SetText {
            node,
            text: text.to_string(),
        });
        Ok(())
    }

    // ========== 监听器 ==========

    pub fn add_listener(&mut self, node: NodeId, event: EventKind) -> Result<ListenerId, DomError> {
        self.get(node)?;
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.insert(id, Listener { id, node, event });
        self.journal.push(Mutation::Listen {
            listener: id,
            node,
            event,
        });
        Ok(id)
    }

    /// 移除监听器；不存在时返回 false
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        if self.listeners.remove(&id).is_none() {
            return false;
        }
        self.journal.push(Mutation::Unlisten { listener: id });
        true
    }

    pub fn listener(&self, id: ListenerId) -> Option<Listener> {
        self.listeners.get(&id).copied()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ========== 变更日志 ==========

    pub fn mutations(&self) -> &[Mutation] {
        &self.journal
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }

    /// 某节点上派发过的事件（按顺序）
    pub fn dispatched_events(&self, node: NodeId) -> Vec<EventKind> {
        self.journal
            .iter()
            .filter_map(|m| match m {
                Mutation::Dispatch { node: n, event } if *n == node => Some(*event),
                _ => None,
            })
            .collect()
    }
}

//! 页面桥接 - 基础设施层
//!
//! 在真实页面和页面模型之间搬运数据：
//! - `snapshot` 把真实 DOM 拍成 [`Document`]，页面侧保留一张下标 → 节点的引用表
//! - `commit` 把模型的变更日志回放到真实页面
//! - `drain_events` 取回引擎注册的监听器收到的事件
//!
//! 模型里新建的节点编号接在快照节点之后，与引用表下标保持一致。

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use super::js_executor::JsExecutor;
use crate::dom::{Document, EventKind, ListenerId, Mutation, NodeId, PageSnapshot};

/// 拍摄快照：按文档序遍历，跳过 option/optgroup（并入所属 select）
const SNAPSHOT_JS: &str = r#"
(() => {
    const refs = [];
    const nodes = [];
    window.__autofillRefs = refs;
    window.__autofillEvents = [];
    window.__autofillListeners = {};
    const sx = window.scrollX, sy = window.scrollY;
    const walk = (el, parent) => {
        const tag = el.tagName.toLowerCase();
        if (tag === 'option' || tag === 'optgroup') return;
        const id = refs.length;
        refs.push(el);
        const attrs = {};
        for (const a of el.attributes) attrs[a.name.toLowerCase()] = a.value;
        let text = '';
        for (const c of el.childNodes) if (c.nodeType === 3) text += c.nodeValue;
        const cs = window.getComputedStyle(el);
        const r = el.getBoundingClientRect();
        const z = parseInt(cs.zIndex, 10);
        const node = {
            id, parent, tag, attrs, text,
            value: (tag === 'input' || tag === 'textarea') ? (el.value || '') : '',
            style: {
                display: cs.display,
                visibility: cs.visibility,
                opacity: parseFloat(cs.opacity) || 0,
                zIndex: Number.isNaN(z) ? 0 : z,
            },
            rect: { x: r.left + sx, y: r.top + sy, width: r.width, height: r.height },
        };
        if (tag === 'select') {
            node.options = Array.from(el.options).map(o => ({
                value: o.value, label: (o.label || o.text || '').trim(), disabled: o.disabled,
            }));
            node.selectedIndex = el.selectedIndex;
        }
        nodes.push(node);
        for (const child of el.children) walk(child, id);
    };
    walk(document.documentElement, null);
    return {
        url: location.href,
        viewport: { width: window.innerWidth, height: window.innerHeight, scrollY: sy },
        nodes,
    };
})()
"#;

/// 回放变更；返回成功条数，引用表不存在时返回 -1
const COMMIT_FN: &str = r#"
(muts) => {
    const refs = window.__autofillRefs;
    if (!refs) return -1;
    const events = window.__autofillEvents || (window.__autofillEvents = []);
    const listeners = window.__autofillListeners || (window.__autofillListeners = {});
    const setNativeValue = (el, value) => {
        const proto = el instanceof HTMLTextAreaElement
            ? HTMLTextAreaElement.prototype
            : HTMLInputElement.prototype;
        const desc = Object.getOwnPropertyDescriptor(proto, 'value');
        if (desc && desc.set) desc.set.call(el, value); else el.value = value;
    };
    let applied = 0;
    for (const m of muts) {
        try {
            const el = refs[m.node];
            switch (m.op) {
                case 'create': refs[m.node] = document.createElement(m.tag); break;
                case 'append': refs[m.parent].appendChild(el); break;
                case 'remove': el.remove(); break;
                case 'setValue': setNativeValue(el, m.value); break;
                case 'selectOption': el.selectedIndex = m.index; break;
                case 'dispatch': el.dispatchEvent(new Event(m.event, { bubbles: true })); break;
                case 'setStyle':
                    if (m.value === null) el.style.removeProperty(m.prop);
                    else el.style.setProperty(m.prop, m.value);
                    break;
                case 'setAttr':
                    if (m.value === null) el.removeAttribute(m.name);
                    else el.setAttribute(m.name, m.value);
                    break;
                case 'setText': el.textContent = m.text; break;
                case 'listen': {
                    const target = m.event === 'beforeunload' ? window : el;
                    const fn = () => events.push({ listener: m.listener, node: m.node, event: m.event });
                    target.addEventListener(m.event, fn);
                    listeners[m.listener] = { target, event: m.event, fn };
                    break;
                }
                case 'unlisten': {
                    const l = listeners[m.listener];
                    if (l) { l.target.removeEventListener(l.event, l.fn); delete listeners[m.listener]; }
                    break;
                }
                default: continue;
            }
            applied++;
        } catch (e) {
            console.debug('[job-autofill] mutation failed', m, e);
        }
    }
    return applied;
}
"#;

/// 引用表不存在（页面已导航）时 `attached` 为 false
const DRAIN_EVENTS_JS: &str = r#"
(() => {
    if (!window.__autofillRefs) return { attached: false, events: [] };
    const events = window.__autofillEvents || [];
    window.__autofillEvents = [];
    return { attached: true, events };
})()
"#;

const PAGE_SOURCE_JS: &str = r#"
(() => ({ url: location.href, html: document.documentElement.outerHTML }))()
"#;

/// 页面侧监听器收到的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DomEventRecord {
    pub listener: ListenerId,
    pub node: NodeId,
    pub event: EventKind,
}

#[derive(Debug, Deserialize)]
struct DrainedEvents {
    attached: bool,
    #[serde(default)]
    events: Vec<DomEventRecord>,
}

/// 页面源码
#[derive(Debug, Clone, Deserialize)]
pub struct PageSource {
    pub url: String,
    pub html: String,
}

/// 页面桥接
pub struct PageBridge {
    executor: JsExecutor,
}

impl PageBridge {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// 拍摄页面快照
    pub async fn snapshot(&self) -> Result<Document> {
        let snapshot: PageSnapshot = self
            .executor
            .eval_as(SNAPSHOT_JS)
            .await
            .context("拍摄页面快照失败")?;
        debug!("快照包含 {} 个节点", snapshot.nodes.len());
        Ok(Document::from_snapshot(snapshot)?)
    }

    /// 把模型上尚未提交的变更回放到页面，返回回放条数
    pub async fn commit(&self, doc: &mut Document) -> Result<usize> {
        let mutations = doc.take_mutations();
        if mutations.is_empty() {
            return Ok(0);
        }
        let total = mutations.len();
        let applied: i64 = self
            .executor
            .call_as(COMMIT_FN, &mutations)
            .await
            .context("回放变更失败")?;
        if applied < 0 {
            bail!("页面引用表不存在，需要重新拍摄快照");
        }
        let applied = applied as usize;
        if applied < total {
            warn!("⚠️ {} 条变更中有 {} 条未能应用", total, total - applied);
        }
        debug!("已回放 {} 条变更", applied);
        Ok(applied)
    }

    /// 取回并清空页面侧事件队列；页面已离开快照时返回 `None`
    pub async fn drain_events(&self) -> Result<Option<Vec<DomEventRecord>>> {
        let drained: DrainedEvents = self
            .executor
            .eval_as(DRAIN_EVENTS_JS)
            .await
            .context("读取页面事件失败")?;
        Ok(drained.attached.then_some(drained.events))
    }

    /// 当前页面的 URL 与 HTML
    pub async fn page_source(&self) -> Result<PageSource> {
        let mut source: PageSource = self
            .executor
            .eval_as(PAGE_SOURCE_JS)
            .await
            .context("读取页面源码失败")?;
        if source.url.is_empty() {
            source.url = self.executor.current_url().await?.unwrap_or_default();
        }
        Ok(source)
    }
}

/// 序列化后的变更（供调试输出）
pub fn mutations_json(mutations: &[Mutation]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(mutations)
}

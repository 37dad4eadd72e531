//! 值注入
//!
//! 前置条件：字段可编辑、当前为空（或只有空白）、可见。
//! 注入成功后按 input → change → blur 的顺序补发事件（缺一个，
//! React/Vue 一类框架的校验就不会更新），然后登记高亮。

use super::fields::{FieldDescriptor, FieldKind};
use super::visibility::is_visible;
use crate::dom::{Document, EventKind, NodeId, SelectOption};
use crate::error::DomError;
use crate::session::PageSession;
use tracing::debug;

/// 注入后补发的事件序列
pub const NOTIFY_SEQUENCE: [EventKind; 3] = [EventKind::Input, EventKind::Change, EventKind::Blur];

/// 值注入器
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueInjector;

impl ValueInjector {
    pub fn new() -> Self {
        Self
    }

    /// 字段是否允许写入（按页面当前状态判断）
    pub fn can_fill(&self, doc: &Document, field: &FieldDescriptor) -> bool {
        let Some(el) = doc.element(field.node) else {
            return false;
        };
        if el.is_disabled() || el.is_readonly() {
            return false;
        }
        if !el.value().trim().is_empty() {
            return false;
        }
        is_visible(doc, field.node)
    }

    /// 写入值；前置条件不满足或找不到匹配选项时返回 `Ok(false)`
    pub fn inject(
        &self,
        doc: &mut Document,
        session: &mut PageSession,
        field: &FieldDescriptor,
        value: &str,
    ) -> Result<bool, DomError> {
        if value.trim().is_empty() || !self.can_fill(doc, field) {
            return Ok(false);
        }

        match field.kind {
            FieldKind::Text | FieldKind::TextArea => doc.set_value(field.node, value)?,
            FieldKind::Choice => {
                let options = doc.get(field.node)?.options().to_vec();
                let Some(index) = choose_option(&options, value) else {
                    debug!("元素 #{} 没有与 \"{}\" 匹配的选项", field.node, value);
                    return Ok(false);
                };
                doc.select_option(field.node, index)?;
            }
        }

        notify(doc, field.node)?;
        session.highlight(doc, field.node)?;
        Ok(true)
    }
}

fn notify(doc: &mut Document, node: NodeId) -> Result<(), DomError> {
    for event in NOTIFY_SEQUENCE {
        doc.dispatch_event(node, event)?;
    }
    Ok(())
}

/// 选择与目标值对应的选项
///
/// 先找 value 或文本完全相同（不区分大小写）的选项；找不到时退而求其次，
/// 取第一个文本包含目标值或被目标值包含的选项（多个候选时按文档序）。
/// value 和文本都为空的占位选项、禁用的选项不参与匹配。
pub fn choose_option(options: &[SelectOption], target: &str) -> Option<usize> {
    let target = target.trim().to_lowercase();
    if target.is_empty() {
        return None;
    }

    let candidates: Vec<(usize, String, String)> = options
        .iter()
        .enumerate()
        .filter(|(_, opt)| !opt.disabled)
        .map(|(idx, opt)| (idx, opt.value.trim().to_lowercase(), opt.label.trim().to_lowercase()))
        .filter(|(_, value, label)| !value.is_empty() || !label.is_empty())
        .collect();

    candidates
        .iter()
        .find(|(_, value, label)| *value == target || *label == target)
        .or_else(|| {
            candidates.iter().find(|(_, _, label)| {
                !label.is_empty() && (label.contains(&target) || target.contains(label.as_str()))
            })
        })
        .map(|(idx, _, _)| *idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autofill::fields::describe;

    fn countries() -> Vec<SelectOption> {
        vec![
            SelectOption::new("", "Select a country"),
            SelectOption::new("ca", "Canada"),
            SelectOption::new("usa-minor", "US Minor Outlying Islands"),
            SelectOption::new("us", "United States"),
        ]
    }

    #[test]
    fn test_exact_match_beats_substring() {
        assert_eq!(choose_option(&countries(), "US"), Some(3));
        assert_eq!(choose_option(&countries(), "canada"), Some(1));
    }

    #[test]
    fn test_bidirectional_substring_in_dom_order() {
        // 文本包含目标值
        assert_eq!(choose_option(&countries(), "United"), Some(3));
        // 目标值包含文本
        assert_eq!(choose_option(&countries(), "Canada (CA)"), Some(1));
        // 多个候选取第一个
        assert_eq!(choose_option(&countries(), "s"), Some(0));
    }

    #[test]
    fn test_total_miss_and_placeholders() {
        let options = vec![SelectOption::new("", ""), SelectOption::new("de", "Germany")];
        assert_eq!(choose_option(&options, "France"), None);
        assert_eq!(choose_option(&options, "   "), None);
        assert_eq!(choose_option(&[], "x"), None);
    }

    #[test]
    fn test_inject_text_dispatches_events_and_highlights() {
        let mut doc = Document::from_html("https://example.com", r#"<body><input name="email"></body>"#);
        let mut session = PageSession::default();
        let node = doc.elements_by_tag(&["input"])[0];
        let field = describe(&doc, node).unwrap();

        assert!(ValueInjector::new().inject(&mut doc, &mut session, &field, "a@b.com").unwrap());
        assert_eq!(doc.value(node), "a@b.com");
        assert_eq!(doc.dispatched_events(node), NOTIFY_SEQUENCE.to_vec());
        assert!(session.highlights().is_highlighted(node));
    }

    #[test]
    fn test_inject_respects_preconditions() {
        let mut doc = Document::from_html(
            "https://example.com",
            r#"<body>
                <input id="full" value="keep me">
                <input id="ro" readonly>
                <div style="display:none"><input id="hidden"></div>
            </body>"#,
        );
        let mut session = PageSession::default();
        let injector = ValueInjector::new();
        for id in ["full", "ro", "hidden"] {
            let node = doc.element_by_id(id).unwrap();
            let field = describe(&doc, node).unwrap();
            assert!(!injector.inject(&mut doc, &mut session, &field, "x").unwrap(), "{}", id);
            assert!(doc.dispatched_events(node).is_empty());
        }
        assert_eq!(doc.value(doc.element_by_id("full").unwrap()), "keep me");
    }

    #[test]
    fn test_inject_select_miss_is_not_an_error() {
        let mut doc = Document::from_html(
            "https://example.com",
            r#"<body><select name="country"><option value="">Choose</option><option value="ca">Canada</option></select></body>"#,
        );
        let mut session = PageSession::default();
        let node = doc.elements_by_tag(&["select"])[0];
        let field = describe(&doc, node).unwrap();
        let injector = ValueInjector::new();

        assert!(!injector.inject(&mut doc, &mut session, &field, "Japan").unwrap());
        assert!(injector.inject(&mut doc, &mut session, &field, "Canada").unwrap());
        assert_eq!(doc.value(node), "ca");
    }
}

//! 字段描述符
//!
//! 每次填充重新采集，不持久化。

use super::visibility::is_visible;
use crate::dom::{Document, NodeId};
use crate::matching::FieldSignals;

/// 可以填写文本的 input 类型
const TEXT_INPUT_TYPES: &[&str] = &[
    "text", "email", "tel", "url", "search", "number", "date", "month", "week",
];

/// 字段种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Choice,
}

impl FieldKind {
    /// 判断元素是否是可填字段
    pub fn of(doc: &Document, node: NodeId) -> Option<Self> {
        let el = doc.element(node)?;
        match el.tag() {
            "input" if TEXT_INPUT_TYPES.contains(&el.input_type().as_str()) => Some(FieldKind::Text),
            "textarea" => Some(FieldKind::TextArea),
            "select" => Some(FieldKind::Choice),
            _ => None,
        }
    }
}

/// 字段描述符
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub node: NodeId,
    pub kind: FieldKind,
    pub signals: FieldSignals,
    pub value: String,
    pub visible: bool,
    pub editable: bool,
}

impl FieldDescriptor {
    /// 当前值为空或只有空白
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// 按文档序采集全部字段
pub fn collect_fields(doc: &Document) -> Vec<FieldDescriptor> {
    doc.elements_by_tag(&["input", "textarea", "select"])
        .into_iter()
        .filter_map(|node| describe(doc, node))
        .collect()
}

/// 为单个元素生成描述符
pub fn describe(doc: &Document, node: NodeId) -> Option<FieldDescriptor> {
    let kind = FieldKind::of(doc, node)?;
    let el = doc.element(node)?;
    let signals = FieldSignals {
        label: label_text(doc, node),
        placeholder: el.attr("placeholder").unwrap_or_default().to_string(),
        name: el.attr("name").unwrap_or_default().to_string(),
        id: el.attr("id").unwrap_or_default().to_string(),
    };
    Some(FieldDescriptor {
        node,
        kind,
        signals,
        value: el.value().to_string(),
        visible: is_visible(doc, node),
        editable: !el.is_disabled() && !el.is_readonly(),
    })
}

/// 标签文本：`<label for>` → 外层 `<label>` → `aria-label` → `aria-labelledby`
pub fn label_text(doc: &Document, node: NodeId) -> String {
    let Some(el) = doc.element(node) else {
        return String::new();
    };

    if let Some(id) = el.attr("id").filter(|id| !id.is_empty()) {
        let text = doc
            .elements_by_tag(&["label"])
            .into_iter()
            .filter(|&label| doc.element(label).and_then(|l| l.attr("for")) == Some(id))
            .map(|label| doc.text_content(label))
            .find(|t| !t.is_empty());
        if let Some(text) = text {
            return text;
        }
    }

    if let Some(label) = doc
        .ancestors(node)
        .into_iter()
        .find(|&a| doc.element(a).map(|e| e.tag() == "label").unwrap_or(false))
    {
        let text = doc.text_content(label);
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(aria) = el.attr("aria-label").map(str::trim).filter(|a| !a.is_empty()) {
        return aria.to_string();
    }

    if let Some(ids) = el.attr("aria-labelledby") {
        let text = ids
            .split_whitespace()
            .filter_map(|id| doc.element_by_id(id))
            .map(|labelled| doc.text_content(labelled))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            return text;
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_supported_controls_in_order() {
        let doc = Document::from_html(
            "https://example.com",
            r#"<body>
                <input type="checkbox" name="agree">
                <input type="email" name="mail">
                <input type="hidden" name="token">
                <textarea name="bio"></textarea>
                <select name="country"><option>US</option></select>
                <input type="submit" value="Go">
            </body>"#,
        );
        let fields = collect_fields(&doc);
        let names: Vec<_> = fields.iter().map(|f| f.signals.name.as_str()).collect();
        assert_eq!(names, vec!["mail", "bio", "country"]);
        assert_eq!(fields[0].kind, FieldKind::Text);
        assert_eq!(fields[1].kind, FieldKind::TextArea);
        assert_eq!(fields[2].kind, FieldKind::Choice);
    }

    #[test]
    fn test_label_resolution_order() {
        let doc = Document::from_html(
            "https://example.com",
            r#"<body>
                <label for="a">Phone number</label><input id="a" aria-label="ignored">
                <label>City <input id="b"></label>
                <input id="c" aria-label="Zip code">
                <span id="lbl">Street</span><input id="d" aria-labelledby="lbl">
                <input id="e">
            </body>"#,
        );
        let label = |id: &str| label_text(&doc, doc.element_by_id(id).unwrap());
        assert_eq!(label("a"), "Phone number");
        assert_eq!(label("b"), "City");
        assert_eq!(label("c"), "Zip code");
        assert_eq!(label("d"), "Street");
        assert_eq!(label("e"), "");
    }

    #[test]
    fn test_descriptor_flags() {
        let doc = Document::from_html(
            "https://example.com",
            r#"<body>
                <input id="ro" readonly value="x">
                <input id="off" disabled>
                <div style="display:none"><input id="gone"></div>
            </body>"#,
        );
        let get = |id: &str| describe(&doc, doc.element_by_id(id).unwrap()).unwrap();
        let ro = get("ro");
        assert!(!ro.editable);
        assert!(!ro.is_empty());
        assert!(!get("off").editable);
        assert!(!get("gone").visible);
    }
}

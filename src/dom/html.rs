//! 从 HTML 文本构建页面模型
//!
//! 离线页面没有真实布局，这里给每个渲染元素分配一行（祖先盒子覆盖后代），
//! 并让视口高度容纳全部内容，使离线页面的表现等同于"全部可见"。

use super::document::{Document, Element, NodeId, SelectOption};
use super::style::{Rect, Viewport};
use scraper::{ElementRef, Html, Node};

/// 合成布局的行高
pub const ROW_HEIGHT: f64 = 24.0;

impl Document {
    /// 解析 HTML 并应用合成布局
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document::empty(url, Viewport::default());
        load_element(&mut doc, None, parsed.root_element());
        apply_row_layout(&mut doc);
        doc
    }
}

fn load_element(doc: &mut Document, parent: Option<NodeId>, el: ElementRef<'_>) {
    let name = el.value().name().to_ascii_lowercase();
    let mut element = Element::new(name.as_str());
    for (attr, value) in el.value().attrs() {
        element = element.with_attr(attr, value);
    }

    match name.as_str() {
        "select" => {
            let mut options = Vec::new();
            let mut selected = None;
            for opt in el
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|e| e.value().name().eq_ignore_ascii_case("option"))
            {
                let label = collapse(&opt.text().collect::<String>());
                let value = opt
                    .value()
                    .attr("value")
                    .map(str::to_string)
                    .unwrap_or_else(|| label.clone());
                if opt.value().attr("selected").is_some() {
                    selected = Some(options.len());
                }
                options.push(SelectOption {
                    value,
                    label,
                    disabled: opt.value().attr("disabled").is_some(),
                });
            }
            element = element.with_options(options).with_selected(selected);
            doc.insert(parent, element);
            return;
        }
        "textarea" => {
            let text = el.text().collect::<String>();
            element = element.with_value(text.trim());
            doc.insert(parent, element);
            return;
        }
        _ => {}
    }

    let id = doc.insert(parent, element);
    for child in el.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    load_element(doc, Some(id), child_el);
                }
            }
            Node::Text(text) => doc.push_text(id, text),
            _ => {}
        }
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 合成行布局
fn apply_row_layout(doc: &mut Document) {
    let width = doc.viewport().width;
    let order = doc.all_elements();
    let mut rects: Vec<Option<Rect>> = vec![None; doc.len()];
    let mut row = 0usize;

    for &id in &order {
        if doc.is_rendered(id) {
            rects[id] = Some(Rect::new(0.0, row as f64 * ROW_HEIGHT, width, ROW_HEIGHT));
            row += 1;
        }
    }

    // 逆文档序：子节点先于父节点完成，父盒子覆盖全部后代
    for &id in order.iter().rev() {
        let Some(mut rect) = rects[id] else {
            continue;
        };
        if let Some(el) = doc.element(id) {
            for &child in el.children() {
                if let Some(child_rect) = rects[child] {
                    rect = rect.union(&child_rect);
                }
            }
        }
        rects[id] = Some(rect);
    }

    for (id, rect) in rects.into_iter().enumerate() {
        if let Some(rect) = rect {
            doc.set_rect(id, rect);
        }
    }

    let mut viewport = doc.viewport();
    viewport.height = viewport.height.max(row as f64 * ROW_HEIGHT);
    doc.set_viewport(viewport);
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
        <html><head><title>Apply</title></head>
        <body>
          <form>
            <label for="mail">Email address</label>
            <input id="mail" name="user_email" style="border: 1px solid red">
            <textarea id="skillsBox">  </textarea>
            <select name="country">
              <option value="">Choose</option>
              <option value="us" selected>United States</option>
            </select>
            <div style="display:none"><input name="ghost"></div>
          </form>
        </body></html>
    "#;

    #[test]
    fn test_from_html_loads_controls() {
        let doc = Document::from_html("https://jobs.example.com/apply", FORM);
        let inputs = doc.elements_by_tag(&["input"]);
        assert_eq!(inputs.len(), 2);
        let mail = doc.element_by_id("mail").unwrap();
        assert_eq!(doc.style_value(mail, "border").as_deref(), Some("1px solid red"));

        let textarea = doc.element_by_id("skillsBox").unwrap();
        assert_eq!(doc.value(textarea), "");

        let select = doc.elements_by_tag(&["select"])[0];
        let el = doc.element(select).unwrap();
        assert_eq!(el.options().len(), 2);
        assert_eq!(doc.value(select), "us");
    }

    #[test]
    fn test_row_layout_makes_controls_hittable() {
        let doc = Document::from_html("https://jobs.example.com/apply", FORM);
        let mail = doc.element_by_id("mail").unwrap();
        let rect = doc.bounding_rect(mail);
        assert!(!rect.is_empty());
        let (cx, cy) = rect.center();
        assert_eq!(doc.element_from_point(cx, cy), Some(mail));

        let ghost = doc.elements_by_tag(&["input"])[1];
        assert!(doc.bounding_rect(ghost).is_empty());
    }

    #[test]
    fn test_label_text_collected() {
        let doc = Document::from_html("about:blank", FORM);
        let label = doc.elements_by_tag(&["label"])[0];
        assert_eq!(doc.text_content(label), "Email address");
    }
}

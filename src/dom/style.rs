//! 几何与样式类型
//!
//! 坐标一律使用页面坐标（相对文档左上角），视口通过 `scroll_y` 换算。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 元素盒子（页面坐标）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// 面积为零（宽或高不大于 0）
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// 点是否落在盒子内（右下边界不含）
    pub fn contains(&self, x: f64, y: f64) -> bool {
        !self.is_empty() && x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// 两个盒子的并集，空盒子不参与
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// 视口
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default, rename = "scrollY")]
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_y: 0.0,
        }
    }
}

impl Viewport {
    /// 可见区域顶部（页面坐标）
    pub fn visible_top(&self) -> f64 {
        self.scroll_y
    }

    /// 可见区域底部（页面坐标）
    pub fn visible_bottom(&self) -> f64 {
        self.scroll_y + self.height
    }
}

/// 计算样式中引擎关心的部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
    #[serde(default)]
    pub z_index: i32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            z_index: 0,
        }
    }
}

impl ComputedStyle {
    pub fn is_display_none(&self) -> bool {
        self.display.eq_ignore_ascii_case("none")
    }

    pub fn is_hidden(&self) -> bool {
        matches!(
            self.visibility.to_ascii_lowercase().as_str(),
            "hidden" | "collapse"
        )
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity <= 0.0
    }
}

/// 默认不渲染的标签
pub const NON_RENDERED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "meta", "link", "title",
];

/// 解析内联 style 属性为 `属性 -> 值`
///
/// 属性名统一小写，值保留原样（去掉首尾空白），空声明忽略。
pub fn parse_inline_style(style: &str) -> BTreeMap<String, String> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            if prop.is_empty() || value.is_empty() {
                None
            } else {
                Some((prop, value.to_string()))
            }
        })
        .collect()
}

/// 把样式表序列化回 style 属性文本
pub fn serialize_inline_style(style: &BTreeMap<String, String>) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline_style() {
        let style = parse_inline_style("display:none; Opacity: 0.5 ;; color:");
        assert_eq!(style.get("display").map(String::as_str), Some("none"));
        assert_eq!(style.get("opacity").map(String::as_str), Some("0.5"));
        assert!(!style.contains_key("color"));
    }

    #[test]
    fn test_rect_contains_and_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 20.0, 10.0, 10.0);
        assert!(a.contains(5.0, 5.0));
        assert!(!a.contains(10.0, 5.0));
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, 0.0, 15.0, 30.0));
        assert_eq!(Rect::default().union(&a), a);
    }
}

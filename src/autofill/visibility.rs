//! 可见性判定
//!
//! 启发式：允许误判。依次检查
//! 1. 节点存在且挂在文档上
//! 2. `display:none` / `visibility:hidden` / `opacity:0`
//! 3. 盒子面积为零
//! 4. 盒子完全落在容差窗口之外（底部在可见顶部之上超过一个视口高度，
//!    或顶部在可见底部之下超过两个视口高度）。可滚动到达即可，不要求在视口内
//! 5. 遮挡：盒子中心点最上层的元素既不是它的祖先也不是它的后代

use crate::dom::{Document, NodeId};

/// 元素是否可交互
pub fn is_visible(doc: &Document, node: NodeId) -> bool {
    if !doc.is_attached(node) {
        return false;
    }

    let Some(style) = doc.computed_style(node) else {
        return false;
    };
    if style.is_display_none() || style.is_hidden() || style.is_transparent() {
        return false;
    }

    let rect = doc.bounding_rect(node);
    if rect.is_empty() {
        return false;
    }

    let viewport = doc.viewport();
    if rect.bottom() < viewport.visible_top() - viewport.height {
        return false;
    }
    if rect.top() > viewport.visible_bottom() + 2.0 * viewport.height {
        return false;
    }

    let (cx, cy) = rect.center();
    match doc.element_from_point(cx, cy) {
        Some(top) => doc.contains(node, top) || doc.contains(top, node),
        None => true,
    }
}

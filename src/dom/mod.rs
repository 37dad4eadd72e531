//! 页面模型层
//!
//! - `document` - 元素树、监听器表、变更日志
//! - `style` - 盒子、视口、计算样式
//! - `html` - 离线 HTML 导入（合成布局）
//! - `snapshot` - 浏览器快照导入

pub mod document;
pub mod html;
pub mod snapshot;
pub mod style;

pub use document::{Document, Element, EventKind, Listener, ListenerId, Mutation, NodeId, SelectOption};
pub use snapshot::{PageSnapshot, SnapshotNode};
pub use style::{ComputedStyle, Rect, Viewport};

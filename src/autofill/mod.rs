//! 自动填充组件
//!
//! - `visibility` - 元素是否可交互
//! - `fields` - 字段描述符采集
//! - `injector` - 写值 + 事件补发
//! - `highlight` - 填充后的临时高亮
//! - `toast` - 提示条

pub mod fields;
pub mod highlight;
pub mod injector;
pub mod toast;
pub mod visibility;

pub use fields::{collect_fields, FieldDescriptor, FieldKind};
pub use highlight::HighlightManager;
pub use injector::{choose_option, ValueInjector};
pub use toast::{Severity, ToastId, ToastManager};
pub use visibility::is_visible;

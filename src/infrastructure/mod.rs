//! 基础设施层
//!
//! 持有稀缺资源（Page），只暴露能力

pub mod js_executor;
pub mod page_bridge;

pub use js_executor::JsExecutor;
pub use page_bridge::{DomEventRecord, PageBridge, PageSource};

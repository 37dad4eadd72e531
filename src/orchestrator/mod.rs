//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把外部命令路由到引擎，并管理页面和浏览器资源。
//!
//! ## 模块划分
//!
//! ### `dispatcher` - 命令分发器
//! - 定义命令面（fill / instant / extract / cleanup / 卸载 / 计时 / 页面事件）
//! - 持有页面会话和两张关键字表
//! - 页面卸载后关闭，之后的命令一律忽略
//!
//! ### `app` - 应用主流程
//! - 解析命令行、载入页面（离线 HTML 或浏览器快照）
//! - 分发命令、回放变更、推进计时器
//! - `serve` 模式逐行读取 JSON 命令
//!
//! ## 层次关系
//!
//! ```text
//! app (命令行 / 浏览器 / 计时泵)
//!     ↓
//! dispatcher (单条命令)
//!     ↓
//! workflow::FillFlow / job::JobExtractor
//!     ↓
//! autofill + session (组件)
//!     ↓
//! dom (页面模型) ⇄ infrastructure (PageBridge)
//! ```

pub mod app;
pub mod dispatcher;

pub use app::{App, Cli, CliCommand};
pub use dispatcher::{Command, CommandOutcome, Dispatcher};

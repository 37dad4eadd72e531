//! # Job Autofill
//!
//! 用档案自动填写网页表单，并从招聘页面抽取结构化岗位信息
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `PageBridge` - 快照 / 回放变更 / 取回页面事件
//!
//! ### ② 页面模型与数据（Model）
//! - `dom/` - 内存中的元素树，引擎修改全部写入变更日志
//! - `profile/` - 档案记录与派生规则
//! - `matching/` - 关键字表与字段身份解析
//!
//! ### ③ 组件层（Components）
//! - `autofill/` - 可见性判断、字段采集、值注入、高亮、提示
//! - `session/` - 每个页面一个的会话（计时器、清理）
//! - `job/` - 站点适配器 + 通用回退 + 薪资/类型/技能分类
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一次填充"的完整过程
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/dispatcher` - 命令分发
//! - `orchestrator/app` - 命令行、浏览器、计时泵
//!
//! ## 模块结构

pub mod autofill;
pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod infrastructure;
pub mod job;
pub mod logger;
pub mod matching;
pub mod orchestrator;
pub mod profile;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_headless_browser};
pub use config::Config;
pub use dom::Document;
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, PageBridge};
pub use job::{JobExtractor, JobRecord};
pub use orchestrator::{App, Command, CommandOutcome, Dispatcher};
pub use profile::Profile;
pub use session::PageSession;
pub use workflow::{FillFlow, FillMode, FillReport};

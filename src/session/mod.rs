//! 会话层
//!
//! - `timers` - 虚拟时钟与计时器集合
//! - `page_session` - 每个页面一个的上下文对象（计时器、高亮、提示、清理）

pub mod page_session;
pub mod timers;

pub use page_session::{CleanupReport, PageSession, SessionOptions};
pub use timers::{TimerAction, TimerId, TimerSet};

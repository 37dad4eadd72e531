//! 命令分发器
//!
//! 外部对引擎的所有调用都是一条 [`Command`]，由单线程的 [`Dispatcher`] 逐条处理。
//! 分发器持有页面会话，创建时在页面上注册卸载监听器；页面卸载后关闭，之后的命令一律忽略。

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dom::{Document, EventKind, ListenerId, NodeId};
use crate::error::ConfigError;
use crate::job::{JobExtractor, JobRecord};
use crate::profile::{BlobProfileSource, Profile, ProfileSource};
use crate::session::{CleanupReport, PageSession};
use crate::workflow::{FillFlow, FillMode, FillReport};

/// 外部命令（按行传入的 JSON 消息，`command` 字段区分类型）
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    /// 用完整档案填充
    #[serde(rename = "fill")]
    FillProfile { profile: Profile },
    /// 用缓存的档案文本即时填充
    #[serde(rename = "instant")]
    InstantFill { blob: String },
    /// 抽取岗位；`url` 为空时使用当前页面地址
    #[serde(rename = "extract")]
    ExtractJob {
        #[serde(default)]
        url: String,
        html: String,
    },
    Cleanup,
    PageUnload,
    /// 推进会话时钟
    Tick {
        #[serde(rename = "elapsedMs")]
        elapsed_ms: u64,
    },
    /// 页面上的监听器收到事件
    DomEvent {
        listener: ListenerId,
        node: NodeId,
        event: EventKind,
    },
}

impl Command {
    /// 解析一行 JSON 命令
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::FillProfile { .. } => "fill",
            Command::InstantFill { .. } => "instant",
            Command::ExtractJob { .. } => "extract",
            Command::Cleanup => "cleanup",
            Command::PageUnload => "pageUnload",
            Command::Tick { .. } => "tick",
            Command::DomEvent { .. } => "domEvent",
        }
    }
}

/// 命令执行结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "result", rename_all = "camelCase")]
pub enum CommandOutcome {
    Filled(FillReport),
    Extracted(Option<JobRecord>),
    Cleaned(CleanupReport),
    Unloaded(CleanupReport),
    Ticked { fired: usize },
    Event { handled: bool },
    /// 分发器已关闭
    Ignored,
    /// 运行时故障（不是启发式未命中）
    Failed { message: String },
}

/// 命令分发器
pub struct Dispatcher {
    session: PageSession,
    flow: FillFlow,
    extractor: JobExtractor,
    unload_listener: Option<ListenerId>,
    closed: bool,
}

impl Dispatcher {
    /// 创建分发器并注册页面卸载监听器
    pub fn new(doc: &mut Document, session: PageSession, flow: FillFlow, extractor: JobExtractor) -> Self {
        let unload_listener = match doc.add_listener(doc.body(), EventKind::BeforeUnload) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("⚠️ 无法注册页面卸载监听器: {}", e);
                None
            }
        };
        Self {
            session,
            flow,
            extractor,
            unload_listener,
            closed: false,
        }
    }

    /// 按配置创建分发器
    pub fn from_config(doc: &mut Document, config: &Config) -> Result<Self, ConfigError> {
        let (general, instant) = config.keyword_tables()?;
        Ok(Self::new(
            doc,
            PageSession::new(config.session_options()),
            FillFlow::new(general, instant),
            JobExtractor::new(config.skill_limit),
        ))
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    pub fn unload_listener(&self) -> Option<ListenerId> {
        self.unload_listener
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 会话中最近一个计时器的剩余时间（毫秒）
    pub fn next_timer_in(&self) -> Option<u64> {
        let timers = self.session.timers();
        timers
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(timers.now()))
    }

    /// 执行一条命令
    pub async fn dispatch(&mut self, doc: &mut Document, command: Command) -> CommandOutcome {
        if self.closed {
            debug!("分发器已关闭，忽略命令: {}", command.name());
            return CommandOutcome::Ignored;
        }
        debug!("执行命令: {}", command.name());

        match command {
            Command::FillProfile { profile } => {
                CommandOutcome::Filled(self.flow.run(doc, &mut self.session, &profile, FillMode::Full))
            }
            Command::InstantFill { blob } => {
                let profile = match BlobProfileSource::new(blob).fetch().await {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!("⚠️ 缓存档案不可用，按空档案处理: {}", e);
                        Profile::default()
                    }
                };
                CommandOutcome::Filled(self.flow.run(doc, &mut self.session, &profile, FillMode::Instant))
            }
            Command::ExtractJob { url, html } => {
                let url = if url.trim().is_empty() {
                    doc.url().to_string()
                } else {
                    url
                };
                CommandOutcome::Extracted(self.extractor.extract(&url, &html))
            }
            Command::Cleanup => match self.session.cleanup(doc) {
                Ok(report) => CommandOutcome::Cleaned(report),
                Err(e) => failed("清理失败", e),
            },
            Command::PageUnload => self.unload(doc),
            Command::Tick { elapsed_ms } => CommandOutcome::Ticked {
                fired: self.session.advance(doc, elapsed_ms),
            },
            Command::DomEvent {
                listener,
                node,
                event,
            } => {
                if event == EventKind::BeforeUnload && Some(listener) == self.unload_listener {
                    return self.unload(doc);
                }
                match self.session.handle_event(doc, listener, event) {
                    Ok(handled) => {
                        if !handled {
                            debug!("事件 {} (监听器 {}, 节点 #{}) 无人处理", event.as_str(), listener, node);
                        }
                        CommandOutcome::Event { handled }
                    }
                    Err(e) => failed("事件处理失败", e),
                }
            }
        }
    }

    /// 页面卸载：清理会话、移除卸载监听器并关闭
    fn unload(&mut self, doc: &mut Document) -> CommandOutcome {
        let report = match self.session.cleanup(doc) {
            Ok(report) => report,
            Err(e) => {
                warn!("⚠️ 卸载时清理失败: {}", e);
                CleanupReport::default()
            }
        };
        if let Some(id) = self.unload_listener.take() {
            doc.remove_listener(id);
        }
        self.closed = true;
        info!("页面卸载，分发器已关闭");
        CommandOutcome::Unloaded(report)
    }
}

fn failed(context: &str, err: impl std::fmt::Display) -> CommandOutcome {
    warn!("⚠️ {}: {}", context, err);
    CommandOutcome::Failed {
        message: format!("{}: {}", context, err),
    }
}

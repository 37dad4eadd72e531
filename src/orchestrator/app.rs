//! 应用主流程
//!
//! 两种页面来源：
//! - 离线：`--html` 指定的文件，计时器在虚拟时钟上一次性跑完
//! - 在线：接管（或启动）浏览器，拍快照 → 分发命令 → 回放变更 → 按真实时间推进计时器

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chromiumoxide::Browser;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::dispatcher::{Command, CommandOutcome, Dispatcher};
use crate::autofill::collect_fields;
use crate::browser::{connect_to_browser_and_page, launch_headless_browser};
use crate::config::Config;
use crate::dom::{Document, NodeId};
use crate::infrastructure::page_bridge::mutations_json;
use crate::infrastructure::{JsExecutor, PageBridge};
use crate::profile::{FileProfileSource, ProfileSource};
use crate::utils::logging::{log_section, log_startup, print_final_stats, truncate_text};

/// 在线模式下轮询页面事件的最长间隔
const POLL_MS: u64 = 100;

/// job-autofill 命令行
#[derive(Debug, Parser)]
#[command(name = "job-autofill")]
#[command(about = "Fill web forms from a stored profile and extract job postings")]
#[command(version)]
pub struct Cli {
    /// Work offline against this HTML file instead of a browser
    #[arg(long, global = true)]
    pub html: Option<PathBuf>,

    /// Page URL (offline: the document URL; online: the page to open)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Browser remote debugging port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Attach to the open page whose title contains this text
    #[arg(long, global = true)]
    pub title: Option<String>,

    /// Launch a headless browser instead of attaching
    #[arg(long, global = true)]
    pub headless: bool,

    /// Extra keyword rules (TOML)
    #[arg(long, global = true)]
    pub keywords: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Fill the page from a profile JSON file
    Fill {
        /// Profile JSON file
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Fill the page from a cached profile blob
    Instant {
        /// Profile JSON text
        #[arg(long)]
        blob: Option<String>,

        /// File holding the profile JSON text
        #[arg(long, conflicts_with = "blob")]
        blob_file: Option<PathBuf>,
    },
    /// Extract the job posting on the page
    Extract,
    /// Cancel pending timers and remove toast containers left on the page
    Cleanup,
    /// Read JSON commands from stdin, one per line
    Serve,
}

impl CliCommand {
    pub fn name(&self) -> &'static str {
        match self {
            CliCommand::Fill { .. } => "fill",
            CliCommand::Instant { .. } => "instant",
            CliCommand::Extract => "extract",
            CliCommand::Cleanup => "cleanup",
            CliCommand::Serve => "serve",
        }
    }
}

impl Cli {
    /// 命令行参数覆盖配置
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.browser_debug_port = port;
        }
        if let Some(url) = &self.url {
            config.target_url = Some(url.clone());
        }
        if let Some(title) = &self.title {
            config.target_title = Some(title.clone());
        }
        if self.headless {
            config.headless = true;
        }
        if let Some(keywords) = &self.keywords {
            config.keyword_file = Some(keywords.display().to_string());
        }
        if self.verbose {
            config.verbose_logging = true;
        }
        if let CliCommand::Fill {
            profile: Some(profile),
        } = &self.command
        {
            config.profile_path = profile.display().to_string();
        }
    }
}

/// 页面来源
enum PageTarget {
    Offline {
        html: String,
    },
    Live {
        _browser: Browser,
        bridge: PageBridge,
        attached: bool,
    },
}

/// 字段最终取值（输出用）
#[derive(Debug, Serialize)]
struct FieldValue {
    node: NodeId,
    #[serde(skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    label: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct RunOutput<'a> {
    command: &'a str,
    outcome: &'a CommandOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldValue>,
}

/// 应用主结构
pub struct App {
    config: Config,
    command: CliCommand,
    target: PageTarget,
    doc: Document,
    dispatcher: Dispatcher,
}

impl App {
    /// 初始化应用：载入页面并创建分发器
    pub async fn initialize(cli: Cli, mut config: Config) -> Result<Self> {
        cli.apply(&mut config);
        log_startup(cli.command.name(), &config);

        let (target, mut doc) = match &cli.html {
            Some(path) => {
                let html = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("读取 HTML 文件失败: {}", path.display()))?;
                let url = config
                    .target_url
                    .clone()
                    .unwrap_or_else(|| format!("file://{}", path.display()));
                let doc = Document::from_html(url, &html);
                info!("✓ 已载入离线页面: {} ({} 个节点)", doc.url(), doc.len());
                (PageTarget::Offline { html }, doc)
            }
            None => {
                let (browser, page) = if config.headless {
                    let url = config.target_url.as_deref().unwrap_or("about:blank");
                    launch_headless_browser(url, config.chrome_executable.as_deref()).await?
                } else {
                    connect_to_browser_and_page(
                        config.browser_debug_port,
                        config.target_url.as_deref(),
                        config.target_title.as_deref(),
                    )
                    .await?
                };
                let bridge = PageBridge::new(JsExecutor::new(page));
                let doc = bridge.snapshot().await?;
                info!("✓ 已拍摄页面快照: {} ({} 个节点)", doc.url(), doc.len());
                (
                    PageTarget::Live {
                        _browser: browser,
                        bridge,
                        attached: true,
                    },
                    doc,
                )
            }
        };

        let dispatcher = Dispatcher::from_config(&mut doc, &config)?;
        let mut app = Self {
            config,
            command: cli.command,
            target,
            doc,
            dispatcher,
        };
        app.commit().await?;
        Ok(app)
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        if let CliCommand::Serve = self.command {
            self.serve().await?;
            return self.detach().await;
        }

        let command = self.build_command().await?;
        let name = self.command.name();
        log_section(&format!("▶ 执行命令: {}", name));
        let outcome = self.execute(command).await?;
        self.settle().await?;

        let fields = match outcome {
            CommandOutcome::Filled(_) | CommandOutcome::Cleaned(_) => self.field_values(),
            _ => Vec::new(),
        };
        let output = RunOutput {
            command: name,
            outcome: &outcome,
            fields,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("序列化输出失败")?
        );
        print_final_stats(&summary_lines(&outcome));

        self.detach().await
    }

    /// 把子命令转成分发器命令
    async fn build_command(&self) -> Result<Command> {
        let command = match &self.command {
            CliCommand::Fill { .. } => {
                let profile = FileProfileSource::new(&self.config.profile_path)
                    .fetch()
                    .await
                    .with_context(|| format!("载入档案失败: {}", self.config.profile_path))?;
                info!("✓ 已载入档案: {} 项", profile.len());
                Command::FillProfile { profile }
            }
            CliCommand::Instant { blob, blob_file } => {
                let blob = match (blob, blob_file) {
                    (Some(blob), _) => blob.clone(),
                    (None, Some(path)) => tokio::fs::read_to_string(path)
                        .await
                        .with_context(|| format!("读取档案文本失败: {}", path.display()))?,
                    (None, None) => tokio::fs::read_to_string(&self.config.profile_path)
                        .await
                        .with_context(|| format!("读取档案文本失败: {}", self.config.profile_path))?,
                };
                Command::InstantFill { blob }
            }
            CliCommand::Extract => {
                let (url, html) = match &self.target {
                    PageTarget::Offline { html } => (self.doc.url().to_string(), html.clone()),
                    PageTarget::Live { bridge, .. } => {
                        let source = bridge.page_source().await?;
                        (source.url, source.html)
                    }
                };
                Command::ExtractJob { url, html }
            }
            CliCommand::Cleanup => Command::Cleanup,
            CliCommand::Serve => bail!("serve 不是单条命令"),
        };
        Ok(command)
    }

    /// 分发一条命令并把变更回放到页面
    async fn execute(&mut self, command: Command) -> Result<CommandOutcome> {
        let outcome = self.dispatcher.dispatch(&mut self.doc, command).await;
        self.commit().await?;
        Ok(outcome)
    }

    /// 回放变更；离线模式只记录日志
    async fn commit(&mut self) -> Result<()> {
        match &mut self.target {
            PageTarget::Offline { .. } => {
                let mutations = self.doc.take_mutations();
                if !mutations.is_empty() {
                    debug!(
                        "离线模式，丢弃 {} 条变更: {}",
                        mutations.len(),
                        truncate_text(&mutations_json(&mutations)?, 200)
                    );
                }
            }
            PageTarget::Live {
                bridge, attached, ..
            } => {
                if !*attached {
                    self.doc.take_mutations();
                    return Ok(());
                }
                if let Err(e) = bridge.commit(&mut self.doc).await {
                    warn!("⚠️ 回放变更失败，页面可能已离开: {:#}", e);
                    *attached = false;
                }
            }
        }
        Ok(())
    }

    fn is_live(&self) -> bool {
        matches!(self.target, PageTarget::Live { attached: true, .. })
    }

    /// 跑完所有计时器
    async fn settle(&mut self) -> Result<()> {
        if !self.is_live() {
            while let Some(wait) = self.dispatcher.next_timer_in() {
                self.execute(Command::Tick { elapsed_ms: wait }).await?;
            }
            return Ok(());
        }

        let mut last = Instant::now();
        while let Some(wait) = self.dispatcher.next_timer_in() {
            if self.dispatcher.is_closed() || !self.is_live() {
                break;
            }
            sleep(Duration::from_millis(wait.clamp(1, POLL_MS))).await;
            self.poll(&mut last).await?;
        }
        Ok(())
    }

    /// 在线模式的一次轮询：转发页面事件、按真实时间推进计时器
    async fn poll(&mut self, last: &mut Instant) -> Result<()> {
        let drained = match &self.target {
            PageTarget::Live {
                bridge,
                attached: true,
                ..
            } => bridge.drain_events().await,
            _ => return Ok(()),
        };

        let events = match drained {
            Ok(Some(events)) => events,
            Ok(None) => return self.page_left().await,
            Err(e) => {
                debug!("读取页面事件失败: {:#}", e);
                return self.page_left().await;
            }
        };
        for record in events {
            let command = Command::DomEvent {
                listener: record.listener,
                node: record.node,
                event: record.event,
            };
            self.execute(command).await?;
        }

        let elapsed = last.elapsed().as_millis() as u64;
        *last = Instant::now();
        if elapsed > 0 {
            self.execute(Command::Tick { elapsed_ms: elapsed }).await?;
        }
        Ok(())
    }

    /// 页面已导航或关闭：之后不再回放变更，会话按卸载处理
    async fn page_left(&mut self) -> Result<()> {
        info!("页面已离开，释放会话");
        if let PageTarget::Live { attached, .. } = &mut self.target {
            *attached = false;
        }
        self.execute(Command::PageUnload).await?;
        Ok(())
    }

    /// 逐行读取 JSON 命令，每条命令输出一行 JSON 结果
    async fn serve(&mut self) -> Result<()> {
        info!("📥 等待标准输入中的命令...");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut last = Instant::now();
        loop {
            let wait = self
                .dispatcher
                .next_timer_in()
                .map_or(POLL_MS, |ms| ms.clamp(1, POLL_MS));
            let live = self.is_live();
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("读取标准输入失败")? else {
                        debug!("标准输入已结束");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let outcome = match Command::from_json_line(&line) {
                        Ok(command) => self.execute(command).await?,
                        Err(e) => {
                            warn!("⚠️ 无法解析命令: {}", e);
                            CommandOutcome::Failed {
                                message: format!("invalid command: {}", e),
                            }
                        }
                    };
                    println!("{}", serde_json::to_string(&outcome).context("序列化输出失败")?);
                }
                _ = sleep(Duration::from_millis(wait)), if live => {
                    self.poll(&mut last).await?;
                }
            }
            if self.dispatcher.is_closed() {
                info!("分发器已关闭，停止读取命令");
                break;
            }
        }
        Ok(())
    }

    /// 退出前释放页面上的会话状态
    async fn detach(mut self) -> Result<()> {
        if !self.dispatcher.is_closed() {
            self.execute(Command::PageUnload).await?;
        }
        Ok(())
    }

    fn field_values(&self) -> Vec<FieldValue> {
        collect_fields(&self.doc)
            .into_iter()
            .map(|field| FieldValue {
                node: field.node,
                name: field.signals.name,
                id: field.signals.id,
                label: field.signals.label,
                value: field.value,
            })
            .collect()
    }
}

fn summary_lines(outcome: &CommandOutcome) -> Vec<String> {
    match outcome {
        CommandOutcome::Filled(report) => vec![
            format!("✅ {}", report.summary()),
            format!("🔎 匹配 {} / 跳过 {} / 失败 {}", report.matched, report.skipped, report.failed),
        ],
        CommandOutcome::Extracted(Some(record)) => vec![
            format!("✅ {} @ {}", record.job_title, record.company),
            format!("🏷️ 来源: {}", record.job_source),
        ],
        CommandOutcome::Extracted(None) => vec!["❌ 未找到岗位信息".to_string()],
        CommandOutcome::Cleaned(report) | CommandOutcome::Unloaded(report) => vec![format!(
            "🧹 计时器 {} / 样式 {} / 提示 {}",
            report.timers_cancelled, report.styles_restored, report.toasts_removed
        )],
        CommandOutcome::Ticked { fired } => vec![format!("⏱️ 执行计时器 {} 个", fired)],
        CommandOutcome::Event { handled } => vec![format!("📨 事件已处理: {}", handled)],
        CommandOutcome::Ignored => vec!["⚠️ 命令被忽略".to_string()],
        CommandOutcome::Failed { message } => vec![format!("❌ {}", message)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "job-autofill",
            "--port",
            "2001",
            "--keywords",
            "extra.toml",
            "fill",
            "--profile",
            "me.json",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.browser_debug_port, 2001);
        assert_eq!(config.keyword_file.as_deref(), Some("extra.toml"));
        assert_eq!(config.profile_path, "me.json");
        assert!(!config.headless);
    }

    #[test]
    fn test_instant_blob_flags_conflict() {
        assert!(Cli::try_parse_from(["job-autofill", "instant", "--blob", "{}", "--blob-file", "x.json"]).is_err());
        let cli = Cli::try_parse_from(["job-autofill", "instant", "--html", "page.html", "--blob", "{}"]).unwrap();
        assert_eq!(cli.html, Some(PathBuf::from("page.html")));
        assert_eq!(cli.command.name(), "instant");
    }

    #[tokio::test]
    async fn test_offline_fill_settles_and_prints_fields() {
        let dir = std::env::temp_dir();
        let html_path = dir.join(format!("job_autofill_page_{}.html", std::process::id()));
        let profile_path = dir.join(format!("job_autofill_me_{}.json", std::process::id()));
        tokio::fs::write(&html_path, r#"<body><input name="user_email"><textarea id="skillsBox"></textarea></body>"#)
            .await
            .unwrap();
        tokio::fs::write(&profile_path, r#"{"email": "a@b.com", "skills": ["Go", "SQL"]}"#)
            .await
            .unwrap();

        let cli = Cli::try_parse_from([
            "job-autofill".to_string(),
            "--html".to_string(),
            html_path.display().to_string(),
            "fill".to_string(),
            "--profile".to_string(),
            profile_path.display().to_string(),
        ])
        .unwrap();
        let mut app = App::initialize(cli, Config::default()).await.unwrap();
        let command = app.build_command().await.unwrap();
        let outcome = app.execute(command).await.unwrap();
        app.settle().await.unwrap();

        assert!(matches!(&outcome, CommandOutcome::Filled(report) if report.filled == 2));
        assert!(app.dispatcher.session().is_idle());
        let values: Vec<_> = app.field_values().into_iter().map(|f| f.value).collect();
        assert_eq!(values, vec!["a@b.com", "Go, SQL"]);

        let _ = tokio::fs::remove_file(&html_path).await;
        let _ = tokio::fs::remove_file(&profile_path).await;
    }
}

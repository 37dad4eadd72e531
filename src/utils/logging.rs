/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;

/// 记录程序启动信息
///
/// # 参数
/// - `command`: 执行的子命令
/// - `config`: 当前配置
pub fn log_startup(command: &str, config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", command);
    if config.headless {
        info!("🌐 浏览器: 无头模式");
    } else {
        info!("🌐 浏览器调试端口: {}", config.browser_debug_port);
    }
    info!(
        "⏱️ 高亮 {} ms / 提示 {} ms",
        config.highlight_ms, config.toast_ms
    );
    info!("{}", "=".repeat(60));
}

/// 记录阶段分隔线
///
/// # 参数
/// - `title`: 阶段名称
pub fn log_section(title: &str) {
    info!("\n{}", "─".repeat(60));
    info!("{}", title);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `lines`: 每行一项统计
pub fn print_final_stats(lines: &[String]) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for line in lines {
        info!("{}", line);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

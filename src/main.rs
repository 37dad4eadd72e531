use anyhow::Result;
use clap::Parser;
use job_autofill::orchestrator::{App, Cli};
use job_autofill::{logger, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::try_from_env()?;

    // 初始化日志
    logger::init_with(cli.verbose || config.verbose_logging);

    // 初始化并运行应用
    App::initialize(cli, config).await?.run().await?;

    Ok(())
}

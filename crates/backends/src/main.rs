//! mockgen CLI
//!
//! 模拟后端数据工具的命令行入口点。
//! 提供服务枚举、状态树导出和快照批量落盘。

use clap::Parser;
use mock_backends::cli::{Cli, CommandRunner, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化 tracing 日志
    // 优先使用环境变量 RUST_LOG，否则使用命令行参数指定的级别
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    let runner = CommandRunner;

    match cli.command {
        Commands::List => runner.run_list()?,
        Commands::Dump { service, seed } => runner.run_dump(&service, seed)?,
        Commands::Populate { out_dir, seed } => runner.run_populate(&out_dir, seed)?,
    }

    Ok(())
}

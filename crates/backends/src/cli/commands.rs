//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。
//! 子命令覆盖模拟后端的枚举、单服务导出和快照批量落盘。

use clap::{Parser, Subcommand};

/// 模拟后端数据工具
///
/// 枚举已注册的模拟服务、按种子生成状态树、批量写出快照文件。
/// 使用 `--help` 查看各子命令的详细说明。
#[derive(Parser, Debug)]
#[command(name = "mockgen")]
#[command(version, about = "模拟 SaaS 后端的种子与快照工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 列出所有已注册的模拟服务
    List,

    /// 生成单个服务的状态树并打印为 JSON
    ///
    /// 不传 `--seed` 时每次生成的内容都不同，结构保持稳定。
    Dump {
        /// 服务名（见 `list` 子命令）
        #[arg(short, long)]
        service: String,

        /// 随机种子，相同种子完整复现同一棵状态树
        #[arg(long)]
        seed: Option<u64>,
    },

    /// 为每个服务生成状态树并写出快照文件
    ///
    /// 文件名遵循 `diverse_{service}_state.json` 约定。
    Populate {
        /// 快照输出目录
        #[arg(short, long, default_value = ".")]
        out_dir: String,

        /// 随机种子，应用到每个服务
        #[arg(long)]
        seed: Option<u64>,
    },
}

// ============================================================================
// 单元测试
// ============================================================================

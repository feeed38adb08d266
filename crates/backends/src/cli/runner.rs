//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑。服务注册表在这里维护：
//! 新增模拟服务时在 `SERVICE_NAMES` 和 `build_backend` 各加一行。

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use mock_harness::MockBackend;
use mock_harness::snapshot::write_state;

use crate::services::{
    CommuniLinkApi, NetflixApi, SlackApi, SmartThingsApi, SpotifyApi, VenmoApi, WalmartApi,
    YouTubeApi,
};

/// 已注册的模拟服务名
pub const SERVICE_NAMES: [&str; 8] = [
    "communilink",
    "netflix",
    "slack",
    "smartthings",
    "spotify",
    "venmo",
    "walmart",
    "youtube",
];

/// 按服务名构造后端实例，未知服务名返回 None
pub fn build_backend(name: &str, seed: Option<u64>) -> Option<Box<dyn MockBackend>> {
    let backend: Box<dyn MockBackend> = match name {
        "communilink" => match seed {
            Some(s) => Box::new(CommuniLinkApi::with_seed(s)),
            None => Box::new(CommuniLinkApi::new()),
        },
        "netflix" => match seed {
            Some(s) => Box::new(NetflixApi::with_seed(s)),
            None => Box::new(NetflixApi::new()),
        },
        "slack" => match seed {
            Some(s) => Box::new(SlackApi::with_seed(s)),
            None => Box::new(SlackApi::new()),
        },
        "smartthings" => match seed {
            Some(s) => Box::new(SmartThingsApi::with_seed(s)),
            None => Box::new(SmartThingsApi::new()),
        },
        "spotify" => match seed {
            Some(s) => Box::new(SpotifyApi::with_seed(s)),
            None => Box::new(SpotifyApi::new()),
        },
        "venmo" => match seed {
            Some(s) => Box::new(VenmoApi::with_seed(s)),
            None => Box::new(VenmoApi::new()),
        },
        "walmart" => match seed {
            Some(s) => Box::new(WalmartApi::with_seed(s)),
            None => Box::new(WalmartApi::new()),
        },
        "youtube" => match seed {
            Some(s) => Box::new(YouTubeApi::with_seed(s)),
            None => Box::new(YouTubeApi::new()),
        },
        _ => return None,
    };
    Some(backend)
}

/// 命令执行器
///
/// 作为 CLI 与服务注册表之间的桥梁，简化 main 函数的复杂度。
pub struct CommandRunner;

impl CommandRunner {
    /// 执行 list 命令
    pub fn run_list(&self) -> Result<()> {
        println!("已注册的模拟服务:");
        println!("{}", "-".repeat(30));
        for name in SERVICE_NAMES {
            println!("  {name}");
        }
        println!("{}", "-".repeat(30));
        println!("\n使用示例: mockgen dump --service netflix --seed 42");
        Ok(())
    }

    /// 执行 dump 命令
    ///
    /// 生成指定服务的状态树并打印为格式化 JSON。
    pub fn run_dump(&self, service: &str, seed: Option<u64>) -> Result<()> {
        let backend = build_backend(service, seed).ok_or_else(|| {
            anyhow::anyhow!(
                "未知的服务名 '{}'\n使用 'mockgen list' 查看所有可用服务",
                service
            )
        })?;

        info!(service, seed = ?seed, "生成状态树");
        let state = backend.export_state();
        let json = serde_json::to_string_pretty(&state).context("序列化状态树失败")?;
        println!("{json}");
        Ok(())
    }

    /// 执行 populate 命令
    ///
    /// 为每个注册的服务生成状态树并按快照命名约定落盘。
    pub fn run_populate(&self, out_dir: &str, seed: Option<u64>) -> Result<()> {
        let dir = Path::new(out_dir);
        info!(out_dir, seed = ?seed, "批量写出状态快照");

        let mut written = Vec::with_capacity(SERVICE_NAMES.len());
        for name in SERVICE_NAMES {
            let backend = match build_backend(name, seed) {
                Some(backend) => backend,
                None => bail!("服务 '{}' 未注册", name),
            };
            let state = backend.export_state();
            let path = write_state(dir, name, &state)
                .with_context(|| format!("写出 {} 快照失败", name))?;
            written.push(path);
        }

        println!("\n快照写出完成:");
        println!("{}", "-".repeat(40));
        for path in &written {
            println!("  {}", path.display());
        }
        println!("{}", "-".repeat(40));
        println!("共 {} 个服务", written.len());
        Ok(())
    }
}

// ============================================================================
// 单元测试
// ============================================================================

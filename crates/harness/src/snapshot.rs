//! 状态快照
//!
//! 服务状态以 `diverse_{service}_state.json` 的命名约定落盘。
//! 加载方优先读文件，文件缺失或解析失败时回退到种子生成，
//! 两种回退都只告警、不报错。

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// 快照文件名约定
pub fn state_file_name(service: &str) -> String {
    format!("diverse_{service}_state.json")
}

/// 快照文件完整路径
pub fn state_file_path(dir: &Path, service: &str) -> PathBuf {
    dir.join(state_file_name(service))
}

/// 尝试从快照目录加载一个服务的状态树
///
/// 文件不存在或 JSON 解析失败返回 None
pub fn load_state<T: DeserializeOwned>(dir: &Path, service: &str) -> Option<T> {
    let path = state_file_path(dir, service);

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %path.display(), %err, "快照文件不可读，使用默认状态");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(state) => {
            debug!(path = %path.display(), service, "已加载状态快照");
            Some(state)
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "快照 JSON 解析失败，使用默认状态");
            None
        }
    }
}

/// 加载快照，缺失时回退到种子生成
pub fn load_or_seed<T, F>(dir: &Path, service: &str, seed: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    load_state(dir, service).unwrap_or_else(seed)
}

/// 把状态树写成快照文件，返回写入路径
pub fn write_state<T: Serialize>(dir: &Path, service: &str, state: &T) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = state_file_path(dir, service);
    let json = serde_json::to_string_pretty(state).map_err(std::io::Error::other)?;
    fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct DemoState {
        users: Vec<String>,
        active_plan: String,
    }

    fn demo_state() -> DemoState {
        DemoState {
            users: vec!["alice".to_string(), "bob".to_string()],
            active_plan: "basic".to_string(),
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mock-harness-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_name_convention() {
        assert_eq!(state_file_name("communilink"), "diverse_communilink_state.json");
    }

    #[test]
    fn test_write_then_load_round_trip() {
        let dir = scratch_dir("round-trip");
        let state = demo_state();

        let path = write_state(&dir, "demo", &state).unwrap();
        assert!(path.ends_with("diverse_demo_state.json"));

        let loaded: DemoState = load_state(&dir, "demo").unwrap();
        assert_eq!(loaded, state);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_falls_back_to_seed() {
        let dir = scratch_dir("missing");

        let state: DemoState = load_or_seed(&dir, "demo", demo_state);
        assert_eq!(state, demo_state());
    }

    #[test]
    fn test_undecodable_file_falls_back_to_seed() {
        let dir = scratch_dir("garbage");
        fs::create_dir_all(&dir).unwrap();
        fs::write(state_file_path(&dir, "demo"), "{ not json").unwrap();

        let state: DemoState = load_or_seed(&dir, "demo", demo_state);
        assert_eq!(state, demo_state());

        let _ = fs::remove_dir_all(&dir);
    }
}

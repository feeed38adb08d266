//! Mock Backends
//!
//! 一组进程内的 SaaS 模拟后端（通信、流媒体、协作、智能家居、
//! 支付、电商等），供 LLM 助手的工具调用测试使用。
//! 每个服务都是同一个模式的实例：种子生成 → 状态容器 → 同步处理器。
//!
//! # 主要模块
//!
//! - `models`: 各服务的实体模型（带随机构造器）
//! - `services`: 各服务的状态容器与操作处理器
//! - `generators`: 种子生成的规模配置
//!
//! # 使用示例
//!
//! ```rust
//! use mock_backends::services::netflix::NetflixApi;
//!
//! // 固定种子，测试可复现
//! let mut api = NetflixApi::with_seed(42);
//!
//! let profiles = api.profiles_list().unwrap();
//! assert!(profiles.iter().any(|p| p.id == "P001"));
//! ```

pub mod cli;
pub mod generators;
pub mod models;
pub mod services;

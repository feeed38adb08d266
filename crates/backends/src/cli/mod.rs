//! mockgen 命令行
//!
//! 命令定义与执行逻辑分离：`commands` 描述接口，`runner` 执行。

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;

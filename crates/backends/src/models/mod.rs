//! 各服务的实体模型
//!
//! 实体是带 `id` 字段的扁平结构，随机构造器用于种子生成阶段的
//! 补充记录。跨实体引用一律通过 ID 字段表达。

pub mod communilink;
pub mod netflix;
pub mod slack;
pub mod smartthings;
pub mod spotify;
pub mod venmo;
pub mod walmart;
pub mod youtube;

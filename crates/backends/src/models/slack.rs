//! Slack 实体模型
//!
//! 工作区成员、频道与消息的数据结构。消息以浮点秒字符串 `ts`
//! 作为标识，与真实 Slack 的时间戳约定一致。

use chrono::{DateTime, Utc};
use mock_harness::seed::SeedContext;
use serde::{Deserialize, Serialize};

/// 工作区信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: String,
    pub name: String,
    pub domain: String,
}

/// 工作区成员
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackUser {
    pub id: String,
    pub name: String,
    pub real_name: String,
    pub email: String,
}

impl SlackUser {
    /// 生成随机成员，用于种子补充
    pub fn random(ctx: &mut SeedContext) -> Self {
        let real_name = ctx.full_name();
        let name = ctx.username();
        let email = format!("{name}@example.com");
        Self {
            id: ctx.short_id("U").to_uppercase(),
            name,
            real_name,
            email,
        }
    }
}

/// 频道
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub is_private: bool,
    pub topic: String,
    pub purpose: String,
    /// 成员的用户 ID 列表
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// 消息
///
/// `ts` 在频道内唯一，线程回复通过 `thread_ts` 指向根消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub ts: String,
    pub channel: String,
    pub user: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

/// 某条消息上的一种表情回应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    pub count: u32,
    pub users: Vec<String>,
}

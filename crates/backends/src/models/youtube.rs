//! YouTube 实体模型
//!
//! 用户、频道、视频、播放列表与评论的数据结构。
//! 频道持有视频 ID 名册，视频通过 channel_id 指回所属频道。

use chrono::{DateTime, Utc};
use mock_harness::seed::SeedContext;
use serde::{Deserialize, Serialize};

/// 平台用户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    /// 名下频道 ID，第一个是主频道
    pub channels: Vec<String>,
    /// 订阅的频道 ID 列表
    pub subscriptions: Vec<String>,
    /// 点过赞的视频 ID 列表
    pub liked_videos: Vec<String>,
    /// 稍后观看的视频 ID 列表
    pub watch_later: Vec<String>,
}

impl YouTubeUser {
    /// 生成随机用户，用于种子补充
    pub fn random(ctx: &mut SeedContext) -> Self {
        let username = ctx.username();
        Self {
            id: ctx.uuid(),
            email: format!("{username}@example.com"),
            display_name: ctx.full_name(),
            channels: Vec::new(),
            subscriptions: Vec::new(),
            liked_videos: Vec::new(),
            watch_later: Vec::new(),
        }
    }
}

/// 频道
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub subscriber_count: u64,
    /// 频道下的视频 ID 名册
    pub video_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    /// 生成随机频道，归属给指定用户
    pub fn random(ctx: &mut SeedContext, owner_id: &str) -> Self {
        Self {
            id: ctx.id("UC"),
            title: ctx.catch_phrase(),
            description: ctx.sentence(),
            owner_id: owner_id.to_string(),
            subscriber_count: ctx.int(0..50_000) as u64,
            video_ids: Vec::new(),
            created_at: ctx.past_datetime(1200),
        }
    }
}

/// 视频
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub uploader_id: String,
    pub published_at: DateTime<Utc>,
    pub duration_seconds: u32,
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub tags: Vec<String>,
    /// 点赞用户的 ID 列表，用于撤销点赞
    pub liked_by: Vec<String>,
    /// 点踩用户的 ID 列表
    pub disliked_by: Vec<String>,
}

impl Video {
    /// 生成随机视频，挂到指定频道下
    pub fn random(ctx: &mut SeedContext, channel_id: &str, uploader_id: &str) -> Self {
        let tag_pool = ["tutorial", "vlog", "music", "gaming", "review"];
        Self {
            id: ctx.short_id("v"),
            title: ctx.catch_phrase(),
            description: ctx.sentence(),
            channel_id: channel_id.to_string(),
            uploader_id: uploader_id.to_string(),
            published_at: ctx.past_datetime(720),
            duration_seconds: ctx.int(30..3600) as u32,
            views: ctx.int(0..1_000_000) as u64,
            likes: ctx.int(0..10_000) as u64,
            dislikes: ctx.int(0..500) as u64,
            tags: vec![ctx.pick(&tag_pool).to_string()],
            liked_by: Vec::new(),
            disliked_by: Vec::new(),
        }
    }
}

/// 播放列表可见性
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyStatus {
    #[default]
    Public,
    Unlisted,
    Private,
}

/// 播放列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub owner_id: String,
    pub privacy_status: PrivacyStatus,
    pub video_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// 视频评论
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub video_id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// 打分动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingAction {
    Like,
    Dislike,
    None,
}

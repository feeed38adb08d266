//! Spotify 实体模型
//!
//! 曲库（歌曲、专辑、艺人）与用户资料的数据结构。
//! 用户的喜欢列表和关注列表只存目标实体的 ID。

use chrono::{DateTime, Utc};
use mock_harness::seed::SeedContext;
use serde::{Deserialize, Serialize};

/// 听歌账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub verified: bool,
    pub liked_songs: Vec<String>,
    pub liked_albums: Vec<String>,
    pub following_artists: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// 歌曲
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    pub duration_seconds: i64,
    pub genre: String,
}

impl Song {
    /// 生成随机歌曲，归属给定艺人
    pub fn random(ctx: &mut SeedContext, artist_id: &str, artist_name: &str) -> Self {
        let genres = ["pop", "rock", "jazz", "electronic", "hip-hop", "classical"];
        Self {
            id: ctx.short_id("T"),
            title: ctx.catch_phrase(),
            artist_id: artist_id.to_string(),
            artist_name: artist_name.to_string(),
            album_id: None,
            duration_seconds: ctx.int(90..420),
            genre: ctx.pick(&genres).to_string(),
        }
    }
}

/// 专辑
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    pub year: i32,
    pub song_ids: Vec<String>,
}

/// 艺人
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub genre: String,
    pub follower_count: u64,
}

impl Artist {
    /// 生成随机艺人
    pub fn random(ctx: &mut SeedContext) -> Self {
        let genres = ["pop", "rock", "jazz", "electronic", "hip-hop", "classical"];
        Self {
            id: ctx.short_id("A"),
            name: ctx.full_name(),
            genre: ctx.pick(&genres).to_string(),
            follower_count: ctx.int(100..5_000_000) as u64,
        }
    }
}

/// 歌单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub is_public: bool,
    pub song_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

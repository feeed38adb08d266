//! Netflix 实体模型
//!
//! 档案、片库内容与观看进度的数据结构。

use chrono::{DateTime, Utc};
use mock_harness::seed::SeedContext;
use serde::{Deserialize, Serialize};

/// 账户下的观看档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetflixProfile {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub maturity_level: MaturityLevel,
    pub language: String,
    pub autoplay: bool,
}

/// 内容分级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityLevel {
    #[default]
    Adult,
    Teen,
    Kids,
}

/// 内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Movie,
    Series,
}

/// 片库条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub title: String,
    pub kind: ContentKind,
    pub year: i32,
    /// 分级标签（R、TV-MA 等）
    pub rating: String,
    /// 电影时长（分钟），剧集为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    /// 剧集季数，电影为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasons: Option<u32>,
    pub genres: Vec<String>,
    pub description: String,
    pub cast: Vec<String>,
}

impl Content {
    /// 生成随机片库条目，用于种子补充
    pub fn random(ctx: &mut SeedContext) -> Self {
        let kind = if ctx.chance(0.6) {
            ContentKind::Movie
        } else {
            ContentKind::Series
        };
        let genres = ["Drama", "Comedy", "Thriller", "Sci-Fi", "Documentary"];
        let ratings = ["G", "PG-13", "R", "TV-14", "TV-MA"];

        let (prefix, duration_minutes, seasons) = match kind {
            ContentKind::Movie => ("M", Some(ctx.int(80..180)), None),
            ContentKind::Series => ("S", None, Some(ctx.int(1..8) as u32)),
        };

        Self {
            id: ctx.short_id(prefix),
            title: ctx.catch_phrase(),
            kind,
            year: ctx.int(1980..2026) as i32,
            rating: ctx.pick(&ratings).to_string(),
            duration_minutes,
            seasons,
            genres: vec![ctx.pick(&genres).to_string()],
            description: ctx.sentence(),
            cast: vec![ctx.full_name(), ctx.full_name()],
        }
    }
}

/// 继续观看条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinueWatchingEntry {
    pub content_id: String,
    /// 进度百分比 0-100
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_content_kind_fields_match() {
        let mut ctx = SeedContext::with_seed(21);
        for _ in 0..20 {
            let content = Content::random(&mut ctx);
            match content.kind {
                ContentKind::Movie => {
                    assert!(content.id.starts_with('M'));
                    assert!(content.duration_minutes.is_some());
                    assert!(content.seasons.is_none());
                }
                ContentKind::Series => {
                    assert!(content.id.starts_with('S'));
                    assert!(content.duration_minutes.is_none());
                    assert!(content.seasons.is_some());
                }
            }
        }
    }
}

//! YouTube 模拟服务
//!
//! 频道、视频、播放列表与评论的内存模拟。
//! 认证方式与 Venmo 相同（`token_{email}`）。删除视频时级联清理
//! 频道名册、播放列表、点赞列表和评论，不留悬挂引用。

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use mock_harness::page::{Page, PageQuery, paginate};
use mock_harness::result::{ApiError, ApiResult};
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use mock_harness::MockBackend;

use crate::generators::SeedProfile;
use crate::models::youtube::{
    Channel, Comment, Playlist, PrivacyStatus, RatingAction, Video, YouTubeUser,
};

/// YouTube 状态树
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeState {
    pub users: MemoryStore<YouTubeUser>,
    pub channels: MemoryStore<Channel>,
    pub videos: MemoryStore<Video>,
    pub playlists: MemoryStore<Playlist>,
    pub comments: MemoryStore<Comment>,
    /// 当前登录用户，None 表示未认证
    pub current_user_id: Option<String>,
    pub access_token: Option<String>,
}

impl YouTubeState {
    /// 生成默认种子树：两位锚点用户各一个频道 + 锚点视频/播放列表
    pub fn seed(ctx: &mut SeedContext, profile: &SeedProfile) -> Self {
        let alice_id = ctx.uuid();
        let bob_id = ctx.uuid();

        let mut users = MemoryStore::new();
        users.insert(
            &alice_id.clone(),
            YouTubeUser {
                id: alice_id.clone(),
                email: "alice@youtube.example".to_string(),
                display_name: "Alice Walker".to_string(),
                channels: vec!["UC001".to_string()],
                subscriptions: vec!["UC002".to_string()],
                liked_videos: Vec::new(),
                watch_later: vec!["V003".to_string()],
            },
        );
        users.insert(
            &bob_id.clone(),
            YouTubeUser {
                id: bob_id.clone(),
                email: "bob@youtube.example".to_string(),
                display_name: "Bob Chen".to_string(),
                channels: vec!["UC002".to_string()],
                subscriptions: Vec::new(),
                liked_videos: Vec::new(),
                watch_later: Vec::new(),
            },
        );

        let mut channels = MemoryStore::new();
        channels.insert(
            "UC001",
            Channel {
                id: "UC001".to_string(),
                title: "Alice Cooks".to_string(),
                description: "Weeknight recipes and kitchen basics.".to_string(),
                owner_id: alice_id.clone(),
                subscriber_count: 0,
                video_ids: vec!["V001".to_string(), "V002".to_string()],
                created_at: ctx.past_datetime(1200),
            },
        );
        channels.insert(
            "UC002",
            Channel {
                id: "UC002".to_string(),
                title: "Bob's Garage".to_string(),
                description: "Car repair walkthroughs.".to_string(),
                owner_id: bob_id.clone(),
                subscriber_count: 1,
                video_ids: vec!["V003".to_string()],
                created_at: ctx.past_datetime(1200),
            },
        );

        let mut videos = MemoryStore::new();
        let anchor_videos = [
            ("V001", "UC001", &alice_id, "Fifteen Minute Pasta", 412),
            ("V002", "UC001", &alice_id, "Knife Skills 101", 655),
            ("V003", "UC002", &bob_id, "Brake Pad Replacement", 903),
        ];
        for (id, channel_id, uploader, title, duration) in anchor_videos {
            videos.insert(
                id,
                Video {
                    id: id.to_string(),
                    title: title.to_string(),
                    description: ctx.sentence(),
                    channel_id: channel_id.to_string(),
                    uploader_id: uploader.clone(),
                    published_at: ctx.past_datetime(360),
                    duration_seconds: duration,
                    views: ctx.int(100..100_000) as u64,
                    likes: ctx.int(0..2_000) as u64,
                    dislikes: ctx.int(0..100) as u64,
                    tags: vec!["tutorial".to_string()],
                    liked_by: Vec::new(),
                    disliked_by: Vec::new(),
                },
            );
        }

        let mut playlists = MemoryStore::new();
        playlists.insert(
            "PL001",
            Playlist {
                id: "PL001".to_string(),
                title: "Cooking Basics".to_string(),
                description: "Start here.".to_string(),
                channel_id: "UC001".to_string(),
                owner_id: alice_id.clone(),
                privacy_status: PrivacyStatus::Public,
                video_ids: vec!["V001".to_string()],
                created_at: ctx.past_datetime(360),
            },
        );

        let mut comments = MemoryStore::new();
        let comment_id = ctx.uuid();
        comments.insert(
            &comment_id,
            Comment {
                id: comment_id.clone(),
                video_id: "V001".to_string(),
                author_id: bob_id.clone(),
                author_name: "Bob Chen".to_string(),
                text: "Made this tonight, worked great.".to_string(),
                created_at: ctx.past_datetime(30),
            },
        );

        // 随机补充用户，各带一个频道和若干视频
        for _ in 0..profile.extra_users {
            let mut user = YouTubeUser::random(ctx);
            let mut channel = Channel::random(ctx, &user.id);
            let video_count = ctx.int(
                profile.history_per_user.start as i64..profile.history_per_user.end as i64,
            );
            for _ in 0..video_count {
                let video = Video::random(ctx, &channel.id, &user.id);
                channel.video_ids.push(video.id.clone());
                videos.insert(&video.id.clone(), video);
            }
            user.channels.push(channel.id.clone());
            channels.insert(&channel.id.clone(), channel);
            users.insert(&user.id.clone(), user);
        }

        Self {
            users,
            channels,
            videos,
            playlists,
            comments,
            current_user_id: None,
            access_token: None,
        }
    }
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 更新频道请求，只合并显式提供的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChannelRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// 上传视频请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 创建播放列表请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub privacy_status: PrivacyStatus,
}

// ============================================================================
// 状态容器
// ============================================================================

/// YouTube API 容器
#[derive(Debug)]
pub struct YouTubeApi {
    pub state: YouTubeState,
    ctx: SeedContext,
    profile: SeedProfile,
}

impl Default for YouTubeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl YouTubeApi {
    pub fn new() -> Self {
        Self::build(SeedContext::new(), SeedProfile::default())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::build(SeedContext::with_seed(seed), SeedProfile::default())
    }

    pub fn with_profile(ctx: SeedContext, profile: SeedProfile) -> Self {
        Self::build(ctx, profile)
    }

    pub fn from_state(state: YouTubeState) -> Self {
        Self {
            state,
            ctx: SeedContext::new(),
            profile: SeedProfile::default(),
        }
    }

    fn build(mut ctx: SeedContext, profile: SeedProfile) -> Self {
        let state = YouTubeState::seed(&mut ctx, &profile);
        Self {
            state,
            ctx,
            profile,
        }
    }

    fn require_auth(&self) -> ApiResult<String> {
        self.state
            .current_user_id
            .clone()
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }

    fn current_user(&self) -> ApiResult<YouTubeUser> {
        let user_id = self.require_auth()?;
        self.state
            .users
            .get(&user_id)
            .ok_or_else(|| ApiError::not_found("user", &user_id))
    }

    fn require_channel(&self, channel_id: &str) -> ApiResult<Channel> {
        self.state
            .channels
            .get(channel_id)
            .ok_or_else(|| ApiError::not_found("channel", channel_id))
    }

    fn require_video(&self, video_id: &str) -> ApiResult<Video> {
        self.state
            .videos
            .get(video_id)
            .ok_or_else(|| ApiError::not_found("video", video_id))
    }

    fn require_playlist(&self, playlist_id: &str) -> ApiResult<Playlist> {
        self.state
            .playlists
            .get(playlist_id)
            .ok_or_else(|| ApiError::not_found("playlist", playlist_id))
    }

    // ------------------------------------------------------------------
    // 认证
    // ------------------------------------------------------------------

    /// 用 `token_{email}` 形式的令牌认证
    pub fn authenticate(&mut self, access_token: &str) -> ApiResult<YouTubeUser> {
        let email = access_token
            .strip_prefix("token_")
            .ok_or_else(|| ApiError::unauthorized("invalid access token"))?;

        let user = self
            .state
            .users
            .list_by(|u| u.email == email)
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::unauthorized("invalid access token"))?;

        self.state.access_token = Some(access_token.to_string());
        self.state.current_user_id = Some(user.id.clone());
        info!(user_id = %user.id, "YouTube 用户已认证");
        Ok(user)
    }

    // ------------------------------------------------------------------
    // 频道
    // ------------------------------------------------------------------

    /// 当前用户的主频道（名下第一个）
    pub fn get_my_channel(&self) -> ApiResult<Channel> {
        let user = self.current_user()?;
        let channel_id = user
            .channels
            .first()
            .ok_or_else(|| ApiError::not_found("channel for user", &user.id))?;
        self.require_channel(channel_id)
    }

    pub fn get_channel(&self, channel_id: &str) -> ApiResult<Channel> {
        self.require_channel(channel_id)
    }

    pub fn create_channel(&mut self, title: &str, description: &str) -> ApiResult<Channel> {
        let user_id = self.require_auth()?;
        if title.is_empty() {
            return Err(ApiError::validation("channel title is required"));
        }

        let channel = Channel {
            id: self.ctx.id("UC"),
            title: title.to_string(),
            description: description.to_string(),
            owner_id: user_id.clone(),
            subscriber_count: 0,
            video_ids: Vec::new(),
            created_at: Utc::now(),
        };
        self.state.channels.insert(&channel.id.clone(), channel.clone());
        self.state
            .users
            .update(&user_id, |u| u.channels.push(channel.id.clone()));
        info!(channel_id = %channel.id, title, "创建频道");
        Ok(channel)
    }

    /// 更新频道，只有属主可以改
    pub fn update_channel(
        &mut self,
        channel_id: &str,
        req: UpdateChannelRequest,
    ) -> ApiResult<Channel> {
        let user_id = self.require_auth()?;
        let channel = self.require_channel(channel_id)?;
        if channel.owner_id != user_id {
            return Err(ApiError::unauthorized(
                "only the channel owner can update this channel",
            ));
        }

        self.state.channels.update(channel_id, |c| {
            if let Some(title) = req.title.clone() {
                c.title = title;
            }
            if let Some(description) = req.description.clone() {
                c.description = description;
            }
        });
        self.require_channel(channel_id)
    }

    // ------------------------------------------------------------------
    // 订阅
    // ------------------------------------------------------------------

    /// 订阅频道，重复订阅保持单条且不重复计数
    pub fn subscribe(&mut self, channel_id: &str) -> ApiResult<Channel> {
        let user = self.current_user()?;
        self.require_channel(channel_id)?;

        if !user.subscriptions.iter().any(|id| id == channel_id) {
            self.state
                .users
                .update(&user.id, |u| u.subscriptions.push(channel_id.to_string()));
            self.state
                .channels
                .update(channel_id, |c| c.subscriber_count += 1);
        }
        self.require_channel(channel_id)
    }

    /// 退订频道；未订阅时静默成功，计数下限为 0
    pub fn unsubscribe(&mut self, channel_id: &str) -> ApiResult<Channel> {
        let user = self.current_user()?;
        self.require_channel(channel_id)?;

        if user.subscriptions.iter().any(|id| id == channel_id) {
            self.state
                .users
                .update(&user.id, |u| u.subscriptions.retain(|id| id != channel_id));
            self.state.channels.update(channel_id, |c| {
                c.subscriber_count = c.subscriber_count.saturating_sub(1);
            });
        }
        self.require_channel(channel_id)
    }

    pub fn list_my_subscriptions(&self, page: &PageQuery) -> ApiResult<Page<Channel>> {
        let user = self.current_user()?;
        let channels: Vec<Channel> = user
            .subscriptions
            .iter()
            .filter_map(|id| self.state.channels.get(id))
            .collect();
        Ok(paginate(channels, page))
    }

    // ------------------------------------------------------------------
    // 视频
    // ------------------------------------------------------------------

    /// 上传视频到当前用户的主频道
    pub fn upload_video(&mut self, req: UploadVideoRequest) -> ApiResult<Video> {
        let user = self.current_user()?;
        if req.title.is_empty() {
            return Err(ApiError::validation("video title is required"));
        }
        let channel_id = user
            .channels
            .first()
            .cloned()
            .ok_or_else(|| ApiError::not_found("channel for user", &user.id))?;

        let video = Video {
            id: self.ctx.short_id("v"),
            title: req.title,
            description: req.description,
            channel_id: channel_id.clone(),
            uploader_id: user.id.clone(),
            published_at: Utc::now(),
            duration_seconds: req.duration_seconds,
            views: 0,
            likes: 0,
            dislikes: 0,
            tags: req.tags,
            liked_by: Vec::new(),
            disliked_by: Vec::new(),
        };
        self.state.videos.insert(&video.id.clone(), video.clone());
        self.state
            .channels
            .update(&channel_id, |c| c.video_ids.push(video.id.clone()));
        info!(video_id = %video.id, channel_id = %channel_id, "上传视频");
        Ok(video)
    }

    pub fn get_video(&self, video_id: &str) -> ApiResult<Video> {
        self.require_video(video_id)
    }

    pub fn list_channel_videos(
        &self,
        channel_id: &str,
        page: &PageQuery,
    ) -> ApiResult<Page<Video>> {
        let channel = self.require_channel(channel_id)?;
        let videos: Vec<Video> = channel
            .video_ids
            .iter()
            .filter_map(|id| self.state.videos.get(id))
            .collect();
        Ok(paginate(videos, page))
    }

    /// 给视频打分：like/dislike 互斥，none 撤销两者，全部幂等
    pub fn rate_video(&mut self, video_id: &str, rating: RatingAction) -> ApiResult<Video> {
        let user_id = self.require_auth()?;
        self.require_video(video_id)?;

        self.state.videos.update(video_id, |v| {
            let liked = v.liked_by.iter().any(|id| *id == user_id);
            let disliked = v.disliked_by.iter().any(|id| *id == user_id);
            match rating {
                RatingAction::Like => {
                    if disliked {
                        v.disliked_by.retain(|id| *id != user_id);
                        v.dislikes = v.dislikes.saturating_sub(1);
                    }
                    if !liked {
                        v.liked_by.push(user_id.clone());
                        v.likes += 1;
                    }
                }
                RatingAction::Dislike => {
                    if liked {
                        v.liked_by.retain(|id| *id != user_id);
                        v.likes = v.likes.saturating_sub(1);
                    }
                    if !disliked {
                        v.disliked_by.push(user_id.clone());
                        v.dislikes += 1;
                    }
                }
                RatingAction::None => {
                    if liked {
                        v.liked_by.retain(|id| *id != user_id);
                        v.likes = v.likes.saturating_sub(1);
                    }
                    if disliked {
                        v.disliked_by.retain(|id| *id != user_id);
                        v.dislikes = v.dislikes.saturating_sub(1);
                    }
                }
            }
        });

        let video = self.require_video(video_id)?;
        self.state.users.update(&user_id, |u| {
            u.liked_videos.retain(|id| id != video_id);
            if video.liked_by.iter().any(|id| *id == user_id) {
                u.liked_videos.push(video_id.to_string());
            }
        });
        Ok(video)
    }

    /// 按标题/描述/标签子串检索视频
    pub fn search_videos(&self, query: &str, page: &PageQuery) -> ApiResult<Page<Video>> {
        if query.is_empty() {
            return Err(ApiError::validation("query is required"));
        }
        let needle = query.to_lowercase();
        let matches = self.state.videos.list_by(|v| {
            v.title.to_lowercase().contains(&needle)
                || v.description.to_lowercase().contains(&needle)
                || v.tags.iter().any(|t| t.to_lowercase().contains(&needle))
        });
        Ok(paginate(matches, page))
    }

    /// 删除视频并级联清理全部指向它的引用
    ///
    /// 清理范围：频道名册、所有播放列表、用户点赞列表、该视频的评论
    pub fn delete_video(&mut self, video_id: &str) -> ApiResult<()> {
        let user_id = self.require_auth()?;
        let video = self.require_video(video_id)?;
        let channel = self.require_channel(&video.channel_id)?;
        if channel.owner_id != user_id {
            return Err(ApiError::unauthorized(
                "only the video owner can delete this video",
            ));
        }

        self.state.videos.remove(video_id);
        self.state.channels.update(&video.channel_id, |c| {
            c.video_ids.retain(|id| id != video_id);
        });
        for playlist_id in self.state.playlists.ids() {
            self.state.playlists.update(&playlist_id, |p| {
                p.video_ids.retain(|id| id != video_id);
            });
        }
        for uid in self.state.users.ids() {
            self.state.users.update(&uid, |u| {
                u.liked_videos.retain(|id| id != video_id);
                u.watch_later.retain(|id| id != video_id);
            });
        }
        let comment_ids: Vec<String> = self
            .state
            .comments
            .list_by(|c| c.video_id == video_id)
            .into_iter()
            .map(|c| c.id)
            .collect();
        for comment_id in comment_ids {
            self.state.comments.remove(&comment_id);
        }

        info!(video_id, "视频已删除");
        Ok(())
    }

    // ------------------------------------------------------------------
    // 稍后观看
    // ------------------------------------------------------------------

    /// 加入稍后观看，重复添加保持单条
    pub fn watch_later_add(&mut self, video_id: &str) -> ApiResult<Vec<String>> {
        let user_id = self.require_auth()?;
        self.require_video(video_id)?;

        self.state.users.update(&user_id, |u| {
            if !u.watch_later.iter().any(|id| id == video_id) {
                u.watch_later.push(video_id.to_string());
            }
        });
        Ok(self.current_user()?.watch_later)
    }

    /// 从稍后观看移除，条目不存在时静默成功
    pub fn watch_later_remove(&mut self, video_id: &str) -> ApiResult<Vec<String>> {
        let user_id = self.require_auth()?;
        self.state.users.update(&user_id, |u| {
            u.watch_later.retain(|id| id != video_id);
        });
        Ok(self.current_user()?.watch_later)
    }

    pub fn watch_later_list(&self) -> ApiResult<Vec<Video>> {
        let user = self.current_user()?;
        Ok(user
            .watch_later
            .iter()
            .filter_map(|id| self.state.videos.get(id))
            .collect())
    }

    // ------------------------------------------------------------------
    // 播放列表
    // ------------------------------------------------------------------

    /// 在当前用户的主频道下创建播放列表
    pub fn create_playlist(&mut self, req: CreatePlaylistRequest) -> ApiResult<Playlist> {
        let user = self.current_user()?;
        if req.title.is_empty() {
            return Err(ApiError::validation("playlist title is required"));
        }
        let channel_id = user
            .channels
            .first()
            .cloned()
            .ok_or_else(|| ApiError::not_found("channel for user", &user.id))?;

        let playlist = Playlist {
            id: self.ctx.id("PL"),
            title: req.title,
            description: req.description,
            channel_id,
            owner_id: user.id.clone(),
            privacy_status: req.privacy_status,
            video_ids: Vec::new(),
            created_at: Utc::now(),
        };
        self.state
            .playlists
            .insert(&playlist.id.clone(), playlist.clone());
        Ok(playlist)
    }

    pub fn get_playlist(&self, playlist_id: &str) -> ApiResult<Playlist> {
        self.require_playlist(playlist_id)
    }

    /// 添加视频到播放列表，重复添加保持单条
    pub fn add_video_to_playlist(
        &mut self,
        playlist_id: &str,
        video_id: &str,
    ) -> ApiResult<Playlist> {
        let user_id = self.require_auth()?;
        let playlist = self.require_playlist(playlist_id)?;
        if playlist.owner_id != user_id {
            return Err(ApiError::unauthorized(
                "only the playlist owner can add videos",
            ));
        }
        self.require_video(video_id)?;

        self.state.playlists.update(playlist_id, |p| {
            if !p.video_ids.iter().any(|id| id == video_id) {
                p.video_ids.push(video_id.to_string());
            }
        });
        self.require_playlist(playlist_id)
    }

    /// 从播放列表移除视频，条目不存在时静默成功
    pub fn remove_video_from_playlist(
        &mut self,
        playlist_id: &str,
        video_id: &str,
    ) -> ApiResult<Playlist> {
        let user_id = self.require_auth()?;
        let playlist = self.require_playlist(playlist_id)?;
        if playlist.owner_id != user_id {
            return Err(ApiError::unauthorized(
                "only the playlist owner can remove videos",
            ));
        }

        self.state.playlists.update(playlist_id, |p| {
            p.video_ids.retain(|id| id != video_id);
        });
        self.require_playlist(playlist_id)
    }

    // ------------------------------------------------------------------
    // 评论
    // ------------------------------------------------------------------

    pub fn add_comment_to_video(&mut self, video_id: &str, text: &str) -> ApiResult<Comment> {
        let user = self.current_user()?;
        if text.is_empty() {
            return Err(ApiError::validation("comment text cannot be empty"));
        }
        self.require_video(video_id)?;

        let comment = Comment {
            id: self.ctx.uuid(),
            video_id: video_id.to_string(),
            author_id: user.id.clone(),
            author_name: user.display_name.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.state
            .comments
            .insert(&comment.id.clone(), comment.clone());
        Ok(comment)
    }

    pub fn list_comments_for_video(
        &self,
        video_id: &str,
        page: &PageQuery,
    ) -> ApiResult<Page<Comment>> {
        self.require_video(video_id)?;
        let comments = self.state.comments.list_by(|c| c.video_id == video_id);
        Ok(paginate(comments, page))
    }

    /// 删除评论，只有作者本人可以删
    pub fn delete_comment(&mut self, comment_id: &str) -> ApiResult<()> {
        let user_id = self.require_auth()?;
        let comment = self
            .state
            .comments
            .get(comment_id)
            .ok_or_else(|| ApiError::not_found("comment", comment_id))?;
        if comment.author_id != user_id {
            return Err(ApiError::unauthorized(
                "only the comment author can delete this comment",
            ));
        }
        self.state.comments.remove(comment_id);
        Ok(())
    }
}

impl MockBackend for YouTubeApi {
    fn service_name(&self) -> &'static str {
        "youtube"
    }

    fn export_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn reset_data(&mut self) -> bool {
        let mut ctx = self.ctx.renew();
        self.state = YouTubeState::seed(&mut ctx, &self.profile);
        self.ctx = ctx;
        info!("YouTube 状态已重置");
        true
    }
}

// ============================================================================
// 单元测试
// ============================================================================

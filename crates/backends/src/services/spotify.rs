//! Spotify 模拟服务
//!
//! 曲库检索、喜欢/收藏、歌单管理与艺人关注的内存模拟。
//! 喜欢和关注类操作全部幂等：重复添加保持单条，移除不存在的
//! 条目静默成功。

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use mock_harness::result::{ApiError, ApiResult};
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use mock_harness::MockBackend;

use crate::generators::SeedProfile;
use crate::models::spotify::{Album, Artist, Playlist, Song, SpotifyUser};

/// Spotify 状态树
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyState {
    pub users: MemoryStore<SpotifyUser>,
    pub songs: MemoryStore<Song>,
    pub albums: MemoryStore<Album>,
    pub artists: MemoryStore<Artist>,
    pub playlists: MemoryStore<Playlist>,
    pub genres: Vec<String>,
    /// 当前登录用户，None 表示未登录
    pub current_user_id: Option<String>,
}

impl SpotifyState {
    /// 生成默认种子树：两位锚点用户、锚点曲库 + 随机补充
    pub fn seed(ctx: &mut SeedContext, profile: &SeedProfile) -> Self {
        let mut artists = MemoryStore::new();
        artists.insert(
            "A001",
            Artist {
                id: "A001".to_string(),
                name: "The Midnight Collective".to_string(),
                genre: "electronic".to_string(),
                follower_count: 1_250_000,
            },
        );
        artists.insert(
            "A002",
            Artist {
                id: "A002".to_string(),
                name: "Ruby Harper".to_string(),
                genre: "pop".to_string(),
                follower_count: 860_000,
            },
        );

        let mut songs = MemoryStore::new();
        let anchor_songs = [
            ("T001", "Neon Skyline", "A001", "The Midnight Collective", 214),
            ("T002", "Glass Rivers", "A001", "The Midnight Collective", 189),
            ("T003", "Paper Hearts", "A002", "Ruby Harper", 201),
            ("T004", "Late Summer", "A002", "Ruby Harper", 176),
        ];
        for (id, title, artist_id, artist_name, duration) in anchor_songs {
            songs.insert(
                id,
                Song {
                    id: id.to_string(),
                    title: title.to_string(),
                    artist_id: artist_id.to_string(),
                    artist_name: artist_name.to_string(),
                    album_id: Some(if artist_id == "A001" { "AL001" } else { "AL002" }.to_string()),
                    duration_seconds: duration,
                    genre: if artist_id == "A001" { "electronic" } else { "pop" }.to_string(),
                },
            );
        }

        let mut albums = MemoryStore::new();
        albums.insert(
            "AL001",
            Album {
                id: "AL001".to_string(),
                title: "City Lights".to_string(),
                artist_id: "A001".to_string(),
                artist_name: "The Midnight Collective".to_string(),
                year: 2021,
                song_ids: vec!["T001".to_string(), "T002".to_string()],
            },
        );
        albums.insert(
            "AL002",
            Album {
                id: "AL002".to_string(),
                title: "Postcards".to_string(),
                artist_id: "A002".to_string(),
                artist_name: "Ruby Harper".to_string(),
                year: 2023,
                song_ids: vec!["T003".to_string(), "T004".to_string()],
            },
        );

        // 随机补充艺人和歌曲
        let extra = ctx.int(profile.extra_catalog.start as i64..profile.extra_catalog.end as i64);
        for _ in 0..extra {
            let artist = Artist::random(ctx);
            let song = Song::random(ctx, &artist.id, &artist.name);
            artists.insert(&artist.id.clone(), artist);
            songs.insert(&song.id.clone(), song);
        }

        let alice_id = ctx.uuid();
        let bob_id = ctx.uuid();
        let mut users = MemoryStore::new();
        users.insert(
            &alice_id.clone(),
            SpotifyUser {
                id: alice_id.clone(),
                first_name: "Alice".to_string(),
                last_name: "Walker".to_string(),
                email: "alice@spotify.example".to_string(),
                password: "alice-secret".to_string(),
                verified: true,
                liked_songs: vec!["T001".to_string()],
                liked_albums: Vec::new(),
                following_artists: vec!["A001".to_string()],
                created_at: ctx.past_datetime(700),
            },
        );
        users.insert(
            &bob_id.clone(),
            SpotifyUser {
                id: bob_id.clone(),
                first_name: "Bob".to_string(),
                last_name: "Reyes".to_string(),
                email: "bob@spotify.example".to_string(),
                password: "bob-secret".to_string(),
                verified: true,
                liked_songs: Vec::new(),
                liked_albums: Vec::new(),
                following_artists: Vec::new(),
                created_at: ctx.past_datetime(700),
            },
        );

        let mut playlists = MemoryStore::new();
        playlists.insert(
            "PL001",
            Playlist {
                id: "PL001".to_string(),
                title: "Focus Mix".to_string(),
                owner_id: alice_id.clone(),
                is_public: true,
                song_ids: vec!["T001".to_string(), "T003".to_string()],
                created_at: ctx.past_datetime(90),
            },
        );
        playlists.insert(
            "PL002",
            Playlist {
                id: "PL002".to_string(),
                title: "Bob's Gym Set".to_string(),
                owner_id: bob_id,
                is_public: false,
                song_ids: vec!["T004".to_string()],
                created_at: ctx.past_datetime(90),
            },
        );

        Self {
            users,
            songs,
            albums,
            artists,
            playlists,
            genres: vec![
                "pop".to_string(),
                "rock".to_string(),
                "jazz".to_string(),
                "electronic".to_string(),
                "hip-hop".to_string(),
                "classical".to_string(),
            ],
            current_user_id: Some(alice_id),
        }
    }
}

// ============================================================================
// 响应 DTO
// ============================================================================

/// 账户视图，不含密码
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub verified: bool,
}

impl AccountView {
    fn from_user(user: &SpotifyUser) -> Self {
        Self {
            user_id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            verified: user.verified,
        }
    }
}

// ============================================================================
// 状态容器
// ============================================================================

/// Spotify API 容器
#[derive(Debug)]
pub struct SpotifyApi {
    pub state: SpotifyState,
    ctx: SeedContext,
    profile: SeedProfile,
}

impl Default for SpotifyApi {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotifyApi {
    pub fn new() -> Self {
        Self::build(SeedContext::new(), SeedProfile::default())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::build(SeedContext::with_seed(seed), SeedProfile::default())
    }

    pub fn with_profile(ctx: SeedContext, profile: SeedProfile) -> Self {
        Self::build(ctx, profile)
    }

    pub fn from_state(state: SpotifyState) -> Self {
        Self {
            state,
            ctx: SeedContext::new(),
            profile: SeedProfile::default(),
        }
    }

    fn build(mut ctx: SeedContext, profile: SeedProfile) -> Self {
        let state = SpotifyState::seed(&mut ctx, &profile);
        Self {
            state,
            ctx,
            profile,
        }
    }

    fn require_login(&self) -> ApiResult<String> {
        self.state
            .current_user_id
            .clone()
            .ok_or_else(|| ApiError::unauthorized("no user is logged in"))
    }

    fn current_user(&self) -> ApiResult<SpotifyUser> {
        let user_id = self.require_login()?;
        self.state
            .users
            .get(&user_id)
            .ok_or_else(|| ApiError::not_found("user", &user_id))
    }

    fn require_song(&self, song_id: &str) -> ApiResult<Song> {
        self.state
            .songs
            .get(song_id)
            .ok_or_else(|| ApiError::not_found("song", song_id))
    }

    fn require_playlist(&self, playlist_id: &str) -> ApiResult<Playlist> {
        self.state
            .playlists
            .get(playlist_id)
            .ok_or_else(|| ApiError::not_found("playlist", playlist_id))
    }

    /// 校验歌单归属当前用户
    fn require_own_playlist(&self, playlist_id: &str) -> ApiResult<Playlist> {
        let user_id = self.require_login()?;
        let playlist = self.require_playlist(playlist_id)?;
        if playlist.owner_id != user_id {
            return Err(ApiError::unauthorized(
                "playlist belongs to a different user",
            ));
        }
        Ok(playlist)
    }

    // ------------------------------------------------------------------
    // 账户
    // ------------------------------------------------------------------

    pub fn login(&mut self, email: &str, password: &str) -> ApiResult<AccountView> {
        let user = self
            .state
            .users
            .list()
            .into_iter()
            .find(|u| u.email == email)
            .ok_or_else(|| ApiError::unauthorized("invalid email or password"))?;
        if user.password != password {
            return Err(ApiError::unauthorized("invalid email or password"));
        }

        self.state.current_user_id = Some(user.id.clone());
        info!(email, "用户已登录");
        Ok(AccountView::from_user(&user))
    }

    pub fn logout(&mut self) -> ApiResult<()> {
        self.state.current_user_id = None;
        Ok(())
    }

    /// 当前登录账户
    pub fn show_account(&self) -> ApiResult<AccountView> {
        Ok(AccountView::from_user(&self.current_user()?))
    }

    /// 按邮箱查看公开资料
    pub fn show_profile(&self, email: &str) -> ApiResult<AccountView> {
        self.state
            .users
            .list()
            .into_iter()
            .find(|u| u.email == email)
            .map(|u| AccountView::from_user(&u))
            .ok_or_else(|| ApiError::not_found("user", email))
    }

    pub fn show_genres(&self) -> ApiResult<Vec<String>> {
        Ok(self.state.genres.clone())
    }

    // ------------------------------------------------------------------
    // 歌曲
    // ------------------------------------------------------------------

    /// 按标题或艺人子串检索歌曲
    pub fn search_songs(&self, query: &str) -> ApiResult<Vec<Song>> {
        let query = query.to_lowercase();
        Ok(self.state.songs.list_by(|s| {
            s.title.to_lowercase().contains(&query)
                || s.artist_name.to_lowercase().contains(&query)
        }))
    }

    pub fn show_song(&self, song_id: &str) -> ApiResult<Song> {
        self.require_song(song_id)
    }

    /// 喜欢歌曲，重复喜欢保持单条
    pub fn like_song(&mut self, song_id: &str) -> ApiResult<()> {
        let user_id = self.require_login()?;
        self.require_song(song_id)?;
        self.state.users.update(&user_id, |u| {
            if !u.liked_songs.iter().any(|id| id == song_id) {
                u.liked_songs.push(song_id.to_string());
            }
        });
        Ok(())
    }

    /// 取消喜欢，未喜欢过时静默成功
    pub fn unlike_song(&mut self, song_id: &str) -> ApiResult<()> {
        let user_id = self.require_login()?;
        self.state
            .users
            .update(&user_id, |u| u.liked_songs.retain(|id| id != song_id));
        Ok(())
    }

    pub fn show_liked_songs(&self) -> ApiResult<Vec<Song>> {
        let user = self.current_user()?;
        Ok(user
            .liked_songs
            .iter()
            .filter_map(|id| self.state.songs.get(id))
            .collect())
    }

    // ------------------------------------------------------------------
    // 专辑
    // ------------------------------------------------------------------

    pub fn search_albums(&self, query: &str) -> ApiResult<Vec<Album>> {
        let query = query.to_lowercase();
        Ok(self.state.albums.list_by(|a| {
            a.title.to_lowercase().contains(&query)
                || a.artist_name.to_lowercase().contains(&query)
        }))
    }

    pub fn show_album(&self, album_id: &str) -> ApiResult<Album> {
        self.state
            .albums
            .get(album_id)
            .ok_or_else(|| ApiError::not_found("album", album_id))
    }

    pub fn like_album(&mut self, album_id: &str) -> ApiResult<()> {
        let user_id = self.require_login()?;
        self.show_album(album_id)?;
        self.state.users.update(&user_id, |u| {
            if !u.liked_albums.iter().any(|id| id == album_id) {
                u.liked_albums.push(album_id.to_string());
            }
        });
        Ok(())
    }

    pub fn unlike_album(&mut self, album_id: &str) -> ApiResult<()> {
        let user_id = self.require_login()?;
        self.state
            .users
            .update(&user_id, |u| u.liked_albums.retain(|id| id != album_id));
        Ok(())
    }

    pub fn show_liked_albums(&self) -> ApiResult<Vec<Album>> {
        let user = self.current_user()?;
        Ok(user
            .liked_albums
            .iter()
            .filter_map(|id| self.state.albums.get(id))
            .collect())
    }

    // ------------------------------------------------------------------
    // 歌单
    // ------------------------------------------------------------------

    /// 当前用户的歌单库
    pub fn show_playlist_library(&self) -> ApiResult<Vec<Playlist>> {
        let user_id = self.require_login()?;
        Ok(self.state.playlists.list_by(|p| p.owner_id == user_id))
    }

    pub fn show_playlist(&self, playlist_id: &str) -> ApiResult<Playlist> {
        self.require_playlist(playlist_id)
    }

    pub fn create_playlist(&mut self, title: &str, is_public: bool) -> ApiResult<Playlist> {
        let user_id = self.require_login()?;
        if title.is_empty() {
            return Err(ApiError::validation("playlist title is required"));
        }

        let playlist = Playlist {
            id: self.ctx.short_id("PL"),
            title: title.to_string(),
            owner_id: user_id,
            is_public,
            song_ids: Vec::new(),
            created_at: Utc::now(),
        };
        info!(playlist_id = %playlist.id, title, "创建歌单");
        self.state
            .playlists
            .insert(&playlist.id.clone(), playlist.clone());
        Ok(playlist)
    }

    /// 更新自己的歌单标题或可见性
    pub fn update_playlist(
        &mut self,
        playlist_id: &str,
        title: Option<&str>,
        is_public: Option<bool>,
    ) -> ApiResult<Playlist> {
        self.require_own_playlist(playlist_id)?;
        self.state.playlists.update(playlist_id, |p| {
            if let Some(title) = title {
                p.title = title.to_string();
            }
            if let Some(is_public) = is_public {
                p.is_public = is_public;
            }
        });
        self.require_playlist(playlist_id)
    }

    /// 删除自己的歌单
    pub fn delete_playlist(&mut self, playlist_id: &str) -> ApiResult<()> {
        self.require_own_playlist(playlist_id)?;
        self.state.playlists.remove(playlist_id);
        info!(playlist_id, "歌单已删除");
        Ok(())
    }

    /// 向自己的歌单添加歌曲，重复添加保持单条
    pub fn add_song_to_playlist(&mut self, playlist_id: &str, song_id: &str) -> ApiResult<Playlist> {
        self.require_own_playlist(playlist_id)?;
        self.require_song(song_id)?;

        self.state.playlists.update(playlist_id, |p| {
            if !p.song_ids.iter().any(|id| id == song_id) {
                p.song_ids.push(song_id.to_string());
            }
        });
        self.require_playlist(playlist_id)
    }

    /// 从自己的歌单移除歌曲，不存在时静默成功
    pub fn remove_song_from_playlist(
        &mut self,
        playlist_id: &str,
        song_id: &str,
    ) -> ApiResult<Playlist> {
        self.require_own_playlist(playlist_id)?;
        self.state
            .playlists
            .update(playlist_id, |p| p.song_ids.retain(|id| id != song_id));
        self.require_playlist(playlist_id)
    }

    // ------------------------------------------------------------------
    // 艺人
    // ------------------------------------------------------------------

    pub fn search_artists(&self, query: &str) -> ApiResult<Vec<Artist>> {
        let query = query.to_lowercase();
        Ok(self
            .state
            .artists
            .list_by(|a| a.name.to_lowercase().contains(&query)))
    }

    pub fn show_artist(&self, artist_id: &str) -> ApiResult<Artist> {
        self.state
            .artists
            .get(artist_id)
            .ok_or_else(|| ApiError::not_found("artist", artist_id))
    }

    /// 关注艺人，重复关注保持单条
    pub fn follow_artist(&mut self, artist_id: &str) -> ApiResult<()> {
        let user_id = self.require_login()?;
        self.show_artist(artist_id)?;
        self.state.users.update(&user_id, |u| {
            if !u.following_artists.iter().any(|id| id == artist_id) {
                u.following_artists.push(artist_id.to_string());
            }
        });
        Ok(())
    }

    /// 取消关注，未关注过时静默成功
    pub fn unfollow_artist(&mut self, artist_id: &str) -> ApiResult<()> {
        let user_id = self.require_login()?;
        self.state
            .users
            .update(&user_id, |u| u.following_artists.retain(|id| id != artist_id));
        Ok(())
    }

    pub fn show_following_artists(&self) -> ApiResult<Vec<Artist>> {
        let user = self.current_user()?;
        Ok(user
            .following_artists
            .iter()
            .filter_map(|id| self.state.artists.get(id))
            .collect())
    }
}

impl MockBackend for SpotifyApi {
    fn service_name(&self) -> &'static str {
        "spotify"
    }

    fn export_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn reset_data(&mut self) -> bool {
        let mut ctx = self.ctx.renew();
        self.state = SpotifyState::seed(&mut ctx, &self.profile);
        self.ctx = ctx;
        info!("Spotify 状态已重置");
        true
    }
}

// ============================================================================
// 单元测试
// ============================================================================

//! Netflix 模拟服务
//!
//! 档案管理、片库检索、评分与观看进度的内存模拟。
//! 所有按档案划分的集合在删除档案时一并清理。

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use mock_harness::page::{Page, PageQuery, paginate};
use mock_harness::result::{ApiError, ApiResult};
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use mock_harness::MockBackend;

use crate::generators::SeedProfile;
use crate::models::netflix::{
    Content, ContentKind, ContinueWatchingEntry, MaturityLevel, NetflixProfile,
};

/// Netflix 状态树
///
/// watchlists/ratings/favorites/continue_watching 都按档案 ID 划分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetflixState {
    pub profiles: MemoryStore<NetflixProfile>,
    pub catalog: MemoryStore<Content>,
    pub watchlists: IndexMap<String, Vec<String>>,
    pub ratings: IndexMap<String, IndexMap<String, u8>>,
    pub favorites: IndexMap<String, Vec<String>>,
    pub continue_watching: IndexMap<String, Vec<ContinueWatchingEntry>>,
}

impl NetflixState {
    /// 生成默认种子树：P001/P002 档案 + 经典片目锚点 + 随机补充内容
    pub fn seed(ctx: &mut SeedContext, profile: &SeedProfile) -> Self {
        let mut profiles = MemoryStore::new();
        profiles.insert(
            "P001",
            NetflixProfile {
                id: "P001".to_string(),
                name: "Main Profile".to_string(),
                avatar: "https://netflix.mock/avatar1.png".to_string(),
                maturity_level: MaturityLevel::Adult,
                language: "en".to_string(),
                autoplay: true,
            },
        );
        profiles.insert(
            "P002",
            NetflixProfile {
                id: "P002".to_string(),
                name: "Kids".to_string(),
                avatar: "https://netflix.mock/avatar2.png".to_string(),
                maturity_level: MaturityLevel::Kids,
                language: "en".to_string(),
                autoplay: false,
            },
        );

        let mut catalog = MemoryStore::new();
        catalog.insert(
            "M001",
            Content {
                id: "M001".to_string(),
                title: "The Shawshank Redemption".to_string(),
                kind: ContentKind::Movie,
                year: 1994,
                rating: "R".to_string(),
                duration_minutes: Some(142),
                seasons: None,
                genres: vec!["Drama".to_string()],
                description: "Two imprisoned men bond over a number of years.".to_string(),
                cast: vec!["Tim Robbins".to_string(), "Morgan Freeman".to_string()],
            },
        );
        catalog.insert(
            "M002",
            Content {
                id: "M002".to_string(),
                title: "The Godfather".to_string(),
                kind: ContentKind::Movie,
                year: 1972,
                rating: "R".to_string(),
                duration_minutes: Some(175),
                seasons: None,
                genres: vec!["Crime".to_string(), "Drama".to_string()],
                description: "The aging patriarch of an organized crime dynasty.".to_string(),
                cast: vec!["Marlon Brando".to_string(), "Al Pacino".to_string()],
            },
        );
        catalog.insert(
            "S001",
            Content {
                id: "S001".to_string(),
                title: "Breaking Bad".to_string(),
                kind: ContentKind::Series,
                year: 2008,
                rating: "TV-MA".to_string(),
                duration_minutes: None,
                seasons: Some(5),
                genres: vec![
                    "Crime".to_string(),
                    "Drama".to_string(),
                    "Thriller".to_string(),
                ],
                description: "A chemistry teacher turns to manufacturing.".to_string(),
                cast: vec!["Bryan Cranston".to_string(), "Aaron Paul".to_string()],
            },
        );
        catalog.insert(
            "S002",
            Content {
                id: "S002".to_string(),
                title: "Stranger Things".to_string(),
                kind: ContentKind::Series,
                year: 2016,
                rating: "TV-14".to_string(),
                duration_minutes: None,
                seasons: Some(4),
                genres: vec![
                    "Drama".to_string(),
                    "Fantasy".to_string(),
                    "Horror".to_string(),
                ],
                description: "A young boy disappears near a secret laboratory.".to_string(),
                cast: vec!["Millie Bobby Brown".to_string(), "Winona Ryder".to_string()],
            },
        );

        let extra_count = ctx.int(
            profile.extra_catalog.start as i64..profile.extra_catalog.end as i64,
        );
        for _ in 0..extra_count {
            let content = Content::random(ctx);
            catalog.insert(&content.id.clone(), content);
        }

        let mut watchlists = IndexMap::new();
        let mut ratings = IndexMap::new();
        let mut favorites = IndexMap::new();
        let mut continue_watching = IndexMap::new();
        for profile_id in profiles.ids() {
            watchlists.insert(profile_id.clone(), Vec::new());
            ratings.insert(profile_id.clone(), IndexMap::new());
            favorites.insert(profile_id.clone(), Vec::new());
            continue_watching.insert(profile_id, Vec::new());
        }

        // 主档案预置一点观看痕迹
        if let Some(list) = watchlists.get_mut("P001") {
            list.push("M002".to_string());
            list.push("S001".to_string());
        }
        if let Some(map) = ratings.get_mut("P001") {
            map.insert("M001".to_string(), 5);
        }

        Self {
            profiles,
            catalog,
            watchlists,
            ratings,
            favorites,
            continue_watching,
        }
    }
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 创建档案的可选参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileOptions {
    pub maturity_level: MaturityLevel,
    pub language: String,
    pub autoplay: bool,
}

impl Default for CreateProfileOptions {
    fn default() -> Self {
        Self {
            maturity_level: MaturityLevel::Adult,
            language: "en".to_string(),
            autoplay: true,
        }
    }
}

/// 更新档案请求，只合并显式提供的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub maturity_level: Option<MaturityLevel>,
    pub language: Option<String>,
    pub autoplay: Option<bool>,
}

/// 片库检索请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub kind: Option<ContentKind>,
    #[serde(default)]
    pub page: PageQuery,
}

/// 更新观看进度请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub content_id: String,
    /// 进度百分比 0-100
    pub progress: u8,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

// ============================================================================
// 状态容器
// ============================================================================

/// Netflix API 容器
#[derive(Debug)]
pub struct NetflixApi {
    pub state: NetflixState,
    ctx: SeedContext,
    profile: SeedProfile,
}

impl Default for NetflixApi {
    fn default() -> Self {
        Self::new()
    }
}

impl NetflixApi {
    pub fn new() -> Self {
        Self::build(SeedContext::new(), SeedProfile::default())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::build(SeedContext::with_seed(seed), SeedProfile::default())
    }

    pub fn with_profile(ctx: SeedContext, profile: SeedProfile) -> Self {
        Self::build(ctx, profile)
    }

    pub fn from_state(state: NetflixState) -> Self {
        Self {
            state,
            ctx: SeedContext::new(),
            profile: SeedProfile::default(),
        }
    }

    fn build(mut ctx: SeedContext, profile: SeedProfile) -> Self {
        let state = NetflixState::seed(&mut ctx, &profile);
        Self {
            state,
            ctx,
            profile,
        }
    }

    fn require_profile(&self, profile_id: &str) -> ApiResult<NetflixProfile> {
        self.state
            .profiles
            .get(profile_id)
            .ok_or_else(|| ApiError::not_found("profile", profile_id))
    }

    fn require_content(&self, content_id: &str) -> ApiResult<Content> {
        self.state
            .catalog
            .get(content_id)
            .ok_or_else(|| ApiError::not_found("content", content_id))
    }

    // ------------------------------------------------------------------
    // 档案
    // ------------------------------------------------------------------

    pub fn profiles_list(&self) -> ApiResult<Vec<NetflixProfile>> {
        Ok(self.state.profiles.list())
    }

    pub fn profiles_get(&self, profile_id: &str) -> ApiResult<NetflixProfile> {
        self.require_profile(profile_id)
    }

    /// 创建档案并初始化它的各个集合
    pub fn profiles_create(
        &mut self,
        name: &str,
        opts: CreateProfileOptions,
    ) -> ApiResult<NetflixProfile> {
        if name.is_empty() {
            return Err(ApiError::validation("profile name is required"));
        }

        let profile_id = self.ctx.short_id("P");
        let profile = NetflixProfile {
            id: profile_id.clone(),
            name: name.to_string(),
            avatar: format!(
                "https://netflix.mock/avatar_{}.png",
                self.state.profiles.count() + 1
            ),
            maturity_level: opts.maturity_level,
            language: opts.language,
            autoplay: opts.autoplay,
        };

        self.state.profiles.insert(&profile_id, profile.clone());
        self.state.watchlists.insert(profile_id.clone(), Vec::new());
        self.state
            .ratings
            .insert(profile_id.clone(), IndexMap::new());
        self.state.favorites.insert(profile_id.clone(), Vec::new());
        self.state
            .continue_watching
            .insert(profile_id.clone(), Vec::new());

        info!(profile_id = %profile_id, name, "创建档案");
        Ok(profile)
    }

    pub fn profiles_update(
        &mut self,
        profile_id: &str,
        req: UpdateProfileRequest,
    ) -> ApiResult<NetflixProfile> {
        let found = self.state.profiles.update(profile_id, |p| {
            if let Some(name) = req.name.clone() {
                p.name = name;
            }
            if let Some(level) = req.maturity_level {
                p.maturity_level = level;
            }
            if let Some(language) = req.language.clone() {
                p.language = language;
            }
            if let Some(autoplay) = req.autoplay {
                p.autoplay = autoplay;
            }
        });
        if !found {
            return Err(ApiError::not_found("profile", profile_id));
        }
        self.require_profile(profile_id)
    }

    /// 删除档案，并级联清理它名下的全部集合
    pub fn profiles_delete(&mut self, profile_id: &str) -> ApiResult<()> {
        if self.state.profiles.remove(profile_id).is_none() {
            return Err(ApiError::not_found("profile", profile_id));
        }
        self.state.watchlists.shift_remove(profile_id);
        self.state.ratings.shift_remove(profile_id);
        self.state.favorites.shift_remove(profile_id);
        self.state.continue_watching.shift_remove(profile_id);
        info!(profile_id, "档案已删除");
        Ok(())
    }

    // ------------------------------------------------------------------
    // 待看清单
    // ------------------------------------------------------------------

    /// 加入待看清单，重复添加保持单条
    pub fn watchlist_add(&mut self, profile_id: &str, content_id: &str) -> ApiResult<Vec<String>> {
        self.require_profile(profile_id)?;
        self.require_content(content_id)?;

        let list = self
            .state
            .watchlists
            .entry(profile_id.to_string())
            .or_default();
        if !list.iter().any(|id| id == content_id) {
            list.push(content_id.to_string());
        }
        Ok(list.clone())
    }

    /// 从待看清单移除，条目不存在时静默成功
    pub fn watchlist_remove(
        &mut self,
        profile_id: &str,
        content_id: &str,
    ) -> ApiResult<Vec<String>> {
        self.require_profile(profile_id)?;

        let list = self
            .state
            .watchlists
            .entry(profile_id.to_string())
            .or_default();
        list.retain(|id| id != content_id);
        Ok(list.clone())
    }

    pub fn watchlist_list(&self, profile_id: &str) -> ApiResult<Vec<Content>> {
        self.require_profile(profile_id)?;
        let ids = self
            .state
            .watchlists
            .get(profile_id)
            .cloned()
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| self.state.catalog.get(id))
            .collect())
    }

    // ------------------------------------------------------------------
    // 评分
    // ------------------------------------------------------------------

    /// 给内容打 1-5 星，越界评分报 `invalid_rating` 且不改动状态
    pub fn ratings_add(&mut self, profile_id: &str, content_id: &str, rating: u8) -> ApiResult<u8> {
        self.require_profile(profile_id)?;
        if !(1..=5).contains(&rating) {
            return Err(ApiError::validation("rating must be between 1 and 5")
                .with_code("invalid_rating"));
        }
        self.require_content(content_id)?;

        self.state
            .ratings
            .entry(profile_id.to_string())
            .or_default()
            .insert(content_id.to_string(), rating);
        Ok(rating)
    }

    /// 删除评分，不存在时静默成功
    pub fn ratings_remove(&mut self, profile_id: &str, content_id: &str) -> ApiResult<()> {
        self.require_profile(profile_id)?;
        if let Some(map) = self.state.ratings.get_mut(profile_id) {
            map.shift_remove(content_id);
        }
        Ok(())
    }

    pub fn ratings_list(&self, profile_id: &str) -> ApiResult<IndexMap<String, u8>> {
        self.require_profile(profile_id)?;
        Ok(self
            .state
            .ratings
            .get(profile_id)
            .cloned()
            .unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // 收藏
    // ------------------------------------------------------------------

    /// 收藏内容，重复收藏保持单条
    pub fn favorites_add(&mut self, profile_id: &str, content_id: &str) -> ApiResult<Vec<String>> {
        self.require_profile(profile_id)?;
        self.require_content(content_id)?;

        let list = self
            .state
            .favorites
            .entry(profile_id.to_string())
            .or_default();
        if !list.iter().any(|id| id == content_id) {
            list.push(content_id.to_string());
        }
        Ok(list.clone())
    }

    /// 取消收藏，不存在时静默成功
    pub fn favorites_remove(
        &mut self,
        profile_id: &str,
        content_id: &str,
    ) -> ApiResult<Vec<String>> {
        self.require_profile(profile_id)?;

        let list = self
            .state
            .favorites
            .entry(profile_id.to_string())
            .or_default();
        list.retain(|id| id != content_id);
        Ok(list.clone())
    }

    pub fn favorites_list(&self, profile_id: &str) -> ApiResult<Vec<Content>> {
        self.require_profile(profile_id)?;
        let ids = self
            .state
            .favorites
            .get(profile_id)
            .cloned()
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| self.state.catalog.get(id))
            .collect())
    }

    // ------------------------------------------------------------------
    // 观看进度
    // ------------------------------------------------------------------

    pub fn continue_watching_list(
        &self,
        profile_id: &str,
    ) -> ApiResult<Vec<ContinueWatchingEntry>> {
        self.require_profile(profile_id)?;
        Ok(self
            .state
            .continue_watching
            .get(profile_id)
            .cloned()
            .unwrap_or_default())
    }

    /// 按内容 ID upsert 观看进度
    pub fn continue_watching_update(
        &mut self,
        profile_id: &str,
        update: ProgressUpdate,
    ) -> ApiResult<Vec<ContinueWatchingEntry>> {
        self.require_profile(profile_id)?;
        self.require_content(&update.content_id)?;
        if update.progress > 100 {
            return Err(ApiError::validation("progress must be between 0 and 100"));
        }

        let entries = self
            .state
            .continue_watching
            .entry(profile_id.to_string())
            .or_default();

        match entries
            .iter_mut()
            .find(|e| e.content_id == update.content_id)
        {
            Some(entry) => {
                entry.progress = update.progress;
                if update.season.is_some() {
                    entry.season = update.season;
                }
                if update.episode.is_some() {
                    entry.episode = update.episode;
                }
                entry.updated_at = Utc::now();
            }
            None => entries.push(ContinueWatchingEntry {
                content_id: update.content_id,
                progress: update.progress,
                season: update.season,
                episode: update.episode,
                updated_at: Utc::now(),
            }),
        }

        Ok(entries.clone())
    }

    // ------------------------------------------------------------------
    // 检索
    // ------------------------------------------------------------------

    /// 按标题或题材子串检索片库，支持类型过滤和分页
    pub fn search_content(&self, req: SearchRequest) -> ApiResult<Page<Content>> {
        let query = req.query.to_lowercase();
        let matches = self.state.catalog.list_by(|content| {
            let title_hit = content.title.to_lowercase().contains(&query);
            let genre_hit = content
                .genres
                .iter()
                .any(|g| g.to_lowercase().contains(&query));
            let kind_hit = req.kind.is_none_or(|kind| content.kind == kind);
            (title_hit || genre_hit) && kind_hit
        });
        Ok(paginate(matches, &req.page))
    }
}

impl MockBackend for NetflixApi {
    fn service_name(&self) -> &'static str {
        "netflix"
    }

    fn export_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn reset_data(&mut self) -> bool {
        let mut ctx = self.ctx.renew();
        self.state = NetflixState::seed(&mut ctx, &self.profile);
        self.ctx = ctx;
        info!("Netflix 状态已重置");
        true
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mock_harness::{ErrorKind, envelope};

    fn api() -> NetflixApi {
        NetflixApi::with_seed(42)
    }

    #[test]
    fn test_seed_contains_anchor_profiles_and_catalog() {
        let api = api();
        assert!(api.state.profiles.contains("P001"));
        assert!(api.state.profiles.contains("P002"));
        assert!(api.state.catalog.contains("M001"));
        assert!(api.state.catalog.contains("S002"));
    }

    #[test]
    fn test_profile_create_then_get_round_trip() {
        let mut api = api();
        let created = api
            .profiles_create("Teens", CreateProfileOptions::default())
            .unwrap();

        let fetched = api.profiles_get(&created.id).unwrap();
        assert_eq!(fetched.name, "Teens");
        assert_eq!(fetched.maturity_level, MaturityLevel::Adult);
    }

    #[test]
    fn test_profile_delete_cascades_collections() {
        let mut api = api();
        let profile = api
            .profiles_create("Temp", CreateProfileOptions::default())
            .unwrap();
        api.watchlist_add(&profile.id, "M001").unwrap();
        api.ratings_add(&profile.id, "M001", 4).unwrap();

        api.profiles_delete(&profile.id).unwrap();

        let err = api.profiles_get(&profile.id).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(!api.state.watchlists.contains_key(&profile.id));
        assert!(!api.state.ratings.contains_key(&profile.id));
        assert!(!api.state.favorites.contains_key(&profile.id));
    }

    #[test]
    fn test_invalid_rating_rejected_and_state_unchanged() {
        let mut api = api();
        let before = api.ratings_list("P001").unwrap();

        let result = api.ratings_add("P001", "M001", 6);
        let value = envelope(&result);
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "invalid_rating");

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.wire_code(), "invalid_rating");

        assert_eq!(api.ratings_list("P001").unwrap(), before);
    }

    #[test]
    fn test_rating_bounds_accept_one_and_five() {
        let mut api = api();
        assert_eq!(api.ratings_add("P002", "M001", 1).unwrap(), 1);
        assert_eq!(api.ratings_add("P002", "S001", 5).unwrap(), 5);
        assert!(api.ratings_add("P002", "S001", 0).is_err());
    }

    #[test]
    fn test_watchlist_add_is_idempotent() {
        let mut api = api();
        api.watchlist_add("P002", "S002").unwrap();
        let list = api.watchlist_add("P002", "S002").unwrap();

        assert_eq!(list.iter().filter(|id| *id == "S002").count(), 1);
    }

    #[test]
    fn test_watchlist_remove_absent_is_noop() {
        let mut api = api();
        let result = api.watchlist_remove("P002", "M999");
        assert!(result.is_ok());
    }

    #[test]
    fn test_favorites_pair_idempotent() {
        let mut api = api();
        api.favorites_add("P001", "M002").unwrap();
        api.favorites_add("P001", "M002").unwrap();

        let favorites = api.favorites_list("P001").unwrap();
        assert_eq!(favorites.iter().filter(|c| c.id == "M002").count(), 1);

        api.favorites_remove("P001", "M002").unwrap();
        api.favorites_remove("P001", "M002").unwrap();
        assert!(api.favorites_list("P001").unwrap().is_empty());
    }

    #[test]
    fn test_continue_watching_upserts() {
        let mut api = api();
        api.continue_watching_update(
            "P001",
            ProgressUpdate {
                content_id: "S001".to_string(),
                progress: 30,
                season: Some(2),
                episode: Some(3),
            },
        )
        .unwrap();

        let entries = api
            .continue_watching_update(
                "P001",
                ProgressUpdate {
                    content_id: "S001".to_string(),
                    progress: 55,
                    season: None,
                    episode: Some(4),
                },
            )
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].progress, 55);
        assert_eq!(entries[0].season, Some(2));
        assert_eq!(entries[0].episode, Some(4));
    }

    #[test]
    fn test_continue_watching_progress_bounds() {
        let mut api = api();
        let err = api
            .continue_watching_update(
                "P001",
                ProgressUpdate {
                    content_id: "M001".to_string(),
                    progress: 101,
                    season: None,
                    episode: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_search_by_title_and_kind() {
        let api = api();
        let page = api
            .search_content(SearchRequest {
                query: "godfather".to_string(),
                kind: Some(ContentKind::Movie),
                page: PageQuery::default(),
            })
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "M002");
    }

    #[test]
    fn test_search_pagination_is_total() {
        let api = api();
        let all = api
            .search_content(SearchRequest {
                query: String::new(),
                kind: None,
                page: PageQuery::default(),
            })
            .unwrap();

        let mut collected = Vec::new();
        let mut offset = 0;
        loop {
            let page = api
                .search_content(SearchRequest {
                    query: String::new(),
                    kind: None,
                    page: PageQuery::new(2, offset),
                })
                .unwrap();
            assert!(page.items.len() <= 2);
            let len = page.items.len();
            collected.extend(page.items.into_iter().map(|c| c.id));
            if !page_has_more(len, offset, all.total) {
                break;
            }
            offset += len;
        }

        let all_ids: Vec<String> = all.items.into_iter().map(|c| c.id).collect();
        assert_eq!(collected, all_ids);
    }

    fn page_has_more(len: usize, offset: usize, total: usize) -> bool {
        offset + len < total
    }

    #[test]
    fn test_reset_restores_anchor_watchlist() {
        let mut api = api();
        api.watchlist_remove("P001", "M002").unwrap();
        api.reset_data();

        let list = api.watchlist_list("P001").unwrap();
        assert!(list.iter().any(|c| c.id == "M002"));
    }
}

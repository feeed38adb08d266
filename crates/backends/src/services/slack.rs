//! Slack 模拟服务
//!
//! 频道消息、线程、表情回应与置顶的内存模拟。所有写操作以
//! 当前用户（默认 U001）的身份执行。

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use mock_harness::result::{ApiError, ApiResult};
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use mock_harness::MockBackend;

use crate::generators::SeedProfile;
use crate::models::slack::{Channel, Message, Reaction, SlackUser, TeamInfo};

/// Slack 状态树
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackState {
    pub team: TeamInfo,
    pub users: MemoryStore<SlackUser>,
    pub channels: MemoryStore<Channel>,
    /// 全部消息的平铺列表，按 `channel` 字段归属
    pub messages: Vec<Message>,
    /// 表情回应，键为 `{channel}:{ts}`
    pub reactions: IndexMap<String, Vec<Reaction>>,
    /// 每个频道的置顶消息 ts 列表
    pub pins: IndexMap<String, Vec<String>>,
    /// 发消息时使用的身份
    pub current_user_id: String,
    /// ts 去重计数器
    pub ts_counter: u64,
}

impl SlackState {
    /// 生成默认种子树：U001/U002 成员、general/random 频道 + 少量历史消息
    pub fn seed(ctx: &mut SeedContext, profile: &SeedProfile) -> Self {
        let mut users = MemoryStore::new();
        users.insert(
            "U001",
            SlackUser {
                id: "U001".to_string(),
                name: "alice".to_string(),
                real_name: "Alice Example".to_string(),
                email: "alice@example.com".to_string(),
            },
        );
        users.insert(
            "U002",
            SlackUser {
                id: "U002".to_string(),
                name: "bob".to_string(),
                real_name: "Bob Example".to_string(),
                email: "bob@example.com".to_string(),
            },
        );
        for _ in 0..profile.extra_users {
            let user = SlackUser::random(ctx);
            users.insert(&user.id.clone(), user);
        }

        let member_ids = users.ids();
        let mut channels = MemoryStore::new();
        channels.insert(
            "C001",
            Channel {
                id: "C001".to_string(),
                name: "general".to_string(),
                is_private: false,
                topic: "General discussion".to_string(),
                purpose: "General workspace discussion".to_string(),
                members: member_ids.clone(),
                created_at: ctx.past_datetime(365),
            },
        );
        channels.insert(
            "C002",
            Channel {
                id: "C002".to_string(),
                name: "random".to_string(),
                is_private: false,
                topic: "Random stuff".to_string(),
                purpose: "Random conversations".to_string(),
                members: member_ids,
                created_at: ctx.past_datetime(365),
            },
        );

        let mut state = Self {
            team: TeamInfo {
                id: "T123".to_string(),
                name: "Mock Team".to_string(),
                domain: "mockteam".to_string(),
            },
            users,
            channels,
            messages: Vec::new(),
            reactions: IndexMap::new(),
            pins: IndexMap::new(),
            current_user_id: "U001".to_string(),
            ts_counter: 0,
        };
        state.pins.insert("C001".to_string(), Vec::new());
        state.pins.insert("C002".to_string(), Vec::new());

        // 种下几条历史消息，时间取过去几天内
        let seeded_texts = [
            ("U001", "Morning everyone!"),
            ("U002", "Standup moved to 10am today."),
        ];
        for (user, text) in seeded_texts {
            let ts = format!(
                "{}.{:06}",
                ctx.past_datetime(3).timestamp(),
                state.ts_counter
            );
            state.ts_counter += 1;
            state.messages.push(Message {
                ts,
                channel: "C001".to_string(),
                user: user.to_string(),
                text: text.to_string(),
                thread_ts: None,
            });
        }

        state
    }

    /// 分配下一个消息 ts，保证进程内唯一且可排序
    fn next_ts(&mut self) -> String {
        let ts = format!("{}.{:06}", Utc::now().timestamp(), self.ts_counter);
        self.ts_counter += 1;
        ts
    }
}

fn ts_value(ts: &str) -> f64 {
    ts.parse().unwrap_or(0.0)
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 历史消息查询
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    /// 只取晚于该 ts 的消息
    pub oldest: Option<String>,
    /// 只取早于该 ts 的消息
    pub latest: Option<String>,
}

/// 发消息结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
    pub message: Message,
}

/// 历史消息响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

// ============================================================================
// 状态容器
// ============================================================================

/// Slack API 容器
#[derive(Debug)]
pub struct SlackApi {
    pub state: SlackState,
    ctx: SeedContext,
    profile: SeedProfile,
}

impl Default for SlackApi {
    fn default() -> Self {
        Self::new()
    }
}

impl SlackApi {
    pub fn new() -> Self {
        Self::build(SeedContext::new(), SeedProfile::default())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::build(SeedContext::with_seed(seed), SeedProfile::default())
    }

    pub fn with_profile(ctx: SeedContext, profile: SeedProfile) -> Self {
        Self::build(ctx, profile)
    }

    pub fn from_state(state: SlackState) -> Self {
        Self {
            state,
            ctx: SeedContext::new(),
            profile: SeedProfile::default(),
        }
    }

    fn build(mut ctx: SeedContext, profile: SeedProfile) -> Self {
        let state = SlackState::seed(&mut ctx, &profile);
        Self {
            state,
            ctx,
            profile,
        }
    }

    fn require_channel(&self, channel: &str) -> ApiResult<Channel> {
        self.state
            .channels
            .get(channel)
            .ok_or_else(|| ApiError::not_found("channel", channel))
    }

    fn message_index(&self, channel: &str, ts: &str) -> ApiResult<usize> {
        self.state
            .messages
            .iter()
            .position(|m| m.channel == channel && m.ts == ts)
            .ok_or_else(|| ApiError::not_found("message", ts))
    }

    fn reaction_key(channel: &str, ts: &str) -> String {
        format!("{channel}:{ts}")
    }

    // ------------------------------------------------------------------
    // chat.* 消息
    // ------------------------------------------------------------------

    /// 向频道发消息，`thread_ts` 指定后作为线程回复
    pub fn chat_post_message(
        &mut self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> ApiResult<PostedMessage> {
        self.require_channel(channel)?;
        if text.is_empty() {
            return Err(ApiError::validation("message text is required"));
        }
        if let Some(root_ts) = thread_ts {
            self.message_index(channel, root_ts)?;
        }

        let ts = self.state.next_ts();
        let message = Message {
            ts: ts.clone(),
            channel: channel.to_string(),
            user: self.state.current_user_id.clone(),
            text: text.to_string(),
            thread_ts: thread_ts.map(|t| t.to_string()),
        };
        self.state.messages.push(message.clone());

        info!(channel, ts = %ts, "消息已发送");
        Ok(PostedMessage {
            channel: channel.to_string(),
            ts,
            message,
        })
    }

    /// 编辑已有消息的正文
    pub fn chat_update(&mut self, channel: &str, ts: &str, text: &str) -> ApiResult<Message> {
        let index = self.message_index(channel, ts)?;
        self.state.messages[index].text = text.to_string();
        Ok(self.state.messages[index].clone())
    }

    /// 删除消息，同时清理它的表情回应和置顶引用
    pub fn chat_delete(&mut self, channel: &str, ts: &str) -> ApiResult<()> {
        let index = self.message_index(channel, ts)?;
        self.state.messages.remove(index);

        self.state
            .reactions
            .shift_remove(&Self::reaction_key(channel, ts));
        if let Some(pins) = self.state.pins.get_mut(channel) {
            pins.retain(|pinned| pinned != ts);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // conversations.* 频道
    // ------------------------------------------------------------------

    /// 新建频道，重名报冲突
    pub fn conversations_create(&mut self, name: &str, is_private: bool) -> ApiResult<Channel> {
        if name.is_empty() {
            return Err(ApiError::validation("channel name is required"));
        }
        if self.state.channels.list().iter().any(|c| c.name == name) {
            return Err(ApiError::already_exists("channel", name));
        }

        let id = self.ctx.short_id("C").to_uppercase();
        let channel = Channel {
            id: id.clone(),
            name: name.to_string(),
            is_private,
            topic: String::new(),
            purpose: String::new(),
            members: vec![self.state.current_user_id.clone()],
            created_at: Utc::now(),
        };
        self.state.channels.insert(&id, channel.clone());
        self.state.pins.insert(id.clone(), Vec::new());

        info!(channel_id = %id, name, "创建频道");
        Ok(channel)
    }

    pub fn conversations_list(&self) -> ApiResult<Vec<Channel>> {
        Ok(self.state.channels.list())
    }

    pub fn conversations_info(&self, channel: &str) -> ApiResult<Channel> {
        self.require_channel(channel)
    }

    /// 频道历史，按 ts 从新到旧，支持 oldest/latest 边界
    pub fn conversations_history(&self, channel: &str, query: HistoryQuery) -> ApiResult<History> {
        self.require_channel(channel)?;

        let mut messages: Vec<Message> = self
            .state
            .messages
            .iter()
            .filter(|m| m.channel == channel)
            .filter(|m| {
                query
                    .latest
                    .as_ref()
                    .is_none_or(|latest| ts_value(&m.ts) < ts_value(latest))
            })
            .filter(|m| {
                query
                    .oldest
                    .as_ref()
                    .is_none_or(|oldest| ts_value(&m.ts) > ts_value(oldest))
            })
            .cloned()
            .collect();

        messages.sort_by(|a, b| {
            ts_value(&b.ts)
                .partial_cmp(&ts_value(&a.ts))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let limit = query.limit.unwrap_or(100);
        let has_more = messages.len() > limit;
        messages.truncate(limit);

        Ok(History { messages, has_more })
    }

    /// 线程消息：根消息 + 全部回复，按时间正序
    pub fn conversations_replies(&self, channel: &str, ts: &str) -> ApiResult<Vec<Message>> {
        self.message_index(channel, ts)?;

        let mut messages: Vec<Message> = self
            .state
            .messages
            .iter()
            .filter(|m| {
                m.channel == channel
                    && (m.ts == ts || m.thread_ts.as_deref() == Some(ts))
            })
            .cloned()
            .collect();
        messages.sort_by(|a, b| {
            ts_value(&a.ts)
                .partial_cmp(&ts_value(&b.ts))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(messages)
    }

    /// 加入频道，已在频道中时静默成功
    pub fn conversations_join(&mut self, channel: &str) -> ApiResult<Channel> {
        self.require_channel(channel)?;
        let user_id = self.state.current_user_id.clone();
        self.state.channels.update(channel, |c| {
            if !c.members.contains(&user_id) {
                c.members.push(user_id.clone());
            }
        });
        self.require_channel(channel)
    }

    /// 退出频道，不在频道中时静默成功
    pub fn conversations_leave(&mut self, channel: &str) -> ApiResult<()> {
        self.require_channel(channel)?;
        let user_id = self.state.current_user_id.clone();
        self.state
            .channels
            .update(channel, |c| c.members.retain(|m| m != &user_id));
        Ok(())
    }

    /// 设置频道话题
    pub fn conversations_set_topic(&mut self, channel: &str, topic: &str) -> ApiResult<Channel> {
        self.require_channel(channel)?;
        self.state
            .channels
            .update(channel, |c| c.topic = topic.to_string());
        self.require_channel(channel)
    }

    // ------------------------------------------------------------------
    // users.* 成员
    // ------------------------------------------------------------------

    pub fn users_list(&self) -> ApiResult<Vec<SlackUser>> {
        Ok(self.state.users.list())
    }

    pub fn users_info(&self, user: &str) -> ApiResult<SlackUser> {
        self.state
            .users
            .get(user)
            .ok_or_else(|| ApiError::not_found("user", user))
    }

    pub fn users_lookup_by_email(&self, email: &str) -> ApiResult<SlackUser> {
        self.state
            .users
            .list()
            .into_iter()
            .find(|u| u.email == email)
            .ok_or_else(|| ApiError::not_found("user", email))
    }

    // ------------------------------------------------------------------
    // reactions.* 表情回应
    // ------------------------------------------------------------------

    /// 给消息加表情，同一用户重复添加不累计
    pub fn reactions_add(&mut self, name: &str, channel: &str, ts: &str) -> ApiResult<()> {
        self.message_index(channel, ts)?;
        let user_id = self.state.current_user_id.clone();
        let key = Self::reaction_key(channel, ts);
        let reactions = self.state.reactions.entry(key).or_default();

        match reactions.iter_mut().find(|r| r.name == name) {
            Some(reaction) => {
                if !reaction.users.contains(&user_id) {
                    reaction.users.push(user_id);
                    reaction.count += 1;
                }
            }
            None => reactions.push(Reaction {
                name: name.to_string(),
                count: 1,
                users: vec![user_id],
            }),
        }
        Ok(())
    }

    /// 移除当前用户的表情，未加过时静默成功
    pub fn reactions_remove(&mut self, name: &str, channel: &str, ts: &str) -> ApiResult<()> {
        self.message_index(channel, ts)?;
        let user_id = self.state.current_user_id.clone();
        let key = Self::reaction_key(channel, ts);

        if let Some(reactions) = self.state.reactions.get_mut(&key) {
            if let Some(reaction) = reactions.iter_mut().find(|r| r.name == name) {
                if let Some(pos) = reaction.users.iter().position(|u| u == &user_id) {
                    reaction.users.remove(pos);
                    reaction.count = reaction.count.saturating_sub(1);
                }
            }
            reactions.retain(|r| r.count > 0);
        }
        Ok(())
    }

    pub fn reactions_get(&self, channel: &str, ts: &str) -> ApiResult<Vec<Reaction>> {
        self.message_index(channel, ts)?;
        Ok(self
            .state
            .reactions
            .get(&Self::reaction_key(channel, ts))
            .cloned()
            .unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // pins.* 置顶
    // ------------------------------------------------------------------

    /// 置顶消息，重复置顶保持单条
    pub fn pins_add(&mut self, channel: &str, ts: &str) -> ApiResult<()> {
        self.message_index(channel, ts)?;
        let pins = self.state.pins.entry(channel.to_string()).or_default();
        if !pins.iter().any(|pinned| pinned == ts) {
            pins.push(ts.to_string());
        }
        Ok(())
    }

    /// 取消置顶，未置顶时静默成功
    pub fn pins_remove(&mut self, channel: &str, ts: &str) -> ApiResult<()> {
        self.require_channel(channel)?;
        if let Some(pins) = self.state.pins.get_mut(channel) {
            pins.retain(|pinned| pinned != ts);
        }
        Ok(())
    }

    /// 频道的置顶消息列表
    pub fn pins_list(&self, channel: &str) -> ApiResult<Vec<Message>> {
        self.require_channel(channel)?;
        let pins = self.state.pins.get(channel).cloned().unwrap_or_default();
        Ok(self
            .state
            .messages
            .iter()
            .filter(|m| m.channel == channel && pins.contains(&m.ts))
            .cloned()
            .collect())
    }

    /// 工作区信息
    pub fn team_info(&self) -> ApiResult<TeamInfo> {
        Ok(self.state.team.clone())
    }
}

impl MockBackend for SlackApi {
    fn service_name(&self) -> &'static str {
        "slack"
    }

    fn export_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn reset_data(&mut self) -> bool {
        let mut ctx = self.ctx.renew();
        self.state = SlackState::seed(&mut ctx, &self.profile);
        self.ctx = ctx;
        info!("Slack 状态已重置");
        true
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mock_harness::ErrorKind;

    fn api() -> SlackApi {
        SlackApi::with_seed(42)
    }

    #[test]
    fn test_post_message_appears_in_history() {
        let mut api = api();
        let posted = api.chat_post_message("C001", "hi", None).unwrap();
        assert_eq!(posted.channel, "C001");

        let history = api
            .conversations_history("C001", HistoryQuery::default())
            .unwrap();
        assert!(history.messages.iter().any(|m| m.text == "hi"));
    }

    #[test]
    fn test_history_is_newest_first_and_limited() {
        let mut api = api();
        for i in 0..5 {
            api.chat_post_message("C002", &format!("msg-{i}"), None)
                .unwrap();
        }

        let history = api
            .conversations_history(
                "C002",
                HistoryQuery {
                    limit: Some(3),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(history.messages.len(), 3);
        assert!(history.has_more);
        assert_eq!(history.messages[0].text, "msg-4");
    }

    #[test]
    fn test_history_unknown_channel() {
        let api = api();
        let err = api
            .conversations_history("C999", HistoryQuery::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_thread_replies_include_root() {
        let mut api = api();
        let root = api.chat_post_message("C001", "root", None).unwrap();
        api.chat_post_message("C001", "reply-1", Some(&root.ts))
            .unwrap();
        api.chat_post_message("C001", "reply-2", Some(&root.ts))
            .unwrap();

        let thread = api.conversations_replies("C001", &root.ts).unwrap();
        assert_eq!(thread.len(), 3);
        assert_eq!(thread[0].text, "root");
        assert_eq!(thread[2].text, "reply-2");
    }

    #[test]
    fn test_chat_update_and_delete() {
        let mut api = api();
        let posted = api.chat_post_message("C001", "typo", None).unwrap();

        let updated = api.chat_update("C001", &posted.ts, "fixed").unwrap();
        assert_eq!(updated.text, "fixed");

        api.pins_add("C001", &posted.ts).unwrap();
        api.chat_delete("C001", &posted.ts).unwrap();

        // 删除后消息、置顶引用都消失
        let err = api.chat_update("C001", &posted.ts, "x").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(api.pins_list("C001").unwrap().is_empty());
    }

    #[test]
    fn test_create_channel_rejects_duplicate_name() {
        let mut api = api();
        api.conversations_create("incidents", false).unwrap();

        let err = api.conversations_create("incidents", true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);

        let err = api.conversations_create("general", false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_join_and_leave_are_idempotent() {
        let mut api = api();
        let channel = api.conversations_join("C002").unwrap();
        let before = channel.members.len();

        let channel = api.conversations_join("C002").unwrap();
        assert_eq!(channel.members.len(), before);

        api.conversations_leave("C002").unwrap();
        api.conversations_leave("C002").unwrap();
        let channel = api.conversations_info("C002").unwrap();
        assert!(!channel.members.contains(&"U001".to_string()));
    }

    #[test]
    fn test_reactions_per_user_idempotent() {
        let mut api = api();
        let posted = api.chat_post_message("C001", "react to me", None).unwrap();

        api.reactions_add("thumbsup", "C001", &posted.ts).unwrap();
        api.reactions_add("thumbsup", "C001", &posted.ts).unwrap();

        let reactions = api.reactions_get("C001", &posted.ts).unwrap();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].count, 1);

        // 未加过的表情移除是静默成功
        api.reactions_remove("eyes", "C001", &posted.ts).unwrap();
        api.reactions_remove("thumbsup", "C001", &posted.ts).unwrap();
        assert!(api.reactions_get("C001", &posted.ts).unwrap().is_empty());
    }

    #[test]
    fn test_pins_idempotent_pair() {
        let mut api = api();
        let posted = api.chat_post_message("C001", "pin me", None).unwrap();

        api.pins_add("C001", &posted.ts).unwrap();
        api.pins_add("C001", &posted.ts).unwrap();
        assert_eq!(api.pins_list("C001").unwrap().len(), 1);

        api.pins_remove("C001", &posted.ts).unwrap();
        api.pins_remove("C001", &posted.ts).unwrap();
        assert!(api.pins_list("C001").unwrap().is_empty());
    }

    #[test]
    fn test_users_lookup_by_email() {
        let api = api();
        let user = api.users_lookup_by_email("bob@example.com").unwrap();
        assert_eq!(user.id, "U002");

        let err = api.users_lookup_by_email("nobody@example.com").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_set_topic() {
        let mut api = api();
        let channel = api.conversations_set_topic("C002", "releases").unwrap();
        assert_eq!(channel.topic, "releases");
    }

    #[test]
    fn test_reset_drops_posted_messages() {
        let mut api = api();
        let before = api.state.messages.len();
        api.chat_post_message("C001", "ephemeral", None).unwrap();

        api.reset_data();
        assert_eq!(api.state.messages.len(), before);
        assert!(!api.state.messages.iter().any(|m| m.text == "ephemeral"));
    }
}

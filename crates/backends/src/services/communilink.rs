//! CommuniLink 模拟服务
//!
//! 短信发送、语音呼叫与计费的内存模拟。费用从全局激活套餐的费率表
//! 计算，扣费同时写入计费流水。需要登录的操作通过当前用户指针鉴权。

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use mock_harness::result::{ApiError, ApiResult};
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use mock_harness::MockBackend;

use crate::generators::SeedProfile;
use crate::models::communilink::{
    BillingRecord, CallQuality, CallRecord, CallStatus, CallType, CommuniUser, ContactMethod,
    MessageType, NetworkStatus, ServicePlan, SmsMessage, SmsPriority, SmsStatus, SupportTicket,
    TicketCategory, TicketPriority, TicketStatus, TransactionType, UserSettings,
};

/// CommuniLink 状态树
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommuniLinkState {
    pub users: MemoryStore<CommuniUser>,
    /// 当前登录用户，None 表示未登录
    pub current_user_id: Option<String>,
    pub billing_history: Vec<BillingRecord>,
    pub support_tickets: MemoryStore<SupportTicket>,
    pub service_plans: IndexMap<String, ServicePlan>,
    /// 全局激活套餐，费率按它计算
    pub active_plan: String,
    pub network_status: NetworkStatus,
}

impl CommuniLinkState {
    /// 生成默认种子树：锚点账户 + 随机补充账户
    pub fn seed(ctx: &mut SeedContext, profile: &SeedProfile) -> Self {
        let mut service_plans = IndexMap::new();
        service_plans.insert(
            "basic".to_string(),
            ServicePlan {
                price_per_sms: 0.05,
                price_per_minute: 0.10,
                monthly_fee: None,
                description: "Basic communication plan: affordable messaging and calling rates."
                    .to_string(),
            },
        );
        service_plans.insert(
            "premium".to_string(),
            ServicePlan {
                price_per_sms: 0.02,
                price_per_minute: 0.05,
                monthly_fee: None,
                description: "Premium communication plan: lower rates plus priority support."
                    .to_string(),
            },
        );
        service_plans.insert(
            "unlimited".to_string(),
            ServicePlan {
                price_per_sms: 0.0,
                price_per_minute: 0.0,
                monthly_fee: Some(30.0),
                description: "Unlimited plan: flat monthly fee, free SMS and calls in-network."
                    .to_string(),
            },
        );

        // 锚点账户的 ID 先分配好，便于历史记录互相引用
        let alice_id = ctx.uuid();
        let bob_id = ctx.uuid();
        let charlie_id = ctx.uuid();
        let diana_id = ctx.uuid();

        let anchors = [
            (
                &alice_id,
                "Alice",
                "Smith",
                "alice.smith@communi.link",
                "+12025550101",
                100.00,
                "premium",
                vec![bob_id.clone(), charlie_id.clone()],
            ),
            (
                &bob_id,
                "Robert",
                "Johnson",
                "bob.johnson@communi.link",
                "+12025550102",
                50.00,
                "basic",
                vec![alice_id.clone(), charlie_id.clone()],
            ),
            (
                &charlie_id,
                "Charles",
                "Brown",
                "charlie.brown@communi.link",
                "+12025550104",
                250.00,
                "unlimited",
                vec![alice_id.clone(), bob_id.clone(), diana_id.clone()],
            ),
            (
                &diana_id,
                "Diana",
                "Miller",
                "diana.miller@communi.link",
                "+12025550105",
                180.50,
                "basic",
                vec![charlie_id.clone()],
            ),
        ];

        let mut users = MemoryStore::new();
        for (id, first, last, email, phone, balance, plan, contacts) in anchors {
            users.insert(
                id,
                CommuniUser {
                    id: id.clone(),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    email: email.to_string(),
                    phone_number: phone.to_string(),
                    balance,
                    password: format!("{}-secret", first.to_lowercase()),
                    service_plan: plan.to_string(),
                    settings: UserSettings::default(),
                    contacts,
                    sms_history: Vec::new(),
                    call_history: Vec::new(),
                    last_login: ctx.past_datetime(30),
                    is_active: true,
                },
            );
        }

        // 锚点账户之间的历史消息与通话
        let seeded_sms = SmsMessage {
            id: ctx.id("sms"),
            sender_id: Some(alice_id.clone()),
            sender_number: "+12025550101".to_string(),
            receiver_number: "+12025550102".to_string(),
            message: "Hey Bob, planning anything for the weekend?".to_string(),
            status: SmsStatus::Delivered,
            timestamp: ctx.past_datetime(3),
            priority: SmsPriority::Normal,
            delivery_receipt: true,
            schedule_time: None,
            message_type: MessageType::Text,
            is_external: false,
        };
        users.update(&alice_id, |u| u.sms_history.push(seeded_sms.clone()));
        users.update(&bob_id, |u| u.sms_history.push(seeded_sms.clone()));

        let seeded_call = CallRecord {
            id: ctx.id("call"),
            caller_id: Some(alice_id.clone()),
            caller_number: "+12025550101".to_string(),
            receiver_number: "+12025550104".to_string(),
            status: CallStatus::Completed,
            timestamp: ctx.past_datetime(5),
            duration_seconds: ctx.int(60..600),
            call_type: CallType::Voice,
            call_quality: CallQuality::Standard,
            recording_enabled: false,
            audio_url: None,
            recording_url: None,
            is_external: false,
        };
        users.update(&alice_id, |u| u.call_history.push(seeded_call.clone()));
        users.update(&charlie_id, |u| u.call_history.push(seeded_call.clone()));

        // 随机补充账户，带少量对外部号码的历史消息
        for _ in 0..profile.extra_users {
            let mut user = CommuniUser::random(ctx);
            let history_count = ctx.int(profile.history_per_user.start as i64
                ..profile.history_per_user.end as i64) as usize;
            for _ in 0..history_count {
                let external_number = ctx.phone_number();
                user.sms_history.push(SmsMessage {
                    id: ctx.id("sms"),
                    sender_id: Some(user.id.clone()),
                    sender_number: user.phone_number.clone(),
                    receiver_number: external_number,
                    message: ctx.sentence(),
                    status: SmsStatus::Delivered,
                    timestamp: ctx.past_datetime(60),
                    priority: SmsPriority::Normal,
                    delivery_receipt: true,
                    schedule_time: None,
                    message_type: MessageType::Text,
                    is_external: true,
                });
            }
            users.insert(&user.id.clone(), user);
        }

        Self {
            users,
            current_user_id: Some(alice_id),
            billing_history: Vec::new(),
            support_tickets: MemoryStore::new(),
            service_plans,
            active_plan: "basic".to_string(),
            network_status: NetworkStatus::Operational,
        }
    }
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 发送短信的可选参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendSmsOptions {
    pub priority: SmsPriority,
    pub delivery_receipt: bool,
    /// 预约发送时间，指定后消息停留在 scheduled 状态
    pub schedule_time: Option<chrono::DateTime<Utc>>,
    pub message_type: MessageType,
}

impl Default for SendSmsOptions {
    fn default() -> Self {
        Self {
            priority: SmsPriority::Normal,
            delivery_receipt: true,
            schedule_time: None,
            message_type: MessageType::Text,
        }
    }
}

/// 发起呼叫的可选参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceCallOptions {
    pub call_type: CallType,
    pub call_quality: CallQuality,
    pub recording_enabled: bool,
    pub voicemail_enabled: bool,
}

impl Default for VoiceCallOptions {
    fn default() -> Self {
        Self {
            call_type: CallType::Voice,
            call_quality: CallQuality::Standard,
            recording_enabled: false,
            voicemail_enabled: true,
        }
    }
}

/// 注册新账户请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// 不提供则自动分配号码
    pub phone_number: Option<String>,
}

/// 更新账户设置请求，只合并显式提供的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub sms_notifications: Option<bool>,
    pub call_forwarding_enabled: Option<bool>,
    pub call_forwarding_number: Option<String>,
}

/// 工单创建请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub category: TicketCategory,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub preferred_contact_method: ContactMethod,
}

/// 计费流水查询
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingQuery {
    pub start_date: Option<chrono::DateTime<Utc>>,
    pub end_date: Option<chrono::DateTime<Utc>>,
    pub transaction_type: Option<TransactionType>,
    pub limit: Option<usize>,
}

/// 登录结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub email: String,
}

/// 短信回执
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsReceipt {
    pub id: String,
    pub from: String,
    pub to: String,
    pub message: String,
    pub status: SmsStatus,
    pub timestamp: chrono::DateTime<Utc>,
    pub priority: SmsPriority,
    pub delivery_receipt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_time: Option<chrono::DateTime<Utc>>,
}

impl SmsReceipt {
    fn from_message(sms: &SmsMessage) -> Self {
        Self {
            id: sms.id.clone(),
            from: sms.sender_number.clone(),
            to: sms.receiver_number.clone(),
            message: sms.message.clone(),
            status: sms.status,
            timestamp: sms.timestamp,
            priority: sms.priority,
            delivery_receipt: sms.delivery_receipt,
            schedule_time: sms.schedule_time,
        }
    }
}

/// 通话回执
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallReceipt {
    pub call_id: String,
    pub from: String,
    pub to: String,
    pub status: CallStatus,
    pub timestamp: chrono::DateTime<Utc>,
    pub duration: i64,
    pub call_type: CallType,
    pub call_quality: CallQuality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
}

impl CallReceipt {
    fn from_record(call: &CallRecord) -> Self {
        Self {
            call_id: call.id.clone(),
            from: call.caller_number.clone(),
            to: call.receiver_number.clone(),
            status: call.status,
            timestamp: call.timestamp,
            duration: call.duration_seconds,
            call_type: call.call_type,
            call_quality: call.call_quality,
            audio_url: call.audio_url.clone(),
            recording_url: call.recording_url.clone(),
        }
    }
}

/// 账户信息视图，不含密码和历史
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub balance: f64,
    pub service_plan: String,
    pub settings: UserSettings,
    pub is_active: bool,
}

impl UserInfo {
    fn from_user(user: &CommuniUser) -> Self {
        Self {
            user_id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            balance: user.balance,
            service_plan: user.service_plan.clone(),
            settings: user.settings.clone(),
            is_active: user.is_active,
        }
    }
}

/// 计费流水响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingHistory {
    pub records: Vec<BillingRecord>,
    pub total_records: usize,
}

/// 网络状态响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStatusView {
    pub status: NetworkStatus,
}

// ============================================================================
// 状态容器
// ============================================================================

/// CommuniLink API 容器
#[derive(Debug)]
pub struct CommuniLinkApi {
    pub state: CommuniLinkState,
    ctx: SeedContext,
    profile: SeedProfile,
}

impl Default for CommuniLinkApi {
    fn default() -> Self {
        Self::new()
    }
}

impl CommuniLinkApi {
    /// 创建实例，种子内容每次随机
    pub fn new() -> Self {
        Self::build(SeedContext::new(), SeedProfile::default())
    }

    /// 创建固定种子的实例，内容可复现
    pub fn with_seed(seed: u64) -> Self {
        Self::build(SeedContext::with_seed(seed), SeedProfile::default())
    }

    /// 按自定义上下文和规模创建实例
    pub fn with_profile(ctx: SeedContext, profile: SeedProfile) -> Self {
        Self::build(ctx, profile)
    }

    /// 从已有状态树（如快照）恢复实例
    pub fn from_state(state: CommuniLinkState) -> Self {
        Self {
            state,
            ctx: SeedContext::new(),
            profile: SeedProfile::default(),
        }
    }

    fn build(mut ctx: SeedContext, profile: SeedProfile) -> Self {
        let state = CommuniLinkState::seed(&mut ctx, &profile);
        Self {
            state,
            ctx,
            profile,
        }
    }

    // ------------------------------------------------------------------
    // 内部工具
    // ------------------------------------------------------------------

    fn require_login(&self) -> ApiResult<String> {
        self.state
            .current_user_id
            .clone()
            .ok_or_else(|| ApiError::unauthorized("User must be logged in to perform this action"))
    }

    fn user_id_by_email(&self, email: &str) -> Option<String> {
        self.state
            .users
            .list()
            .into_iter()
            .find(|u| u.email == email)
            .map(|u| u.id)
    }

    fn user_id_by_phone(&self, phone: &str) -> Option<String> {
        self.state
            .users
            .list()
            .into_iter()
            .find(|u| u.phone_number == phone)
            .map(|u| u.id)
    }

    fn active_plan(&self) -> ApiResult<ServicePlan> {
        self.state
            .service_plans
            .get(&self.state.active_plan)
            .cloned()
            .ok_or_else(|| ApiError::not_found("service plan", &self.state.active_plan))
    }

    fn current_user(&self) -> ApiResult<CommuniUser> {
        let user_id = self.require_login()?;
        self.state
            .users
            .get(&user_id)
            .ok_or_else(|| ApiError::not_found("user", &user_id))
    }

    // ------------------------------------------------------------------
    // 账户
    // ------------------------------------------------------------------

    /// 用邮箱和密码登录，成功后设置当前用户指针
    pub fn login_user(&mut self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let user_id = self
            .user_id_by_email(email)
            .ok_or_else(|| ApiError::unauthorized("invalid email or password"))?;

        let user = self
            .state
            .users
            .get(&user_id)
            .ok_or_else(|| ApiError::not_found("user", &user_id))?;
        if user.password != password {
            warn!(email, "登录失败：密码不匹配");
            return Err(ApiError::unauthorized("invalid email or password"));
        }

        self.state.current_user_id = Some(user_id.clone());
        self.state.users.update(&user_id, |u| u.last_login = Utc::now());
        info!(email, "用户已登录");

        Ok(LoginResponse {
            user_id,
            email: email.to_string(),
        })
    }

    /// 登出，清空当前用户指针
    pub fn logout_user(&mut self) -> ApiResult<()> {
        self.state.current_user_id = None;
        Ok(())
    }

    /// 注册新账户并赠送初始余额
    pub fn register_user(&mut self, req: RegisterUserRequest) -> ApiResult<UserInfo> {
        if req.email.is_empty() || req.password.is_empty() {
            return Err(ApiError::validation("email and password are required"));
        }
        if self.user_id_by_email(&req.email).is_some() {
            return Err(ApiError::already_exists("user", &req.email));
        }

        let phone_number = match req.phone_number {
            Some(phone) => phone,
            None => self.ctx.phone_number(),
        };
        let user = CommuniUser {
            id: self.ctx.uuid(),
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone_number,
            balance: 10.0,
            password: req.password,
            service_plan: self.state.active_plan.clone(),
            settings: UserSettings::default(),
            contacts: Vec::new(),
            sms_history: Vec::new(),
            call_history: Vec::new(),
            last_login: Utc::now(),
            is_active: true,
        };
        info!(user_id = %user.id, email = %user.email, "注册新账户");
        let view = UserInfo::from_user(&user);
        self.state.users.insert(&user.id.clone(), user);
        Ok(view)
    }

    /// 当前登录账户的信息
    pub fn get_user_info(&self) -> ApiResult<UserInfo> {
        Ok(UserInfo::from_user(&self.current_user()?))
    }

    /// 合并更新当前账户设置
    pub fn update_user_settings(&mut self, req: UpdateSettingsRequest) -> ApiResult<UserSettings> {
        let user_id = self.require_login()?;
        let found = self.state.users.update(&user_id, |u| {
            if let Some(value) = req.sms_notifications {
                u.settings.sms_notifications = value;
            }
            if let Some(value) = req.call_forwarding_enabled {
                u.settings.call_forwarding_enabled = value;
            }
            if let Some(value) = req.call_forwarding_number.clone() {
                u.settings.call_forwarding_number = Some(value);
            }
        });
        if !found {
            return Err(ApiError::not_found("user", &user_id));
        }
        let user = self
            .state
            .users
            .get(&user_id)
            .ok_or_else(|| ApiError::not_found("user", &user_id))?;
        Ok(user.settings)
    }

    // ------------------------------------------------------------------
    // 短信
    // ------------------------------------------------------------------

    /// 以当前用户身份发送短信
    ///
    /// 费用 = 激活套餐单价 × 优先级乘数，先验余额再扣费并写入计费流水；
    /// 对端号码在系统内时消息同步写入对方历史
    pub fn send_sms(
        &mut self,
        to_number: &str,
        message: &str,
        opts: SendSmsOptions,
    ) -> ApiResult<SmsReceipt> {
        let sender_id = self.require_login()?;
        if to_number.is_empty() || message.is_empty() {
            return Err(ApiError::validation(
                "missing required parameters: to_number and message",
            ));
        }

        let sender = self
            .state
            .users
            .get(&sender_id)
            .ok_or_else(|| ApiError::not_found("user", &sender_id))?;
        let plan = self.active_plan()?;
        let cost = plan.price_per_sms * opts.priority.cost_multiplier();

        if sender.balance < cost {
            warn!(user_id = %sender_id, cost, balance = sender.balance, "余额不足，短信未发送");
            return Err(ApiError::insufficient_balance(
                "Insufficient balance to send SMS",
            ));
        }

        let receiver_id = self.user_id_by_phone(to_number);
        let scheduled = opts.schedule_time.is_some();
        let mut sms = SmsMessage {
            id: self.ctx.id("sms"),
            sender_id: Some(sender_id.clone()),
            sender_number: sender.phone_number.clone(),
            receiver_number: to_number.to_string(),
            message: message.to_string(),
            status: if scheduled {
                SmsStatus::Scheduled
            } else {
                SmsStatus::Queued
            },
            timestamp: Utc::now(),
            priority: opts.priority,
            delivery_receipt: opts.delivery_receipt,
            schedule_time: opts.schedule_time,
            message_type: opts.message_type,
            is_external: receiver_id.is_none(),
        };

        // 扣费并记账
        self.state.users.update(&sender_id, |u| u.balance -= cost);
        self.state.billing_history.push(BillingRecord {
            transaction_id: self.ctx.id("txn"),
            transaction_type: TransactionType::SmsCharge,
            user_id: sender_id.clone(),
            amount: -cost,
            date: Utc::now(),
            description: format!(
                "SMS to {} (priority: {})",
                to_number,
                opts.priority.as_str()
            ),
        });

        // 即时发送直接推进到 delivered，预约发送停在 scheduled
        if !scheduled {
            sms.status = SmsStatus::Delivered;
        }

        self.state
            .users
            .update(&sender_id, |u| u.sms_history.push(sms.clone()));
        if let Some(receiver_id) = &receiver_id {
            self.state
                .users
                .update(receiver_id, |u| u.sms_history.push(sms.clone()));
        }

        info!(
            sms_id = %sms.id,
            to = to_number,
            status = ?sms.status,
            external = sms.is_external,
            "SMS 已创建"
        );
        Ok(SmsReceipt::from_message(&sms))
    }

    /// 按消息 ID 查询短信状态，跨所有账户历史检索
    pub fn get_sms_status(&self, message_id: &str) -> ApiResult<SmsReceipt> {
        for user in self.state.users.list() {
            if let Some(sms) = user.sms_history.iter().find(|s| s.id == message_id) {
                return Ok(SmsReceipt::from_message(sms));
            }
        }
        Err(ApiError::not_found("SMS message", message_id))
    }

    /// 当前用户的全部短信历史
    pub fn get_all_sms_messages(&self) -> ApiResult<Vec<SmsMessage>> {
        Ok(self.current_user()?.sms_history)
    }

    // ------------------------------------------------------------------
    // 语音
    // ------------------------------------------------------------------

    /// 以当前用户身份发起呼叫
    ///
    /// 通话时长随机生成（30-120 秒），费用在接通前按
    /// 单价 × 分钟数 × 质量乘数 × 类型乘数（+录音附加费）验证
    pub fn make_voice_call(
        &mut self,
        to_number: &str,
        opts: VoiceCallOptions,
    ) -> ApiResult<CallReceipt> {
        let caller_id = self.require_login()?;
        if to_number.is_empty() {
            return Err(ApiError::validation("missing required parameter: to_number"));
        }

        let caller = self
            .state
            .users
            .get(&caller_id)
            .ok_or_else(|| ApiError::not_found("user", &caller_id))?;
        let plan = self.active_plan()?;

        let duration_seconds = self.ctx.int(30..121);
        let minutes = duration_seconds as f64 / 60.0;
        let mut cost = plan.price_per_minute
            * minutes
            * opts.call_quality.cost_multiplier()
            * opts.call_type.cost_multiplier();
        if opts.recording_enabled {
            cost += 0.05 * minutes;
        }

        if caller.balance < cost {
            warn!(user_id = %caller_id, cost, "余额不足，呼叫未接通");
            return Err(ApiError::insufficient_balance(
                "Insufficient balance to make call",
            ));
        }

        let receiver_id = self.user_id_by_phone(to_number);
        let call_id = self.ctx.id("call");
        let call = CallRecord {
            id: call_id.clone(),
            caller_id: Some(caller_id.clone()),
            caller_number: caller.phone_number.clone(),
            receiver_number: to_number.to_string(),
            status: CallStatus::Completed,
            timestamp: Utc::now(),
            duration_seconds,
            call_type: opts.call_type,
            call_quality: opts.call_quality,
            recording_enabled: opts.recording_enabled,
            audio_url: Some(format!("https://audio.mock/{call_id}.mp3")),
            recording_url: opts
                .recording_enabled
                .then(|| format!("https://recordings.mock/{call_id}.mp3")),
            is_external: receiver_id.is_none(),
        };

        self.state.users.update(&caller_id, |u| {
            u.balance -= cost;
            u.call_history.push(call.clone());
        });
        if let Some(receiver_id) = &receiver_id {
            self.state
                .users
                .update(receiver_id, |u| u.call_history.push(call.clone()));
        }
        self.state.billing_history.push(BillingRecord {
            transaction_id: self.ctx.id("txn"),
            transaction_type: TransactionType::VoiceCallCharge,
            user_id: caller_id.clone(),
            amount: -cost,
            date: Utc::now(),
            description: format!(
                "{} call to {}, duration {}s, quality: {}",
                opts.call_type.as_str(),
                to_number,
                duration_seconds,
                opts.call_quality.as_str()
            ),
        });

        info!(call_id = %call.id, to = to_number, duration_seconds, "通话已完成");
        Ok(CallReceipt::from_record(&call))
    }

    /// 按通话 ID 查询状态，跨所有账户历史检索
    pub fn get_voice_call_status(&self, call_id: &str) -> ApiResult<CallReceipt> {
        for user in self.state.users.list() {
            if let Some(call) = user.call_history.iter().find(|c| c.id == call_id) {
                return Ok(CallReceipt::from_record(call));
            }
        }
        Err(ApiError::not_found("voice call", call_id))
    }

    /// 当前用户的全部通话历史
    pub fn get_all_voice_calls(&self) -> ApiResult<Vec<CallRecord>> {
        Ok(self.current_user()?.call_history)
    }

    // ------------------------------------------------------------------
    // 计费与支持
    // ------------------------------------------------------------------

    /// 当前用户的计费流水，支持日期区间和类型过滤，按日期倒序
    pub fn get_billing_history(&self, query: BillingQuery) -> ApiResult<BillingHistory> {
        let user_id = self.require_login()?;

        let mut records: Vec<BillingRecord> = self
            .state
            .billing_history
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| query.start_date.is_none_or(|start| r.date >= start))
            .filter(|r| query.end_date.is_none_or(|end| r.date <= end))
            .filter(|r| {
                query
                    .transaction_type
                    .is_none_or(|kind| r.transaction_type == kind)
            })
            .cloned()
            .collect();

        records.sort_by(|a, b| b.date.cmp(&a.date));
        records.truncate(query.limit.unwrap_or(100));

        let total_records = records.len();
        Ok(BillingHistory {
            records,
            total_records,
        })
    }

    /// 为当前用户创建客服工单
    pub fn create_support_ticket(&mut self, req: CreateTicketRequest) -> ApiResult<SupportTicket> {
        let user_id = self.require_login()?;
        if req.subject.is_empty() {
            return Err(ApiError::validation("subject is required"));
        }
        if req.description.is_empty() {
            return Err(ApiError::validation("description is required"));
        }

        let now = Utc::now();
        let ticket = SupportTicket {
            ticket_id: self.ctx.id("ticket"),
            user_id,
            subject: req.subject,
            description: req.description,
            priority: req.priority,
            category: req.category,
            attachments: req.attachments,
            preferred_contact_method: req.preferred_contact_method,
            status: TicketStatus::Open,
            created_at: now,
            last_updated: now,
        };
        info!(ticket_id = %ticket.ticket_id, priority = ?ticket.priority, "创建客服工单");
        self.state
            .support_tickets
            .insert(&ticket.ticket_id.clone(), ticket.clone());
        Ok(ticket)
    }

    /// 当前网络运行状态，无需登录
    pub fn get_network_status(&self) -> ApiResult<NetworkStatusView> {
        Ok(NetworkStatusView {
            status: self.state.network_status,
        })
    }
}

impl MockBackend for CommuniLinkApi {
    fn service_name(&self) -> &'static str {
        "communilink"
    }

    fn export_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn reset_data(&mut self) -> bool {
        let mut ctx = self.ctx.renew();
        self.state = CommuniLinkState::seed(&mut ctx, &self.profile);
        self.ctx = ctx;
        info!("CommuniLink 状态已重置");
        true
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> CommuniLinkApi {
        CommuniLinkApi::with_seed(42)
    }

    fn balance_of(api: &CommuniLinkApi, email: &str) -> f64 {
        api.state
            .users
            .list()
            .into_iter()
            .find(|u| u.email == email)
            .unwrap()
            .balance
    }

    #[test]
    fn test_send_sms_delivers_and_bills() {
        let mut api = api();
        let before = balance_of(&api, "alice.smith@communi.link");

        let receipt = api
            .send_sms("+12025550102", "hi", SendSmsOptions::default())
            .unwrap();

        assert_eq!(receipt.status, SmsStatus::Delivered);
        assert_eq!(receipt.to, "+12025550102");

        // 扣费 = 激活套餐（basic）单价 × normal 乘数
        let after = balance_of(&api, "alice.smith@communi.link");
        assert!((before - after - 0.05).abs() < 1e-9);

        // 恰好一条 sms_charge 计费流水，金额为负
        let charges: Vec<_> = api
            .state
            .billing_history
            .iter()
            .filter(|r| r.transaction_type == TransactionType::SmsCharge)
            .collect();
        assert_eq!(charges.len(), 1);
        assert!(charges[0].amount < 0.0);

        // 对端在系统内，消息同步进对方历史
        let bob = api
            .state
            .users
            .list()
            .into_iter()
            .find(|u| u.email == "bob.johnson@communi.link")
            .unwrap();
        assert!(bob.sms_history.iter().any(|s| s.message == "hi"));
    }

    #[test]
    fn test_send_sms_priority_multiplier() {
        let mut api = api();
        let before = balance_of(&api, "alice.smith@communi.link");

        let opts = SendSmsOptions {
            priority: SmsPriority::High,
            ..Default::default()
        };
        api.send_sms("+12025550104", "urgent", opts).unwrap();

        let after = balance_of(&api, "alice.smith@communi.link");
        assert!((before - after - 0.05 * 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_scheduled_sms_stays_scheduled() {
        let mut api = api();
        let opts = SendSmsOptions {
            schedule_time: Some(Utc::now() + chrono::Duration::hours(2)),
            ..Default::default()
        };

        let receipt = api.send_sms("+12025550102", "later", opts).unwrap();
        assert_eq!(receipt.status, SmsStatus::Scheduled);

        let status = api.get_sms_status(&receipt.id).unwrap();
        assert_eq!(status.status, SmsStatus::Scheduled);
    }

    #[test]
    fn test_send_sms_insufficient_balance() {
        let mut api = api();
        let user_id = api.state.current_user_id.clone().unwrap();
        api.state.users.update(&user_id, |u| u.balance = 0.0);

        let err = api
            .send_sms("+12025550102", "hi", SendSmsOptions::default())
            .unwrap_err();
        assert_eq!(err.kind, mock_harness::ErrorKind::InsufficientBalance);

        // 失败时不产生计费流水
        assert!(api.state.billing_history.is_empty());
    }

    #[test]
    fn test_send_sms_requires_login() {
        let mut api = api();
        api.logout_user().unwrap();

        let err = api
            .send_sms("+12025550102", "hi", SendSmsOptions::default())
            .unwrap_err();
        assert_eq!(err.kind, mock_harness::ErrorKind::Unauthorized);
    }

    #[test]
    fn test_voice_call_bills_by_duration_and_quality() {
        let mut api = api();
        let before = balance_of(&api, "alice.smith@communi.link");

        let opts = VoiceCallOptions {
            call_type: CallType::Video,
            call_quality: CallQuality::Hd,
            ..Default::default()
        };
        let receipt = api.make_voice_call("+12025550104", opts).unwrap();

        assert_eq!(receipt.status, CallStatus::Completed);
        assert!((30..=120).contains(&receipt.duration));
        assert!(receipt.audio_url.is_some());

        let expected = 0.10 * (receipt.duration as f64 / 60.0) * 1.3 * 2.0;
        let after = balance_of(&api, "alice.smith@communi.link");
        assert!((before - after - expected).abs() < 1e-9);

        let last = api.state.billing_history.last().unwrap();
        assert_eq!(last.transaction_type, TransactionType::VoiceCallCharge);
    }

    #[test]
    fn test_login_logout_cycle() {
        let mut api = api();
        api.logout_user().unwrap();
        assert!(api.get_user_info().is_err());

        let login = api
            .login_user("bob.johnson@communi.link", "robert-secret")
            .unwrap();
        assert_eq!(login.email, "bob.johnson@communi.link");

        let info = api.get_user_info().unwrap();
        assert_eq!(info.email, "bob.johnson@communi.link");

        let err = api
            .login_user("bob.johnson@communi.link", "wrong")
            .unwrap_err();
        assert_eq!(err.kind, mock_harness::ErrorKind::Unauthorized);
    }

    #[test]
    fn test_register_duplicate_email() {
        let mut api = api();
        let req = RegisterUserRequest {
            first_name: "Eve".to_string(),
            last_name: "Green".to_string(),
            email: "eve.green@communi.link".to_string(),
            password: "pw".to_string(),
            phone_number: None,
        };
        let created = api.register_user(req.clone()).unwrap();
        assert!(created.phone_number.starts_with("+1"));

        let err = api.register_user(req).unwrap_err();
        assert_eq!(err.kind, mock_harness::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_billing_history_filters_by_type() {
        let mut api = api();
        api.send_sms("+12025550102", "one", SendSmsOptions::default())
            .unwrap();
        api.make_voice_call("+12025550104", VoiceCallOptions::default())
            .unwrap();

        let history = api
            .get_billing_history(BillingQuery {
                transaction_type: Some(TransactionType::SmsCharge),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(history.total_records, 1);
        assert!(
            history
                .records
                .iter()
                .all(|r| r.transaction_type == TransactionType::SmsCharge)
        );
    }

    #[test]
    fn test_support_ticket_requires_subject() {
        let mut api = api();
        let err = api
            .create_support_ticket(CreateTicketRequest {
                subject: String::new(),
                description: "broken".to_string(),
                priority: TicketPriority::High,
                category: TicketCategory::Technical,
                attachments: Vec::new(),
                preferred_contact_method: ContactMethod::Email,
            })
            .unwrap_err();
        assert_eq!(err.kind, mock_harness::ErrorKind::Validation);
    }

    #[test]
    fn test_reset_discards_mutations() {
        let mut api = api();
        api.send_sms("+12025550102", "hi", SendSmsOptions::default())
            .unwrap();
        assert!(!api.state.billing_history.is_empty());

        assert!(api.reset_data());
        assert!(api.state.billing_history.is_empty());

        // 固定种子下锚点账户完整复现
        assert!((balance_of(&api, "alice.smith@communi.link") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_with_seed_reproduces_ids() {
        let mut api = api();
        let ids_before = api.state.users.ids();
        api.reset_data();
        assert_eq!(api.state.users.ids(), ids_before);
    }

    #[test]
    fn test_network_status_without_login() {
        let mut api = api();
        api.logout_user().unwrap();
        let view = api.get_network_status().unwrap();
        assert_eq!(view.status, NetworkStatus::Operational);
    }
}

//! CommuniLink 实体模型
//!
//! 短信、语音通话与计费相关的数据结构。费率由套餐表驱动，
//! 优先级、通话类型和质量等级分别贡献独立的价格乘数。

use chrono::{DateTime, Utc};
use mock_harness::seed::SeedContext;
use serde::{Deserialize, Serialize};

/// 通信账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommuniUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub balance: f64,
    pub password: String,
    pub service_plan: String,
    pub settings: UserSettings,
    /// 联系人的用户 ID 列表
    pub contacts: Vec<String>,
    pub sms_history: Vec<SmsMessage>,
    pub call_history: Vec<CallRecord>,
    pub last_login: DateTime<Utc>,
    pub is_active: bool,
}

impl CommuniUser {
    /// 生成随机账户，用于种子补充
    pub fn random(ctx: &mut SeedContext) -> Self {
        let first_name = ctx.first_name();
        let last_name = ctx.last_name();
        let email = format!(
            "{}.{}@communi.link",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        );

        Self {
            id: ctx.uuid(),
            first_name,
            last_name,
            email,
            phone_number: ctx.phone_number(),
            balance: ctx.amount(5.0..300.0),
            password: ctx.short_id("pw"),
            service_plan: ctx.pick(&["basic", "premium", "unlimited"]).to_string(),
            settings: UserSettings::default(),
            contacts: Vec::new(),
            sms_history: Vec::new(),
            call_history: Vec::new(),
            last_login: ctx.past_datetime(30),
            is_active: ctx.chance(0.85),
        }
    }
}

/// 账户设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSettings {
    pub sms_notifications: bool,
    pub call_forwarding_enabled: bool,
    pub call_forwarding_number: Option<String>,
}

/// 短信优先级
///
/// 优先级影响单条费用：low 八折，high 上浮 50%
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl SmsPriority {
    pub fn cost_multiplier(&self) -> f64 {
        match self {
            Self::Low => 0.8,
            Self::Normal => 1.0,
            Self::High => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// 短信类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    Marketing,
    Transactional,
}

/// 短信状态
///
/// 即时发送走 queued → delivered，预约发送停在 scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsStatus {
    Queued,
    Scheduled,
    Sent,
    Delivered,
    Failed,
}

/// 短信记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsMessage {
    pub id: String,
    /// 发送方的用户 ID，外部号码发来的消息为 None
    pub sender_id: Option<String>,
    pub sender_number: String,
    pub receiver_number: String,
    pub message: String,
    pub status: SmsStatus,
    pub timestamp: DateTime<Utc>,
    pub priority: SmsPriority,
    pub delivery_receipt: bool,
    pub schedule_time: Option<DateTime<Utc>>,
    pub message_type: MessageType,
    /// 对端号码是否不在系统内
    pub is_external: bool,
}

/// 通话类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    #[default]
    Voice,
    Video,
    Conference,
}

impl CallType {
    pub fn cost_multiplier(&self) -> f64 {
        match self {
            Self::Voice => 1.0,
            Self::Video => 2.0,
            Self::Conference => 2.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Video => "video",
            Self::Conference => "conference",
        }
    }
}

/// 通话质量等级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallQuality {
    #[default]
    Standard,
    Hd,
    Premium,
}

impl CallQuality {
    pub fn cost_multiplier(&self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Hd => 1.3,
            Self::Premium => 1.8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Hd => "hd",
            Self::Premium => "premium",
        }
    }
}

/// 通话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Initiated,
    Ringing,
    InProgress,
    Completed,
    Failed,
}

/// 通话记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    /// 主叫方的用户 ID，外部来电为 None
    pub caller_id: Option<String>,
    pub caller_number: String,
    pub receiver_number: String,
    pub status: CallStatus,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: i64,
    pub call_type: CallType,
    pub call_quality: CallQuality,
    pub recording_enabled: bool,
    pub audio_url: Option<String>,
    pub recording_url: Option<String>,
    pub is_external: bool,
}

/// 计费条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    SmsCharge,
    VoiceCallCharge,
    Refund,
}

/// 计费条目
///
/// 扣费为负数金额，退款为正数金额
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRecord {
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub user_id: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub description: String,
}

/// 工单优先级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// 工单分类
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    #[default]
    General,
    Billing,
    Technical,
    Account,
}

/// 联系方式偏好
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    #[default]
    Email,
    Phone,
    Sms,
}

/// 工单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// 客服工单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub ticket_id: String,
    pub user_id: String,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub attachments: Vec<String>,
    pub preferred_contact_method: ContactMethod,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// 套餐费率
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePlan {
    pub price_per_sms: f64,
    pub price_per_minute: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_fee: Option<f64>,
    pub description: String,
}

/// 网络状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    Operational,
    Degraded,
    Maintenance,
    Outage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_shape() {
        let mut ctx = SeedContext::with_seed(11);
        let user = CommuniUser::random(&mut ctx);

        assert!(user.email.ends_with("@communi.link"));
        assert!(user.phone_number.starts_with("+1"));
        assert!(user.balance >= 5.0);
        assert!(user.sms_history.is_empty());
    }

    #[test]
    fn test_priority_multipliers() {
        assert_eq!(SmsPriority::Low.cost_multiplier(), 0.8);
        assert_eq!(SmsPriority::Normal.cost_multiplier(), 1.0);
        assert_eq!(SmsPriority::High.cost_multiplier(), 1.5);
    }

    #[test]
    fn test_call_multipliers_stack_independently() {
        // 视频 + HD 时两个乘数相乘：2.0 * 1.3
        let combined = CallType::Video.cost_multiplier() * CallQuality::Hd.cost_multiplier();
        assert!((combined - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_billing_record_type_field_name() {
        let record = BillingRecord {
            transaction_id: "txn-1".to_string(),
            transaction_type: TransactionType::SmsCharge,
            user_id: "u-1".to_string(),
            amount: -0.05,
            date: Utc::now(),
            description: "SMS to +12025550105".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "sms_charge");
    }
}

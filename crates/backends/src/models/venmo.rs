//! Venmo 实体模型
//!
//! 账户、支付方式与交易的数据结构。卡号只保存掩码后四位。

use chrono::{DateTime, Utc};
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use serde::{Deserialize, Serialize};

/// 支付账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenmoUser {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_picture_url: String,
    pub balance: f64,
    /// 好友的用户 ID 列表
    pub friends: Vec<String>,
    pub payment_methods: MemoryStore<PaymentMethod>,
    /// 默认支付方式，None 表示用余额支付
    pub default_payment_method: Option<String>,
    pub notifications: Vec<Notification>,
    pub date_created: DateTime<Utc>,
}

impl VenmoUser {
    /// 生成随机账户，用于种子补充
    pub fn random(ctx: &mut SeedContext) -> Self {
        let first_name = ctx.first_name();
        let last_name = ctx.last_name();
        let username = ctx.username();
        let email = format!("{username}@example.com");
        Self {
            id: ctx.uuid(),
            display_name: format!("{first_name} {last_name}"),
            username,
            first_name,
            last_name,
            email,
            profile_picture_url: format!("https://venmo.mock/avatars/{}.png", ctx.short_id("av")),
            balance: ctx.amount(0.0..2000.0),
            friends: Vec::new(),
            payment_methods: MemoryStore::new(),
            default_payment_method: None,
            notifications: Vec::new(),
            date_created: ctx.past_datetime(900),
        }
    }
}

/// 支付方式类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
    Bank,
}

/// 支付方式
///
/// 只保存号码的后四位掩码，完整卡号和 CVV 不落入状态树
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    pub method_type: PaymentMethodType,
    pub brand: String,
    pub last_four: String,
    pub expiration_month: u8,
    pub expiration_year: i32,
    pub added_at: DateTime<Utc>,
}

/// 交易动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxAction {
    Pay,
    Charge,
}

/// 交易状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Settled,
    Pending,
}

/// 可见范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Public,
    Friends,
    #[default]
    Private,
}

/// 交易记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub status: TxStatus,
    pub action: TxAction,
    pub amount: f64,
    pub note: String,
    pub audience: Audience,
    /// 发起方用户 ID
    pub actor_id: String,
    /// 对方用户 ID
    pub target_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
    pub date_created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<DateTime<Utc>>,
}

/// 通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub text: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

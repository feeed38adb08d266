//! Venmo 模拟服务
//!
//! 余额转账、付款请求、支付方式与通知的内存模拟。
//! 调用方先用 `token_{email}` 形式的令牌认证，之后的处理器
//! 都以当前登录用户为主体。

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use mock_harness::page::{Page, PageQuery, paginate};
use mock_harness::result::{ApiError, ApiResult};
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use mock_harness::MockBackend;

use crate::generators::SeedProfile;
use crate::models::venmo::{
    Audience, Notification, PaymentMethod, PaymentMethodType, Transaction, TxAction, TxStatus,
    VenmoUser,
};

/// Venmo 状态树
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenmoState {
    pub users: MemoryStore<VenmoUser>,
    pub transactions: MemoryStore<Transaction>,
    /// 当前登录用户，None 表示未认证
    pub current_user_id: Option<String>,
    pub access_token: Option<String>,
}

impl VenmoState {
    /// 生成默认种子树：alice/bob 互为好友 + 一笔已结算转账
    pub fn seed(ctx: &mut SeedContext, profile: &SeedProfile) -> Self {
        let alice_id = ctx.uuid();
        let bob_id = ctx.uuid();

        let mut alice = VenmoUser {
            id: alice_id.clone(),
            username: "alice".to_string(),
            display_name: "Alice Walker".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Walker".to_string(),
            email: "alice@venmo.example".to_string(),
            profile_picture_url: "https://venmo.mock/avatars/alice.png".to_string(),
            balance: 100.0,
            friends: vec![bob_id.clone()],
            payment_methods: MemoryStore::new(),
            default_payment_method: None,
            notifications: Vec::new(),
            date_created: ctx.past_datetime(900),
        };

        // alice 预置一张已绑定的卡
        let card_id = ctx.uuid();
        alice.payment_methods.insert(
            &card_id,
            PaymentMethod {
                id: card_id.clone(),
                method_type: PaymentMethodType::Card,
                brand: "visa".to_string(),
                last_four: "4242".to_string(),
                expiration_month: 9,
                expiration_year: Utc::now().year() + 3,
                added_at: ctx.past_datetime(300),
            },
        );

        let mut bob = VenmoUser {
            id: bob_id.clone(),
            username: "bob".to_string(),
            display_name: "Bob Chen".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Chen".to_string(),
            email: "bob@venmo.example".to_string(),
            profile_picture_url: "https://venmo.mock/avatars/bob.png".to_string(),
            balance: 250.0,
            friends: vec![alice_id.clone()],
            payment_methods: MemoryStore::new(),
            default_payment_method: None,
            notifications: Vec::new(),
            date_created: ctx.past_datetime(900),
        };

        let mut transactions = MemoryStore::new();
        let tx_id = ctx.uuid();
        let tx_date = ctx.past_datetime(30);
        transactions.insert(
            &tx_id,
            Transaction {
                id: tx_id.clone(),
                status: TxStatus::Settled,
                action: TxAction::Pay,
                amount: 20.0,
                note: "Dinner".to_string(),
                audience: Audience::Friends,
                actor_id: bob_id.clone(),
                target_id: alice_id.clone(),
                payment_method_id: None,
                date_created: tx_date,
                date_completed: Some(tx_date),
            },
        );
        bob.notifications.push(Notification {
            id: ctx.uuid(),
            text: "You paid Alice Walker $20.00".to_string(),
            read: true,
            created_at: tx_date,
        });
        alice.notifications.push(Notification {
            id: ctx.uuid(),
            text: "Bob Chen paid you $20.00".to_string(),
            read: false,
            created_at: tx_date,
        });

        let mut users = MemoryStore::new();
        users.insert(&alice_id.clone(), alice);
        users.insert(&bob_id.clone(), bob);
        for _ in 0..profile.extra_users {
            let user = VenmoUser::random(ctx);
            users.insert(&user.id.clone(), user);
        }

        Self {
            users,
            transactions,
            current_user_id: None,
            access_token: None,
        }
    }
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 对外公开的用户档案，不含余额等私密字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub profile_picture_url: String,
}

impl PublicProfile {
    fn from_user(user: &VenmoUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            profile_picture_url: user.profile_picture_url.clone(),
        }
    }
}

/// 当前用户的完整档案视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub balance: f64,
    pub friends_count: usize,
    pub date_created: chrono::DateTime<Utc>,
}

/// 转账请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// 收款方的用户 ID 或邮箱
    pub user: String,
    pub amount: f64,
    pub note: String,
    #[serde(default)]
    pub audience: Audience,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
}

/// 付款请求（向对方要钱）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// 付款方的用户 ID 或邮箱
    pub user: String,
    pub amount: f64,
    pub note: String,
    #[serde(default)]
    pub audience: Audience,
}

/// 交易列表过滤
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub status: Option<TxStatus>,
    #[serde(default)]
    pub page: PageQuery,
}

/// 绑卡请求，卡号与 CVV 校验后即丢弃
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRequest {
    pub card_number: String,
    pub expiry_month: u8,
    pub expiry_year: i32,
    pub cvv: String,
    pub billing_zip: String,
}

// ============================================================================
// 状态容器
// ============================================================================

/// Venmo API 容器
#[derive(Debug)]
pub struct VenmoApi {
    pub state: VenmoState,
    ctx: SeedContext,
    profile: SeedProfile,
}

impl Default for VenmoApi {
    fn default() -> Self {
        Self::new()
    }
}

impl VenmoApi {
    pub fn new() -> Self {
        Self::build(SeedContext::new(), SeedProfile::default())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::build(SeedContext::with_seed(seed), SeedProfile::default())
    }

    pub fn with_profile(ctx: SeedContext, profile: SeedProfile) -> Self {
        Self::build(ctx, profile)
    }

    pub fn from_state(state: VenmoState) -> Self {
        Self {
            state,
            ctx: SeedContext::new(),
            profile: SeedProfile::default(),
        }
    }

    fn build(mut ctx: SeedContext, profile: SeedProfile) -> Self {
        let state = VenmoState::seed(&mut ctx, &profile);
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

    fn current_user(&self) -> ApiResult<VenmoUser> {
        let user_id = self.require_auth()?;
        self.state
            .users
            .get(&user_id)
            .ok_or_else(|| ApiError::not_found("user", &user_id))
    }

    /// 按用户 ID 或邮箱解析出用户 ID
    fn resolve_user(&self, identifier: &str) -> ApiResult<String> {
        if self.state.users.contains(identifier) {
            return Ok(identifier.to_string());
        }
        self.state
            .users
            .list_by(|u| u.email == identifier)
            .first()
            .map(|u| u.id.clone())
            .ok_or_else(|| ApiError::not_found("user", identifier))
    }

    // ------------------------------------------------------------------
    // 认证与档案
    // ------------------------------------------------------------------

    /// 用 `token_{email}` 形式的令牌认证
    pub fn authenticate(&mut self, access_token: &str) -> ApiResult<PublicProfile> {
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
        info!(user_id = %user.id, "Venmo 用户已认证");
        Ok(PublicProfile::from_user(&user))
    }

    pub fn get_profile(&self) -> ApiResult<ProfileView> {
        let user = self.current_user()?;
        Ok(ProfileView {
            id: user.id.clone(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            balance: user.balance,
            friends_count: user.friends.len(),
            date_created: user.date_created,
        })
    }

    pub fn get_account_balance(&self) -> ApiResult<f64> {
        Ok(self.current_user()?.balance)
    }

    pub fn get_friends(&self, page: &PageQuery) -> ApiResult<Page<PublicProfile>> {
        let user = self.current_user()?;
        let friends: Vec<PublicProfile> = user
            .friends
            .iter()
            .filter_map(|id| self.state.users.get(id))
            .map(|u| PublicProfile::from_user(&u))
            .collect();
        Ok(paginate(friends, page))
    }

    // ------------------------------------------------------------------
    // 转账与请款
    // ------------------------------------------------------------------

    /// 立即结算的转账：扣发送方余额、加收款方余额、记一笔交易
    pub fn create_payment(&mut self, req: PaymentRequest) -> ApiResult<Transaction> {
        let sender = self.current_user()?;
        let receiver_id = self.resolve_user(&req.user)?;

        if req.amount <= 0.0 {
            return Err(ApiError::validation("amount must be positive"));
        }
        if let Some(ref pm_id) = req.payment_method_id {
            if !sender.payment_methods.contains(pm_id) {
                return Err(ApiError::not_found("payment method", pm_id));
            }
        }
        if sender.balance < req.amount {
            return Err(ApiError::insufficient_balance(format!(
                "balance {:.2} is less than {:.2}",
                sender.balance, req.amount
            )));
        }

        self.state
            .users
            .update(&sender.id, |u| u.balance -= req.amount);
        let notification = Notification {
            id: self.ctx.uuid(),
            text: format!("{} paid you ${:.2}", sender.display_name, req.amount),
            read: false,
            created_at: Utc::now(),
        };
        self.state.users.update(&receiver_id, |u| {
            u.balance += req.amount;
            u.notifications.push(notification);
        });

        let now = Utc::now();
        let tx = Transaction {
            id: self.ctx.uuid(),
            status: TxStatus::Settled,
            action: TxAction::Pay,
            amount: req.amount,
            note: req.note,
            audience: req.audience,
            actor_id: sender.id.clone(),
            target_id: receiver_id,
            payment_method_id: req.payment_method_id,
            date_created: now,
            date_completed: Some(now),
        };
        self.state.transactions.insert(&tx.id.clone(), tx.clone());
        info!(tx_id = %tx.id, amount = req.amount, "转账已结算");
        Ok(tx)
    }

    /// 创建待确认的付款请求，不移动余额
    pub fn create_charge(&mut self, req: ChargeRequest) -> ApiResult<Transaction> {
        let requester = self.current_user()?;
        let payer_id = self.resolve_user(&req.user)?;

        if req.amount <= 0.0 {
            return Err(ApiError::validation("amount must be positive"));
        }

        let notification = Notification {
            id: self.ctx.uuid(),
            text: format!(
                "{} requests ${:.2}",
                requester.display_name, req.amount
            ),
            read: false,
            created_at: Utc::now(),
        };
        self.state.users.update(&payer_id, |u| {
            u.notifications.push(notification);
        });

        let tx = Transaction {
            id: self.ctx.uuid(),
            status: TxStatus::Pending,
            action: TxAction::Charge,
            amount: req.amount,
            note: req.note,
            audience: req.audience,
            actor_id: requester.id.clone(),
            target_id: payer_id,
            payment_method_id: None,
            date_created: Utc::now(),
            date_completed: None,
        };
        self.state.transactions.insert(&tx.id.clone(), tx.clone());
        Ok(tx)
    }

    pub fn get_payment(&self, payment_id: &str) -> ApiResult<Transaction> {
        self.state
            .transactions
            .get(payment_id)
            .ok_or_else(|| ApiError::not_found("payment", payment_id))
    }

    /// 当前用户参与的交易，按创建时间倒序
    pub fn get_transactions(&self, filter: &TransactionFilter) -> ApiResult<Page<Transaction>> {
        let user_id = self.require_auth()?;
        let mut txs = self.state.transactions.list_by(|t| {
            let involved = t.actor_id == user_id || t.target_id == user_id;
            let status_hit = filter.status.is_none_or(|s| t.status == s);
            involved && status_hit
        });
        txs.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        Ok(paginate(txs, &filter.page))
    }

    // ------------------------------------------------------------------
    // 支付方式
    // ------------------------------------------------------------------

    /// 绑卡：校验有效期和 CVV，只保存品牌和后四位
    pub fn add_payment_method(&mut self, req: CardRequest) -> ApiResult<PaymentMethod> {
        let user_id = self.require_auth()?;

        if !(1..=12).contains(&req.expiry_month) {
            return Err(ApiError::validation("expiry month must be between 1 and 12"));
        }
        let current_year = Utc::now().year();
        if !(current_year..=current_year + 20).contains(&req.expiry_year) {
            return Err(ApiError::validation(format!(
                "expiry year must be between {} and {}",
                current_year,
                current_year + 20
            )));
        }
        if !matches!(req.cvv.len(), 3 | 4) {
            return Err(ApiError::validation("cvv must be 3 or 4 digits"));
        }

        let last_four = if req.card_number.len() >= 4 {
            req.card_number[req.card_number.len() - 4..].to_string()
        } else {
            req.card_number.clone()
        };
        let brand = match req.card_number.chars().next() {
            Some('4') => "visa",
            Some('5') => "mastercard",
            Some('3') | Some('6') => "discover",
            _ => "unknown",
        };

        let method = PaymentMethod {
            id: self.ctx.uuid(),
            method_type: PaymentMethodType::Card,
            brand: brand.to_string(),
            last_four,
            expiration_month: req.expiry_month,
            expiration_year: req.expiry_year,
            added_at: Utc::now(),
        };
        let stored = method.clone();
        self.state.users.update(&user_id, |u| {
            let key = stored.id.clone();
            u.payment_methods.insert(&key, stored);
        });
        Ok(method)
    }

    pub fn get_payment_methods(&self) -> ApiResult<Vec<PaymentMethod>> {
        Ok(self.current_user()?.payment_methods.list())
    }

    pub fn set_default_payment_method(&mut self, payment_method_id: &str) -> ApiResult<PaymentMethod> {
        let user = self.current_user()?;
        let method = user
            .payment_methods
            .get(payment_method_id)
            .ok_or_else(|| ApiError::not_found("payment method", payment_method_id))?;

        self.state.users.update(&user.id, |u| {
            u.default_payment_method = Some(payment_method_id.to_string());
        });
        Ok(method)
    }

    /// 删除支付方式；若删的是默认方式，默认回落到余额支付
    pub fn delete_payment_method(&mut self, payment_method_id: &str) -> ApiResult<()> {
        let user = self.current_user()?;
        if !user.payment_methods.contains(payment_method_id) {
            return Err(ApiError::not_found("payment method", payment_method_id));
        }

        self.state.users.update(&user.id, |u| {
            u.payment_methods.remove(payment_method_id);
            if u.default_payment_method.as_deref() == Some(payment_method_id) {
                u.default_payment_method = None;
            }
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // 通知
    // ------------------------------------------------------------------

    pub fn get_unread_notification_count(&self) -> ApiResult<usize> {
        Ok(self
            .current_user()?
            .notifications
            .iter()
            .filter(|n| !n.read)
            .count())
    }

    /// 把当前用户的全部通知标记为已读/未读
    pub fn mark_notifications_as_read(&mut self, read: bool) -> ApiResult<()> {
        let user_id = self.require_auth()?;
        self.state.users.update(&user_id, |u| {
            for n in &mut u.notifications {
                n.read = read;
            }
        });
        Ok(())
    }

    pub fn delete_all_notifications(&mut self) -> ApiResult<()> {
        let user_id = self.require_auth()?;
        self.state.users.update(&user_id, |u| u.notifications.clear());
        Ok(())
    }
}

impl MockBackend for VenmoApi {
    fn service_name(&self) -> &'static str {
        "venmo"
    }

    fn export_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn reset_data(&mut self) -> bool {
        let mut ctx = self.ctx.renew();
        self.state = VenmoState::seed(&mut ctx, &self.profile);
        self.ctx = ctx;
        info!("Venmo 状态已重置");
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

    fn api() -> VenmoApi {
        let mut api = VenmoApi::with_seed(42);
        api.authenticate("token_alice@venmo.example").unwrap();
        api
    }

    fn payment(user: &str, amount: f64) -> PaymentRequest {
        PaymentRequest {
            user: user.to_string(),
            amount,
            note: "test".to_string(),
            audience: Audience::Private,
            payment_method_id: None,
        }
    }

    #[test]
    fn test_authenticate_accepts_token_format_only() {
        let mut api = VenmoApi::with_seed(42);

        let err = api.authenticate("alice@venmo.example").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let err = api.authenticate("token_nobody@venmo.example").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let profile = api.authenticate("token_alice@venmo.example").unwrap();
        assert_eq!(profile.username, "alice");
    }

    #[test]
    fn test_operations_require_authentication() {
        let api = VenmoApi::with_seed(42);
        assert_eq!(
            api.get_profile().unwrap_err().kind,
            ErrorKind::Unauthorized
        );
        assert_eq!(
            api.get_account_balance().unwrap_err().kind,
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn test_payment_moves_balance_and_settles() {
        let mut api = api();
        let before_sender = api.get_account_balance().unwrap();

        let tx = api
            .create_payment(payment("bob@venmo.example", 25.5))
            .unwrap();
        assert_eq!(tx.status, TxStatus::Settled);
        assert_eq!(tx.action, TxAction::Pay);
        assert!(tx.date_completed.is_some());

        assert!((api.get_account_balance().unwrap() - (before_sender - 25.5)).abs() < 1e-9);

        // 创建后按 ID 读回，内容一致
        let fetched = api.get_payment(&tx.id).unwrap();
        assert_eq!(fetched.amount, 25.5);
        assert_eq!(fetched.note, "test");
    }

    #[test]
    fn test_payment_insufficient_balance_leaves_state_unchanged() {
        let mut api = api();
        let before = api.get_account_balance().unwrap();
        let tx_count = api.state.transactions.count();

        let err = api
            .create_payment(payment("bob@venmo.example", 10_000.0))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientBalance);

        assert_eq!(api.get_account_balance().unwrap(), before);
        assert_eq!(api.state.transactions.count(), tx_count);
    }

    #[test]
    fn test_payment_rejects_non_positive_amount_and_unknown_user() {
        let mut api = api();

        let err = api
            .create_payment(payment("bob@venmo.example", 0.0))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = api
            .create_payment(payment("ghost@venmo.example", 5.0))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_charge_is_pending_without_balance_movement() {
        let mut api = api();
        let sender_before = api.get_account_balance().unwrap();

        let tx = api
            .create_charge(ChargeRequest {
                user: "bob@venmo.example".to_string(),
                amount: 30.0,
                note: "your half".to_string(),
                audience: Audience::Private,
            })
            .unwrap();

        assert_eq!(tx.status, TxStatus::Pending);
        assert_eq!(tx.action, TxAction::Charge);
        assert!(tx.date_completed.is_none());
        assert_eq!(api.get_account_balance().unwrap(), sender_before);
    }

    #[test]
    fn test_transactions_filter_and_order() {
        let mut api = api();
        api.create_payment(payment("bob@venmo.example", 1.0)).unwrap();
        api.create_charge(ChargeRequest {
            user: "bob@venmo.example".to_string(),
            amount: 2.0,
            note: "pending".to_string(),
            audience: Audience::Private,
        })
        .unwrap();

        let all = api.get_transactions(&TransactionFilter::default()).unwrap();
        // 种子交易 + 新转账 + 新请款
        assert_eq!(all.total, 3);
        // 倒序：最新的在前
        assert!(all.items[0].date_created >= all.items[1].date_created);

        let pending = api
            .get_transactions(&TransactionFilter {
                status: Some(TxStatus::Pending),
                page: PageQuery::default(),
            })
            .unwrap();
        assert_eq!(pending.total, 1);
        assert_eq!(pending.items[0].action, TxAction::Charge);
    }

    #[test]
    fn test_add_payment_method_masks_card() {
        let mut api = api();
        let method = api
            .add_payment_method(CardRequest {
                card_number: "4532123456789012".to_string(),
                expiry_month: 12,
                expiry_year: Utc::now().year() + 2,
                cvv: "123".to_string(),
                billing_zip: "10001".to_string(),
            })
            .unwrap();

        assert_eq!(method.brand, "visa");
        assert_eq!(method.last_four, "9012");

        let methods = api.get_payment_methods().unwrap();
        assert!(methods.iter().any(|m| m.id == method.id));
        // 完整卡号不出现在状态树里
        let state = serde_json::to_string(&api.export_state()).unwrap();
        assert!(!state.contains("4532123456789012"));
    }

    #[test]
    fn test_add_payment_method_validations() {
        let mut api = api();
        let year = Utc::now().year() + 2;

        let bad_month = CardRequest {
            card_number: "5500000000000004".to_string(),
            expiry_month: 13,
            expiry_year: year,
            cvv: "123".to_string(),
            billing_zip: "10001".to_string(),
        };
        assert_eq!(
            api.add_payment_method(bad_month).unwrap_err().kind,
            ErrorKind::Validation
        );

        let bad_cvv = CardRequest {
            card_number: "5500000000000004".to_string(),
            expiry_month: 6,
            expiry_year: year,
            cvv: "12".to_string(),
            billing_zip: "10001".to_string(),
        };
        assert_eq!(
            api.add_payment_method(bad_cvv).unwrap_err().kind,
            ErrorKind::Validation
        );

        let expired = CardRequest {
            card_number: "5500000000000004".to_string(),
            expiry_month: 6,
            expiry_year: Utc::now().year() - 1,
            cvv: "123".to_string(),
            billing_zip: "10001".to_string(),
        };
        assert_eq!(
            api.add_payment_method(expired).unwrap_err().kind,
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_delete_default_payment_method_falls_back_to_balance() {
        let mut api = api();
        let methods = api.get_payment_methods().unwrap();
        let card_id = methods[0].id.clone();

        api.set_default_payment_method(&card_id).unwrap();
        assert_eq!(
            api.current_user().unwrap().default_payment_method,
            Some(card_id.clone())
        );

        api.delete_payment_method(&card_id).unwrap();
        assert_eq!(api.current_user().unwrap().default_payment_method, None);
        assert_eq!(
            api.delete_payment_method(&card_id).unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_payment_notifies_receiver() {
        let mut api = api();
        api.create_payment(payment("bob@venmo.example", 5.0)).unwrap();

        api.authenticate("token_bob@venmo.example").unwrap();
        let unread = api.get_unread_notification_count().unwrap();
        assert!(unread >= 1);

        api.mark_notifications_as_read(true).unwrap();
        assert_eq!(api.get_unread_notification_count().unwrap(), 0);

        api.delete_all_notifications().unwrap();
        assert!(api.current_user().unwrap().notifications.is_empty());
    }

    #[test]
    fn test_friends_pagination_is_total() {
        let api = api();
        let all = api.get_friends(&PageQuery::default()).unwrap();
        assert_eq!(all.total, 1);
        assert_eq!(all.items[0].username, "bob");

        let page = api.get_friends(&PageQuery::new(1, 5)).unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_more());
    }

    #[test]
    fn test_snapshot_round_trip_via_loader() {
        use mock_harness::snapshot::{load_or_seed, write_state};
        use std::fs;

        let dir = std::env::temp_dir().join(format!("venmo-snapshot-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let api = VenmoApi::with_seed(9);
        write_state(&dir, api.service_name(), &api.state).unwrap();

        // 快照存在时走文件，回种闭包不会被执行
        let state: VenmoState = load_or_seed(&dir, "venmo", || {
            panic!("snapshot file should have been used")
        });
        let mut restored = VenmoApi::from_state(state);
        restored.authenticate("token_alice@venmo.example").unwrap();
        assert_eq!(restored.get_account_balance().unwrap(), 100.0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reset_clears_auth_and_replays_seed() {
        let mut api = api();
        api.create_payment(payment("bob@venmo.example", 50.0)).unwrap();
        api.reset_data();

        // 重置后需要重新认证
        assert_eq!(
            api.get_profile().unwrap_err().kind,
            ErrorKind::Unauthorized
        );

        api.authenticate("token_alice@venmo.example").unwrap();
        assert_eq!(api.get_account_balance().unwrap(), 100.0);
        assert_eq!(api.state.transactions.count(), 1);
    }
}

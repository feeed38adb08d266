//! Walmart Marketplace 模拟服务
//!
//! 卖家视角的商品、库存、采购单与促销的内存模拟。
//! 采购单沿固定状态机流转，非法迁移返回带当前状态名的参数错误。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use mock_harness::page::{Page, PageQuery, paginate};
use mock_harness::result::{ApiError, ApiResult};
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use mock_harness::MockBackend;

use crate::generators::SeedProfile;
use crate::models::walmart::{
    ItemStatus, MarketItem, OrderLine, OrderStatus, Promotion, PurchaseOrder, RefundRecord,
    TrackingInfo,
};

/// Walmart Marketplace 状态树
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalmartState {
    pub seller_id: String,
    pub items: MemoryStore<MarketItem>,
    pub orders: MemoryStore<PurchaseOrder>,
    pub promotions: MemoryStore<Promotion>,
}

impl WalmartState {
    /// 生成默认种子树：SKU001/SKU002 商品、两张不同状态的采购单、一个促销
    pub fn seed(ctx: &mut SeedContext, profile: &SeedProfile) -> Self {
        let mut items = MemoryStore::new();
        items.insert(
            "SKU001",
            MarketItem {
                sku: "SKU001".to_string(),
                product_name: "Wireless Earbuds".to_string(),
                description: "Bluetooth earbuds with charging case.".to_string(),
                category: "Electronics".to_string(),
                price: 29.99,
                quantity: 100,
                fulfillment_center_id: "FC001".to_string(),
                status: ItemStatus::Active,
            },
        );
        items.insert(
            "SKU002",
            MarketItem {
                sku: "SKU002".to_string(),
                product_name: "Garden Hose Reel".to_string(),
                description: "Wall-mounted reel, 100ft capacity.".to_string(),
                category: "Home & Garden".to_string(),
                price: 49.99,
                quantity: 50,
                fulfillment_center_id: "FC002".to_string(),
                status: ItemStatus::Active,
            },
        );

        let extra = ctx.int(profile.extra_catalog.start as i64..profile.extra_catalog.end as i64);
        for _ in 0..extra {
            let item = MarketItem::random(ctx);
            items.insert(&item.sku.clone(), item);
        }

        let mut orders = MemoryStore::new();
        orders.insert(
            "PO001",
            PurchaseOrder {
                purchase_order_id: "PO001".to_string(),
                order_date: ctx.past_datetime(20),
                status: OrderStatus::Created,
                lines: vec![OrderLine {
                    sku: "SKU001".to_string(),
                    quantity: 2,
                    price: 29.99,
                }],
                total_amount: 59.98,
                acknowledged_at: None,
                tracking: None,
                cancelled_at: None,
                cancel_reason: None,
                refunds: Vec::new(),
            },
        );
        orders.insert(
            "PO002",
            PurchaseOrder {
                purchase_order_id: "PO002".to_string(),
                order_date: ctx.past_datetime(20),
                status: OrderStatus::Acknowledged,
                lines: vec![OrderLine {
                    sku: "SKU002".to_string(),
                    quantity: 1,
                    price: 49.99,
                }],
                total_amount: 49.99,
                acknowledged_at: Some(ctx.past_datetime(10)),
                tracking: None,
                cancelled_at: None,
                cancel_reason: None,
                refunds: Vec::new(),
            },
        );

        // 随机补充新建状态的采购单，行项目取自已有商品
        let sku_pool: Vec<(String, f64)> = items
            .list()
            .into_iter()
            .map(|i| (i.sku, i.price))
            .collect();
        let extra_orders = ctx.int(
            profile.history_per_user.start as i64..profile.history_per_user.end as i64,
        );
        for _ in 0..extra_orders {
            let order = PurchaseOrder::random(ctx, &sku_pool);
            orders.insert(&order.purchase_order_id.clone(), order);
        }

        let mut promotions = MemoryStore::new();
        promotions.insert(
            "PROMO001",
            Promotion {
                promo_id: "PROMO001".to_string(),
                name: "Summer Sale".to_string(),
                discount_percent: 15,
                start_date: ctx.past_datetime(30),
                end_date: ctx.future_datetime(60),
                active: true,
            },
        );

        Self {
            seller_id: "SEL001".to_string(),
            items,
            orders,
            promotions,
        }
    }
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 更新商品请求，只合并显式提供的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
}

/// 采购单列表过滤
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page: PageQuery,
}

/// 发货请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub carrier: String,
    pub tracking_number: String,
}

/// 退款请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub amount: f64,
    pub reason: String,
}

/// 创建促销请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePromotionRequest {
    pub name: String,
    pub discount_percent: u8,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// 库存视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryView {
    pub sku: String,
    pub quantity: u32,
    pub fulfillment_center_id: String,
}

/// 价格视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceView {
    pub sku: String,
    pub price: f64,
}

// ============================================================================
// 状态容器
// ============================================================================

/// Walmart Marketplace API 容器
#[derive(Debug)]
pub struct WalmartApi {
    pub state: WalmartState,
    ctx: SeedContext,
    profile: SeedProfile,
}

impl Default for WalmartApi {
    fn default() -> Self {
        Self::new()
    }
}

impl WalmartApi {
    pub fn new() -> Self {
        Self::build(SeedContext::new(), SeedProfile::default())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::build(SeedContext::with_seed(seed), SeedProfile::default())
    }

    pub fn with_profile(ctx: SeedContext, profile: SeedProfile) -> Self {
        Self::build(ctx, profile)
    }

    pub fn from_state(state: WalmartState) -> Self {
        Self {
            state,
            ctx: SeedContext::new(),
            profile: SeedProfile::default(),
        }
    }

    fn build(mut ctx: SeedContext, profile: SeedProfile) -> Self {
        let state = WalmartState::seed(&mut ctx, &profile);
        Self {
            state,
            ctx,
            profile,
        }
    }

    fn require_item(&self, sku: &str) -> ApiResult<MarketItem> {
        self.state
            .items
            .get(sku)
            .ok_or_else(|| ApiError::not_found("item", sku))
    }

    fn require_order(&self, purchase_order_id: &str) -> ApiResult<PurchaseOrder> {
        self.state
            .orders
            .get(purchase_order_id)
            .ok_or_else(|| ApiError::not_found("order", purchase_order_id))
    }

    // ------------------------------------------------------------------
    // 商品
    // ------------------------------------------------------------------

    pub fn get_items(&self, page: &PageQuery) -> ApiResult<Page<MarketItem>> {
        Ok(paginate(self.state.items.list(), page))
    }

    pub fn get_item(&self, sku: &str) -> ApiResult<MarketItem> {
        self.require_item(sku)
    }

    pub fn update_item(&mut self, sku: &str, req: UpdateItemRequest) -> ApiResult<MarketItem> {
        self.require_item(sku)?;
        if let Some(price) = req.price {
            if price <= 0.0 {
                return Err(ApiError::validation("price must be positive"));
            }
        }

        self.state.items.update(sku, |item| {
            if let Some(name) = req.product_name.clone() {
                item.product_name = name;
            }
            if let Some(description) = req.description.clone() {
                item.description = description;
            }
            if let Some(category) = req.category.clone() {
                item.category = category;
            }
            if let Some(price) = req.price {
                item.price = price;
            }
        });
        self.require_item(sku)
    }

    /// 下架商品；重复下架静默成功
    pub fn retire_item(&mut self, sku: &str) -> ApiResult<MarketItem> {
        self.require_item(sku)?;
        self.state
            .items
            .update(sku, |item| item.status = ItemStatus::Retired);
        info!(sku, "商品已下架");
        self.require_item(sku)
    }

    // ------------------------------------------------------------------
    // 库存与价格
    // ------------------------------------------------------------------

    pub fn get_inventory(&self, sku: &str) -> ApiResult<InventoryView> {
        let item = self.require_item(sku)?;
        Ok(InventoryView {
            sku: item.sku,
            quantity: item.quantity,
            fulfillment_center_id: item.fulfillment_center_id,
        })
    }

    /// 更新库存数量，可选更新履约中心
    pub fn update_inventory(
        &mut self,
        sku: &str,
        quantity: i64,
        fulfillment_center_id: Option<String>,
    ) -> ApiResult<InventoryView> {
        self.require_item(sku)?;
        if quantity < 0 {
            return Err(ApiError::validation("quantity cannot be negative"));
        }

        self.state.items.update(sku, |item| {
            item.quantity = quantity as u32;
            if let Some(fc) = fulfillment_center_id.clone() {
                item.fulfillment_center_id = fc;
            }
        });
        self.get_inventory(sku)
    }

    pub fn get_price(&self, sku: &str) -> ApiResult<PriceView> {
        let item = self.require_item(sku)?;
        Ok(PriceView {
            sku: item.sku,
            price: item.price,
        })
    }

    pub fn update_price(&mut self, sku: &str, price: f64) -> ApiResult<PriceView> {
        self.require_item(sku)?;
        if price <= 0.0 {
            return Err(ApiError::validation("price must be positive"));
        }
        self.state.items.update(sku, |item| item.price = price);
        self.get_price(sku)
    }

    // ------------------------------------------------------------------
    // 采购单
    // ------------------------------------------------------------------

    /// 按状态和下单时间过滤采购单
    pub fn get_orders(&self, filter: &OrderFilter) -> ApiResult<Page<PurchaseOrder>> {
        let matches = self.state.orders.list_by(|o| {
            let status_hit = filter.status.is_none_or(|s| o.status == s);
            let after_hit = filter.created_after.is_none_or(|t| o.order_date >= t);
            let before_hit = filter.created_before.is_none_or(|t| o.order_date <= t);
            status_hit && after_hit && before_hit
        });
        Ok(paginate(matches, &filter.page))
    }

    pub fn get_order(&self, purchase_order_id: &str) -> ApiResult<PurchaseOrder> {
        self.require_order(purchase_order_id)
    }

    /// 确认接单，只能从 Created 状态迁移
    pub fn acknowledge_order(&mut self, purchase_order_id: &str) -> ApiResult<PurchaseOrder> {
        let order = self.require_order(purchase_order_id)?;
        if order.status != OrderStatus::Created {
            return Err(ApiError::validation(format!(
                "order in status {} cannot be acknowledged",
                order.status.as_str()
            )));
        }

        self.state.orders.update(purchase_order_id, |o| {
            o.status = OrderStatus::Acknowledged;
            o.acknowledged_at = Some(Utc::now());
        });
        info!(purchase_order_id, "采购单已确认");
        self.require_order(purchase_order_id)
    }

    /// 发货，附带承运方和运单号；Created/Acknowledged 都允许发货
    pub fn ship_order(
        &mut self,
        purchase_order_id: &str,
        req: ShipmentRequest,
    ) -> ApiResult<PurchaseOrder> {
        let order = self.require_order(purchase_order_id)?;
        if !matches!(
            order.status,
            OrderStatus::Created | OrderStatus::Acknowledged
        ) {
            return Err(ApiError::validation(format!(
                "order in status {} cannot be shipped",
                order.status.as_str()
            )));
        }

        self.state.orders.update(purchase_order_id, |o| {
            o.status = OrderStatus::Shipped;
            o.tracking = Some(TrackingInfo {
                carrier: req.carrier.clone(),
                tracking_number: req.tracking_number.clone(),
                shipped_at: Utc::now(),
            });
        });
        info!(purchase_order_id, "采购单已发货");
        self.require_order(purchase_order_id)
    }

    /// 取消采购单，发货之后不可取消
    pub fn cancel_order(
        &mut self,
        purchase_order_id: &str,
        reason: &str,
    ) -> ApiResult<PurchaseOrder> {
        let order = self.require_order(purchase_order_id)?;
        if matches!(order.status, OrderStatus::Shipped | OrderStatus::Delivered) {
            return Err(ApiError::validation(format!(
                "order in status {} cannot be cancelled",
                order.status.as_str()
            )));
        }

        self.state.orders.update(purchase_order_id, |o| {
            o.status = OrderStatus::Cancelled;
            o.cancelled_at = Some(Utc::now());
            o.cancel_reason = Some(reason.to_string());
        });
        info!(purchase_order_id, reason, "采购单已取消");
        self.require_order(purchase_order_id)
    }

    /// 退款，只允许在发货/签收之后，退款记录追加到采购单上
    pub fn refund_order(
        &mut self,
        purchase_order_id: &str,
        req: RefundRequest,
    ) -> ApiResult<RefundRecord> {
        let order = self.require_order(purchase_order_id)?;
        if !matches!(order.status, OrderStatus::Shipped | OrderStatus::Delivered) {
            return Err(ApiError::validation(format!(
                "order in status {} cannot be refunded",
                order.status.as_str()
            )));
        }
        if req.amount <= 0.0 {
            return Err(ApiError::validation("refund amount must be positive"));
        }

        let refund = RefundRecord {
            refund_id: self.ctx.short_id("RF"),
            amount: req.amount,
            reason: req.reason,
            refund_date: Utc::now(),
        };
        let record = refund.clone();
        self.state
            .orders
            .update(purchase_order_id, |o| o.refunds.push(record));
        info!(purchase_order_id, refund_id = %refund.refund_id, "退款已登记");
        Ok(refund)
    }

    // ------------------------------------------------------------------
    // 促销
    // ------------------------------------------------------------------

    pub fn get_promotions(&self, page: &PageQuery) -> ApiResult<Page<Promotion>> {
        Ok(paginate(self.state.promotions.list(), page))
    }

    pub fn create_promotion(&mut self, req: CreatePromotionRequest) -> ApiResult<Promotion> {
        if req.name.is_empty() {
            return Err(ApiError::validation("promotion name is required"));
        }
        if !(1..=100).contains(&req.discount_percent) {
            return Err(ApiError::validation(
                "discount percent must be between 1 and 100",
            ));
        }

        let promotion = Promotion {
            promo_id: self.ctx.short_id("PROMO").to_uppercase(),
            name: req.name,
            discount_percent: req.discount_percent,
            start_date: req.start_date,
            end_date: req.end_date,
            active: true,
        };
        self.state
            .promotions
            .insert(&promotion.promo_id.clone(), promotion.clone());
        Ok(promotion)
    }
}

impl MockBackend for WalmartApi {
    fn service_name(&self) -> &'static str {
        "walmart"
    }

    fn export_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn reset_data(&mut self) -> bool {
        let mut ctx = self.ctx.renew();
        self.state = WalmartState::seed(&mut ctx, &self.profile);
        self.ctx = ctx;
        info!("Walmart 状态已重置");
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

    fn api() -> WalmartApi {
        WalmartApi::with_seed(42)
    }

    fn shipment() -> ShipmentRequest {
        ShipmentRequest {
            carrier: "UPS".to_string(),
            tracking_number: "1Z999".to_string(),
        }
    }

    #[test]
    fn test_seed_contains_anchor_records() {
        let api = api();
        assert!(api.state.items.contains("SKU001"));
        assert!(api.state.items.contains("SKU002"));
        assert_eq!(
            api.get_order("PO001").unwrap().status,
            OrderStatus::Created
        );
        assert_eq!(
            api.get_order("PO002").unwrap().status,
            OrderStatus::Acknowledged
        );
        assert!(api.state.promotions.contains("PROMO001"));
    }

    #[test]
    fn test_update_item_merges_fields() {
        let mut api = api();
        let updated = api
            .update_item(
                "SKU001",
                UpdateItemRequest {
                    product_name: Some("Wireless Earbuds Pro".to_string()),
                    price: Some(39.99),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.product_name, "Wireless Earbuds Pro");
        assert_eq!(updated.price, 39.99);
        // 未提供的字段保持不变
        assert_eq!(updated.category, "Electronics");

        let err = api
            .update_item(
                "SKU001",
                UpdateItemRequest {
                    price: Some(0.0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_retire_item() {
        let mut api = api();
        let item = api.retire_item("SKU002").unwrap();
        assert_eq!(item.status, ItemStatus::Retired);

        // 重复下架静默成功
        let item = api.retire_item("SKU002").unwrap();
        assert_eq!(item.status, ItemStatus::Retired);

        assert_eq!(
            api.retire_item("SKU999").unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_inventory_update_rejects_negative() {
        let mut api = api();
        let inventory = api
            .update_inventory("SKU001", 75, Some("FC003".to_string()))
            .unwrap();
        assert_eq!(inventory.quantity, 75);
        assert_eq!(inventory.fulfillment_center_id, "FC003");

        let err = api.update_inventory("SKU001", -5, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(api.get_inventory("SKU001").unwrap().quantity, 75);
    }

    #[test]
    fn test_price_round_trip_and_validation() {
        let mut api = api();
        api.update_price("SKU002", 44.5).unwrap();
        assert_eq!(api.get_price("SKU002").unwrap().price, 44.5);

        assert_eq!(
            api.update_price("SKU002", -1.0).unwrap_err().kind,
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_order_status_machine_happy_path() {
        let mut api = api();

        let order = api.acknowledge_order("PO001").unwrap();
        assert_eq!(order.status, OrderStatus::Acknowledged);
        assert!(order.acknowledged_at.is_some());

        let order = api.ship_order("PO001", shipment()).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.tracking.as_ref().unwrap().carrier, "UPS");

        let refund = api
            .refund_order(
                "PO001",
                RefundRequest {
                    amount: 29.99,
                    reason: "damaged in transit".to_string(),
                },
            )
            .unwrap();
        assert!(refund.refund_id.starts_with("RF"));
        assert_eq!(api.get_order("PO001").unwrap().refunds.len(), 1);
    }

    #[test]
    fn test_invalid_transitions_name_current_status() {
        let mut api = api();

        // PO002 已是 Acknowledged，不能重复确认
        let err = api.acknowledge_order("PO002").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("Acknowledged"));

        // 未发货不能退款
        let err = api
            .refund_order(
                "PO002",
                RefundRequest {
                    amount: 10.0,
                    reason: "test".to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        // 发货之后不能取消
        api.ship_order("PO002", shipment()).unwrap();
        let err = api.cancel_order("PO002", "too late").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("Shipped"));
    }

    #[test]
    fn test_cancel_before_shipment() {
        let mut api = api();
        let order = api.cancel_order("PO001", "buyer request").unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.cancel_reason.as_deref(), Some("buyer request"));

        // 取消后不能再发货
        let err = api.ship_order("PO001", shipment()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("Cancelled"));
    }

    #[test]
    fn test_order_filters() {
        let api = api();

        let created = api
            .get_orders(&OrderFilter {
                status: Some(OrderStatus::Created),
                ..Default::default()
            })
            .unwrap();
        assert!(created.items.iter().all(|o| o.status == OrderStatus::Created));
        assert!(created.items.iter().any(|o| o.purchase_order_id == "PO001"));

        // 未来起始时间过滤掉所有订单
        let none = api
            .get_orders(&OrderFilter {
                created_after: Some(Utc::now() + chrono::Duration::days(1)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(none.total, 0);
    }

    #[test]
    fn test_items_pagination_is_total() {
        let api = api();
        let all = api.get_items(&PageQuery::default()).unwrap();

        let mut collected = Vec::new();
        let mut offset = 0;
        loop {
            let page = api.get_items(&PageQuery::new(2, offset)).unwrap();
            assert!(page.items.len() <= 2);
            let len = page.items.len();
            collected.extend(page.items.into_iter().map(|i| i.sku));
            if offset + len >= all.total {
                break;
            }
            offset += len;
        }

        let all_skus: Vec<String> = all.items.into_iter().map(|i| i.sku).collect();
        assert_eq!(collected, all_skus);
    }

    #[test]
    fn test_create_promotion_validations() {
        let mut api = api();
        let promo = api
            .create_promotion(CreatePromotionRequest {
                name: "Clearance".to_string(),
                discount_percent: 30,
                start_date: Utc::now(),
                end_date: Utc::now() + chrono::Duration::days(14),
            })
            .unwrap();
        assert!(api.state.promotions.contains(&promo.promo_id));

        let err = api
            .create_promotion(CreatePromotionRequest {
                name: "Bad".to_string(),
                discount_percent: 0,
                start_date: Utc::now(),
                end_date: Utc::now(),
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_reset_restores_order_statuses() {
        let mut api = api();
        api.acknowledge_order("PO001").unwrap();
        api.ship_order("PO001", shipment()).unwrap();
        api.reset_data();

        assert_eq!(
            api.get_order("PO001").unwrap().status,
            OrderStatus::Created
        );
        assert!(api.get_order("PO001").unwrap().tracking.is_none());
    }
}

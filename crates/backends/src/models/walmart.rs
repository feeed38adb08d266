//! Walmart Marketplace 实体模型
//!
//! 商品按 SKU 组织，价格、库存与生命周期状态折叠在商品记录里。
//! 采购单携带自身的状态机字段与退款列表。

use chrono::{DateTime, Utc};
use mock_harness::seed::SeedContext;
use serde::{Deserialize, Serialize};

/// 商品生命周期状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    Retired,
}

/// 在售商品
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketItem {
    /// SKU 同时是所属集合的 key
    pub sku: String,
    pub product_name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub quantity: u32,
    pub fulfillment_center_id: String,
    pub status: ItemStatus,
}

impl MarketItem {
    /// 生成随机商品，用于种子补充
    pub fn random(ctx: &mut SeedContext) -> Self {
        let categories = [
            "Electronics",
            "Home & Garden",
            "Toys",
            "Grocery",
            "Sports",
        ];
        Self {
            sku: ctx.short_id("SKU").to_uppercase(),
            product_name: ctx.catch_phrase(),
            description: ctx.sentence(),
            category: ctx.pick(&categories).to_string(),
            price: ctx.amount(5.0..300.0),
            quantity: ctx.int(0..500) as u32,
            fulfillment_center_id: format!("FC{:03}", ctx.int(1..10)),
            status: ItemStatus::Active,
        }
    }
}

/// 采购单状态机
///
/// Created → Acknowledged → Shipped → Delivered；Cancelled 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    Acknowledged,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// 状态的 wire 名称，用于错误消息
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Acknowledged => "Acknowledged",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// 采购单行项目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: u32,
    pub price: f64,
}

/// 发货跟踪信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub carrier: String,
    pub tracking_number: String,
    pub shipped_at: DateTime<Utc>,
}

/// 退款记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub refund_id: String,
    pub amount: f64,
    pub reason: String,
    pub refund_date: DateTime<Utc>,
}

/// 采购单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub purchase_order_id: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    pub refunds: Vec<RefundRecord>,
}

impl PurchaseOrder {
    /// 生成随机采购单，行项目从给定 SKU 池中取
    pub fn random(ctx: &mut SeedContext, sku_pool: &[(String, f64)]) -> Self {
        let (sku, price) = ctx.pick(sku_pool).clone();
        let quantity = ctx.int(1..5) as u32;
        Self {
            purchase_order_id: ctx.short_id("PO").to_uppercase(),
            order_date: ctx.past_datetime(60),
            status: OrderStatus::Created,
            lines: vec![OrderLine {
                sku,
                quantity,
                price,
            }],
            total_amount: (price * quantity as f64 * 100.0).round() / 100.0,
            acknowledged_at: None,
            tracking: None,
            cancelled_at: None,
            cancel_reason: None,
            refunds: Vec::new(),
        }
    }
}

/// 促销活动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub promo_id: String,
    pub name: String,
    pub discount_percent: u8,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_order_total_matches_lines() {
        let mut ctx = SeedContext::with_seed(41);
        let pool = vec![("SKU001".to_string(), 29.99), ("SKU002".to_string(), 49.99)];

        for _ in 0..10 {
            let order = PurchaseOrder::random(&mut ctx, &pool);
            let expected: f64 = order
                .lines
                .iter()
                .map(|l| l.price * l.quantity as f64)
                .sum();
            assert!((order.total_amount - (expected * 100.0).round() / 100.0).abs() < 1e-9);
            assert_eq!(order.status, OrderStatus::Created);
        }
    }

    #[test]
    fn test_status_names() {
        assert_eq!(OrderStatus::Created.as_str(), "Created");
        assert_eq!(OrderStatus::Cancelled.as_str(), "Cancelled");
    }
}

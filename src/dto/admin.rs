use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    domain::status::{OrderStatus, PaymentReferenceStatus},
    models::Order,
    routes::params::Pagination,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewPaymentRequest {
    pub status: PaymentReferenceStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LowStockQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub threshold: Option<i32>,
}

impl LowStockQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReport {
    pub total_sales: i64,
    pub period_sales: i64,
    pub top_products: Vec<TopProduct>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ViewedProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub views: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewsReport {
    pub top_viewed: Vec<ViewedProduct>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentOrder {
    pub order: Order,
    pub customer_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub total_sales: i64,
    pub order_count: i64,
    pub pending_orders: i64,
    pub customer_count: i64,
    pub recent_orders: Vec<RecentOrder>,
    pub popular_products: Vec<TopProduct>,
}

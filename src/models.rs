use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::status::{
    AccountType, OrderStatus, PaymentMethodKind, PaymentReferenceStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub dni: String,
    pub phone: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Prices are in minor currency units (cents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub color: String,
    pub price: i64,
    pub stock: i32,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub category_id: Uuid,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
    pub variants: Vec<ProductVariant>,
    pub featured_image: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn min_price(&self) -> Option<i64> {
        self.variants.iter().map(|v| v.price).min()
    }

    pub fn max_price(&self) -> Option<i64> {
        self.variants.iter().map(|v| v.price).max()
    }

    pub fn variant(&self, variant_id: Uuid) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i32,
    pub product_name: String,
    pub product_slug: String,
    pub color: String,
    pub unit_price: i64,
    pub stock: i32,
    pub image: Option<String>,
    pub subtotal: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: i64,
    pub item_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub kind: PaymentMethodKind,
    pub bank: String,
    pub account_number: Option<String>,
    pub phone: Option<String>,
    pub dni: String,
    pub holder_name: Option<String>,
    pub account_type: Option<AccountType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentReference {
    pub id: Uuid,
    pub order_id: Uuid,
    pub payment_method_id: Uuid,
    pub reference_number: String,
    pub bank_origin: String,
    pub date: NaiveDate,
    pub image_url: Option<String>,
    pub status: PaymentReferenceStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub color: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub subtotal: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total: i64,
    pub payment_method_id: Uuid,
    pub shipping_address: String,
    pub shipping_city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

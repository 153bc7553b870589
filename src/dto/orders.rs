use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, PaymentReference};

/// Proof of an out-of-band bank transfer.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaymentReferenceInput {
    pub reference_number: String,
    pub bank_origin: String,
    pub date: NaiveDate,
    /// URL returned by the receipt upload endpoint.
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    pub shipping_city: String,
    pub payment_method_id: Uuid,
    pub payment_reference: PaymentReferenceInput,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPaymentReferenceRequest {
    pub payment_method_id: Uuid,
    #[serde(flatten)]
    pub reference: PaymentReferenceInput,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment_reference: Option<PaymentReference>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{domain::status::PaymentMethodKind, models::PaymentMethod};

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PaymentMethodQuery {
    pub kind: Option<PaymentMethodKind>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PaymentMethodList {
    #[schema(value_type = Vec<PaymentMethod>)]
    pub items: Vec<PaymentMethod>,
}

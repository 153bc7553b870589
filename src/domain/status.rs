use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

/// Status columns only hold values this crate wrote, so an unknown one is a
/// server fault.
impl From<ParseStatusError> for crate::error::AppError {
    fn from(err: ParseStatusError) -> Self {
        crate::error::AppError::Internal(err.into())
    }
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Orders only move forward; cancelling is possible until shipment.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (*self, next),
            (Pending, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Processing, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseStatusError::new("order status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentReferenceStatus {
    Pending,
    Verified,
    Rejected,
}

impl PaymentReferenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentReferenceStatus::Pending => "pending",
            PaymentReferenceStatus::Verified => "verified",
            PaymentReferenceStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: PaymentReferenceStatus) -> bool {
        *self == PaymentReferenceStatus::Pending && next != PaymentReferenceStatus::Pending
    }

    /// A rejected proof may be replaced by a new submission.
    pub fn blocks_resubmission(&self) -> bool {
        !matches!(self, PaymentReferenceStatus::Rejected)
    }
}

impl fmt::Display for PaymentReferenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentReferenceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentReferenceStatus::Pending),
            "verified" => Ok(PaymentReferenceStatus::Verified),
            "rejected" => Ok(PaymentReferenceStatus::Rejected),
            other => Err(ParseStatusError::new("payment reference status", other)),
        }
    }
}

/// `pago_movil` is a phone-based interbank transfer, `transferencia` a
/// regular account transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    PagoMovil,
    Transferencia,
}

impl PaymentMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodKind::PagoMovil => "pago_movil",
            PaymentMethodKind::Transferencia => "transferencia",
        }
    }
}

impl FromStr for PaymentMethodKind {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pago_movil" => Ok(PaymentMethodKind::PagoMovil),
            "transferencia" => Ok(PaymentMethodKind::Transferencia),
            other => Err(ParseStatusError::new("payment method kind", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Ahorro,
    Corriente,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Ahorro => "ahorro",
            AccountType::Corriente => "corriente",
        }
    }
}

impl FromStr for AccountType {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ahorro" => Ok(AccountType::Ahorro),
            "corriente" => Ok(AccountType::Corriente),
            other => Err(ParseStatusError::new("account type", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_moves_forward_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn cancel_allowed_before_shipment() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        let all = [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ];
        for next in all {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn status_strings_round_trip_through_columns() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
        assert!("paid".parse::<OrderStatus>().is_err());
        assert_eq!(
            "pago_movil".parse::<PaymentMethodKind>(),
            Ok(PaymentMethodKind::PagoMovil)
        );
    }

    #[test]
    fn payment_reference_review_is_one_shot() {
        use PaymentReferenceStatus::*;
        assert!(Pending.can_transition_to(Verified));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Verified.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Verified));
        assert!(!Pending.can_transition_to(Pending));
        assert!(Pending.blocks_resubmission());
        assert!(!Rejected.blocks_resubmission());
    }
}

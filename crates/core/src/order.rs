//! The order aggregate and its approval state machine.
//!
//! An order is created in `Pending` by the purchaser and leaves it exactly
//! once, by an operator accepting or cancelling it. Both outcomes are
//! terminal. Lines and payment declarations are embedded in the aggregate
//! and have no independent lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{OrderId, ProductId, UserId};

/// Approval status of an order.
///
/// Serialized in its capitalised form (`"Pending"`), which is also the
/// stored representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Accepted,
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transition is defined out of this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Cancelled)
    }

    /// The approval state machine: `Pending -> Accepted` and
    /// `Pending -> Cancelled` are the only legal transitions.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Accepted) | (Self::Pending, Self::Cancelled)
        )
    }

    /// Whether an invoice may be issued for an order in this status.
    ///
    /// This is an explicit allow-list: only `Accepted` qualifies, so any
    /// status added later stays ineligible until deliberately admitted.
    #[must_use]
    pub const fn invoice_issuable(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Error returned when a status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid order status: {0}")]
pub struct StatusParseError(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Accepted" => Ok(Self::Accepted),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// One line of an order.
///
/// `name` and `unit_price` are snapshots taken from the catalog at order
/// time; the catalog is never re-read for a settled order. `line_total` is
/// derived by the calculator and never trusted from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub photo_count: u32,
    pub line_total: Decimal,
}

/// A declared out-of-band payment against an order.
///
/// These are declarative records (bank transfer reference, mobile wallet
/// account, ...), not gateway captures. Declaration order is preserved for
/// display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDeclaration {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    pub amount: Decimal,
}

/// The order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub lines: Vec<OrderLine>,
    pub sub_total: Decimal,
    pub discounted_amount: Decimal,
    pub final_price: Decimal,
    pub status: OrderStatus,
    pub payments: Vec<PaymentDeclaration>,
    /// Version of the pricing policy this order was priced under.
    pub policy_version: i32,
    pub created_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validation failure while assembling an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The cart has no lines.
    #[error("no order items provided")]
    EmptyCart,

    /// No payment declaration was supplied.
    #[error("at least one payment detail is required")]
    NoPayment,

    /// A payment declaration is malformed.
    #[error("invalid payment declaration: {0}")]
    InvalidPayment(String),

    /// The declared payments do not settle the order total.
    #[error("declared payments ({declared}) do not match the order total ({expected})")]
    PaymentMismatch {
        declared: Decimal,
        expected: Decimal,
    },
}

/// Validate a payment breakdown against the computed order total.
///
/// Every declaration needs a non-empty method and a non-negative amount, and
/// the amounts must sum to exactly `final_price`.
///
/// # Errors
///
/// Returns [`OrderError::NoPayment`], [`OrderError::InvalidPayment`], or
/// [`OrderError::PaymentMismatch`].
pub fn validate_payments(
    payments: &[PaymentDeclaration],
    final_price: Decimal,
) -> Result<(), OrderError> {
    if payments.is_empty() {
        return Err(OrderError::NoPayment);
    }

    let mut declared = Decimal::ZERO;
    for payment in payments {
        if payment.method.trim().is_empty() {
            return Err(OrderError::InvalidPayment(
                "payment method is required".to_string(),
            ));
        }
        if payment.amount < Decimal::ZERO {
            return Err(OrderError::InvalidPayment(
                "payment amount cannot be negative".to_string(),
            ));
        }
        declared += payment.amount;
    }

    if declared != final_price {
        return Err(OrderError::PaymentMismatch {
            declared,
            expected: final_price,
        });
    }

    Ok(())
}

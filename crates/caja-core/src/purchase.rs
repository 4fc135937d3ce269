//! # Purchases
//!
//! Incoming stock from suppliers: the mirror image of a sale.
//!
//! ```text
//!   create  ──► status: completed ──► cancel ──► status: cancelled
//!               stock += qty                     stock -= qty
//!               (credit) supplier += total       (credit) supplier -= total
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{PaymentMethod, Rate};

/// Lifecycle of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Completed,
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }

    /// Purchases are recorded completed; cancellation is the only move.
    pub fn ensure_valid_target(self) -> CoreResult<()> {
        match self {
            PurchaseStatus::Cancelled => Ok(()),
            PurchaseStatus::Completed => Err(CoreError::invalid_state(
                "A purchase can only be moved to cancelled",
            )),
        }
    }
}

/// Settlement state of a purchase towards the supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Pending,
}

impl PaymentStatus {
    /// Credit purchases start pending; anything paid at the counter is paid.
    pub fn for_method(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Credit => PaymentStatus::Pending,
            PaymentMethod::Cash | PaymentMethod::Card => PaymentStatus::Paid,
        }
    }
}

/// A recorded purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub supplier_id: String,
    pub receipt_number: String,
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: PurchaseStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Purchase {
    pub fn ensure_cancellable(&self) -> CoreResult<()> {
        if self.status == PurchaseStatus::Cancelled {
            return Err(CoreError::invalid_state(format!(
                "Purchase {} is already cancelled",
                self.receipt_number
            )));
        }
        Ok(())
    }
}

/// One line of a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub position: i64,
    pub product_id: String,
    pub name_snapshot: String,
    pub quantity: Quantity,
    pub unit_cost: Money,
    pub tax_rate: Rate,
    pub tax_amount: Money,
    pub line_total: Money,
}

/// A purchase with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseDetail {
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

// =============================================================================
// Posting Input
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewPurchaseLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_cost: Money,
    #[serde(default)]
    pub tax_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewPurchase {
    pub supplier_id: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<NewPurchaseLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_for_method() {
        assert_eq!(PaymentStatus::for_method(PaymentMethod::Credit), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::for_method(PaymentMethod::Cash), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::for_method(PaymentMethod::Card), PaymentStatus::Paid);
    }

    #[test]
    fn test_cancellation_rules() {
        assert!(PurchaseStatus::Cancelled.ensure_valid_target().is_ok());
        assert!(matches!(
            PurchaseStatus::Completed.ensure_valid_target(),
            Err(CoreError::InvalidState(_))
        ));

        let mut purchase = Purchase {
            id: "pur-1".to_string(),
            supplier_id: "sup-1".to_string(),
            receipt_number: "C-000003".to_string(),
            subtotal: Money::from_cents(5000),
            tax_total: Money::zero(),
            total: Money::from_cents(5000),
            payment_method: PaymentMethod::Credit,
            payment_status: PaymentStatus::Pending,
            status: PurchaseStatus::Completed,
            notes: None,
            created_at: Utc::now(),
            cancelled_at: None,
        };
        assert!(purchase.ensure_cancellable().is_ok());

        purchase.status = PurchaseStatus::Cancelled;
        assert_eq!(
            purchase.ensure_cancellable().unwrap_err().to_string(),
            "Purchase C-000003 is already cancelled"
        );
    }
}

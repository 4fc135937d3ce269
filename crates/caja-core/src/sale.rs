//! # Sales
//!
//! Sale headers, line items and the request shape for posting a sale.
//!
//! ## Snapshot Pattern
//! Every `SaleItem` freezes the product name, unit price, discount and tax
//! rate at the moment of sale. Editing a product later never rewrites
//! historical receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{PaymentMethod, Rate};

/// Lifecycle of a posted sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Refunded,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Refunded => "refunded",
        }
    }
}

/// A posted sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub session_id: String,
    pub customer_id: Option<String>,
    pub receipt_number: String,
    /// Sum of line amounts after discount, before tax.
    pub subtotal: Money,
    pub tax_total: Money,
    pub discount_total: Money,
    /// `subtotal + tax_total`.
    pub total: Money,
    pub amount_tendered: Money,
    /// Non-zero only for cash sales.
    pub change: Money,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_reason: Option<String>,
}

impl Sale {
    /// A sale is refunded at most once.
    pub fn ensure_refundable(&self) -> CoreResult<()> {
        if self.status != SaleStatus::Completed {
            return Err(CoreError::invalid_state(format!(
                "Sale {} is {} and cannot be refunded",
                self.receipt_number,
                self.status.as_str()
            )));
        }
        Ok(())
    }
}

/// One line of a posted sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Order of the line on the receipt.
    pub position: i64,
    pub product_id: String,
    pub name_snapshot: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub discount_rate: Rate,
    pub tax_rate: Rate,
    pub discount_amount: Money,
    pub tax_amount: Money,
    /// Line amount after discount plus tax.
    pub line_total: Money,
}

/// A sale with its items, as returned by posting and lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Posting Input
// =============================================================================

/// A line as submitted by the register.
///
/// The name and prices are what the cashier saw on screen; they are stored
/// verbatim as the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewSaleLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[serde(default)]
    pub discount_rate: Rate,
    #[serde(default)]
    pub tax_rate: Rate,
}

/// Everything needed to post one sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewSale {
    pub session_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub amount_tendered: Money,
    pub items: Vec<NewSaleLine>,
}

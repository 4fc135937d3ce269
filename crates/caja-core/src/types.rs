//! # Domain Types
//!
//! Catalogue types and the small enums shared by every posting.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Category     │   │ StockAdjustment │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  base_price     │   │  name (unique)  │   │  delta (signed) │       │
//! │  │  cost_price     │   └─────────────────┘   │  reason         │       │
//! │  │  tax_rate (bps) │                         └─────────────────┘       │
//! │  │  stock (milli)  │   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  min_stock      │   │      Rate       │   │ PaymentMethod   │       │
//! │  │  track_inventory│   │  bps (u32)      │   │  Cash           │       │
//! │  └─────────────────┘   │  2100 = 21%     │   │  Card           │       │
//! │                        └─────────────────┘   │  Credit         │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Rate
// =============================================================================

/// A percentage in basis points (1 bps = 0.01%).
///
/// Used for both tax rates and line discounts. 2100 bps = 21%.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// 100% expressed in basis points.
    pub const FULL_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Whole percent, e.g. `from_percent(21)` for 21%.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        Rate(pct * 100)
    }

    /// Parses a user-entered percentage such as `8.25`.
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// For display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale or purchase was settled.
///
/// `Credit` means "on account": the amount is charged to the customer's or
/// supplier's ledger instead of changing hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Credit => "credit",
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// Product grouping. The only entity that is ever hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale and purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Internal stock keeping code.
    pub sku: Option<String>,

    /// EAN-13, UPC-A, etc.
    pub barcode: Option<String>,

    pub category_id: Option<String>,

    /// Selling price before tax.
    pub base_price: Money,

    /// Last known purchase cost, used for inventory valuation.
    pub cost_price: Money,

    pub tax_rate: Rate,

    /// Current stock level. Never driven negative by a posting when
    /// `track_inventory` is set.
    pub stock: Quantity,

    /// Low-stock threshold for reports.
    pub min_stock: Quantity,

    pub track_inventory: bool,

    /// Inactive products are hidden from search and reports (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` can leave the shelf without going negative.
    ///
    /// Untracked products always pass.
    pub fn ensure_can_release(&self, quantity: Quantity) -> CoreResult<()> {
        if self.track_inventory && self.stock < quantity {
            return Err(CoreError::OutOfStock {
                product: self.name.clone(),
                available: self.stock,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// True when the product should appear on the low-stock report.
    pub fn is_low_on_stock(&self) -> bool {
        self.is_active && self.track_inventory && self.stock <= self.min_stock
    }
}

/// Fields accepted when creating or editing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    pub base_price: Money,
    #[serde(default)]
    pub cost_price: Money,
    #[serde(default)]
    pub tax_rate: Rate,
    #[serde(default)]
    pub min_stock: Quantity,
    #[serde(default = "default_true")]
    pub track_inventory: bool,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// A manual stock correction (breakage, count differences, samples).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockAdjustment {
    pub id: String,
    pub product_id: String,
    /// Signed change applied to the product's stock.
    pub delta: Quantity,
    pub reason: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

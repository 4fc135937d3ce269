//! # caja-core: Pure Business Logic for Caja
//!
//! This crate holds the posting model's arithmetic and rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Caja Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 caja-app (request dispatcher)                   │   │
//! │  │    open_session, complete_sale, create_purchase, reports...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ caja-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  session  │  │  pricing  │  │  ledger   │  │ validation│  │   │
//! │  │   │ sale      │  │  Money    │  │  balance  │  │   rules   │  │   │
//! │  │   │ purchase  │  │  Quantity │  │  fold     │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    caja-db (Database Layer)                     │   │
//! │  │        SQLite, migrations, repositories, posting transactions   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] / [`quantity`] - Integer cents and fixed-point stock quantities
//! - [`types`] - Catalogue types, rates, payment methods
//! - [`session`] - Register sessions and cash movements
//! - [`sale`] / [`purchase`] - Postings and their line items
//! - [`pricing`] - Line and document totals
//! - [`party`] / [`ledger`] - Customers, suppliers and their accounts
//! - [`report`] - Read-only aggregate shapes
//! - [`error`] / [`validation`] - Typed errors and input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use caja_core::money::Money;
//! use caja_core::quantity::Quantity;
//! use caja_core::pricing::price_sale_line;
//! use caja_core::types::Rate;
//!
//! let line = price_sale_line(
//!     Quantity::from_units(2),
//!     Money::from_cents(500),
//!     Rate::zero(),
//!     Rate::from_percent(10),
//! )
//! .unwrap();
//!
//! assert_eq!(line.net.cents(), 1000);
//! assert_eq!(line.tax.cents(), 100);
//! assert_eq!(line.total.cents(), 1100);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod party;
pub mod pricing;
pub mod purchase;
pub mod quantity;
pub mod report;
pub mod sale;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{BalanceCheck, LedgerEntry, LedgerEntryKind};
pub use money::Money;
pub use party::{Customer, PartyInput, PartyKind, Supplier};
pub use purchase::*;
pub use quantity::Quantity;
pub use report::DateRange;
pub use sale::*;
pub use session::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items accepted in one sale or purchase.
pub const MAX_LINE_ITEMS: usize = 200;

/// Largest amount, in cents, accepted for a price, a payment or one line's
/// gross (ten billion currency units).
///
/// With at most [`MAX_LINE_ITEMS`] lines and rates capped at 100%, every
/// document total stays far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Largest quantity, in thousandths, accepted on one line or adjustment
/// (one billion units).
pub const MAX_QUANTITY_MILLI: i64 = 1_000_000_000_000;

/// Receipt series prefix for sales.
pub const SALE_RECEIPT_SERIES: &str = "V";

/// Receipt series prefix for purchases.
pub const PURCHASE_RECEIPT_SERIES: &str = "C";

/// Formats a counter value as a receipt number, e.g. `V-000042`.
pub fn format_receipt_number(series: &str, value: i64) -> String {
    format!("{}-{:06}", series, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_receipt_number() {
        assert_eq!(format_receipt_number(SALE_RECEIPT_SERIES, 1), "V-000001");
        assert_eq!(format_receipt_number(PURCHASE_RECEIPT_SERIES, 1_234_567), "C-1234567");
    }
}

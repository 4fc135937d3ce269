//! # Report Types
//!
//! Read-only aggregates returned by the report queries, plus the date range
//! every query is filtered by.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::PaymentMethod;
use crate::validation::ValidationResult;

// =============================================================================
// Date Range
// =============================================================================

/// 9999-12-31T23:59:59Z
const ALL_TIME_END_SECS: i64 = 253_402_300_799;

/// A half-open time range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    #[ts(as = "String")]
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range, rejecting one that ends before it starts.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> ValidationResult<Self> {
        if to < from {
            return Err(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: "end is before start".to_string(),
            });
        }
        Ok(DateRange { from, to })
    }

    /// Whole calendar days from `first` through `last`, inclusive.
    pub fn days(first: NaiveDate, last: NaiveDate) -> ValidationResult<Self> {
        let from = Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN));
        let to = Utc.from_utc_datetime(&last.and_time(NaiveTime::MIN)) + Duration::days(1);
        DateRange::new(from, to)
    }

    /// A single calendar day.
    pub fn day(date: NaiveDate) -> Self {
        let from = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        DateRange {
            from,
            to: from + Duration::days(1),
        }
    }

    /// Everything ever recorded (1970 through the end of year 9999).
    ///
    /// Bounds stay within four-digit years so they compare correctly against
    /// timestamps stored as RFC 3339 text.
    pub fn all_time() -> Self {
        DateRange {
            from: DateTime::from_timestamp(0, 0).unwrap_or_default(),
            to: DateTime::from_timestamp(ALL_TIME_END_SECS, 0).unwrap_or_default(),
        }
    }
}

// =============================================================================
// Sales Reports
// =============================================================================

/// Completed sales over a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: i64,
    pub subtotal: Money,
    pub tax_total: Money,
    pub discount_total: Money,
    pub total: Money,
    pub average_ticket: Money,
}

impl SalesSummary {
    /// Builds a summary from raw sums; the average ticket is rounded to the cent.
    pub fn from_sums(
        sale_count: i64,
        subtotal: Money,
        tax_total: Money,
        discount_total: Money,
        total: Money,
    ) -> Self {
        let average_ticket = if sale_count > 0 {
            let count = sale_count as i128;
            let cents = total.cents() as i128;
            Money::from_cents(((cents * 2 + count) / (count * 2)) as i64)
        } else {
            Money::zero()
        };

        SalesSummary {
            sale_count,
            subtotal,
            tax_total,
            discount_total,
            total,
            average_ticket,
        }
    }
}

/// Completed sales for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailySales {
    /// `YYYY-MM-DD`
    pub day: String,
    pub sale_count: i64,
    pub total: Money,
}

/// Completed sales grouped by payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentMethodTotal {
    pub payment_method: PaymentMethod,
    pub sale_count: i64,
    pub total: Money,
}

/// A best-selling product by quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub quantity: Quantity,
    pub revenue: Money,
}

// =============================================================================
// Inventory and Accounts
// =============================================================================

/// Stock on hand valued at cost and at selling price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryValuation {
    pub product_count: i64,
    pub cost_value: Money,
    pub retail_value: Money,
}

impl InventoryValuation {
    /// Potential gross margin if all stock sold at current prices.
    pub fn potential_margin(&self) -> Money {
        self.retail_value - self.cost_value
    }
}

/// A party with an outstanding positive balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Debtor {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub current_balance: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_rejects_inverted() {
        let now = Utc::now();
        assert!(DateRange::new(now, now - Duration::hours(1)).is_err());
        assert!(DateRange::new(now, now).is_ok());
    }

    #[test]
    fn test_days_is_inclusive() {
        let first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let range = DateRange::days(first, last).unwrap();

        // Half-open: the end bound is midnight after the last day.
        assert_eq!(range.from, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(range.to, Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_average_ticket_rounds() {
        let summary = SalesSummary::from_sums(
            3,
            Money::from_cents(900),
            Money::from_cents(100),
            Money::zero(),
            Money::from_cents(1000),
        );
        // 1000 / 3 = 333.33
        assert_eq!(summary.average_ticket.cents(), 333);

        let empty = SalesSummary::from_sums(0, Money::zero(), Money::zero(), Money::zero(), Money::zero());
        assert!(empty.average_ticket.is_zero());
    }

    #[test]
    fn test_potential_margin() {
        let valuation = InventoryValuation {
            product_count: 2,
            cost_value: Money::from_cents(3000),
            retail_value: Money::from_cents(4500),
        };
        assert_eq!(valuation.potential_margin().cents(), 1500);
    }
}

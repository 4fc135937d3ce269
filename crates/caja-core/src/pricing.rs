//! # Line Pricing
//!
//! Pure arithmetic behind sale and purchase posting. The database layer
//! calls these before writing a single row, so the numbers on the receipt,
//! in the session accumulators and in the ledger all come from one place.
//!
//! ## Sale Line
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  gross     = quantity × unit_price                     (rounded)       │
//! │  discount  = gross × discount_rate                     (rounded)       │
//! │  net       = gross - discount                                          │
//! │  tax       = net × tax_rate                            (rounded)       │
//! │  total     = net + tax                                                 │
//! │                                                                         │
//! │  subtotal += net   tax_total += tax   discount_total += discount       │
//! │  sale.total = subtotal + tax_total                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purchase Line
//! ```text
//!   base  = quantity × unit_cost;  tax = base × tax_rate;  total = base + tax
//! ```
//!
//! Every step is checked. An amount that leaves the `i64` range is an
//! `OutOfRange` validation failure, never a wrapped or panicking total.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::purchase::NewPurchaseLine;
use crate::quantity::Quantity;
use crate::sale::NewSaleLine;
use crate::types::{PaymentMethod, Rate};
use crate::MAX_AMOUNT_CENTS;

fn overflow(field: &str) -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: MAX_AMOUNT_CENTS,
    })
}

fn add(acc: Money, amount: Money, field: &str) -> CoreResult<Money> {
    acc.checked_add(amount).ok_or_else(|| overflow(field))
}

// =============================================================================
// Sales
// =============================================================================

/// Amounts for one priced sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLineAmounts {
    pub gross: Money,
    pub discount: Money,
    pub net: Money,
    pub tax: Money,
    pub total: Money,
}

/// Prices a single sale line.
pub fn price_sale_line(
    quantity: Quantity,
    unit_price: Money,
    discount_rate: Rate,
    tax_rate: Rate,
) -> CoreResult<SaleLineAmounts> {
    let gross = unit_price
        .checked_times(quantity)
        .ok_or_else(|| overflow("unitPrice"))?;
    let discount = gross
        .checked_percent(discount_rate)
        .ok_or_else(|| overflow("discountRate"))?;
    let net = gross.checked_sub(discount).ok_or_else(|| overflow("discountRate"))?;
    let tax = net.checked_percent(tax_rate).ok_or_else(|| overflow("taxRate"))?;

    Ok(SaleLineAmounts {
        gross,
        discount,
        net,
        tax,
        total: add(net, tax, "lineTotal")?,
    })
}

/// Header totals for a sale plus the per-line breakdown, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleTotals {
    pub lines: Vec<SaleLineAmounts>,
    pub subtotal: Money,
    pub tax_total: Money,
    pub discount_total: Money,
    pub total: Money,
}

/// Prices every line of a sale and accumulates the header totals.
///
/// ```rust
/// use caja_core::money::Money;
/// use caja_core::pricing::price_sale;
/// use caja_core::quantity::Quantity;
/// use caja_core::sale::NewSaleLine;
/// use caja_core::types::Rate;
///
/// let line = NewSaleLine {
///     product_id: "p".into(),
///     product_name: "Mate".into(),
///     quantity: Quantity::from_units(2),
///     unit_price: Money::from_cents(500),
///     discount_rate: Rate::zero(),
///     tax_rate: Rate::from_percent(10),
/// };
/// let totals = price_sale(&[line]).unwrap();
/// assert_eq!(totals.subtotal.cents(), 1000);
/// assert_eq!(totals.tax_total.cents(), 100);
/// assert_eq!(totals.total.cents(), 1100);
/// ```
pub fn price_sale(lines: &[NewSaleLine]) -> CoreResult<SaleTotals> {
    let mut totals = SaleTotals {
        lines: Vec::with_capacity(lines.len()),
        subtotal: Money::zero(),
        tax_total: Money::zero(),
        discount_total: Money::zero(),
        total: Money::zero(),
    };

    for line in lines {
        let amounts =
            price_sale_line(line.quantity, line.unit_price, line.discount_rate, line.tax_rate)?;
        totals.subtotal = add(totals.subtotal, amounts.net, "subtotal")?;
        totals.tax_total = add(totals.tax_total, amounts.tax, "taxTotal")?;
        totals.discount_total = add(totals.discount_total, amounts.discount, "discountTotal")?;
        totals.lines.push(amounts);
    }

    totals.total = add(totals.subtotal, totals.tax_total, "total")?;
    Ok(totals)
}

/// Change handed back at the counter.
///
/// Only cash produces change; card and credit sales always return zero.
pub fn change_due(method: PaymentMethod, amount_tendered: Money, total: Money) -> Money {
    match method {
        PaymentMethod::Cash => amount_tendered.saturating_excess_over(total),
        PaymentMethod::Card | PaymentMethod::Credit => Money::zero(),
    }
}

// =============================================================================
// Purchases
// =============================================================================

/// Amounts for one priced purchase line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseLineAmounts {
    pub base: Money,
    pub tax: Money,
    pub total: Money,
}

pub fn price_purchase_line(
    quantity: Quantity,
    unit_cost: Money,
    tax_rate: Rate,
) -> CoreResult<PurchaseLineAmounts> {
    let base = unit_cost
        .checked_times(quantity)
        .ok_or_else(|| overflow("unitCost"))?;
    let tax = base.checked_percent(tax_rate).ok_or_else(|| overflow("taxRate"))?;

    Ok(PurchaseLineAmounts {
        base,
        tax,
        total: add(base, tax, "lineTotal")?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseTotals {
    pub lines: Vec<PurchaseLineAmounts>,
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
}

pub fn price_purchase(lines: &[NewPurchaseLine]) -> CoreResult<PurchaseTotals> {
    let priced = lines
        .iter()
        .map(|l| price_purchase_line(l.quantity, l.unit_cost, l.tax_rate))
        .collect::<CoreResult<Vec<_>>>()?;

    let mut subtotal = Money::zero();
    let mut tax_total = Money::zero();
    for line in &priced {
        subtotal = add(subtotal, line.base, "subtotal")?;
        tax_total = add(tax_total, line.tax, "taxTotal")?;
    }

    Ok(PurchaseTotals {
        lines: priced,
        subtotal,
        tax_total,
        total: add(subtotal, tax_total, "total")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sale_line(qty: i64, price: i64, discount_pct: u32, tax_pct: u32) -> NewSaleLine {
        NewSaleLine {
            product_id: "p".to_string(),
            product_name: "Item".to_string(),
            quantity: Quantity::from_units(qty),
            unit_price: Money::from_cents(price),
            discount_rate: Rate::from_percent(discount_pct),
            tax_rate: Rate::from_percent(tax_pct),
        }
    }

    #[test]
    fn test_single_line_without_discount() {
        let totals = price_sale(&[sale_line(2, 500, 0, 10)]).unwrap();
        assert_eq!(totals.subtotal.cents(), 1000);
        assert_eq!(totals.tax_total.cents(), 100);
        assert_eq!(totals.discount_total.cents(), 0);
        assert_eq!(totals.total.cents(), 1100);
        assert_eq!(totals.lines[0].total.cents(), 1100);
    }

    #[test]
    fn test_discount_applies_before_tax() {
        // gross 1000, discount 10% = 100, net 900, tax 21% = 189
        let amounts = price_sale_line(
            Quantity::from_units(4),
            Money::from_cents(250),
            Rate::from_percent(10),
            Rate::from_percent(21),
        )
        .unwrap();
        assert_eq!(amounts.gross.cents(), 1000);
        assert_eq!(amounts.discount.cents(), 100);
        assert_eq!(amounts.net.cents(), 900);
        assert_eq!(amounts.tax.cents(), 189);
        assert_eq!(amounts.total.cents(), 1089);
    }

    #[test]
    fn test_totals_are_sums_of_lines() {
        let lines = vec![sale_line(1, 333, 5, 21), sale_line(3, 199, 0, 10), sale_line(2, 1050, 15, 0)];
        let totals = price_sale(&lines).unwrap();

        let net: i64 = totals.lines.iter().map(|l| l.net.cents()).sum();
        let tax: i64 = totals.lines.iter().map(|l| l.tax.cents()).sum();
        let discount: i64 = totals.lines.iter().map(|l| l.discount.cents()).sum();
        assert_eq!(totals.subtotal.cents(), net);
        assert_eq!(totals.tax_total.cents(), tax);
        assert_eq!(totals.discount_total.cents(), discount);
        assert_eq!(totals.total, totals.subtotal + totals.tax_total);
    }

    #[test]
    fn test_fractional_quantity_line() {
        let line = NewSaleLine {
            quantity: Quantity::from_milli(1250),
            ..sale_line(0, 800, 0, 0)
        };
        let totals = price_sale(&[line]).unwrap();
        assert_eq!(totals.total.cents(), 1000);
    }

    #[test]
    fn test_change_due() {
        let total = Money::from_cents(1100);
        assert_eq!(change_due(PaymentMethod::Cash, Money::from_cents(1100), total).cents(), 0);
        assert_eq!(change_due(PaymentMethod::Cash, Money::from_cents(2000), total).cents(), 900);
        assert_eq!(change_due(PaymentMethod::Cash, Money::from_cents(500), total).cents(), 0);
        assert_eq!(change_due(PaymentMethod::Card, Money::from_cents(2000), total).cents(), 0);
        assert_eq!(change_due(PaymentMethod::Credit, Money::zero(), total).cents(), 0);
    }

    #[test]
    fn test_purchase_scenario() {
        let line = NewPurchaseLine {
            product_id: "p".to_string(),
            product_name: "Harina 1kg".to_string(),
            quantity: Quantity::from_units(5),
            unit_cost: Money::from_cents(100),
            tax_rate: Rate::from_percent(21),
        };
        let totals = price_purchase(&[line]).unwrap();
        assert_eq!(totals.subtotal.cents(), 500);
        assert_eq!(totals.tax_total.cents(), 105);
        assert_eq!(totals.total.cents(), 605);
    }

    #[test]
    fn test_empty_sale_totals_zero() {
        let totals = price_sale(&[]).unwrap();
        assert!(totals.total.is_zero());
        assert!(totals.lines.is_empty());
    }

    #[test]
    fn test_oversized_line_is_rejected_not_wrapped() {
        let line = NewSaleLine {
            quantity: Quantity::from_milli(3000),
            ..sale_line(0, i64::MAX / 2, 0, 0)
        };

        let err = price_sale(&[line]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "unitPrice"
        ));
    }

    #[test]
    fn test_sale_total_overflow_is_an_error() {
        let big = sale_line(1, i64::MAX / 2 + 10, 0, 0);

        let err = price_sale(&[big.clone(), big]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "subtotal"
        ));
    }

    #[test]
    fn test_purchase_total_overflow_is_an_error() {
        let line = NewPurchaseLine {
            product_id: "p".to_string(),
            product_name: "Granel".to_string(),
            quantity: Quantity::from_units(1),
            unit_cost: Money::from_cents(i64::MAX / 2 + 10),
            tax_rate: Rate::zero(),
        };

        assert!(price_purchase(&[line.clone(), line]).is_err());
    }
}

//! # Validation Module
//!
//! Input checks run at the top of every posting, before the database
//! transaction starts.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Command (caja-app)                                            │
//! │  └── Deserialization: shapes and enum values                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Amount bounds, rate bounds, non-empty lines, names                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Posting transaction (caja-db)                                 │
//! │  └── Existence, state, stock floor; UNIQUE / FK constraints            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::purchase::NewPurchase;
use crate::quantity::Quantity;
use crate::sale::NewSale;
use crate::types::{PaymentMethod, ProductInput, Rate};
use crate::party::PartyInput;
use crate::{MAX_AMOUNT_CENTS, MAX_LINE_ITEMS, MAX_QUANTITY_MILLI};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a display name (products, parties, categories).
///
/// ```rust
/// use caja_core::validation::validate_name;
///
/// assert!(validate_name("name", "Yerba Mate 1kg").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a free-text search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an identifier reference (ids are opaque, but never blank).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// A strictly positive amount (cash movements, payments).
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    validate_amount_ceiling(field, amount)
}

/// A non-negative amount (prices, floats, tendered cash).
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    validate_amount_ceiling(field, amount)
}

fn validate_amount_ceiling(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

pub fn validate_quantity(quantity: Quantity) -> ValidationResult<()> {
    if !quantity.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    validate_quantity_ceiling("quantity", quantity)
}

/// Signed stock corrections share the line ceiling in both directions.
pub fn validate_quantity_ceiling(field: &str, quantity: Quantity) -> ValidationResult<()> {
    if quantity.milli().unsigned_abs() > MAX_QUANTITY_MILLI as u64 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: -MAX_QUANTITY_MILLI,
            max: MAX_QUANTITY_MILLI,
        });
    }
    Ok(())
}

/// One line's gross (`quantity × price`) must stay under the amount ceiling.
fn validate_line_gross(field: &str, quantity: Quantity, price: Money) -> ValidationResult<()> {
    match price.checked_times(quantity) {
        Some(gross) if gross.cents() <= MAX_AMOUNT_CENTS => Ok(()),
        _ => Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        }),
    }
}

/// A percentage between 0% and 100%.
pub fn validate_rate(field: &str, rate: Rate) -> ValidationResult<()> {
    if rate.bps() > Rate::FULL_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: Rate::FULL_BPS as i64,
        });
    }
    Ok(())
}

fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    if count > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a sale request before posting.
///
/// Credit sales must name the customer whose account is charged.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_id("sessionId", &sale.session_id)?;
    validate_line_count(sale.items.len())?;
    validate_non_negative_amount("amountTendered", sale.amount_tendered)?;

    if sale.payment_method == PaymentMethod::Credit
        && sale.customer_id.as_deref().map_or(true, |id| id.trim().is_empty())
    {
        return Err(ValidationError::Required {
            field: "customerId".to_string(),
        });
    }

    for line in &sale.items {
        validate_id("productId", &line.product_id)?;
        validate_name("productName", &line.product_name)?;
        validate_quantity(line.quantity)?;
        validate_non_negative_amount("unitPrice", line.unit_price)?;
        validate_line_gross("unitPrice", line.quantity, line.unit_price)?;
        validate_rate("discountRate", line.discount_rate)?;
        validate_rate("taxRate", line.tax_rate)?;
    }

    Ok(())
}

/// Validates a purchase request before posting.
pub fn validate_new_purchase(purchase: &NewPurchase) -> ValidationResult<()> {
    validate_id("supplierId", &purchase.supplier_id)?;
    validate_line_count(purchase.items.len())?;

    for line in &purchase.items {
        validate_id("productId", &line.product_id)?;
        validate_name("productName", &line.product_name)?;
        validate_quantity(line.quantity)?;
        validate_non_negative_amount("unitCost", line.unit_cost)?;
        validate_line_gross("unitCost", line.quantity, line.unit_cost)?;
        validate_rate("taxRate", line.tax_rate)?;
    }

    Ok(())
}

pub fn validate_product_input(input: &ProductInput) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_non_negative_amount("basePrice", input.base_price)?;
    validate_non_negative_amount("costPrice", input.cost_price)?;
    validate_rate("taxRate", input.tax_rate)?;
    if input.min_stock.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "minStock".to_string(),
        });
    }
    validate_quantity_ceiling("minStock", input.min_stock)
}

pub fn validate_party_input(input: &PartyInput) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_non_negative_amount("creditLimit", input.credit_limit)?;
    if let Some(email) = input.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !email.contains('@') {
            return Err(ValidationError::InvalidFormat {
                field: "email".to_string(),
                reason: "missing '@'".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase::NewPurchaseLine;
    use crate::sale::NewSaleLine;

    fn line() -> NewSaleLine {
        NewSaleLine {
            product_id: "p-1".to_string(),
            product_name: "Mate".to_string(),
            quantity: Quantity::from_units(1),
            unit_price: Money::from_cents(500),
            discount_rate: Rate::zero(),
            tax_rate: Rate::from_percent(21),
        }
    }

    fn sale(method: PaymentMethod, customer: Option<&str>) -> NewSale {
        NewSale {
            session_id: "s-1".to_string(),
            customer_id: customer.map(str::to_string),
            payment_method: method,
            amount_tendered: Money::zero(),
            items: vec![line()],
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Queso Cremoso").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(201)).is_err());
    }

    #[test]
    fn test_amount_validators() {
        assert!(validate_positive_amount("amount", Money::from_cents(1)).is_ok());
        assert!(validate_positive_amount("amount", Money::zero()).is_err());
        assert!(validate_positive_amount("amount", Money::from_cents(-5)).is_err());
        assert!(validate_non_negative_amount("float", Money::zero()).is_ok());
        assert!(validate_non_negative_amount("float", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_rate_bounds() {
        assert!(validate_rate("taxRate", Rate::from_bps(10_000)).is_ok());
        assert!(validate_rate("taxRate", Rate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_credit_sale_requires_customer() {
        assert!(validate_new_sale(&sale(PaymentMethod::Cash, None)).is_ok());
        assert!(validate_new_sale(&sale(PaymentMethod::Credit, Some("c-1"))).is_ok());
        assert_eq!(
            validate_new_sale(&sale(PaymentMethod::Credit, None)),
            Err(ValidationError::Required {
                field: "customerId".to_string()
            })
        );
        assert!(validate_new_sale(&sale(PaymentMethod::Credit, Some("  "))).is_err());
    }

    #[test]
    fn test_sale_lines_are_checked() {
        let mut empty = sale(PaymentMethod::Cash, None);
        empty.items.clear();
        assert!(validate_new_sale(&empty).is_err());

        let mut zero_qty = sale(PaymentMethod::Cash, None);
        zero_qty.items[0].quantity = Quantity::zero();
        assert!(validate_new_sale(&zero_qty).is_err());

        let mut big_discount = sale(PaymentMethod::Cash, None);
        big_discount.items[0].discount_rate = Rate::from_percent(101);
        assert!(validate_new_sale(&big_discount).is_err());
    }

    #[test]
    fn test_amount_ceiling() {
        let at_limit = Money::from_cents(MAX_AMOUNT_CENTS);
        let over = Money::from_cents(MAX_AMOUNT_CENTS + 1);

        assert!(validate_non_negative_amount("unitPrice", at_limit).is_ok());
        assert!(matches!(
            validate_non_negative_amount("unitPrice", over),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_positive_amount("amount", Money::from_cents(i64::MAX)).is_err());
        assert!(validate_quantity(Quantity::from_milli(MAX_QUANTITY_MILLI + 1)).is_err());
        assert!(validate_quantity_ceiling("delta", Quantity::from_milli(-MAX_QUANTITY_MILLI)).is_ok());
        assert!(validate_quantity_ceiling("delta", Quantity::from_milli(i64::MIN)).is_err());
    }

    #[test]
    fn test_sale_line_gross_is_bounded() {
        // Each factor is under its ceiling, the product is not.
        let mut bulk = sale(PaymentMethod::Cash, None);
        bulk.items[0].quantity = Quantity::from_units(1_000_000);
        bulk.items[0].unit_price = Money::from_cents(MAX_AMOUNT_CENTS);
        assert_eq!(
            validate_new_sale(&bulk),
            Err(ValidationError::OutOfRange {
                field: "unitPrice".to_string(),
                min: 0,
                max: MAX_AMOUNT_CENTS,
            })
        );

        let mut wrapped = sale(PaymentMethod::Cash, None);
        wrapped.items[0].quantity = Quantity::from_units(3);
        wrapped.items[0].unit_price = Money::from_cents(i64::MAX / 2);
        assert!(validate_new_sale(&wrapped).is_err());
    }

    #[test]
    fn test_validate_new_purchase() {
        let purchase = NewPurchase {
            supplier_id: "sup-1".to_string(),
            payment_method: PaymentMethod::Credit,
            notes: None,
            items: vec![NewPurchaseLine {
                product_id: "p-1".to_string(),
                product_name: "Harina".to_string(),
                quantity: Quantity::from_units(5),
                unit_cost: Money::from_cents(100),
                tax_rate: Rate::from_percent(21),
            }],
        };
        assert!(validate_new_purchase(&purchase).is_ok());

        let mut negative_cost = purchase.clone();
        negative_cost.items[0].unit_cost = Money::from_cents(-1);
        assert!(validate_new_purchase(&negative_cost).is_err());

        let mut oversized = purchase.clone();
        oversized.items[0].quantity = Quantity::from_units(1_000);
        oversized.items[0].unit_cost = Money::from_cents(MAX_AMOUNT_CENTS);
        assert!(matches!(
            validate_new_purchase(&oversized),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "unitCost"
        ));
    }

    #[test]
    fn test_validate_party_email() {
        let mut input = PartyInput {
            name: "Distribuidora Norte".to_string(),
            ..PartyInput::default()
        };
        assert!(validate_party_input(&input).is_ok());

        input.email = Some("ventas.norte.example".to_string());
        assert!(validate_party_input(&input).is_err());
    }
}

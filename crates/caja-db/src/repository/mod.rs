//! # Repository Module
//!
//! Database repository implementations for Caja.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Postings                            │
//! │                                                                         │
//! │  Command (caja-app)                                                    │
//! │       │                                                                 │
//! │       │  db.sales().complete_sale(&new_sale)                           │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── let mut tx = pool.begin()                                         │
//! │  ├── receipt::next_receipt_number(&mut tx)                             │
//! │  ├── product::release_stock(&mut tx)      ← stock floor              │
//! │  ├── session::add_to_accumulator(&mut tx) ← running totals           │
//! │  ├── ledger::post_entry(&mut tx)          ← party balance            │
//! │  └── tx.commit()                                                       │
//! │                                                                         │
//! │  Shared steps take `&mut SqliteConnection` so any posting can          │
//! │  compose them inside its own transaction. Returning an error drops    │
//! │  the transaction and nothing is written.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products, search, stock adjustments
//! - [`CategoryRepository`](category::CategoryRepository) - Product categories
//! - [`SessionRepository`](session::SessionRepository) - Register sessions and cash movements
//! - [`SaleRepository`](sale::SaleRepository) - Sale posting and refunds
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Purchase posting and cancellation
//! - [`PartyRepository`](party::PartyRepository) - Customers and suppliers
//! - [`LedgerRepository`](ledger::LedgerRepository) - Party accounts
//! - [`ReportRepository`](report::ReportRepository) - Read-only aggregates

pub mod category;
pub mod ledger;
pub mod party;
pub mod product;
pub mod purchase;
pub mod receipt;
pub mod report;
pub mod sale;
pub mod session;

/// Default row cap for list queries.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Builds a `LIKE` pattern matching `query` anywhere, escaping wildcards.
///
/// Use with `ESCAPE '\'`.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Normalises an optional text field: trimmed, and blank becomes `None`.
pub(crate) fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("mate"), "%mate%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(Some("  779123  ")), Some("779123".to_string()));
        assert_eq!(clean_optional(Some("   ")), None);
        assert_eq!(clean_optional(None), None);
    }
}

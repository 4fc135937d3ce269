//! # Ledger Primitives
//!
//! One pattern serves both customer and supplier accounts: an append-only
//! journal of charges and payments, plus a denormalised `current_balance`
//! that must always equal the signed sum of the journal.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  charge   +amount   (credit sale, credit purchase)                      │
//! │  payment  -amount   (payment received/made, refund, cancellation)       │
//! │                                                                         │
//! │  current_balance == Σ signed(entry)   at every committed point          │
//! │                                                                         │
//! │  The entry and the balance change are always written in the same      │
//! │  database transaction.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::party::PartyKind;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Charge,
    Payment,
}

impl LedgerEntryKind {
    /// Effect of an entry of this kind on the running balance.
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            LedgerEntryKind::Charge => amount,
            LedgerEntryKind::Payment => -amount,
        }
    }
}

/// A ledger line for either kind of party.
///
/// `reference_id` links to the sale (customers) or purchase (suppliers)
/// that produced the entry; `receipt_number` is joined in on reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    pub party_id: String,
    pub reference_id: Option<String>,
    pub receipt_number: Option<String>,
    /// Always positive; the sign comes from `kind`.
    pub amount: Money,
    pub kind: LedgerEntryKind,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount)
    }
}

/// Folds a journal into the balance it implies.
pub fn fold_balance<'a, I>(entries: I) -> Money
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    entries.into_iter().map(LedgerEntry::signed_amount).sum()
}

/// Result of comparing the stored balance against the folded journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BalanceCheck {
    pub kind: PartyKind,
    pub party_id: String,
    pub stored: Money,
    pub computed: Money,
    pub entry_count: i64,
}

impl BalanceCheck {
    pub fn is_consistent(&self) -> bool {
        self.stored == self.computed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: LedgerEntryKind, cents: i64) -> LedgerEntry {
        LedgerEntry {
            id: uuid::Uuid::new_v4().to_string(),
            party_id: "c-1".to_string(),
            reference_id: None,
            receipt_number: None,
            amount: Money::from_cents(cents),
            kind,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_signed_amounts() {
        assert_eq!(LedgerEntryKind::Charge.signed(Money::from_cents(605)).cents(), 605);
        assert_eq!(LedgerEntryKind::Payment.signed(Money::from_cents(605)).cents(), -605);
    }

    #[test]
    fn test_fold_balance_allows_overpayment() {
        let journal = vec![
            entry(LedgerEntryKind::Charge, 1100),
            entry(LedgerEntryKind::Payment, 600),
            entry(LedgerEntryKind::Payment, 700),
        ];
        assert_eq!(fold_balance(&journal).cents(), -200);
        assert!(fold_balance(Vec::<LedgerEntry>::new().iter()).is_zero());
    }

    #[test]
    fn test_balance_check() {
        let check = BalanceCheck {
            kind: PartyKind::Customer,
            party_id: "c-1".to_string(),
            stored: Money::from_cents(500),
            computed: Money::from_cents(500),
            entry_count: 2,
        };
        assert!(check.is_consistent());
    }
}

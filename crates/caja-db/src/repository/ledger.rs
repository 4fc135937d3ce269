//! # Ledger Repository
//!
//! One posting routine serves customer and supplier accounts. Every entry
//! and the matching `current_balance` change are written together, so the
//! stored balance always equals the folded journal.
//!
//! ```text
//! ┌──────────────┬─────────────────┬──────────────┬──────────────┐
//! │ PartyKind    │ party table     │ ledger table │ linked doc   │
//! ├──────────────┼─────────────────┼──────────────┼──────────────┤
//! │ Customer     │ customers       │ customer_    │ sales        │
//! │              │                 │ ledger       │ (sale_id)    │
//! │ Supplier     │ suppliers       │ supplier_    │ purchases    │
//! │              │                 │ ledger       │ (purchase_id)│
//! └──────────────┴─────────────────┴──────────────┴──────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::clean_optional;
use caja_core::ledger::fold_balance;
use caja_core::validation::{validate_id, validate_positive_amount};
use caja_core::{BalanceCheck, LedgerEntry, LedgerEntryKind, Money, PartyKind};

/// Table and column names backing one kind of party account.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PartyTables {
    pub party: &'static str,
    pub ledger: &'static str,
    pub party_fk: &'static str,
    pub document: &'static str,
    pub document_fk: &'static str,
}

pub(crate) fn tables(kind: PartyKind) -> PartyTables {
    match kind {
        PartyKind::Customer => PartyTables {
            party: "customers",
            ledger: "customer_ledger",
            party_fk: "customer_id",
            document: "sales",
            document_fk: "sale_id",
        },
        PartyKind::Supplier => PartyTables {
            party: "suppliers",
            ledger: "supplier_ledger",
            party_fk: "supplier_id",
            document: "purchases",
            document_fk: "purchase_id",
        },
    }
}

/// Repository for party ledgers.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Records a payment received from a customer or made to a supplier.
    ///
    /// Overpayment is allowed; the balance simply goes negative.
    pub async fn register_payment(
        &self,
        kind: PartyKind,
        party_id: &str,
        amount: Money,
        notes: Option<&str>,
    ) -> DbResult<LedgerEntry> {
        validate_id("partyId", party_id)?;
        validate_positive_amount("amount", amount)?;

        let mut tx = self.pool.begin().await?;

        let entry = post_entry(
            &mut tx,
            kind,
            party_id,
            None,
            LedgerEntryKind::Payment,
            amount,
            notes,
        )
        .await?;

        tx.commit().await?;

        info!(kind = ?kind, party_id = %party_id, amount = %amount, "Payment registered");
        Ok(entry)
    }

    /// A party's journal, newest first, with linked receipt numbers.
    pub async fn get_ledger(&self, kind: PartyKind, party_id: &str) -> DbResult<Vec<LedgerEntry>> {
        let mut conn = self.pool.acquire().await?;
        ensure_party_exists(&mut conn, kind, party_id).await?;

        let t = tables(kind);
        let sql = format!(
            r#"
            SELECT
                l.id,
                l.{party_fk} AS party_id,
                l.{document_fk} AS reference_id,
                d.receipt_number,
                l.amount,
                l.kind,
                l.notes,
                l.created_at
            FROM {ledger} l
            LEFT JOIN {document} d ON d.id = l.{document_fk}
            WHERE l.{party_fk} = ?1
            ORDER BY l.created_at DESC, l.rowid DESC
            "#,
            party_fk = t.party_fk,
            document_fk = t.document_fk,
            ledger = t.ledger,
            document = t.document,
        );

        let entries = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(party_id)
            .fetch_all(&mut *conn)
            .await?;

        debug!(kind = ?kind, party_id = %party_id, count = entries.len(), "Loaded ledger");
        Ok(entries)
    }

    /// Folds the journal and compares it against the stored balance.
    pub async fn recompute_balance(&self, kind: PartyKind, party_id: &str) -> DbResult<BalanceCheck> {
        let t = tables(kind);
        let stored: Option<Money> = sqlx::query_scalar(&format!(
            "SELECT current_balance FROM {} WHERE id = ?1",
            t.party
        ))
        .bind(party_id)
        .fetch_optional(&self.pool)
        .await?;
        let stored = stored.ok_or_else(|| DbError::not_found(kind.entity(), party_id))?;

        let entries = self.get_ledger(kind, party_id).await?;
        let computed = fold_balance(&entries);

        Ok(BalanceCheck {
            kind,
            party_id: party_id.to_string(),
            stored,
            computed,
            entry_count: entries.len() as i64,
        })
    }
}

// =============================================================================
// Posting Helper
// =============================================================================

/// Appends a ledger entry and moves the party's balance by its signed amount.
///
/// Runs inside the caller's transaction; fails with NotFound when the party
/// does not exist, before anything is inserted.
pub(crate) async fn post_entry(
    conn: &mut SqliteConnection,
    kind: PartyKind,
    party_id: &str,
    reference_id: Option<&str>,
    entry_kind: LedgerEntryKind,
    amount: Money,
    notes: Option<&str>,
) -> DbResult<LedgerEntry> {
    let t = tables(kind);
    let signed = entry_kind.signed(amount);

    let result = sqlx::query(&format!(
        "UPDATE {} SET current_balance = current_balance + ?2 WHERE id = ?1",
        t.party
    ))
    .bind(party_id)
    .bind(signed)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(kind.entity(), party_id));
    }

    let entry = LedgerEntry {
        id: Uuid::new_v4().to_string(),
        party_id: party_id.to_string(),
        reference_id: reference_id.map(str::to_string),
        receipt_number: None,
        amount,
        kind: entry_kind,
        notes: clean_optional(notes),
        created_at: Utc::now(),
    };

    sqlx::query(&format!(
        r#"
        INSERT INTO {ledger} (id, {party_fk}, {document_fk}, amount, kind, notes, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        ledger = t.ledger,
        party_fk = t.party_fk,
        document_fk = t.document_fk,
    ))
    .bind(&entry.id)
    .bind(&entry.party_id)
    .bind(&entry.reference_id)
    .bind(entry.amount)
    .bind(entry.kind)
    .bind(&entry.notes)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        kind = ?kind,
        party_id = %party_id,
        entry = ?entry_kind,
        amount = %amount,
        "Ledger entry posted"
    );
    Ok(entry)
}

/// Fails with NotFound unless the party exists.
pub(crate) async fn ensure_party_exists(
    conn: &mut SqliteConnection,
    kind: PartyKind,
    party_id: &str,
) -> DbResult<()> {
    let found: Option<i64> = sqlx::query_scalar(&format!(
        "SELECT 1 FROM {} WHERE id = ?1",
        tables(kind).party
    ))
    .bind(party_id)
    .fetch_optional(&mut *conn)
    .await?;

    found
        .map(|_| ())
        .ok_or_else(|| DbError::not_found(kind.entity(), party_id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{customer, setup, supplier};

    #[tokio::test]
    async fn test_payment_lowers_balance_and_allows_overpayment() {
        let db = setup().await;
        let ana = customer(&db, "Ana").await;
        let ledger = db.ledger();

        let entry = ledger
            .register_payment(PartyKind::Customer, &ana.id, Money::from_cents(700), Some("cash"))
            .await
            .unwrap();
        assert_eq!(entry.kind, LedgerEntryKind::Payment);

        let ana = db.customers().get(&ana.id).await.unwrap();
        assert_eq!(ana.current_balance.cents(), -700);

        let check = ledger.recompute_balance(PartyKind::Customer, &ana.id).await.unwrap();
        assert!(check.is_consistent());
        assert_eq!(check.entry_count, 1);
    }

    #[tokio::test]
    async fn test_payment_validation_and_missing_party() {
        let db = setup().await;
        let ledger = db.ledger();

        let err = ledger
            .register_payment(PartyKind::Supplier, "missing", Money::from_cents(100), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let s = supplier(&db, "Molinos").await;
        let err = ledger
            .register_payment(PartyKind::Supplier, &s.id, Money::from_cents(-1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        assert!(ledger.get_ledger(PartyKind::Supplier, &s.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_is_newest_first() {
        let db = setup().await;
        let s = supplier(&db, "Lacteos del Sur").await;
        let ledger = db.ledger();

        for cents in [100, 200, 300] {
            ledger
                .register_payment(PartyKind::Supplier, &s.id, Money::from_cents(cents), None)
                .await
                .unwrap();
        }

        let amounts: Vec<i64> = ledger
            .get_ledger(PartyKind::Supplier, &s.id)
            .await
            .unwrap()
            .iter()
            .map(|e| e.amount.cents())
            .collect();
        assert_eq!(amounts, vec![300, 200, 100]);
    }

    #[tokio::test]
    async fn test_kinds_do_not_mix() {
        let db = setup().await;
        let c = customer(&db, "Bruno").await;

        // A customer id is not a supplier.
        let err = db
            .ledger()
            .get_ledger(PartyKind::Supplier, &c.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}

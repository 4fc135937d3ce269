//! # Purchase Repository
//!
//! The mirror image of the sale poster: goods come in, stock goes up, and a
//! credit purchase charges the supplier's account.
//!
//! ## Purchase Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_purchase ─► status: completed                                  │
//! │    ├── stock += qty per line                                            │
//! │    └── credit: supplier charge, balance += total, payment: pending     │
//! │                                                                         │
//! │  cancel ─► status: cancelled (terminal)                                │
//! │    ├── stock -= qty per line   (rejected if a tracked product would    │
//! │    │                            go below zero: goods already sold)     │
//! │    └── credit: supplier payment entry, balance -= total                │
//! │                                                                         │
//! │  create then cancel, with nothing in between, leaves stock and the     │
//! │  supplier balance exactly where they started.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::clean_optional;
use crate::repository::ledger::{ensure_party_exists, post_entry};
use crate::repository::product::{receive_stock, release_stock};
use crate::repository::receipt::next_receipt_number;
use caja_core::pricing::price_purchase;
use caja_core::validation::validate_new_purchase;
use caja_core::{
    DateRange, LedgerEntryKind, NewPurchase, PartyKind, PaymentMethod, PaymentStatus, Purchase,
    PurchaseDetail, PurchaseItem, PurchaseStatus, PURCHASE_RECEIPT_SERIES,
};

const PURCHASE_COLUMNS: &str = r#"
    id, supplier_id, receipt_number,
    subtotal, tax_total, total,
    payment_method, payment_status, status,
    notes, created_at, cancelled_at
"#;

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Posts a purchase with all of its side effects, atomically.
    pub async fn create_purchase(&self, new_purchase: &NewPurchase) -> DbResult<PurchaseDetail> {
        validate_new_purchase(new_purchase)?;

        let totals = price_purchase(&new_purchase.items)?;

        let mut tx = self.pool.begin().await?;

        ensure_party_exists(&mut tx, PartyKind::Supplier, &new_purchase.supplier_id).await?;

        let receipt_number = next_receipt_number(&mut tx, PURCHASE_RECEIPT_SERIES).await?;

        let purchase = Purchase {
            id: Uuid::new_v4().to_string(),
            supplier_id: new_purchase.supplier_id.clone(),
            receipt_number,
            subtotal: totals.subtotal,
            tax_total: totals.tax_total,
            total: totals.total,
            payment_method: new_purchase.payment_method,
            payment_status: PaymentStatus::for_method(new_purchase.payment_method),
            status: PurchaseStatus::Completed,
            notes: clean_optional(new_purchase.notes.as_deref()),
            created_at: Utc::now(),
            cancelled_at: None,
        };

        insert_purchase(&mut tx, &purchase).await?;

        let mut items = Vec::with_capacity(new_purchase.items.len());
        for (index, (line, amounts)) in new_purchase.items.iter().zip(&totals.lines).enumerate() {
            receive_stock(&mut tx, &line.product_id, line.quantity).await?;

            let item = PurchaseItem {
                id: Uuid::new_v4().to_string(),
                purchase_id: purchase.id.clone(),
                position: index as i64 + 1,
                product_id: line.product_id.clone(),
                name_snapshot: line.product_name.trim().to_string(),
                quantity: line.quantity,
                unit_cost: line.unit_cost,
                tax_rate: line.tax_rate,
                tax_amount: amounts.tax,
                line_total: amounts.total,
            };
            insert_item(&mut tx, &item).await?;
            items.push(item);
        }

        if purchase.payment_method == PaymentMethod::Credit {
            post_entry(
                &mut tx,
                PartyKind::Supplier,
                &purchase.supplier_id,
                Some(purchase.id.as_str()),
                LedgerEntryKind::Charge,
                purchase.total,
                Some(format!("Purchase {}", purchase.receipt_number).as_str()),
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            purchase_id = %purchase.id,
            receipt_number = %purchase.receipt_number,
            total = %purchase.total,
            method = purchase.payment_method.as_str(),
            items = items.len(),
            "Purchase recorded"
        );

        Ok(PurchaseDetail { purchase, items })
    }

    /// Moves a purchase to `status`. Cancellation is the only transition.
    pub async fn update_status(
        &self,
        purchase_id: &str,
        status: PurchaseStatus,
    ) -> DbResult<PurchaseDetail> {
        status.ensure_valid_target()?;
        self.cancel(purchase_id).await
    }

    /// Reverses a purchase's stock and ledger effects.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Purchase doesn't exist
    /// * `Err(DbError::InvalidState)` - Already cancelled
    /// * `Err(DbError::OutOfStock)` - The goods were already sold
    pub async fn cancel(&self, purchase_id: &str) -> DbResult<PurchaseDetail> {
        let mut tx = self.pool.begin().await?;

        let mut purchase = fetch_purchase(&mut tx, purchase_id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", purchase_id))?;

        if let Err(err) = purchase.ensure_cancellable() {
            warn!(purchase_id = %purchase_id, "Purchase already cancelled");
            return Err(err.into());
        }

        let items = fetch_items(&mut tx, purchase_id).await?;
        for item in &items {
            release_stock(&mut tx, &item.product_id, item.quantity).await?;
        }

        if purchase.payment_method == PaymentMethod::Credit {
            post_entry(
                &mut tx,
                PartyKind::Supplier,
                &purchase.supplier_id,
                Some(purchase.id.as_str()),
                LedgerEntryKind::Payment,
                purchase.total,
                Some(format!("Cancelled {}", purchase.receipt_number).as_str()),
            )
            .await?;
        }

        let cancelled_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE purchases SET
                status = 'cancelled',
                cancelled_at = ?2
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(purchase_id)
        .bind(cancelled_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        purchase.status = PurchaseStatus::Cancelled;
        purchase.cancelled_at = Some(cancelled_at);

        info!(
            purchase_id = %purchase.id,
            receipt_number = %purchase.receipt_number,
            total = %purchase.total,
            "Purchase cancelled"
        );

        Ok(PurchaseDetail { purchase, items })
    }

    pub async fn get(&self, purchase_id: &str) -> DbResult<PurchaseDetail> {
        let mut conn = self.pool.acquire().await?;

        let purchase = fetch_purchase(&mut conn, purchase_id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", purchase_id))?;
        let items = fetch_items(&mut conn, purchase_id).await?;

        Ok(PurchaseDetail { purchase, items })
    }

    /// Purchases created within `range`, newest first, optionally for one supplier.
    pub async fn list(
        &self,
        range: &DateRange,
        supplier_id: Option<&str>,
        limit: u32,
    ) -> DbResult<Vec<Purchase>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM purchases
            WHERE created_at >= ?1 AND created_at < ?2
              AND (?3 IS NULL OR supplier_id = ?3)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?4
            "#,
            PURCHASE_COLUMNS
        );
        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(range.from)
            .bind(range.to)
            .bind(supplier_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(purchases)
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

async fn insert_purchase(conn: &mut SqliteConnection, purchase: &Purchase) -> DbResult<()> {
    debug!(id = %purchase.id, receipt_number = %purchase.receipt_number, "Inserting purchase");

    sqlx::query(
        r#"
        INSERT INTO purchases (
            id, supplier_id, receipt_number,
            subtotal, tax_total, total,
            payment_method, payment_status, status,
            notes, created_at
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6,
            ?7, ?8, ?9,
            ?10, ?11
        )
        "#,
    )
    .bind(&purchase.id)
    .bind(&purchase.supplier_id)
    .bind(&purchase.receipt_number)
    .bind(purchase.subtotal)
    .bind(purchase.tax_total)
    .bind(purchase.total)
    .bind(purchase.payment_method)
    .bind(purchase.payment_status)
    .bind(purchase.status)
    .bind(&purchase.notes)
    .bind(purchase.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_item(conn: &mut SqliteConnection, item: &PurchaseItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO purchase_items (
            id, purchase_id, position, product_id, name_snapshot,
            quantity, unit_cost, tax_rate, tax_amount, line_total
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.purchase_id)
    .bind(item.position)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_cost)
    .bind(item.tax_rate)
    .bind(item.tax_amount)
    .bind(item.line_total)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_purchase(
    conn: &mut SqliteConnection,
    purchase_id: &str,
) -> DbResult<Option<Purchase>> {
    let sql = format!("SELECT {} FROM purchases WHERE id = ?1", PURCHASE_COLUMNS);
    let purchase = sqlx::query_as::<_, Purchase>(&sql)
        .bind(purchase_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(purchase)
}

async fn fetch_items(conn: &mut SqliteConnection, purchase_id: &str) -> DbResult<Vec<PurchaseItem>> {
    let items = sqlx::query_as::<_, PurchaseItem>(
        r#"
        SELECT
            id, purchase_id, position, product_id, name_snapshot,
            quantity, unit_cost, tax_rate, tax_amount, line_total
        FROM purchase_items
        WHERE purchase_id = ?1
        ORDER BY position
        "#,
    )
    .bind(purchase_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================

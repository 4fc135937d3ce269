//! # Sale Repository
//!
//! The sale poster and its reversal.
//!
//! ## Posting a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 complete_sale (one transaction)                         │
//! │                                                                         │
//! │  validate ─► price lines (caja-core) ─► BEGIN                           │
//! │                                                                         │
//! │  1. session must exist and be open                                     │
//! │  2. customer must exist (required for credit)                          │
//! │  3. claim receipt number            V-000042                           │
//! │  4. INSERT sales                                                       │
//! │  5. per line: release stock (floor) + INSERT sale_items snapshot       │
//! │  6. session.{cash|card|other}_sales += total                           │
//! │  7. credit: customer ledger charge, balance += total                   │
//! │                                                                         │
//! │  COMMIT  (any error above drops the transaction: nothing persists)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Refund
//! `refund_sale` mirrors purchase cancellation: restock every line, then
//! pay the customer back the way they paid. Cash comes out of the drawer of
//! the session open at refund time; credit is written off the customer's
//! account; card refunds are settled outside the register.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::ledger::{ensure_party_exists, post_entry};
use crate::repository::product::{receive_stock, release_stock};
use crate::repository::receipt::next_receipt_number;
use crate::repository::session::{active_session, add_to_accumulator, require_open_session};
use crate::repository::clean_optional;
use caja_core::pricing::{change_due, price_sale};
use caja_core::validation::{validate_name, validate_new_sale};
use caja_core::{
    CoreError, DateRange, LedgerEntryKind, NewSale, PartyKind, PaymentMethod, Sale, SaleDetail,
    SaleItem, SaleStatus, SalesBucket, SALE_RECEIPT_SERIES,
};

const SALE_COLUMNS: &str = r#"
    id, session_id, customer_id, receipt_number,
    subtotal, tax_total, discount_total, total,
    amount_tendered, change, payment_method, status,
    created_at, refunded_at, refund_reason
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Posts a sale with all of its side effects, atomically.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - Empty cart, bad quantity/rate, credit without customer
    /// * `Err(DbError::NotFound)` - Session, customer or product missing
    /// * `Err(DbError::InvalidState)` - Session is closed
    /// * `Err(DbError::OutOfStock)` - A tracked product would go negative
    pub async fn complete_sale(&self, new_sale: &NewSale) -> DbResult<SaleDetail> {
        validate_new_sale(new_sale)?;

        let totals = price_sale(&new_sale.items)?;
        let change = change_due(new_sale.payment_method, new_sale.amount_tendered, totals.total);
        let customer_id = clean_optional(new_sale.customer_id.as_deref());

        if new_sale.payment_method == PaymentMethod::Cash && new_sale.amount_tendered < totals.total {
            debug!(
                tendered = %new_sale.amount_tendered,
                total = %totals.total,
                "Cash tendered is below the total"
            );
        }

        let mut tx = self.pool.begin().await?;

        require_open_session(&mut tx, &new_sale.session_id).await?;

        if let Some(customer_id) = customer_id.as_deref() {
            ensure_party_exists(&mut tx, PartyKind::Customer, customer_id).await?;
        }

        let receipt_number = next_receipt_number(&mut tx, SALE_RECEIPT_SERIES).await?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            session_id: new_sale.session_id.clone(),
            customer_id,
            receipt_number,
            subtotal: totals.subtotal,
            tax_total: totals.tax_total,
            discount_total: totals.discount_total,
            total: totals.total,
            amount_tendered: new_sale.amount_tendered,
            change,
            payment_method: new_sale.payment_method,
            status: SaleStatus::Completed,
            created_at: Utc::now(),
            refunded_at: None,
            refund_reason: None,
        };

        insert_sale(&mut tx, &sale).await?;

        let mut items = Vec::with_capacity(new_sale.items.len());
        for (index, (line, amounts)) in new_sale.items.iter().zip(&totals.lines).enumerate() {
            release_stock(&mut tx, &line.product_id, line.quantity).await?;

            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                position: index as i64 + 1,
                product_id: line.product_id.clone(),
                name_snapshot: line.product_name.trim().to_string(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                discount_rate: line.discount_rate,
                tax_rate: line.tax_rate,
                discount_amount: amounts.discount,
                tax_amount: amounts.tax,
                line_total: amounts.total,
            };
            insert_item(&mut tx, &item).await?;
            items.push(item);
        }

        let bucket = SalesBucket::for_method(sale.payment_method);
        add_to_accumulator(&mut tx, &sale.session_id, bucket.column(), sale.total).await?;

        if sale.payment_method == PaymentMethod::Credit {
            if let Some(customer_id) = sale.customer_id.as_deref() {
                post_entry(
                    &mut tx,
                    PartyKind::Customer,
                    customer_id,
                    Some(sale.id.as_str()),
                    LedgerEntryKind::Charge,
                    sale.total,
                    Some(format!("Sale {}", sale.receipt_number).as_str()),
                )
                .await?;
            }
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            receipt_number = %sale.receipt_number,
            total = %sale.total,
            method = sale.payment_method.as_str(),
            items = items.len(),
            "Sale completed"
        );

        Ok(SaleDetail { sale, items })
    }

    /// Reverses a completed sale.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Sale doesn't exist
    /// * `Err(DbError::InvalidState)` - Already refunded, or a cash refund with no open session
    pub async fn refund_sale(&self, sale_id: &str, reason: &str) -> DbResult<SaleDetail> {
        validate_name("reason", reason)?;

        let mut tx = self.pool.begin().await?;

        let mut sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        if let Err(err) = sale.ensure_refundable() {
            warn!(sale_id = %sale_id, status = sale.status.as_str(), "Refund rejected");
            return Err(err.into());
        }

        let items = fetch_items(&mut tx, sale_id).await?;
        for item in &items {
            receive_stock(&mut tx, &item.product_id, item.quantity).await?;
        }

        match sale.payment_method {
            PaymentMethod::Cash => {
                let session = active_session(&mut tx).await?.ok_or_else(|| {
                    CoreError::invalid_state("A register session must be open to pay out a cash refund")
                })?;
                add_to_accumulator(&mut tx, &session.id, "refunds", sale.total).await?;
            }
            PaymentMethod::Credit => {
                if let Some(customer_id) = sale.customer_id.as_deref() {
                    post_entry(
                        &mut tx,
                        PartyKind::Customer,
                        customer_id,
                        Some(sale.id.as_str()),
                        LedgerEntryKind::Payment,
                        sale.total,
                        Some(format!("Refund {}", sale.receipt_number).as_str()),
                    )
                    .await?;
                }
            }
            PaymentMethod::Card => {}
        }

        let refunded_at = Utc::now();
        let reason = reason.trim().to_string();

        sqlx::query(
            r#"
            UPDATE sales SET
                status = 'refunded',
                refunded_at = ?2,
                refund_reason = ?3
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(sale_id)
        .bind(refunded_at)
        .bind(&reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        sale.status = SaleStatus::Refunded;
        sale.refunded_at = Some(refunded_at);
        sale.refund_reason = Some(reason);

        info!(
            sale_id = %sale.id,
            receipt_number = %sale.receipt_number,
            total = %sale.total,
            method = sale.payment_method.as_str(),
            "Sale refunded"
        );

        Ok(SaleDetail { sale, items })
    }

    /// Gets a sale with its line items.
    pub async fn get(&self, sale_id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;

        let sale = fetch_sale(&mut conn, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        let items = fetch_items(&mut conn, sale_id).await?;

        Ok(SaleDetail { sale, items })
    }

    /// Sales created within `range`, newest first, optionally by status.
    pub async fn list(
        &self,
        range: &DateRange,
        status: Option<SaleStatus>,
        limit: u32,
    ) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
              AND (?3 IS NULL OR status = ?3)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?4
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(range.from)
            .bind(range.to)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, receipt_number = %sale.receipt_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, session_id, customer_id, receipt_number,
            subtotal, tax_total, discount_total, total,
            amount_tendered, change, payment_method, status,
            created_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12,
            ?13
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.session_id)
    .bind(&sale.customer_id)
    .bind(&sale.receipt_number)
    .bind(sale.subtotal)
    .bind(sale.tax_total)
    .bind(sale.discount_total)
    .bind(sale.total)
    .bind(sale.amount_tendered)
    .bind(sale.change)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Snapshot pattern: name, price and rates are copied onto the line so later
/// product edits never rewrite a receipt.
async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, position, product_id, name_snapshot,
            quantity, unit_price, discount_rate, tax_rate,
            discount_amount, tax_amount, line_total
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(item.position)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.discount_rate)
    .bind(item.tax_rate)
    .bind(item.discount_amount)
    .bind(item.tax_amount)
    .bind(item.line_total)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_sale(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(sale)
}

async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT
            id, sale_id, position, product_id, name_snapshot,
            quantity, unit_price, discount_rate, tax_rate,
            discount_amount, tax_amount, line_total
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY position
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Report Repository
//!
//! Read-only aggregates for the back office. Nothing here writes.
//!
//! Sales figures only count `completed` sales; a refunded sale drops out of
//! every total once it is refunded.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::ledger::tables;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::session::SessionRepository;
use caja_core::report::{
    DailySales, Debtor, InventoryValuation, PaymentMethodTotal, SalesSummary, TopProduct,
};
use caja_core::session::summarize;
use caja_core::{DateRange, Money, PartyKind, Product, SessionSummary};

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Count and sums of completed sales, with the average ticket.
    pub async fn sales_summary(&self, range: &DateRange) -> DbResult<SalesSummary> {
        let (count, subtotal, tax_total, discount_total, total): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(subtotal), 0),
                    COALESCE(SUM(tax_total), 0),
                    COALESCE(SUM(discount_total), 0),
                    COALESCE(SUM(total), 0)
                FROM sales
                WHERE status = 'completed'
                  AND created_at >= ?1 AND created_at < ?2
                "#,
            )
            .bind(range.from)
            .bind(range.to)
            .fetch_one(&self.pool)
            .await?;

        debug!(count = count, total = total, "Sales summary");

        Ok(SalesSummary::from_sums(
            count,
            Money::from_cents(subtotal),
            Money::from_cents(tax_total),
            Money::from_cents(discount_total),
            Money::from_cents(total),
        ))
    }

    /// Completed sales per UTC day, oldest day first.
    pub async fn daily_sales(&self, range: &DateRange) -> DbResult<Vec<DailySales>> {
        let days = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT
                substr(created_at, 1, 10) AS day,
                COUNT(*) AS sale_count,
                COALESCE(SUM(total), 0) AS total
            FROM sales
            WHERE status = 'completed'
              AND created_at >= ?1 AND created_at < ?2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(days)
    }

    pub async fn sales_by_payment_method(
        &self,
        range: &DateRange,
    ) -> DbResult<Vec<PaymentMethodTotal>> {
        let totals = sqlx::query_as::<_, PaymentMethodTotal>(
            r#"
            SELECT
                payment_method,
                COUNT(*) AS sale_count,
                COALESCE(SUM(total), 0) AS total
            FROM sales
            WHERE status = 'completed'
              AND created_at >= ?1 AND created_at < ?2
            GROUP BY payment_method
            ORDER BY total DESC
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Best sellers by quantity. Products renamed since the sale show
    /// their current name.
    pub async fn top_products(&self, range: &DateRange, limit: u32) -> DbResult<Vec<TopProduct>> {
        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                si.product_id AS product_id,
                COALESCE(p.name, MAX(si.name_snapshot)) AS name,
                SUM(si.quantity) AS quantity,
                SUM(si.line_total) AS revenue
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            LEFT JOIN products p ON p.id = si.product_id
            WHERE s.status = 'completed'
              AND s.created_at >= ?1 AND s.created_at < ?2
            GROUP BY si.product_id
            ORDER BY quantity DESC, revenue DESC
            LIMIT ?3
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Stock on hand of active products, at cost and at selling price.
    ///
    /// Negative stock on untracked products counts as zero.
    pub async fn inventory_valuation(&self) -> DbResult<InventoryValuation> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut valuation = InventoryValuation {
            product_count: products.len() as i64,
            cost_value: Money::zero(),
            retail_value: Money::zero(),
        };
        for product in products.iter().filter(|p| p.stock.is_positive()) {
            valuation.cost_value = valuation
                .cost_value
                .saturating_add(product.cost_price.times(product.stock));
            valuation.retail_value = valuation
                .retail_value
                .saturating_add(product.base_price.times(product.stock));
        }

        Ok(valuation)
    }

    /// Tracked, active products at or below their minimum, emptiest first.
    pub async fn low_stock(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE is_active = 1
              AND track_inventory = 1
              AND stock <= min_stock
            ORDER BY stock, name
            LIMIT ?1
            "#,
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Customers who owe us, or suppliers we owe, largest balance first.
    pub async fn debtors(&self, kind: PartyKind) -> DbResult<Vec<Debtor>> {
        let sql = format!(
            r#"
            SELECT id, name, phone, current_balance
            FROM {}
            WHERE current_balance > 0
            ORDER BY current_balance DESC, name
            "#,
            tables(kind).party
        );
        let debtors = sqlx::query_as::<_, Debtor>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(debtors)
    }

    /// Sessions opened within `range`, newest first, with drawer figures.
    pub async fn session_history(
        &self,
        range: &DateRange,
        limit: u32,
    ) -> DbResult<Vec<SessionSummary>> {
        let sessions = SessionRepository::new(self.pool.clone())
            .list(range, limit)
            .await?;

        Ok(sessions.iter().map(summarize).collect())
    }
}

//! # Product Repository
//!
//! Database operations for products and their stock.
//!
//! ## Key Operations
//! - CRUD and search (name / SKU / barcode substring)
//! - Manual stock adjustments with an audit row
//! - Stock movement helpers used by the posting transactions
//!
//! ## Stock Floor
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Delta update with the floor in the WHERE clause:                       │
//! │                                                                         │
//! │     UPDATE products SET stock = stock - :qty                            │
//! │     WHERE id = :id AND (track_inventory = 0 OR stock >= :qty)           │
//! │                                                                         │
//! │  0 rows affected → product missing (NotFound) or short (OutOfStock).   │
//! │  The check and the write are one statement inside the posting's        │
//! │  transaction, so no caller can slip between them.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{clean_optional, contains_pattern};
use caja_core::validation::{
    validate_name, validate_product_input, validate_quantity_ceiling, validate_search_query,
};
use caja_core::{Product, ProductInput, Quantity, StockAdjustment, ValidationError};

pub(crate) const PRODUCT_COLUMNS: &str = r#"
    id, name, sku, barcode, category_id,
    base_price, cost_price, tax_rate,
    stock, min_stock, track_inventory, is_active,
    created_at, updated_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("yerba", 20).await?;
/// let product = repo.get("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product with zero stock.
    ///
    /// Opening stock goes through [`adjust_stock`](Self::adjust_stock) or a
    /// purchase, so every unit on the shelf has an audit trail.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU or barcode already exists
    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        validate_product_input(input)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %input.name, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sku, barcode, category_id,
                base_price, cost_price, tax_rate,
                stock, min_stock, track_inventory, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                0, ?9, ?10, 1,
                ?11, ?11
            )
            "#,
        )
        .bind(&id)
        .bind(input.name.trim())
        .bind(clean_optional(input.sku.as_deref()))
        .bind(clean_optional(input.barcode.as_deref()))
        .bind(clean_optional(input.category_id.as_deref()))
        .bind(input.base_price)
        .bind(input.cost_price)
        .bind(input.tax_rate)
        .bind(input.min_stock)
        .bind(input.track_inventory)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(&id).await
    }

    /// Updates catalogue fields. Stock is never touched here.
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        validate_product_input(input)?;

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                sku = ?3,
                barcode = ?4,
                category_id = ?5,
                base_price = ?6,
                cost_price = ?7,
                tax_rate = ?8,
                min_stock = ?9,
                track_inventory = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(clean_optional(input.sku.as_deref()))
        .bind(clean_optional(input.barcode.as_deref()))
        .bind(clean_optional(input.category_id.as_deref()))
        .bind(input.base_price)
        .bind(input.cost_price)
        .bind(input.tax_rate)
        .bind(input.min_stock)
        .bind(input.track_inventory)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by ID, failing with NotFound.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Looks a product up by exact barcode or SKU (scanner input).
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {} FROM products WHERE barcode = ?1 OR sku = ?1 ORDER BY barcode = ?1 DESC LIMIT 1",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Searches active products by name, SKU or barcode substring.
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE is_active = 1
              AND (name LIKE ?1 ESCAPE '\' OR sku LIKE ?1 ESCAPE '\' OR barcode LIKE ?1 ESCAPE '\')
            ORDER BY name
            LIMIT ?2
            "#,
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(contains_pattern(&query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Soft-deletes a product. Historical line items keep referencing it.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Corrects stock by a signed delta and records why.
    ///
    /// The adjustment row and the stock change commit together. Tracked
    /// products may not go below zero.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        delta: Quantity,
        reason: &str,
    ) -> DbResult<StockAdjustment> {
        if delta.is_zero() {
            return Err(ValidationError::InvalidFormat {
                field: "delta".to_string(),
                reason: "must not be zero".to_string(),
            }
            .into());
        }
        validate_quantity_ceiling("delta", delta)?;
        validate_name("reason", reason)?;

        let mut tx = self.pool.begin().await?;

        apply_stock_delta(&mut tx, product_id, delta).await?;

        let adjustment = StockAdjustment {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            delta,
            reason: reason.trim().to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO stock_adjustments (id, product_id, delta, reason, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&adjustment.id)
        .bind(&adjustment.product_id)
        .bind(adjustment.delta)
        .bind(&adjustment.reason)
        .bind(adjustment.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(product_id = %product_id, delta = %delta, "Stock adjusted");
        Ok(adjustment)
    }

    /// Adjustment history for a product, newest first.
    pub async fn list_adjustments(&self, product_id: &str) -> DbResult<Vec<StockAdjustment>> {
        let adjustments = sqlx::query_as::<_, StockAdjustment>(
            r#"
            SELECT id, product_id, delta, reason, created_at
            FROM stock_adjustments
            WHERE product_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(adjustments)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Posting Helpers
// =============================================================================

/// Takes `quantity` off the shelf inside a posting transaction.
pub(crate) async fn release_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: Quantity,
) -> DbResult<()> {
    apply_stock_delta(conn, product_id, -quantity).await
}

/// Puts `quantity` back on the shelf inside a posting transaction.
pub(crate) async fn receive_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: Quantity,
) -> DbResult<()> {
    apply_stock_delta(conn, product_id, quantity).await
}

/// Applies a signed stock delta, refusing to take a tracked product below zero.
async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: Quantity,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2,
            updated_at = ?3
        WHERE id = ?1
          AND (track_inventory = 0 OR stock + ?2 >= 0)
        "#,
    )
    .bind(product_id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))?;

    warn!(product_id = %product_id, stock = %product.stock, delta = %delta, "Stock floor reached");
    product.ensure_can_release(-delta)?;

    // The guarded UPDATE refused a delta the row itself allows.
    Err(DbError::Internal(format!(
        "Stock update for product {} was not applied",
        product_id
    )))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{product, setup};
    use caja_core::{Money, Rate};

    fn input(name: &str, sku: Option<&str>) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            sku: sku.map(str::to_string),
            barcode: None,
            category_id: None,
            base_price: Money::from_cents(1250),
            cost_price: Money::from_cents(800),
            tax_rate: Rate::from_percent(21),
            min_stock: Quantity::zero(),
            track_inventory: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_search() {
        let db = setup().await;
        let repo = db.products();

        let created = repo.create(&input("Yerba Mate 1kg", Some("YM-1"))).await.unwrap();
        repo.create(&input("Azucar 1kg", Some("AZ-1"))).await.unwrap();

        assert!(created.stock.is_zero());
        assert!(created.is_active);

        let results = repo.search("mate", 20).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, created.id);

        let by_sku = repo.search("az-", 20).await.unwrap();
        assert_eq!(by_sku.len(), 1);

        assert_eq!(repo.search("", 20).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = setup().await;
        let repo = db.products();

        repo.create(&input("Leche", Some("LE-1"))).await.unwrap();
        let err = repo.create(&input("Leche descremada", Some("LE-1"))).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Blank codes are stored as NULL and never collide.
        repo.create(&input("Pan", Some(" "))).await.unwrap();
        repo.create(&input("Facturas", Some(""))).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_by_code() {
        let db = setup().await;
        let repo = db.products();

        let mut with_barcode = input("Galletitas", Some("GA-1"));
        with_barcode.barcode = Some("7790001112223".to_string());
        let created = repo.create(&with_barcode).await.unwrap();

        assert_eq!(repo.find_by_code("7790001112223").await.unwrap().unwrap().id, created.id);
        assert_eq!(repo.find_by_code("GA-1").await.unwrap().unwrap().id, created.id);
        assert!(repo.find_by_code("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivated_products_leave_search() {
        let db = setup().await;
        let p = product(&db, "Fideos", 300, 0).await;

        db.products().deactivate(&p.id).await.unwrap();
        assert!(db.products().search("fideos", 10).await.unwrap().is_empty());
        assert!(!db.products().get(&p.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_adjust_stock_respects_floor() {
        let db = setup().await;
        let p = product(&db, "Arroz", 500, 3).await;
        let repo = db.products();

        let err = repo
            .adjust_stock(&p.id, Quantity::from_units(-4), "Breakage")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::OutOfStock { .. }));
        assert_eq!(repo.get(&p.id).await.unwrap().stock, Quantity::from_units(3));

        repo.adjust_stock(&p.id, Quantity::from_milli(-2500), "Count correction")
            .await
            .unwrap();
        assert_eq!(repo.get(&p.id).await.unwrap().stock, Quantity::from_milli(500));

        // Initial count + correction; the failed attempt left no row.
        assert_eq!(repo.list_adjustments(&p.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_untracked_product_may_go_negative() {
        let db = setup().await;
        let mut untracked = input("Servicio de envio", None);
        untracked.track_inventory = false;
        let p = db.products().create(&untracked).await.unwrap();

        db.products()
            .adjust_stock(&p.id, Quantity::from_units(-1), "Manual")
            .await
            .unwrap();
        assert!(db.products().get(&p.id).await.unwrap().stock.is_negative());
    }

    #[tokio::test]
    async fn test_adjust_missing_product() {
        let db = setup().await;
        let err = db
            .products()
            .adjust_stock("missing", Quantity::from_units(1), "Count")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}

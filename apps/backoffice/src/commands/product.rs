//! # Product Commands
//!
//! Catalogue CRUD, search and manual stock adjustments.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Search Flow                                  │
//! │                                                                         │
//! │  search_products { query: "7790001234567" }                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────┐                         │
//! │  │  Is query a barcode? (8-13 digits)        │                         │
//! │  │  YES: Try exact barcode/SKU lookup first  │──► Found? Return [1]    │
//! │  │  NO:  Substring search on name/SKU/code   │                         │
//! │  └───────────────────────────────────────────┘                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<Product>, active only, by name                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use caja_core::{Product, ProductInput, Quantity, StockAdjustment};
use caja_db::DEFAULT_LIST_LIMIT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::{resolve_limit, IdArgs, SearchArgs};
use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductArgs {
    pub id: String,
    #[serde(flatten)]
    pub input: ProductInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindProductArgs {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockArgs {
    pub product_id: String,
    /// Signed: positive adds stock, negative removes it.
    pub delta: Quantity,
    pub reason: String,
}

/// Checks if a query looks like a barcode (8-13 numeric digits).
///
/// Covers EAN-8, UPC-A and EAN-13. Scanners type the whole code at once,
/// so an exact lookup answers before any substring search is needed.
fn is_barcode_query(query: &str) -> bool {
    let len = query.len();
    (8..=13).contains(&len) && query.chars().all(|c| c.is_ascii_digit())
}

pub async fn create_product(db: &DbState, input: ProductInput) -> Result<Product, ApiError> {
    debug!(name = %input.name, "create_product command");

    let product = db.inner().products().create(&input).await?;

    info!(id = %product.id, name = %product.name, "Product created");
    Ok(product)
}

pub async fn update_product(db: &DbState, args: UpdateProductArgs) -> Result<Product, ApiError> {
    debug!(id = %args.id, "update_product command");

    Ok(db.inner().products().update(&args.id, &args.input).await?)
}

pub async fn get_product(db: &DbState, args: IdArgs) -> Result<Product, ApiError> {
    Ok(db.inner().products().get(&args.id).await?)
}

/// Exact barcode or SKU match; `None` when nothing matches.
pub async fn find_product(db: &DbState, args: FindProductArgs) -> Result<Option<Product>, ApiError> {
    Ok(db.inner().products().find_by_code(args.code.trim()).await?)
}

pub async fn search_products(db: &DbState, args: SearchArgs) -> Result<Vec<Product>, ApiError> {
    let start = Instant::now();
    let query = args.query.trim();
    let limit = resolve_limit(args.limit, DEFAULT_LIST_LIMIT);

    debug!(query = %query, limit = %limit, "search_products command");

    let products = db.inner().products();

    if is_barcode_query(query) {
        debug!(barcode = %query, "Detected barcode pattern, trying exact lookup");
        if let Some(product) = products.find_by_code(query).await? {
            if product.is_active {
                return Ok(vec![product]);
            }
        }
        debug!("Barcode not found, falling back to substring search");
    }

    let results = products.search(query, limit).await?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = results.len(),
        query = %query,
        "search_products complete"
    );

    Ok(results)
}

pub async fn deactivate_product(db: &DbState, args: IdArgs) -> Result<(), ApiError> {
    debug!(id = %args.id, "deactivate_product command");

    Ok(db.inner().products().deactivate(&args.id).await?)
}

pub async fn adjust_stock(db: &DbState, args: AdjustStockArgs) -> Result<StockAdjustment, ApiError> {
    debug!(product_id = %args.product_id, delta = %args.delta, "adjust_stock command");

    Ok(db
        .inner()
        .products()
        .adjust_stock(&args.product_id, args.delta, &args.reason)
        .await?)
}

pub async fn list_adjustments(db: &DbState, args: IdArgs) -> Result<Vec<StockAdjustment>, ApiError> {
    Ok(db.inner().products().list_adjustments(&args.id).await?)
}

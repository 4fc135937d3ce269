//! # Report Commands
//!
//! Thin wrappers over `ReportRepository`; all read-only.

use caja_core::report::{
    DailySales, Debtor, InventoryValuation, PaymentMethodTotal, SalesSummary, TopProduct,
};
use caja_core::{PartyKind, Product, SessionSummary};
use caja_db::DEFAULT_LIST_LIMIT;
use serde::{Deserialize, Serialize};

use crate::commands::{resolve_limit, ListArgs, RangeArgs};
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// Default size of the best-seller list.
const TOP_PRODUCTS_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitArgs {
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorsArgs {
    pub kind: PartyKind,
}

pub async fn sales_summary(db: &DbState, args: RangeArgs) -> Result<SalesSummary, ApiError> {
    Ok(db.inner().reports().sales_summary(&args.to_range()?).await?)
}

pub async fn daily_sales(db: &DbState, args: RangeArgs) -> Result<Vec<DailySales>, ApiError> {
    Ok(db.inner().reports().daily_sales(&args.to_range()?).await?)
}

pub async fn sales_by_payment_method(
    db: &DbState,
    args: RangeArgs,
) -> Result<Vec<PaymentMethodTotal>, ApiError> {
    Ok(db
        .inner()
        .reports()
        .sales_by_payment_method(&args.to_range()?)
        .await?)
}

pub async fn top_products(db: &DbState, args: ListArgs) -> Result<Vec<TopProduct>, ApiError> {
    let range = args.range.to_range()?;
    let limit = resolve_limit(args.limit, TOP_PRODUCTS_LIMIT);

    Ok(db.inner().reports().top_products(&range, limit).await?)
}

pub async fn inventory_valuation(db: &DbState) -> Result<InventoryValuation, ApiError> {
    Ok(db.inner().reports().inventory_valuation().await?)
}

pub async fn low_stock(
    db: &DbState,
    config: &ConfigState,
    args: LimitArgs,
) -> Result<Vec<Product>, ApiError> {
    let limit = resolve_limit(args.limit, config.low_stock_limit);
    Ok(db.inner().reports().low_stock(limit).await?)
}

pub async fn debtors(db: &DbState, args: DebtorsArgs) -> Result<Vec<Debtor>, ApiError> {
    Ok(db.inner().reports().debtors(args.kind).await?)
}

pub async fn session_history(
    db: &DbState,
    args: ListArgs,
) -> Result<Vec<SessionSummary>, ApiError> {
    let range = args.range.to_range()?;
    let limit = resolve_limit(args.limit, DEFAULT_LIST_LIMIT);

    Ok(db.inner().reports().session_history(&range, limit).await?)
}

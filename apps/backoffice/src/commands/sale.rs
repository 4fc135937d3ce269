//! # Sale Commands
//!
//! Posting, refunds and lookups. The posting itself (stock, drawer,
//! ledger, receipt number) happens in one transaction inside
//! `SaleRepository::complete_sale`; this layer only adds display fields.

use caja_core::{NewSale, Sale, SaleDetail, SaleStatus};
use caja_db::DEFAULT_LIST_LIMIT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::{resolve_limit, IdArgs, RangeArgs};
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// A posted sale plus the figures a receipt prints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    #[serde(flatten)]
    pub detail: SaleDetail,
    pub store_name: String,
    pub total_display: String,
    pub change_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundSaleArgs {
    pub sale_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSalesArgs {
    #[serde(flatten)]
    pub range: RangeArgs,
    #[serde(default)]
    pub status: Option<SaleStatus>,
    #[serde(default)]
    pub limit: Option<u32>,
}

pub async fn complete_sale(
    db: &DbState,
    config: &ConfigState,
    new_sale: NewSale,
) -> Result<SaleReceipt, ApiError> {
    debug!(
        session_id = %new_sale.session_id,
        items = new_sale.items.len(),
        method = new_sale.payment_method.as_str(),
        "complete_sale command"
    );

    let detail = db.inner().sales().complete_sale(&new_sale).await?;

    let receipt = SaleReceipt {
        store_name: config.store_name.clone(),
        total_display: config.format_currency(detail.sale.total),
        change_display: config.format_currency(detail.sale.change),
        detail,
    };

    info!(
        receipt_number = %receipt.detail.sale.receipt_number,
        total = %receipt.total_display,
        "complete_sale done"
    );
    Ok(receipt)
}

pub async fn refund_sale(db: &DbState, args: RefundSaleArgs) -> Result<SaleDetail, ApiError> {
    debug!(sale_id = %args.sale_id, "refund_sale command");

    Ok(db.inner().sales().refund_sale(&args.sale_id, &args.reason).await?)
}

pub async fn get_sale(db: &DbState, args: IdArgs) -> Result<SaleDetail, ApiError> {
    debug!(id = %args.id, "get_sale command");

    Ok(db.inner().sales().get(&args.id).await?)
}

pub async fn list_sales(db: &DbState, args: ListSalesArgs) -> Result<Vec<Sale>, ApiError> {
    let range = args.range.to_range()?;
    let limit = resolve_limit(args.limit, DEFAULT_LIST_LIMIT);

    Ok(db.inner().sales().list(&range, args.status, limit).await?)
}

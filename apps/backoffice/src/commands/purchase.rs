//! # Purchase Commands

use caja_core::{NewPurchase, Purchase, PurchaseDetail, PurchaseStatus};
use caja_db::DEFAULT_LIST_LIMIT;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::{resolve_limit, IdArgs, RangeArgs};
use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePurchaseStatusArgs {
    pub id: String,
    pub status: PurchaseStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPurchasesArgs {
    #[serde(flatten)]
    pub range: RangeArgs,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

pub async fn create_purchase(
    db: &DbState,
    new_purchase: NewPurchase,
) -> Result<PurchaseDetail, ApiError> {
    debug!(
        supplier_id = %new_purchase.supplier_id,
        items = new_purchase.items.len(),
        "create_purchase command"
    );

    Ok(db.inner().purchases().create_purchase(&new_purchase).await?)
}

/// Only `cancelled` is accepted as a target status.
pub async fn update_purchase_status(
    db: &DbState,
    args: UpdatePurchaseStatusArgs,
) -> Result<PurchaseDetail, ApiError> {
    debug!(id = %args.id, status = args.status.as_str(), "update_purchase_status command");

    Ok(db
        .inner()
        .purchases()
        .update_status(&args.id, args.status)
        .await?)
}

pub async fn get_purchase(db: &DbState, args: IdArgs) -> Result<PurchaseDetail, ApiError> {
    Ok(db.inner().purchases().get(&args.id).await?)
}

pub async fn list_purchases(
    db: &DbState,
    args: ListPurchasesArgs,
) -> Result<Vec<Purchase>, ApiError> {
    let range = args.range.to_range()?;
    let limit = resolve_limit(args.limit, DEFAULT_LIST_LIMIT);

    Ok(db
        .inner()
        .purchases()
        .list(&range, args.supplier_id.as_deref(), limit)
        .await?)
}

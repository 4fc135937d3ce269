//! # Category Commands

use caja_core::Category;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::IdArgs;
use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryArgs {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameCategoryArgs {
    pub id: String,
    pub name: String,
}

pub async fn create_category(db: &DbState, args: CreateCategoryArgs) -> Result<Category, ApiError> {
    debug!(name = %args.name, "create_category command");

    Ok(db.inner().categories().create(&args.name).await?)
}

pub async fn list_categories(db: &DbState) -> Result<Vec<Category>, ApiError> {
    Ok(db.inner().categories().list().await?)
}

pub async fn rename_category(db: &DbState, args: RenameCategoryArgs) -> Result<Category, ApiError> {
    Ok(db.inner().categories().rename(&args.id, &args.name).await?)
}

/// Products in the category are kept and detached.
pub async fn delete_category(db: &DbState, args: IdArgs) -> Result<(), ApiError> {
    debug!(id = %args.id, "delete_category command");

    Ok(db.inner().categories().delete(&args.id).await?)
}

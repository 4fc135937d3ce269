//! # Party Commands
//!
//! Customer and supplier CRUD. Each function is generic over the record
//! type; the dispatcher picks `db.customers()` or `db.suppliers()`.

use caja_core::PartyInput;
use caja_db::{PartyRecord, PartyRepository, DEFAULT_LIST_LIMIT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::{resolve_limit, IdArgs, SearchArgs};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartyArgs {
    pub id: String,
    #[serde(flatten)]
    pub input: PartyInput,
}

pub async fn create<P: PartyRecord>(
    repo: PartyRepository<P>,
    input: PartyInput,
) -> Result<P, ApiError> {
    debug!(kind = ?P::KIND, name = %input.name, "create party command");

    Ok(repo.create(&input).await?)
}

pub async fn update<P: PartyRecord>(
    repo: PartyRepository<P>,
    args: UpdatePartyArgs,
) -> Result<P, ApiError> {
    debug!(kind = ?P::KIND, id = %args.id, "update party command");

    Ok(repo.update(&args.id, &args.input).await?)
}

pub async fn get<P: PartyRecord>(repo: PartyRepository<P>, args: IdArgs) -> Result<P, ApiError> {
    Ok(repo.get(&args.id).await?)
}

pub async fn search<P: PartyRecord>(
    repo: PartyRepository<P>,
    args: SearchArgs,
) -> Result<Vec<P>, ApiError> {
    let limit = resolve_limit(args.limit, DEFAULT_LIST_LIMIT);
    Ok(repo.search(&args.query, limit).await?)
}

pub async fn deactivate<P: PartyRecord>(
    repo: PartyRepository<P>,
    args: IdArgs,
) -> Result<(), ApiError> {
    debug!(kind = ?P::KIND, id = %args.id, "deactivate party command");

    Ok(repo.deactivate(&args.id).await?)
}

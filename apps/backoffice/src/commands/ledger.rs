//! # Ledger Commands
//!
//! Account statements and payments for both customers and suppliers,
//! selected by `kind`.

use caja_core::{BalanceCheck, LedgerEntry, Money, PartyKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyArgs {
    pub kind: PartyKind,
    pub party_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPaymentArgs {
    pub kind: PartyKind,
    pub party_id: String,
    pub amount: Money,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn register_payment(
    db: &DbState,
    args: RegisterPaymentArgs,
) -> Result<LedgerEntry, ApiError> {
    debug!(kind = ?args.kind, party_id = %args.party_id, amount = %args.amount, "register_payment command");

    Ok(db
        .inner()
        .ledger()
        .register_payment(args.kind, &args.party_id, args.amount, args.notes.as_deref())
        .await?)
}

/// Newest entry first.
pub async fn get_ledger(db: &DbState, args: PartyArgs) -> Result<Vec<LedgerEntry>, ApiError> {
    Ok(db.inner().ledger().get_ledger(args.kind, &args.party_id).await?)
}

pub async fn recompute_balance(db: &DbState, args: PartyArgs) -> Result<BalanceCheck, ApiError> {
    let check = db
        .inner()
        .ledger()
        .recompute_balance(args.kind, &args.party_id)
        .await?;

    if !check.is_consistent() {
        warn!(
            kind = ?check.kind,
            party_id = %check.party_id,
            stored = %check.stored,
            computed = %check.computed,
            "Stored balance differs from ledger"
        );
    }

    Ok(check)
}

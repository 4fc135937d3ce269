//! # Register Session Commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Drawer Lifecycle                                     │
//! │                                                                         │
//! │  open_session(openingFloat)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [open] ◄── add_movement(in/out) ◄── complete_sale / refund_sale      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  close_session(closingFloat) ─► expectedFloat frozen, discrepancy     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [closed] (terminal)                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use caja_core::session::summarize;
use caja_core::{CashMovement, Money, MovementKind, RegisterSession, SessionSummary};
use caja_db::DEFAULT_LIST_LIMIT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::{resolve_limit, IdArgs, ListArgs};
use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionArgs {
    pub opening_float: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionArgs {
    pub session_id: String,
    pub closing_float: Money,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMovementArgs {
    pub session_id: String,
    pub amount: Money,
    pub kind: MovementKind,
    pub reason: String,
}

/// A session with its drawer figures and movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session: RegisterSession,
    pub summary: SessionSummary,
    pub movements: Vec<CashMovement>,
}

pub async fn open_session(db: &DbState, args: OpenSessionArgs) -> Result<RegisterSession, ApiError> {
    debug!(opening_float = %args.opening_float, "open_session command");

    let session = db.inner().sessions().open(args.opening_float).await?;

    info!(session_id = %session.id, "Register session opened");
    Ok(session)
}

pub async fn close_session(
    db: &DbState,
    args: CloseSessionArgs,
) -> Result<RegisterSession, ApiError> {
    debug!(session_id = %args.session_id, "close_session command");

    let session = db
        .inner()
        .sessions()
        .close(&args.session_id, args.closing_float, args.notes.as_deref())
        .await?;

    info!(
        session_id = %session.id,
        discrepancy = ?session.discrepancy(),
        "Register session closed"
    );
    Ok(session)
}

pub async fn add_movement(db: &DbState, args: AddMovementArgs) -> Result<CashMovement, ApiError> {
    debug!(session_id = %args.session_id, kind = ?args.kind, "add_movement command");

    let movement = db
        .inner()
        .sessions()
        .add_movement(&args.session_id, args.amount, args.kind, &args.reason)
        .await?;

    Ok(movement)
}

/// The open session, if any.
pub async fn get_active_session(db: &DbState) -> Result<Option<SessionView>, ApiError> {
    debug!("get_active_session command");

    match db.inner().sessions().get_active().await? {
        Some(session) => Ok(Some(view(db, session).await?)),
        None => Ok(None),
    }
}

pub async fn get_session(db: &DbState, args: IdArgs) -> Result<SessionView, ApiError> {
    debug!(id = %args.id, "get_session command");

    let session = db.inner().sessions().get(&args.id).await?;
    view(db, session).await
}

pub async fn list_sessions(db: &DbState, args: ListArgs) -> Result<Vec<RegisterSession>, ApiError> {
    let range = args.range.to_range()?;
    let limit = resolve_limit(args.limit, DEFAULT_LIST_LIMIT);

    Ok(db.inner().sessions().list(&range, limit).await?)
}

async fn view(db: &DbState, session: RegisterSession) -> Result<SessionView, ApiError> {
    let movements = db.inner().sessions().list_movements(&session.id).await?;
    Ok(SessionView {
        summary: summarize(&session),
        session,
        movements,
    })
}

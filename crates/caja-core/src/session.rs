//! # Register Sessions
//!
//! A register session is one stretch of cash-drawer activity, from the
//! opening float to the counted close.
//!
//! ## Drawer Arithmetic
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  expected_float = opening_float                                         │
//! │                 + cash_sales                                            │
//! │                 - refunds                                               │
//! │                 + cash_in                                               │
//! │                 - cash_out                                              │
//! │                                                                         │
//! │  discrepancy    = closing_float - expected_float   (informational)     │
//! │                                                                         │
//! │  card_sales and other_sales never touch the drawer.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PaymentMethod;

/// Whether a session still accepts sales and movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// A cash-drawer session with its running accumulators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RegisterSession {
    pub id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub opening_float: Money,
    pub cash_sales: Money,
    pub card_sales: Money,
    /// Sales on account (credit) and any method that is neither cash nor card.
    pub other_sales: Money,
    /// Cash handed back to customers for refunded sales.
    pub refunds: Money,
    pub cash_in: Money,
    pub cash_out: Money,
    /// What the cashier counted at close.
    pub closing_float: Option<Money>,
    /// What the drawer should have held at close, frozen at close time.
    pub expected_float: Option<Money>,
    pub status: SessionStatus,
    pub notes: Option<String>,
}

impl RegisterSession {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Postings, movements and closing all need an open session.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if !self.is_open() {
            return Err(CoreError::invalid_state(format!(
                "Register session {} is closed",
                self.id
            )));
        }
        Ok(())
    }

    /// Expected drawer contents computed from the current accumulators.
    pub fn compute_expected_float(&self) -> Money {
        self.opening_float + self.cash_sales - self.refunds + self.cash_in - self.cash_out
    }

    /// All sales recorded in the session regardless of method.
    pub fn total_sales(&self) -> Money {
        self.cash_sales + self.card_sales + self.other_sales
    }

    /// `closing_float - expected_float`, once the session is closed.
    ///
    /// Positive means the drawer held more than expected.
    pub fn discrepancy(&self) -> Option<Money> {
        match (self.closing_float, self.expected_float) {
            (Some(counted), Some(expected)) => Some(counted - expected),
            _ => None,
        }
    }
}

/// Only one session may be open at a time.
pub fn ensure_none_open(active: Option<&RegisterSession>) -> CoreResult<()> {
    match active {
        Some(open) => Err(CoreError::invalid_state(format!(
            "Register session {} is already open",
            open.id
        ))),
        None => Ok(()),
    }
}

/// Session accumulator a sale total lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesBucket {
    Cash,
    Card,
    Other,
}

impl SalesBucket {
    /// Credit sales are tracked as "other" sales.
    pub fn for_method(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => SalesBucket::Cash,
            PaymentMethod::Card => SalesBucket::Card,
            PaymentMethod::Credit => SalesBucket::Other,
        }
    }

    /// Column holding this bucket in `register_sessions`.
    pub fn column(&self) -> &'static str {
        match self {
            SalesBucket::Cash => "cash_sales",
            SalesBucket::Card => "card_sales",
            SalesBucket::Other => "other_sales",
        }
    }
}

// =============================================================================
// Cash Movements
// =============================================================================

/// Direction of a manual drawer movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    In,
    Out,
}

impl MovementKind {
    /// Session accumulator this movement increments.
    pub fn column(&self) -> &'static str {
        match self {
            MovementKind::In => "cash_in",
            MovementKind::Out => "cash_out",
        }
    }
}

/// Cash added to or withdrawn from the drawer outside of a sale.
/// Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub session_id: String,
    /// Always positive; the direction is carried by `kind`.
    pub amount: Money,
    pub kind: MovementKind,
    pub reason: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Summary
// =============================================================================

/// Drawer figures for display, open or closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionSummary {
    pub session_id: String,
    pub status: SessionStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub total_sales: Money,
    /// Stored value once closed, live computation while open.
    pub expected_float: Money,
    pub closing_float: Option<Money>,
    pub discrepancy: Option<Money>,
}

/// Summarizes a session's drawer position.
pub fn summarize(session: &RegisterSession) -> SessionSummary {
    SessionSummary {
        session_id: session.id.clone(),
        status: session.status,
        opened_at: session.opened_at,
        closed_at: session.closed_at,
        total_sales: session.total_sales(),
        expected_float: session
            .expected_float
            .unwrap_or_else(|| session.compute_expected_float()),
        closing_float: session.closing_float,
        discrepancy: session.discrepancy(),
    }
}

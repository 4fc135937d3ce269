//! # Register Session Repository
//!
//! Opening, cash movements and closing of the cash drawer.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle                                 │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open(float) → status: open, accumulators at zero               │
//! │         (rejected while another session is open)                       │
//! │                                                                         │
//! │  2. ACTIVITY (each in its own transaction)                             │
//! │     ├── add_movement(in/out)   → cash_in / cash_out += amount          │
//! │     ├── complete_sale          → cash/card/other_sales += total        │
//! │     └── refund_sale (cash)     → refunds += total                      │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── close(counted) → expected_float frozen, status: closed         │
//! │         discrepancy = counted - expected (informational)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::clean_optional;
use caja_core::session::ensure_none_open;
use caja_core::validation::{validate_name, validate_non_negative_amount, validate_positive_amount};
use caja_core::{
    CashMovement, DateRange, Money, MovementKind, RegisterSession, SessionStatus,
};

const SESSION_COLUMNS: &str = r#"
    id, opened_at, closed_at, opening_float,
    cash_sales, card_sales, other_sales, refunds, cash_in, cash_out,
    closing_float, expected_float, status, notes
"#;

/// Repository for register sessions and cash movements.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Opens a new session with every accumulator at zero.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidState)` - A session is already open
    pub async fn open(&self, opening_float: Money) -> DbResult<RegisterSession> {
        validate_non_negative_amount("openingFloat", opening_float)?;

        let mut tx = self.pool.begin().await?;

        let active = active_session(&mut tx).await?;
        if let Some(open) = &active {
            warn!(session_id = %open.id, "Refusing to open a second session");
        }
        ensure_none_open(active.as_ref())?;

        let session = RegisterSession {
            id: Uuid::new_v4().to_string(),
            opened_at: Utc::now(),
            closed_at: None,
            opening_float,
            cash_sales: Money::zero(),
            card_sales: Money::zero(),
            other_sales: Money::zero(),
            refunds: Money::zero(),
            cash_in: Money::zero(),
            cash_out: Money::zero(),
            closing_float: None,
            expected_float: None,
            status: SessionStatus::Open,
            notes: None,
        };

        // The partial unique index on status backs the pre-check above.
        sqlx::query(
            r#"
            INSERT INTO register_sessions (id, opened_at, opening_float, status)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&session.id)
        .bind(session.opened_at)
        .bind(session.opening_float)
        .bind(session.status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(session_id = %session.id, opening_float = %opening_float, "Register session opened");
        Ok(session)
    }

    /// Records cash put into or taken out of the drawer.
    pub async fn add_movement(
        &self,
        session_id: &str,
        amount: Money,
        kind: MovementKind,
        reason: &str,
    ) -> DbResult<CashMovement> {
        validate_positive_amount("amount", amount)?;
        validate_name("reason", reason)?;

        let mut tx = self.pool.begin().await?;

        require_open_session(&mut tx, session_id).await?;

        let movement = CashMovement {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            amount,
            kind,
            reason: reason.trim().to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO cash_movements (id, session_id, amount, kind, reason, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.session_id)
        .bind(movement.amount)
        .bind(movement.kind)
        .bind(&movement.reason)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        add_to_accumulator(&mut tx, session_id, kind.column(), amount).await?;

        tx.commit().await?;

        info!(
            session_id = %session_id,
            kind = ?kind,
            amount = %amount,
            "Cash movement recorded"
        );
        Ok(movement)
    }

    /// Closes a session, freezing the expected float.
    ///
    /// A counted float that differs from the expected one is accepted; the
    /// difference is reported, never rejected.
    pub async fn close(
        &self,
        session_id: &str,
        closing_float: Money,
        notes: Option<&str>,
    ) -> DbResult<RegisterSession> {
        validate_non_negative_amount("closingFloat", closing_float)?;

        let mut tx = self.pool.begin().await?;

        let mut session = require_open_session(&mut tx, session_id).await?;

        let expected_float = session.compute_expected_float();
        let closed_at = Utc::now();
        let notes = clean_optional(notes);

        sqlx::query(
            r#"
            UPDATE register_sessions SET
                status = 'closed',
                closed_at = ?2,
                closing_float = ?3,
                expected_float = ?4,
                notes = ?5
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(session_id)
        .bind(closed_at)
        .bind(closing_float)
        .bind(expected_float)
        .bind(&notes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        session.status = SessionStatus::Closed;
        session.closed_at = Some(closed_at);
        session.closing_float = Some(closing_float);
        session.expected_float = Some(expected_float);
        session.notes = notes;

        info!(
            session_id = %session_id,
            expected = %expected_float,
            counted = %closing_float,
            discrepancy = %(closing_float - expected_float),
            "Register session closed"
        );
        Ok(session)
    }

    /// The single open session, if any.
    pub async fn get_active(&self) -> DbResult<Option<RegisterSession>> {
        let mut conn = self.pool.acquire().await?;
        active_session(&mut conn).await
    }

    pub async fn get(&self, session_id: &str) -> DbResult<RegisterSession> {
        let mut conn = self.pool.acquire().await?;
        fetch_session(&mut conn, session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Register session", session_id))
    }

    /// Sessions opened within `range`, newest first.
    pub async fn list(&self, range: &DateRange, limit: u32) -> DbResult<Vec<RegisterSession>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM register_sessions
            WHERE opened_at >= ?1 AND opened_at < ?2
            ORDER BY opened_at DESC
            LIMIT ?3
            "#,
            SESSION_COLUMNS
        );
        let sessions = sqlx::query_as::<_, RegisterSession>(&sql)
            .bind(range.from)
            .bind(range.to)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    /// Movements of one session in the order they happened.
    pub async fn list_movements(&self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, session_id, amount, kind, reason, created_at
            FROM cash_movements
            WHERE session_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Posting Helpers
// =============================================================================

async fn fetch_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<Option<RegisterSession>> {
    let sql = format!("SELECT {} FROM register_sessions WHERE id = ?1", SESSION_COLUMNS);
    let session = sqlx::query_as::<_, RegisterSession>(&sql)
        .bind(session_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(session)
}

pub(crate) async fn active_session(conn: &mut SqliteConnection) -> DbResult<Option<RegisterSession>> {
    let sql = format!(
        "SELECT {} FROM register_sessions WHERE status = 'open' LIMIT 1",
        SESSION_COLUMNS
    );
    let session = sqlx::query_as::<_, RegisterSession>(&sql)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(session)
}

/// Loads a session that must exist and still be open.
pub(crate) async fn require_open_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<RegisterSession> {
    let session = fetch_session(conn, session_id)
        .await?
        .ok_or_else(|| DbError::not_found("Register session", session_id))?;

    if let Err(err) = session.ensure_open() {
        warn!(session_id = %session_id, "Session is closed");
        return Err(err.into());
    }

    Ok(session)
}

/// Adds `amount` to one of the session's running accumulators.
///
/// `column` comes from [`SalesBucket::column`](caja_core::SalesBucket::column)
/// or [`MovementKind::column`], never from input.
pub(crate) async fn add_to_accumulator(
    conn: &mut SqliteConnection,
    session_id: &str,
    column: &'static str,
    amount: Money,
) -> DbResult<()> {
    debug!(session_id = %session_id, column = %column, amount = %amount, "Updating session total");

    let sql = format!(
        "UPDATE register_sessions SET {col} = {col} + ?2 WHERE id = ?1",
        col = column
    );
    let result = sqlx::query(&sql)
        .bind(session_id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Register session", session_id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

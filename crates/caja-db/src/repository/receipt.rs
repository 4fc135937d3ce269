//! # Receipt Numbers
//!
//! Monotonic per-series counters. The increment runs inside the caller's
//! posting transaction, so a rolled-back posting never consumes a number
//! another posting can see.
//!
//! ```text
//! receipt_counters          sales.receipt_number (UNIQUE)
//! ┌────────┬────────────┐
//! │ series │ last_value │   V-000001
//! ├────────┼────────────┤   V-000002
//! │ V      │ 2          │   ...
//! │ C      │ 0          │
//! └────────┴────────────┘
//! ```

use caja_core::format_receipt_number;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Claims the next number in `series` and formats it.
pub(crate) async fn next_receipt_number(
    conn: &mut SqliteConnection,
    series: &str,
) -> DbResult<String> {
    let value: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE receipt_counters
        SET last_value = last_value + 1
        WHERE series = ?1
        RETURNING last_value
        "#,
    )
    .bind(series)
    .fetch_optional(&mut *conn)
    .await?;

    let value = value
        .ok_or_else(|| DbError::Internal(format!("Receipt series '{}' is not configured", series)))?;

    let receipt_number = format_receipt_number(series, value);
    debug!(series = %series, receipt_number = %receipt_number, "Claimed receipt number");

    Ok(receipt_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;
    use caja_core::{PURCHASE_RECEIPT_SERIES, SALE_RECEIPT_SERIES};

    #[tokio::test]
    async fn test_counters_are_independent_and_monotonic() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert_eq!(next_receipt_number(&mut conn, SALE_RECEIPT_SERIES).await.unwrap(), "V-000001");
        assert_eq!(next_receipt_number(&mut conn, SALE_RECEIPT_SERIES).await.unwrap(), "V-000002");
        assert_eq!(
            next_receipt_number(&mut conn, PURCHASE_RECEIPT_SERIES).await.unwrap(),
            "C-000001"
        );
    }

    #[tokio::test]
    async fn test_rolled_back_number_is_reused() {
        let db = setup().await;

        {
            let mut tx = db.pool().begin().await.unwrap();
            next_receipt_number(&mut tx, SALE_RECEIPT_SERIES).await.unwrap();
            // dropped without commit
        }

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(next_receipt_number(&mut conn, SALE_RECEIPT_SERIES).await.unwrap(), "V-000001");
    }

    #[tokio::test]
    async fn test_unknown_series() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(next_receipt_number(&mut conn, "X").await.is_err());
    }
}

//! # Party Repository
//!
//! Customers and suppliers share one repository, parameterised by the
//! record type. Balances are never written here; they only move through
//! [`ledger::post_entry`](crate::repository::ledger).

use std::marker::PhantomData;

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::ledger::tables;
use crate::repository::{clean_optional, contains_pattern};
use caja_core::validation::{validate_party_input, validate_search_query};
use caja_core::{Customer, PartyInput, PartyKind, Supplier};

/// A row type stored in one of the party tables.
pub trait PartyRecord: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    const KIND: PartyKind;
    const COLUMNS: &'static str;
}

impl PartyRecord for Customer {
    const KIND: PartyKind = PartyKind::Customer;
    const COLUMNS: &'static str = "id, name, document, phone, email, address, credit_limit, current_balance, is_active, created_at";
}

impl PartyRecord for Supplier {
    const KIND: PartyKind = PartyKind::Supplier;
    const COLUMNS: &'static str = "id, name, document, phone, email, address, current_balance, is_active, created_at";
}

/// Repository for customers (`PartyRepository<Customer>`) or suppliers
/// (`PartyRepository<Supplier>`).
#[derive(Debug, Clone)]
pub struct PartyRepository<P> {
    pool: SqlitePool,
    _record: PhantomData<P>,
}

impl<P: PartyRecord> PartyRepository<P> {
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository {
            pool,
            _record: PhantomData,
        }
    }

    pub async fn create(&self, input: &PartyInput) -> DbResult<P> {
        validate_party_input(input)?;

        let id = Uuid::new_v4().to_string();
        let table = tables(P::KIND).party;

        debug!(kind = ?P::KIND, id = %id, name = %input.name, "Creating party");

        let sql = match P::KIND {
            PartyKind::Customer => format!(
                "INSERT INTO {} (id, name, document, phone, email, address, created_at, credit_limit) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                table
            ),
            PartyKind::Supplier => format!(
                "INSERT INTO {} (id, name, document, phone, email, address, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                table
            ),
        };

        let mut query = sqlx::query(&sql)
            .bind(&id)
            .bind(input.name.trim())
            .bind(clean_optional(input.document.as_deref()))
            .bind(clean_optional(input.phone.as_deref()))
            .bind(clean_optional(input.email.as_deref()))
            .bind(clean_optional(input.address.as_deref()))
            .bind(Utc::now());
        if P::KIND == PartyKind::Customer {
            query = query.bind(input.credit_limit);
        }
        query.execute(&self.pool).await?;

        self.get(&id).await
    }

    /// Updates contact fields. `credit_limit` only applies to customers.
    pub async fn update(&self, id: &str, input: &PartyInput) -> DbResult<P> {
        validate_party_input(input)?;

        let table = tables(P::KIND).party;
        let sql = match P::KIND {
            PartyKind::Customer => format!(
                "UPDATE {} SET name = ?2, document = ?3, phone = ?4, email = ?5, address = ?6, credit_limit = ?7 WHERE id = ?1",
                table
            ),
            PartyKind::Supplier => format!(
                "UPDATE {} SET name = ?2, document = ?3, phone = ?4, email = ?5, address = ?6 WHERE id = ?1",
                table
            ),
        };

        let mut query = sqlx::query(&sql)
            .bind(id)
            .bind(input.name.trim())
            .bind(clean_optional(input.document.as_deref()))
            .bind(clean_optional(input.phone.as_deref()))
            .bind(clean_optional(input.email.as_deref()))
            .bind(clean_optional(input.address.as_deref()));
        if P::KIND == PartyKind::Customer {
            query = query.bind(input.credit_limit);
        }
        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(P::KIND.entity(), id));
        }

        self.get(id).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<P>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            P::COLUMNS,
            tables(P::KIND).party
        );
        let party = sqlx::query_as::<_, P>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(party)
    }

    pub async fn get(&self, id: &str) -> DbResult<P> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(P::KIND.entity(), id))
    }

    /// Active parties whose name, document or phone contains `query`.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<P>> {
        let query = validate_search_query(query)?;

        let sql = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE is_active = 1
              AND (name LIKE ?1 ESCAPE '\'
                   OR document LIKE ?1 ESCAPE '\'
                   OR phone LIKE ?1 ESCAPE '\')
            ORDER BY name
            LIMIT ?2
            "#,
            P::COLUMNS,
            tables(P::KIND).party
        );
        let parties = sqlx::query_as::<_, P>(&sql)
            .bind(contains_pattern(&query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(parties)
    }

    /// Soft-deletes a party. Its ledger and balance are kept.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET is_active = 0 WHERE id = ?1",
            tables(P::KIND).party
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(P::KIND.entity(), id));
        }

        Ok(())
    }
}

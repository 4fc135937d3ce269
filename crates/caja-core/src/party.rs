//! # Customers and Suppliers
//!
//! Both are "parties" with a denormalised running balance backed by a
//! ledger (see [`crate::ledger`]). A positive balance means the party owes
//! money: a customer who bought on account, or a supplier we owe for goods
//! (from the supplier's point of view, the shop's debt).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Which side of the counter a party sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    Customer,
    Supplier,
}

impl PartyKind {
    /// Entity name used in error messages.
    pub fn entity(&self) -> &'static str {
        match self {
            PartyKind::Customer => "Customer",
            PartyKind::Supplier => "Supplier",
        }
    }
}

/// A customer who may buy on account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// National id / tax number.
    pub document: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Advisory ceiling for credit sales; zero means no limit configured.
    pub credit_limit: Money,
    /// Signed ledger balance; positive = owes the shop.
    pub current_balance: Money,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Remaining credit before the configured limit, if one is set.
    pub fn available_credit(&self) -> Option<Money> {
        if self.credit_limit.is_zero() {
            return None;
        }
        Some(self.credit_limit - self.current_balance)
    }
}

/// A supplier goods are bought from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Signed ledger balance; positive = the shop owes this supplier.
    pub current_balance: Money,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Contact fields accepted when creating or editing a party.
///
/// `credit_limit` is ignored for suppliers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PartyInput {
    pub name: String,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub credit_limit: Money,
}

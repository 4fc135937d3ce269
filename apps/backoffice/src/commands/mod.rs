//! # Commands Module
//!
//! One async function per boundary operation. Each takes the state it
//! needs plus a deserialised argument struct, and returns
//! `Result<T, ApiError>`.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (shared argument types)
//! ├── session.rs   ◄─── Register sessions, cash movements
//! ├── sale.rs      ◄─── Sale posting, refunds, lookups
//! ├── purchase.rs  ◄─── Purchase posting, cancellation, lookups
//! ├── ledger.rs    ◄─── Payments and account statements
//! ├── party.rs     ◄─── Customer and supplier CRUD
//! ├── product.rs   ◄─── Product CRUD, search, stock adjustments
//! ├── category.rs  ◄─── Product categories
//! ├── report.rs    ◄─── Read-only aggregates
//! └── config.rs    ◄─── Configuration retrieval
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  {"command":"get_sale","args":{"id":"..."}}                            │
//! │         │                                                               │
//! │         │ (serde: Request::GetSale(IdArgs))                             │
//! │         ▼                                                               │
//! │  dispatch() ──► commands::sale::get_sale(&db, args)                    │
//! │         │                                                               │
//! │         │ (serde_json::to_value)                                        │
//! │         ▼                                                               │
//! │  {"ok":true,"data":{"sale":{...},"items":[...]}}                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod category;
pub mod config;
pub mod ledger;
pub mod party;
pub mod product;
pub mod purchase;
pub mod report;
pub mod sale;
pub mod session;

use caja_core::DateRange;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Hard cap on any list request.
pub const MAX_LIMIT: u32 = 500;

/// Resolves an optional client limit against a default and [`MAX_LIMIT`].
pub fn resolve_limit(limit: Option<u32>, default: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

/// Arguments naming a single record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdArgs {
    pub id: String,
}

/// Inclusive calendar-day bounds; either end may be open.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeArgs {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    pub fn to_range(&self) -> Result<DateRange, ApiError> {
        let all = DateRange::all_time();
        let from = match self.from {
            Some(day) => Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)),
            None => all.from,
        };
        let to = match self.to {
            Some(day) => DateRange::day(day).to,
            None => all.to,
        };
        Ok(DateRange::new(from, to)?)
    }
}

/// A date range plus an optional row limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListArgs {
    #[serde(flatten)]
    pub range: RangeArgs,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Free-text search with an optional row limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArgs {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_range_is_all_time() {
        let range = RangeArgs::default().to_range().unwrap();
        assert_eq!(range, DateRange::all_time());
    }

    #[test]
    fn test_range_days_are_inclusive() {
        let first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let range = RangeArgs {
            from: Some(first),
            to: Some(last),
        }
        .to_range()
        .unwrap();
        assert_eq!(range, DateRange::days(first, last).unwrap());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = RangeArgs {
            from: NaiveDate::from_ymd_opt(2026, 3, 5),
            to: NaiveDate::from_ymd_opt(2026, 3, 1),
        }
        .to_range()
        .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
    }

    #[test]
    fn test_limits() {
        assert_eq!(resolve_limit(None, 100), 100);
        assert_eq!(resolve_limit(Some(0), 100), 1);
        assert_eq!(resolve_limit(Some(10_000), 100), MAX_LIMIT);
    }
}

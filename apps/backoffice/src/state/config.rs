//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`CAJA_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::PathBuf;

use caja_core::{Money, Rate};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Database file name inside the data directory.
const DB_FILE_NAME: &str = "caja.db";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name (printed on receipts)
    pub store_name: String,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Tax rate suggested for new products
    pub default_tax_rate: Rate,

    /// Rows returned by the low-stock report when no limit is given
    pub low_stock_limit: u32,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            store_name: "Caja Dev Store".to_string(),
            currency_code: "ARS".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            default_tax_rate: Rate::from_percent(21),
            low_stock_limit: 50,
        }
    }
}

impl ConfigState {
    /// Creates a new ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `CAJA_STORE_NAME`: Override store name
    /// - `CAJA_CURRENCY`: Override currency code (e.g., "USD")
    /// - `CAJA_TAX_RATE`: Override default tax rate (e.g., "10.5")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ConfigState::default();

        if let Some(store_name) = lookup("CAJA_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(currency) = lookup("CAJA_CURRENCY") {
            config.currency_code = currency.trim().to_uppercase();
        }

        if let Some(tax_rate_str) = lookup("CAJA_TAX_RATE") {
            if let Ok(rate) = tax_rate_str.trim().parse::<f64>() {
                if (0.0..=100.0).contains(&rate) {
                    config.default_tax_rate = Rate::from_percentage(rate);
                }
            }
        }

        config
    }

    /// Formats an amount as a currency string.
    ///
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.cents();
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

/// Determines the database file path.
///
/// ## Resolution Order
/// 1. `CAJA_DB_PATH` environment variable
/// 2. Platform data directory:
///    - **macOS**: `~/Library/Application Support/com.caja.backoffice/caja.db`
///    - **Windows**: `%APPDATA%\caja\backoffice\data\caja.db`
///    - **Linux**: `~/.local/share/backoffice/caja.db`
///
/// The data directory is created if missing.
pub fn database_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = std::env::var("CAJA_DB_PATH") {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("com", "caja", "backoffice").ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine app data directory",
        )
    })?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_format_currency_positive() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
        assert_eq!(config.format_currency(Money::from_cents(100)), "$1.00");
        assert_eq!(config.format_currency(Money::from_cents(1)), "$0.01");
        assert_eq!(config.format_currency(Money::zero()), "$0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_cents(-1234)), "-$12.34");
    }

    #[test]
    fn test_format_currency_no_decimals() {
        let config = ConfigState {
            currency_decimals: 0,
            ..ConfigState::default()
        };
        assert_eq!(config.format_currency(Money::from_cents(1500)), "$1500");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CAJA_STORE_NAME", "Almacen Don Pepe"),
            ("CAJA_CURRENCY", "usd"),
            ("CAJA_TAX_RATE", "10.5"),
        ]
        .into_iter()
        .collect();

        let config = ConfigState::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.store_name, "Almacen Don Pepe");
        assert_eq!(config.currency_code, "USD");
        assert_eq!(config.default_tax_rate, Rate::from_bps(1050));
    }

    #[test]
    fn test_bad_tax_rate_keeps_default() {
        let config = ConfigState::from_lookup(|key| {
            (key == "CAJA_TAX_RATE").then(|| "abc".to_string())
        });
        assert_eq!(config.default_tax_rate, Rate::from_percent(21));
    }
}

//! Runtime settings, loaded from TOML.
//!
//! ```toml
//! [defaults]
//! price_list = "A"
//! sales_account_se25 = "3001"
//!
//! [ledger]
//! access_token = "..."
//! client_secret = "..."
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{SyncError, ValidationError};
use crate::vat::VatType;

/// Bookkeeping defaults applied to created records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerDefaults {
    /// Currency the exchange rates are quoted against.
    pub base_currency: String,
    /// Price list for new customers and article prices.
    pub price_list: String,
    pub penalty_interest: Decimal,
    /// VAT type for new domestic customers.
    pub sales_vat_type_se: VatType,
    pub sales_account_se25: String,
    pub sales_account_se12: String,
    pub sales_account_se6: String,
    pub sales_account_se0: String,
    pub sales_account_se_reversed_vat: String,
    pub sales_account_eu_vat: String,
    pub sales_account_eu_reversed_vat: String,
    pub sales_account_export: String,
    pub purchase_account: String,
    /// Whether new articles are stock goods.
    pub stock_article: bool,
    pub stock_account: String,
    pub stock_change_account: String,
    /// Import only files from senders on the ledger's trusted list.
    pub only_allow_trusted_senders: bool,
}

impl Default for LedgerDefaults {
    fn default() -> Self {
        Self {
            base_currency: "SEK".into(),
            price_list: String::new(),
            penalty_interest: Decimal::ZERO,
            sales_vat_type_se: VatType::SeVat,
            sales_account_se25: String::new(),
            sales_account_se12: String::new(),
            sales_account_se6: String::new(),
            sales_account_se0: String::new(),
            sales_account_se_reversed_vat: String::new(),
            sales_account_eu_vat: String::new(),
            sales_account_eu_reversed_vat: String::new(),
            sales_account_export: String::new(),
            purchase_account: String::new(),
            stock_article: false,
            stock_account: "1460".into(),
            stock_change_account: "4990".into(),
            only_allow_trusted_senders: false,
        }
    }
}

impl LedgerDefaults {
    /// Every configured ledger account, in bootstrap order, empty ones skipped.
    pub fn accounts(&self) -> Vec<&str> {
        [
            &self.sales_account_se_reversed_vat,
            &self.sales_account_eu_vat,
            &self.sales_account_export,
            &self.sales_account_se0,
            &self.sales_account_se12,
            &self.sales_account_se25,
            &self.sales_account_se6,
            &self.sales_account_eu_reversed_vat,
            &self.purchase_account,
            &self.stock_account,
            &self.stock_change_account,
        ]
        .into_iter()
        .map(String::as_str)
        .filter(|a| !a.is_empty())
        .collect()
    }

    /// Base currency, `SEK` when unset.
    pub fn base_currency(&self) -> &str {
        if self.base_currency.is_empty() {
            "SEK"
        } else {
            &self.base_currency
        }
    }
}

/// Accounting API connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub base_url: String,
    pub access_token: String,
    pub client_secret: String,
    pub timeout_secs: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.fortnox.se/3".into(),
            access_token: String::new(),
            client_secret: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Currency-rate source connection and cache location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateSettings {
    pub base_url: String,
    pub access_key: String,
    /// Directory holding `currency_rates.json`.
    pub cache_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            base_url: "http://data.fixer.io/api".into(),
            access_key: String::new(),
            cache_dir: PathBuf::from("."),
            timeout_secs: 30,
        }
    }
}

/// All settings of one deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub defaults: LedgerDefaults,
    pub ledger: LedgerSettings,
    pub rates: RateSettings,
}

impl Settings {
    /// Parse settings from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, SyncError> {
        toml::from_str(text).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Read and parse a TOML settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Check that every required value is set.
    ///
    /// Returns all errors found, not just the first.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let required = [
            ("ledger.base_url", &self.ledger.base_url),
            ("ledger.access_token", &self.ledger.access_token),
            ("ledger.client_secret", &self.ledger.client_secret),
            ("defaults.price_list", &self.defaults.price_list),
            ("defaults.sales_account_se25", &self.defaults.sales_account_se25),
            ("defaults.sales_account_se12", &self.defaults.sales_account_se12),
            ("defaults.sales_account_se6", &self.defaults.sales_account_se6),
            ("defaults.sales_account_se0", &self.defaults.sales_account_se0),
            ("defaults.purchase_account", &self.defaults.purchase_account),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(field, "must be set"));
            }
        }
        if self.ledger.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "ledger.timeout_secs",
                "must be greater than zero",
            ));
        }
        errors
    }

    /// Validate, folding every error into one [`SyncError::Config`].
    pub fn validated(self) -> Result<Self, SyncError> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(self);
        }
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(SyncError::Config(message))
    }
}

//! Sales-account selection by VAT bracket.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::LedgerDefaults;

/// Sales account for a new article, chosen by its VAT rate.
///
/// | rate | account |
/// |------|---------|
/// | 0.25 | `sales_account_se25` |
/// | 0.12 | `sales_account_se12` |
/// | 0.06 | `sales_account_se6` |
/// | anything else, or none | `sales_account_se0` |
pub fn sales_account(vat_rate: Option<Decimal>, defaults: &LedgerDefaults) -> &str {
    match vat_rate {
        Some(rate) if rate == dec!(0.25) => &defaults.sales_account_se25,
        Some(rate) if rate == dec!(0.12) => &defaults.sales_account_se12,
        Some(rate) if rate == dec!(0.06) => &defaults.sales_account_se6,
        _ => &defaults.sales_account_se0,
    }
}

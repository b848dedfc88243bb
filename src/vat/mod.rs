//! VAT rules: customer classification, sales-account brackets and
//! VAT buckets.
//!
//! # Example
//!
//! ```
//! use tradesync::vat::*;
//!
//! let t = classify_vat(Some("DE"), None, true, None, VatType::SeVat);
//! assert_eq!(t, VatType::EuReversedVat);
//! ```

mod accounts;
mod classify;
mod specification;

pub use accounts::sales_account;
pub use classify::{EU_COUNTRIES, HOME_COUNTRY, VatType, classify_vat, is_eu};
pub use specification::vat_specification;

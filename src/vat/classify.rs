//! Customer VAT classification from country codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// VAT classification of a customer, as stored in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VatType {
    /// Domestic sale with Swedish VAT.
    SeVat,
    /// Domestic reverse charge (construction services).
    SeReversedVat,
    /// Intra-EU sale to a VAT-registered buyer.
    EuReversedVat,
    /// Intra-EU sale to a buyer without VAT number.
    EuVat,
    /// Sale outside the EU.
    Export,
}

impl VatType {
    /// Ledger code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SeVat => "SEVAT",
            Self::SeReversedVat => "SEREVERSEDVAT",
            Self::EuReversedVat => "EUREVERSEDVAT",
            Self::EuVat => "EUVAT",
            Self::Export => "EXPORT",
        }
    }

    /// Parse from the ledger code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "SEVAT" => Some(Self::SeVat),
            "SEREVERSEDVAT" => Some(Self::SeReversedVat),
            "EUREVERSEDVAT" => Some(Self::EuReversedVat),
            "EUVAT" => Some(Self::EuVat),
            "EXPORT" => Some(Self::Export),
            _ => None,
        }
    }
}

impl fmt::Display for VatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<String> for VatType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_code(&value).ok_or_else(|| format!("unknown VAT type: {value}"))
    }
}

impl From<VatType> for String {
    fn from(value: VatType) -> Self {
        value.code().to_string()
    }
}

/// Country assumed when a party has none.
pub const HOME_COUNTRY: &str = "SE";

/// Country codes treated as EU members.
///
/// Greece appears as `EL` (the EU's own code), and `UK` is still listed.
/// `UK` no longer belongs here; it is kept until the classification change
/// for British customers has been agreed.
pub const EU_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "EL", "ES", "FI", "FR", "HR", "HU", "IE", "IT",
    "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK", "UK",
];

/// Whether `country` is in [`EU_COUNTRIES`]. Exact, case-sensitive match.
pub fn is_eu(country: &str) -> bool {
    EU_COUNTRIES.contains(&country)
}

/// Classify a customer for VAT.
///
/// Absent or empty countries default to `"SE"`.
///
/// # Logic
///
/// 1. Both countries SE → the prior type if it is `SEREVERSEDVAT` or
///    `SEVAT`, else `domestic_default`
/// 2. Both countries EU and a VAT number → `EUREVERSEDVAT`
/// 3. Both countries EU, no VAT number → `EUVAT`
/// 4. Otherwise → `EXPORT`
pub fn classify_vat(
    invoice_country: Option<&str>,
    delivery_country: Option<&str>,
    has_vat_number: bool,
    prior: Option<VatType>,
    domestic_default: VatType,
) -> VatType {
    let invoice = invoice_country.filter(|c| !c.is_empty()).unwrap_or(HOME_COUNTRY);
    let delivery = delivery_country.filter(|c| !c.is_empty()).unwrap_or(HOME_COUNTRY);

    if invoice == HOME_COUNTRY && delivery == HOME_COUNTRY {
        return match prior {
            Some(kept @ (VatType::SeReversedVat | VatType::SeVat)) => kept,
            _ => domestic_default,
        };
    }

    if is_eu(invoice) && is_eu(delivery) {
        if has_vat_number {
            VatType::EuReversedVat
        } else {
            VatType::EuVat
        }
    } else {
        VatType::Export
    }
}

//! Net unit prices and fee rows of outbound documents.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::ProductRow;

/// How a row discount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountType {
    /// A total amount for the whole row.
    Amount,
    /// A percentage of the unit price.
    Percent,
}

impl DiscountType {
    /// Parse the ledger code (`AMOUNT`, `PERCENT`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "AMOUNT" => Some(Self::Amount),
            "PERCENT" => Some(Self::Percent),
            _ => None,
        }
    }
}

/// `1 + percent/100`.
fn vat_factor(vat_percent: Decimal) -> Decimal {
    (dec!(100) + vat_percent) / dec!(100)
}

/// Net unit price of a ledger row.
///
/// A VAT-inclusive `gross` is divided by `1 + vat_percent/100` first. A
/// positive discount is then applied: an [`DiscountType::Amount`] discount
/// covers the whole row, so it is netted the same way and spread over
/// `quantity`; a [`DiscountType::Percent`] discount scales the price. An
/// amount discount on a zero quantity is ignored.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tradesync::export::{DiscountType, net_price};
///
/// assert_eq!(net_price(dec!(125), dec!(25), true, dec!(0), None, dec!(1)), dec!(100));
/// assert_eq!(
///     net_price(dec!(100), dec!(25), false, dec!(10), Some(DiscountType::Percent), dec!(3)),
///     dec!(90)
/// );
/// ```
pub fn net_price(
    gross: Decimal,
    vat_percent: Decimal,
    vat_included: bool,
    discount: Decimal,
    discount_type: Option<DiscountType>,
    quantity: Decimal,
) -> Decimal {
    let factor = vat_factor(vat_percent);
    let price = if vat_included {
        gross.checked_div(factor).unwrap_or(gross)
    } else {
        gross
    };

    if discount <= Decimal::ZERO {
        return price;
    }
    match discount_type {
        Some(DiscountType::Amount) => {
            let discount = if vat_included {
                discount.checked_div(factor).unwrap_or(discount)
            } else {
                discount
            };
            match discount.checked_div(quantity) {
                Some(per_unit) => price - per_unit,
                None => price,
            }
        }
        Some(DiscountType::Percent) => price - price * (discount / dec!(100)),
        None => price,
    }
}

/// Append an invoice-fee row. See [`add_freight`].
pub fn add_invoice_fee(
    vat_included: bool,
    fee: Option<Decimal>,
    vat: Option<Decimal>,
    rows: &mut Vec<ProductRow>,
    language: Option<&str>,
) -> Decimal {
    let name = if is_swedish(language) {
        "Fakturaavgift"
    } else {
        "Invoice fee"
    };
    add_charge(name, vat_included, fee, vat, rows)
}

/// Append a freight row and return the net freight.
///
/// Nothing is appended for an absent or zero amount (returns 0). The net
/// amount is the amount less `vat` when VAT is included. The row has
/// quantity ±1 by the sign of the net amount, its absolute value as unit
/// price, and `vat / net` as VAT rate.
pub fn add_freight(
    vat_included: bool,
    freight: Option<Decimal>,
    vat: Option<Decimal>,
    rows: &mut Vec<ProductRow>,
    language: Option<&str>,
) -> Decimal {
    let name = if is_swedish(language) { "Frakt" } else { "Freight" };
    add_charge(name, vat_included, freight, vat, rows)
}

fn is_swedish(language: Option<&str>) -> bool {
    language.is_some_and(|l| l.eq_ignore_ascii_case("SV"))
}

fn add_charge(
    name: &str,
    vat_included: bool,
    amount: Option<Decimal>,
    vat: Option<Decimal>,
    rows: &mut Vec<ProductRow>,
) -> Decimal {
    let Some(amount) = amount.filter(|a| !a.is_zero()) else {
        return Decimal::ZERO;
    };
    let net = if vat_included {
        amount - vat.unwrap_or_default()
    } else {
        amount
    };

    rows.push(ProductRow {
        product_name: Some(name.to_string()),
        // Ratio, not a percentage; it is the bucket key of the VAT specification.
        vat_rate: vat.and_then(|v| v.checked_div(net)),
        quantity: Some(if net.is_sign_negative() {
            -Decimal::ONE
        } else {
            Decimal::ONE
        }),
        unit_price: Some(net.abs()),
        ..Default::default()
    });
    net
}

//! VAT buckets of an outbound document.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::core::{ProductRow, VatSpecification};

/// Group rows by exact `vat_rate` into VAT buckets, ordered by ascending rate.
///
/// Each bucket accumulates `unit_price * quantity` as taxable amount and
/// `unit_price * quantity * vat_rate` as tax. Rows without a rate form their
/// own bucket (first in order) with zero tax. Subrows are not visited; pass
/// an already flat row list.
pub fn vat_specification(rows: &[ProductRow]) -> Vec<VatSpecification> {
    let mut buckets: BTreeMap<Option<Decimal>, VatSpecification> = BTreeMap::new();
    for row in rows {
        let taxable = row.line_amount();
        let tax = row.vat_rate.map_or(Decimal::ZERO, |rate| taxable * rate);
        let bucket = buckets.entry(row.vat_rate).or_insert_with(|| VatSpecification {
            tax_rate: row.vat_rate,
            ..Default::default()
        });
        bucket.taxable_amount += taxable;
        bucket.tax_amount += tax;
    }
    buckets.into_values().collect()
}

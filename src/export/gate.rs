//! Export eligibility, the purchase-order split, and the sent marker.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::ledger::{Article, LabelRef, Order, Supplier};
use crate::core::{AccountingClient, ProductRow, find, invoke, non_empty};

/// Label that makes a document exportable.
pub const EXPORT_LABEL: &str = "a-dox-trade-v1";

/// Label that makes an order fan out into purchase orders.
pub const PURCHASE_ORDER_LABEL: &str = "a-dox-trade-v1-po";

/// What a document's labels allow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Eligibility {
    /// Export the document itself.
    pub document: bool,
    /// Derive purchase orders (orders only).
    pub purchase_orders: bool,
}

impl Eligibility {
    /// Resolve attached label ids against the label names of the run.
    pub fn from_labels(attached: &[LabelRef], names: &BTreeMap<String, String>) -> Self {
        let mut eligibility = Self::default();
        for label in attached {
            match names.get(&label.id).map(String::as_str) {
                Some(EXPORT_LABEL) => eligibility.document = true,
                Some(PURCHASE_ORDER_LABEL) => eligibility.purchase_orders = true,
                _ => {}
            }
        }
        eligibility
    }

    pub fn any(&self) -> bool {
        self.document || self.purchase_orders
    }
}

/// Marks one source document as sent, at most once.
///
/// A sales order may produce a confirmation and several purchase orders;
/// all of them share one marker.
#[derive(Debug)]
pub struct SentMarker {
    path: String,
    fired: bool,
}

impl SentMarker {
    /// Marker for `{collection}/{number}`, e.g. `("orders", "12")`.
    pub fn new(collection: &str, number: &str) -> Self {
        Self {
            path: format!("{collection}/{number}/externalprint"),
            fired: false,
        }
    }

    /// Invoke the action unless already fired. A failed action still
    /// counts as fired. Returns whether the action ran and succeeded.
    pub async fn mark<C: AccountingClient>(&mut self, client: &C) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        invoke(client, &self.path).await
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }
}

/// Order rows bound for one supplier.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierGroup {
    pub supplier: Supplier,
    pub rows: Vec<ProductRow>,
    /// `Σ article.weight * ordered_quantity / 1000` over this group's rows.
    pub weight_kg: Decimal,
}

/// Group an order's rows by the supplier of their articles.
///
/// Groups appear in order of first occurrence. Rows whose article is
/// missing or has no supplier are left out, and so are rows of a supplier
/// whose record cannot be fetched (fetched once). Purchase-order rows are
/// priced at the article's purchase price.
pub async fn group_by_supplier<C: AccountingClient>(client: &C, order: &Order) -> Vec<SupplierGroup> {
    let mut groups: Vec<SupplierGroup> = Vec::new();
    let mut unavailable: HashSet<String> = HashSet::new();

    for row in &order.order_rows {
        let Some(number) = non_empty(row.article_number.as_deref()) else {
            continue;
        };
        let Some(article) = find::<C, Article>(client, &format!("articles/{number}")).await else {
            continue;
        };
        let Some(supplier_number) = non_empty(article.supplier_number.as_deref()) else {
            continue;
        };
        if unavailable.contains(supplier_number) {
            continue;
        }

        let index = match groups
            .iter()
            .position(|g| g.supplier.supplier_number.as_deref() == Some(supplier_number))
        {
            Some(index) => index,
            None => {
                let path = format!("suppliers/{supplier_number}");
                let Some(mut supplier) = find::<C, Supplier>(client, &path).await else {
                    tracing::warn!(supplier = supplier_number, "supplier unavailable, rows left out");
                    unavailable.insert(supplier_number.to_string());
                    continue;
                };
                supplier
                    .supplier_number
                    .get_or_insert_with(|| supplier_number.to_string());
                groups.push(SupplierGroup {
                    supplier,
                    rows: Vec::new(),
                    weight_kg: Decimal::ZERO,
                });
                groups.len() - 1
            }
        };

        let quantity = row.ordered_quantity;
        let group = &mut groups[index];
        if let Some(weight) = article.weight {
            group.weight_kg += weight * quantity.unwrap_or_default() / dec!(1000);
        }
        group.rows.push(ProductRow {
            product_code: article.article_number,
            manufacturer_code: article.manufacturer_article_number,
            gtin: article.ean,
            product_name: article.description,
            vat_rate: row.vat.map(|v| v / dec!(100)),
            quantity,
            unit_code: row.unit.clone(),
            unit_price: article.purchase_price,
            subrows: Vec::new(),
        });
    }
    groups
}

//! Inbound documents: trade document to offer, order or supplier invoice.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::article::resolve_article;
use super::party::{upsert_customer, upsert_supplier};
use super::reference::ensure_reference;
use crate::core::ledger::{
    Article, Offer, Order, ReferenceKind, SalesHeader, SalesRow, SupplierInvoice,
    SupplierInvoiceRow,
};
use crate::core::text::{currency_code, delivery_code, payment_terms_code, unit_code};
use crate::core::{
    AccountingClient, LedgerDefaults, ProductRow, SyncError, TradeDocument, create, flatten_rows,
    non_empty,
};

/// A flattened product row and the article it resolved to, if any.
struct ResolvedRow<'a> {
    row: &'a ProductRow,
    article: Option<Article>,
}

impl ResolvedRow<'_> {
    fn article_number(&self) -> Option<String> {
        self.article.as_ref().and_then(|a| a.article_number.clone())
    }

    /// The article's unit when resolved, else the row's own.
    fn unit(&self) -> Option<String> {
        match &self.article {
            Some(article) => article.unit.clone(),
            None => self.row.unit_code.clone(),
        }
    }

    /// VAT percent, only for rows without an article (the article carries
    /// its own VAT through its sales account).
    fn vat_percent(&self) -> Option<Decimal> {
        match self.article {
            Some(_) => None,
            None => self.row.vat_rate.map(|rate| rate * dec!(100)),
        }
    }
}

/// Which reference codes a document kind needs.
#[derive(Clone, Copy)]
enum Codes {
    Sales,
    Purchase,
}

/// Normalize the document's codes in place.
fn canonicalize(doc: &mut TradeDocument) {
    fn normalize(value: &mut Option<String>, f: fn(&str) -> String) {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            *value = Some(f(v));
        }
    }

    fn normalize_units(rows: &mut [ProductRow]) {
        for row in rows {
            normalize(&mut row.unit_code, unit_code);
            normalize_units(&mut row.subrows);
        }
    }

    normalize(&mut doc.terms_of_delivery, delivery_code);
    normalize(&mut doc.terms_of_payment, payment_terms_code);
    normalize(&mut doc.mode_of_delivery, delivery_code);
    normalize(&mut doc.currency_code, currency_code);
    normalize_units(&mut doc.product_rows);
}

/// Validate row nesting, canonicalize a copy of `doc` and ensure its
/// reference codes exist.
async fn prepare<C: AccountingClient>(
    client: &C,
    doc: &TradeDocument,
    codes: Codes,
) -> Result<TradeDocument, SyncError> {
    flatten_rows(&doc.product_rows)?;
    let mut doc = doc.clone();
    canonicalize(&mut doc);

    let mut wanted = Vec::with_capacity(4);
    if matches!(codes, Codes::Sales) {
        wanted.push((ReferenceKind::TermsOfDelivery, doc.terms_of_delivery.as_deref()));
    }
    wanted.push((ReferenceKind::TermsOfPayment, doc.terms_of_payment.as_deref()));
    if matches!(codes, Codes::Sales) {
        wanted.push((ReferenceKind::WayOfDelivery, doc.mode_of_delivery.as_deref()));
    }
    wanted.push((ReferenceKind::Currency, doc.currency_code.as_deref()));

    for (kind, code) in wanted {
        ensure_reference(client, kind, code.unwrap_or_default()).await;
    }
    Ok(doc)
}

/// Ensure units and resolve articles for every row, in preorder.
async fn resolve_rows<'a, C: AccountingClient>(
    client: &C,
    defaults: &LedgerDefaults,
    doc: &'a TradeDocument,
) -> Result<Vec<ResolvedRow<'a>>, SyncError> {
    let rows = flatten_rows(&doc.product_rows)?;
    let mut resolved = Vec::with_capacity(rows.len());
    for row in rows {
        ensure_reference(client, ReferenceKind::Unit, row.unit_code.as_deref().unwrap_or_default())
            .await;
        let article = if row.has_identifier() {
            resolve_article(client, defaults, row).await
        } else {
            None
        };
        resolved.push(ResolvedRow { row, article });
    }
    Ok(resolved)
}

fn sales_header(customer_number: Option<String>, doc: &TradeDocument) -> SalesHeader {
    SalesHeader {
        customer_number,
        delivery_date: doc.delivery_date,
        comments: doc.comment.clone(),
        currency: doc.currency_code.clone(),
        vat_included: Some(false),
        ..Default::default()
    }
}

fn owned(value: Option<&String>) -> Option<String> {
    non_empty(value.map(String::as_str)).map(str::to_string)
}

/// Import a request for quotation as an offer to the buyer.
///
/// Returns `Ok(None)` when the customer or the offer could not be saved
/// (already logged). Row trees nested too deep are rejected before any
/// remote call.
pub async fn add_offer<C: AccountingClient>(
    client: &C,
    defaults: &LedgerDefaults,
    sender_email: &str,
    doc: &TradeDocument,
) -> Result<Option<Offer>, SyncError> {
    let doc = prepare(client, doc, Codes::Sales).await?;
    let Some(customer) = upsert_customer(client, defaults, sender_email, &doc).await else {
        return Ok(None);
    };

    let rows = resolve_rows(client, defaults, &doc)
        .await?
        .into_iter()
        .map(|r| SalesRow {
            article_number: r.article_number(),
            description: r.row.product_name.clone(),
            quantity: r.row.quantity,
            price: r.row.unit_price,
            unit: r.unit(),
            vat: r.vat_percent(),
            ..Default::default()
        })
        .collect();

    let offer = Offer {
        header: sales_header(customer.customer_number, &doc),
        offer_date: doc.issue_date,
        expire_date: doc.offer_expires_date,
        your_reference_number: owned(doc.buyer_references.request_for_quotation_id.as_ref()),
        offer_rows: rows,
    };
    Ok(create(client, offer, "offers").await)
}

/// Import a buyer's order as a sales order.
pub async fn add_order<C: AccountingClient>(
    client: &C,
    defaults: &LedgerDefaults,
    sender_email: &str,
    doc: &TradeDocument,
) -> Result<Option<Order>, SyncError> {
    let doc = prepare(client, doc, Codes::Sales).await?;
    let Some(customer) = upsert_customer(client, defaults, sender_email, &doc).await else {
        return Ok(None);
    };

    let rows = resolve_rows(client, defaults, &doc)
        .await?
        .into_iter()
        .map(|r| SalesRow {
            article_number: r.article_number(),
            description: r.row.product_name.clone(),
            ordered_quantity: r.row.quantity,
            delivered_quantity: r.row.quantity,
            price: r.row.unit_price,
            unit: r.unit(),
            vat: r.vat_percent(),
            ..Default::default()
        })
        .collect();

    let order = Order {
        header: sales_header(customer.customer_number, &doc),
        order_date: doc.issue_date,
        your_order_number: owned(doc.buyer_references.order_id.as_ref()),
        external_invoice_reference1: owned(doc.payment_reference.as_ref()),
        external_invoice_reference2: owned(doc.id.as_ref()),
        order_rows: rows,
        ..Default::default()
    };
    Ok(create(client, order, "orders").await)
}

/// Import a seller's invoice or credit invoice as a supplier invoice.
///
/// Booking rows come first: `TOT` carries the negated total, `VAT` the VAT
/// total and `ROV` the rounding, each only when present and non-zero.
/// Product rows without an article are booked on the purchase account.
pub async fn add_supplier_invoice<C: AccountingClient>(
    client: &C,
    defaults: &LedgerDefaults,
    sender_email: &str,
    doc: &TradeDocument,
) -> Result<Option<SupplierInvoice>, SyncError> {
    let doc = prepare(client, doc, Codes::Purchase).await?;
    let Some(supplier) = upsert_supplier(client, sender_email, &doc).await else {
        return Ok(None);
    };

    let mut rows = booking_rows(&doc);
    rows.extend(
        resolve_rows(client, defaults, &doc)
            .await?
            .into_iter()
            .map(|r| SupplierInvoiceRow {
                article_number: r.article_number(),
                account: r
                    .article
                    .is_none()
                    .then(|| defaults.purchase_account.clone()),
                item_description: r.row.product_name.clone(),
                quantity: r.row.quantity,
                price: r.row.unit_price,
                unit: r.unit(),
                ..Default::default()
            }),
    );

    let invoice = SupplierInvoice {
        supplier_number: supplier.supplier_number,
        invoice_number: owned(doc.payment_reference.as_ref()),
        invoice_date: doc.issue_date,
        due_date: doc.due_date,
        currency: doc.currency_code.clone(),
        comments: doc.comment.clone(),
        supplier_invoice_rows: rows,
        ..Default::default()
    };
    Ok(create(client, invoice, "supplierinvoices").await)
}

/// `TOT`, `VAT` and `ROV` rows of a supplier invoice.
fn booking_rows(doc: &TradeDocument) -> Vec<SupplierInvoiceRow> {
    [
        ("TOT", doc.total.map(|t| -t)),
        ("VAT", doc.vat_total),
        ("ROV", doc.rounding),
    ]
    .into_iter()
    .filter_map(|(code, amount)| {
        amount
            .filter(|a| !a.is_zero())
            .map(|total| SupplierInvoiceRow {
                code: Some(code.to_string()),
                total: Some(total),
                ..Default::default()
            })
    })
    .collect()
}

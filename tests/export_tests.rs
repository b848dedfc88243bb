//! Export runs against an in-memory ledger and exchange.
//!
//! Run with: `cargo test --test export_tests`

#![cfg(feature = "export")]

mod common;

use chrono::NaiveDate;
use common::{FakeExchange, FakeLedger};
use rust_decimal_macros::dec;
use serde_json::json;
use tradesync::core::ledger::{OfferList, Order, OrderList};
use tradesync::core::{DocumentType, LedgerDefaults, OutgoingFile, SyncError, TradeDocument};
use tradesync::export::*;

const EXPORT: u32 = 1;
const PURCHASE: u32 = 2;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

/// A tenant with labels, company settings, one customer, two suppliers
/// and three articles.
fn ledger() -> FakeLedger {
    let ledger = FakeLedger::new();
    ledger.respond(
        "labels",
        json!({"Labels": [
            {"Id": EXPORT, "Description": EXPORT_LABEL},
            {"Id": PURCHASE, "Description": PURCHASE_ORDER_LABEL},
            {"Id": 3, "Description": "internal"}
        ]}),
    );
    ledger.insert(
        "settings/company",
        "CompanySettings",
        json!({"Name": "Seller AB", "OrganizationNumber": "556677-8899", "CountryCode": "SE",
               "Email": "sales@seller.se", "BG": "123-4567", "IBAN": "SE4550000000058398257466",
               "BIC": "ESSESESS"}),
    );
    ledger.insert(
        "customers/5",
        "Customer",
        json!({"CustomerNumber": "5", "Name": "Buyer AB", "Email": "buyer@example.se",
               "CountryCode": "SE"}),
    );
    ledger.insert(
        "suppliers/S1",
        "Supplier",
        json!({"SupplierNumber": "S1", "Name": "Parts Ltd", "Email": "orders@parts.example",
               "OurCustomerNumber": "C-42", "Currency": "EUR"}),
    );
    ledger.insert(
        "suppliers/S2",
        "Supplier",
        json!({"SupplierNumber": "S2", "Name": "Bolts Oy", "Email": "po@bolts.example"}),
    );
    ledger.insert(
        "articles/A1",
        "Article",
        json!({"ArticleNumber": "A1", "Description": "Widget", "SupplierNumber": "S1",
               "Weight": 500, "PurchasePrice": 40, "EAN": "111"}),
    );
    ledger.insert(
        "articles/A2",
        "Article",
        json!({"ArticleNumber": "A2", "Description": "Gadget", "SupplierNumber": "S1",
               "Weight": 250, "PurchasePrice": 20}),
    );
    ledger.insert(
        "articles/B1",
        "Article",
        json!({"ArticleNumber": "B1", "Description": "Bolt", "SupplierNumber": "S2",
               "Weight": 10, "PurchasePrice": 1}),
    );
    ledger
}

/// Unsent order 12 with the given labels and rows `(article, quantity)`.
fn add_order(ledger: &FakeLedger, labels: &[u32], rows: &[(&str, u32)]) {
    let labels: Vec<_> = labels.iter().map(|id| json!({"Id": id})).collect();
    let rows: Vec<_> = rows
        .iter()
        .map(|(article, quantity)| {
            json!({"ArticleNumber": article, "OrderedQuantity": quantity, "Price": 125,
                   "VAT": 25, "Unit": "st"})
        })
        .collect();
    ledger.insert(
        "orders/12",
        "Order",
        json!({"DocumentNumber": "12", "CustomerNumber": "5", "VATIncluded": true,
               "Labels": labels, "OrderDate": "2024-06-01", "YourOrderNumber": "PO-9",
               "Net": 400, "OrderRows": rows}),
    );
    ledger.respond(
        "orders?sent=false&limit=10&page=1",
        json!({"Orders": [{"DocumentNumber": "12"}],
               "MetaInformation": {"@TotalPages": 1, "@CurrentPage": 1}}),
    );
}

fn parse(file: &OutgoingFile) -> TradeDocument {
    TradeDocument::from_json(&file.data).unwrap()
}

async fn run(ledger: &FakeLedger, exchange: &FakeExchange) -> ExportSummary {
    let defaults = LedgerDefaults {
        penalty_interest: dec!(0.08),
        ..Default::default()
    };
    Exporter::new(ledger, &defaults)
        .with_today(today())
        .run(exchange, &mut RunCache::new())
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn both_labels_same_supplier_gives_confirmation_and_one_purchase_order() {
    let ledger = ledger();
    add_order(&ledger, &[EXPORT, PURCHASE], &[("A1", 2), ("A2", 4)]);
    let exchange = FakeExchange::new();

    let summary = run(&ledger, &exchange).await;
    assert_eq!(summary, ExportSummary { sent: 2, skipped: 0, failed: 0 });
    assert_eq!(
        exchange.sent_filenames(),
        ["order_confirmation_12.json", "purchase_order_S1_12.json"]
    );
    assert_eq!(ledger.count("PUT", "orders/12/externalprint"), 1);

    let sent = exchange.sent();
    let confirmation = parse(&sent[0]);
    assert_eq!(sent[0].recipient_email, "buyer@example.se");
    assert_eq!(confirmation.document_type, Some(DocumentType::OrderConfirmation));
    assert_eq!(confirmation.buyer_references.order_id.as_deref(), Some("PO-9"));
    assert_eq!(confirmation.product_rows[0].unit_price, Some(dec!(100)));
    assert_eq!(confirmation.product_rows[0].vat_rate, Some(dec!(0.25)));
    assert_eq!(confirmation.total_weight_kg, Some(dec!(2)));
    assert_eq!(confirmation.penalty_interest, Some(dec!(0.08)));
    assert_eq!(confirmation.subtotal, Some(dec!(400)));

    let purchase = parse(&sent[1]);
    assert_eq!(sent[1].recipient_email, "orders@parts.example");
    assert_eq!(sent[1].language_code, "en");
    assert_eq!(purchase.document_type, Some(DocumentType::Order));
    assert_eq!(purchase.issue_date, Some(today()));
    assert_eq!(purchase.total_weight_kg, Some(dec!(2)));
    assert_eq!(purchase.product_rows.len(), 2);
    assert_eq!(purchase.product_rows[0].unit_price, Some(dec!(40)));
    assert_eq!(purchase.buyer_references.customer_id.as_deref(), Some("C-42"));
    assert_eq!(purchase.subtotal, Some(dec!(160)));
    assert_eq!(purchase.total, Some(dec!(200)));
}

#[tokio::test]
async fn purchase_order_label_alone_splits_by_supplier() {
    let ledger = ledger();
    add_order(&ledger, &[PURCHASE], &[("A1", 1), ("B1", 100), ("A2", 2)]);
    let exchange = FakeExchange::new();

    let summary = run(&ledger, &exchange).await;
    assert_eq!(summary.sent, 2);
    assert_eq!(
        exchange.sent_filenames(),
        ["purchase_order_S1_12.json", "purchase_order_S2_12.json"]
    );
    assert_eq!(ledger.count("PUT", "orders/12/externalprint"), 1);

    let sent = exchange.sent();
    let bolts = parse(&sent[1]);
    assert_eq!(bolts.product_rows.len(), 1);
    assert_eq!(bolts.total_weight_kg, Some(dec!(1)));
    assert_eq!(bolts.seller_references.supplier_id.as_deref(), Some("S2"));
}

#[tokio::test]
async fn sent_marker_fires_once_even_when_a_send_fails() {
    let ledger = ledger();
    add_order(&ledger, &[EXPORT, PURCHASE], &[("A1", 1), ("B1", 1)]);
    let exchange = FakeExchange::new().refusing("orders@parts.example");

    let summary = run(&ledger, &exchange).await;
    assert_eq!(summary, ExportSummary { sent: 2, skipped: 0, failed: 1 });
    assert_eq!(ledger.count("PUT", "orders/12/externalprint"), 1);
}

#[tokio::test]
async fn nothing_sent_means_not_marked() {
    let ledger = ledger();
    ledger.insert(
        "customers/5",
        "Customer",
        json!({"CustomerNumber": "5", "Name": "Buyer AB"}),
    );
    add_order(&ledger, &[EXPORT], &[("A1", 1)]);
    let exchange = FakeExchange::new();

    let summary = run(&ledger, &exchange).await;
    assert_eq!(summary.failed, 1);
    assert!(exchange.sent().is_empty());
    assert_eq!(ledger.count("PUT", "orders/12/externalprint"), 0);
}

#[tokio::test]
async fn unlabelled_order_is_skipped() {
    let ledger = ledger();
    add_order(&ledger, &[3], &[("A1", 1)]);
    let exchange = FakeExchange::new();

    let summary = run(&ledger, &exchange).await;
    assert_eq!(summary, ExportSummary { sent: 0, skipped: 1, failed: 0 });
    assert!(exchange.sent().is_empty());
}

#[tokio::test]
async fn unavailable_supplier_drops_only_its_rows() {
    let ledger = ledger();
    ledger.insert(
        "articles/C1",
        "Article",
        json!({"ArticleNumber": "C1", "SupplierNumber": "S9"}),
    );
    ledger.insert(
        "orders/12",
        "Order",
        json!({"DocumentNumber": "12", "OrderRows": [
            {"ArticleNumber": "C1", "OrderedQuantity": 1},
            {"ArticleNumber": "A1", "OrderedQuantity": 1},
            {"ArticleNumber": "C1", "OrderedQuantity": 2},
            {"Description": "Free text row"}
        ]}),
    );
    let order: Order = serde_json::from_value(ledger.record("orders/12").unwrap()).unwrap();

    let groups = group_by_supplier(&ledger, &order).await;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].supplier.supplier_number.as_deref(), Some("S1"));
    assert_eq!(ledger.count("GET", "suppliers/S9"), 1);
}

// ---------------------------------------------------------------------------
// Offers and invoices
// ---------------------------------------------------------------------------

#[tokio::test]
async fn labelled_invoice_becomes_invoice_with_fee_row() {
    let ledger = ledger();
    ledger.insert(
        "invoices/7",
        "Invoice",
        json!({"DocumentNumber": "7", "CustomerNumber": "5", "Labels": [{"Id": EXPORT}],
               "Language": "SV", "OCR": "", "InvoiceDate": "2024-06-01",
               "DueDate": "2024-07-01", "TotalToPay": 500, "Balance": 200, "Net": 100,
               "AdministrationFee": 50, "AdministrationFeeVAT": 12.5,
               "InvoiceRows": [{"ArticleNumber": "A1", "DeliveredQuantity": 1, "Price": 100,
                                "VAT": 25}]}),
    );
    ledger.respond(
        "invoices?sent=false&limit=10&page=1",
        json!({"Invoices": [{"DocumentNumber": "7"}]}),
    );
    ledger.insert(
        "offers/3",
        "Offer",
        json!({"DocumentNumber": "3", "CustomerNumber": "5", "Labels": []}),
    );
    ledger.respond(
        "offers?sent=false&limit=10&page=1",
        json!({"Offers": [{"DocumentNumber": "3"}]}),
    );
    let exchange = FakeExchange::new();

    let summary = run(&ledger, &exchange).await;
    assert_eq!(summary, ExportSummary { sent: 1, skipped: 1, failed: 0 });
    assert_eq!(exchange.sent_filenames(), ["invoice_7.json"]);
    assert_eq!(ledger.count("PUT", "invoices/7/externalprint"), 1);
    assert_eq!(ledger.count("PUT", "offers/3/externalprint"), 0);

    let file = &exchange.sent()[0];
    assert_eq!(file.language_code, "sv");
    assert_eq!(file.standard_name, "Annytab Dox Trade v1");
    assert_eq!(file.charset, "utf-8");

    let doc = parse(file);
    assert_eq!(doc.document_type, Some(DocumentType::Invoice));
    assert_eq!(doc.payment_reference.as_deref(), Some("7"));
    assert_eq!(doc.paid_amount, Some(dec!(300)));
    assert_eq!(doc.balance_due, Some(dec!(200)));
    assert_eq!(doc.subtotal, Some(dec!(150)));
    assert_eq!(doc.product_rows.len(), 2);
    let fee = &doc.product_rows[1];
    assert_eq!(fee.product_name.as_deref(), Some("Fakturaavgift"));
    assert_eq!(fee.unit_price, Some(dec!(50)));
    assert_eq!(fee.vat_rate, Some(dec!(0.25)));
    assert_eq!(doc.vat_specification.len(), 1);
    assert_eq!(doc.vat_specification[0].taxable_amount, dec!(150));

    let seller = doc.seller_information.unwrap();
    assert_eq!(seller.person_name.as_deref(), Some("Seller AB"));
    let options: Vec<_> = doc
        .payment_options
        .iter()
        .map(|o| o.name.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(options, ["IBAN", "BG"]);
}

#[tokio::test]
async fn credit_invoice_keeps_its_type_in_the_filename() {
    let ledger = ledger();
    ledger.insert(
        "invoices/8",
        "Invoice",
        json!({"DocumentNumber": "8", "CustomerNumber": "5", "Labels": [{"Id": EXPORT}],
               "Credit": true, "OCR": "8000123", "InvoiceRows": []}),
    );
    let defaults = LedgerDefaults::default();
    let exporter = Exporter::new(&ledger, &defaults);
    let mut cache = RunCache::new();
    let ctx = cache.context(&ledger).await.unwrap();

    let outbound = exporter.export_invoice(ctx, "8").await.unwrap();
    assert_eq!(outbound.document_type, DocumentType::CreditInvoice);
    assert_eq!(outbound.filename(), "credit_invoice_8.json");
    assert_eq!(outbound.document.payment_reference.as_deref(), Some("8000123"));
}

#[tokio::test]
async fn missing_company_settings_abort_the_run() {
    let ledger = FakeLedger::new();
    let exchange = FakeExchange::new();
    let defaults = LedgerDefaults::default();

    let err = Exporter::new(&ledger, &defaults)
        .run(&exchange, &mut RunCache::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
}

// ---------------------------------------------------------------------------
// Run plumbing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_pages_are_walked_until_one_fails() {
    let ledger = FakeLedger::new();
    let page = |numbers: &[&str]| {
        let items: Vec<_> = numbers.iter().map(|n| json!({"DocumentNumber": n})).collect();
        json!({"Orders": items, "MetaInformation": {"@TotalPages": 4}})
    };
    ledger.respond("orders?sent=false&limit=2&page=1", page(&["1", "2"]));
    ledger.respond("orders?sent=false&limit=2&page=2", page(&["3", "4"]));
    ledger.fail("orders?sent=false&limit=2&page=3");
    ledger.respond("orders?sent=false&limit=2&page=4", page(&["7"]));

    let items = fetch_all::<_, OrderList>(&ledger, "orders?sent=false", 2)
        .await
        .unwrap();
    let numbers: Vec<_> = items
        .iter()
        .map(|i| i.document_number.as_deref().unwrap())
        .collect();
    assert_eq!(numbers, ["1", "2", "3", "4"]);
    assert_eq!(ledger.count("GET", "orders?sent=false&limit=2&page=4"), 0);

    ledger.fail("offers?limit=2&page=1");
    assert!(
        fetch_all::<_, OfferList>(&ledger, "offers", 2)
            .await
            .is_none()
    );
}

#[tokio::test]
async fn marker_invokes_the_action_at_most_once() {
    let ledger = FakeLedger::new();
    let mut marker = SentMarker::new("offers", "3");
    assert!(!marker.is_fired());
    assert!(marker.mark(&ledger).await);
    assert!(!marker.mark(&ledger).await);
    assert!(marker.is_fired());
    assert_eq!(ledger.count("PUT", "offers/3/externalprint"), 1);

    ledger.fail("offers/4/externalprint");
    let mut failing = SentMarker::new("offers", "4");
    assert!(!failing.mark(&ledger).await);
    assert!(failing.is_fired());
    failing.mark(&ledger).await;
    assert_eq!(ledger.count("PUT", "offers/4/externalprint"), 1);
}

#[tokio::test]
async fn run_cache_fetches_labels_once_and_retries_company() {
    let ledger = FakeLedger::new();
    ledger.respond(
        "labels",
        json!({"Labels": [{"Id": 1, "Description": EXPORT_LABEL}]}),
    );
    let mut cache = RunCache::new();

    assert!(cache.context(&ledger).await.is_none());
    ledger.insert("settings/company", "CompanySettings", json!({"Name": "Seller AB"}));
    let ctx = cache.context(&ledger).await.unwrap();
    assert_eq!(ctx.labels.get("1").map(String::as_str), Some(EXPORT_LABEL));
    assert_eq!(ctx.company.name.as_deref(), Some("Seller AB"));

    assert_eq!(ledger.count("GET", "labels"), 1);
    assert_eq!(ledger.count("GET", "settings/company"), 2);
}

#[tokio::test]
async fn send_without_recipient_is_refused() {
    let exchange = FakeExchange::new();
    let outbound = OutboundDocument {
        document_type: DocumentType::Quotation,
        document: TradeDocument {
            id: Some("3".into()),
            ..Default::default()
        },
        email: Some(String::new()),
        language_code: None,
    };
    assert!(!send(&exchange, &outbound).await);

    let outbound = OutboundDocument {
        email: Some("buyer@example.se".into()),
        ..outbound
    };
    assert!(send(&exchange, &outbound).await);
    let sent = exchange.sent();
    assert_eq!(sent[0].filename, "quotation_3.json");
    assert_eq!(sent[0].language_code, "en");
    assert_eq!(sent[0].version, "1");
}

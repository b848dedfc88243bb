//! Outbound documents: ledger offer, order or invoice to trade document.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::gate::SupplierGroup;
use super::pricing::{DiscountType, add_freight, add_invoice_fee, net_price};
use crate::core::ledger::{
    Article, CompanySettings, Customer, Invoice, Offer, Order, SalesHeader, SalesRow,
};
use crate::core::{
    DocumentType, PartyInformation, PaymentOption, ProductRow, References, TradeDocument,
    is_present,
};
use crate::vat::vat_specification;

/// A trade document ready to send, with its routing data.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundDocument {
    /// Envelope type; `purchase_order_<supplier>` for purchase orders.
    pub document_type: DocumentType,
    pub document: TradeDocument,
    /// Recipient. Documents without one are not sent.
    pub email: Option<String>,
    pub language_code: Option<String>,
}

impl OutboundDocument {
    /// `{document_type}_{id}.json`
    pub fn filename(&self) -> String {
        format!(
            "{}_{}.json",
            self.document_type,
            self.document.id.as_deref().unwrap_or_default()
        )
    }
}

/// Everything besides the ledger document needed to build a sales document.
#[derive(Debug, Clone, Copy)]
pub struct SalesParties<'a> {
    pub company: &'a CompanySettings,
    pub customer: &'a Customer,
    pub penalty_interest: Decimal,
}

/// The tenant as a party, with `reference` as contact.
pub fn company_party(company: &CompanySettings, reference: Option<&str>) -> PartyInformation {
    PartyInformation {
        person_id: company.organization_number.clone(),
        person_name: company.name.clone(),
        address_line_1: company.address.clone(),
        postcode: company.zip_code.clone(),
        city_name: company.city.clone(),
        country_name: company.country.clone(),
        country_code: company.country_code.clone(),
        contact_name: reference.map(str::to_string),
        phone_number: company.phone1.clone(),
        email: company.email.clone(),
        vat_number: company.vat_number.clone(),
        ..Default::default()
    }
}

/// Payment options from the company's IBAN, bank giro and postal giro.
pub fn payment_options(company: &CompanySettings) -> Vec<PaymentOption> {
    let mut options = Vec::new();
    if is_present(company.iban.as_deref()) {
        options.push(PaymentOption {
            name: Some("IBAN".into()),
            account_reference: company.iban.clone(),
            bank_identifier_code: company.bic.clone(),
            ..Default::default()
        });
    }
    if is_present(company.bg.as_deref()) {
        options.push(PaymentOption {
            name: Some("BG".into()),
            account_reference: company.bg.clone(),
            bank_identifier_code: Some("BGABSESS".into()),
            bank_name: Some("Bankgirocentralen BGC AB".into()),
            bank_country_code: Some("SE".into()),
        });
    }
    if is_present(company.pg.as_deref()) {
        options.push(PaymentOption {
            name: Some("PG".into()),
            account_reference: company.pg.clone(),
            bank_identifier_code: Some("NDEASESS".into()),
            bank_name: Some("Nordea Bank AB".into()),
            bank_country_code: Some("SE".into()),
        });
    }
    options
}

fn buyer_party(header: &SalesHeader, customer: &Customer) -> PartyInformation {
    PartyInformation {
        person_id: header.organisation_number.clone(),
        person_name: header.customer_name.clone(),
        address_line_1: header.address1.clone(),
        address_line_2: header.address2.clone(),
        postcode: header.zip_code.clone(),
        city_name: header.city.clone(),
        country_name: header.country.clone(),
        contact_name: header.your_reference.clone(),
        phone_number: header.phone1.clone(),
        email: customer.email.clone(),
        ..Default::default()
    }
}

fn delivery_party(header: &SalesHeader) -> PartyInformation {
    PartyInformation {
        person_name: header.delivery_name.clone(),
        address_line_1: header.delivery_address1.clone(),
        address_line_2: header.delivery_address2.clone(),
        postcode: header.delivery_zip_code.clone(),
        city_name: header.delivery_city.clone(),
        country_name: header.delivery_country.clone(),
        ..Default::default()
    }
}

/// Fields shared by quotations, order confirmations and invoices.
///
/// `articles` runs parallel to `rows`; `quantity` picks the row quantity
/// the document kind uses.
fn sales_document(
    header: &SalesHeader,
    rows: &[SalesRow],
    articles: &[Option<Article>],
    quantity: fn(&SalesRow) -> Option<Decimal>,
    parties: SalesParties<'_>,
) -> TradeDocument {
    let vat_included = header.vat_included.unwrap_or(false);
    let mut total_weight_kg = Decimal::ZERO;
    let mut product_rows = Vec::with_capacity(rows.len() + 2);

    for (index, row) in rows.iter().enumerate() {
        let article = articles.get(index).and_then(Option::as_ref);
        let qty = quantity(row);
        if let Some(weight) = article.and_then(|a| a.weight) {
            total_weight_kg += weight * qty.unwrap_or_default() / dec!(1000);
        }

        let vat_percent = row.vat.unwrap_or_default();
        let unit_price = row.price.map(|gross| {
            net_price(
                gross,
                vat_percent,
                vat_included,
                row.discount.unwrap_or_default(),
                row.discount_type.as_deref().and_then(DiscountType::from_code),
                qty.unwrap_or_default(),
            )
        });

        product_rows.push(ProductRow {
            product_code: article.and_then(|a| a.article_number.clone()),
            manufacturer_code: article.and_then(|a| a.manufacturer_article_number.clone()),
            gtin: article.and_then(|a| a.ean.clone()),
            product_name: row.description.clone(),
            vat_rate: row.vat.map(|v| v / dec!(100)),
            quantity: qty,
            unit_code: row.unit.clone(),
            unit_price,
            subrows: Vec::new(),
        });
    }

    let language = header.language.as_deref();
    let fee = add_invoice_fee(
        vat_included,
        header.administration_fee,
        header.administration_fee_vat,
        &mut product_rows,
        language,
    );
    let freight = add_freight(
        vat_included,
        header.freight,
        header.freight_vat,
        &mut product_rows,
        language,
    );

    TradeDocument {
        id: header.document_number.clone(),
        delivery_date: header.delivery_date,
        buyer_references: References {
            customer_id: header.customer_number.clone(),
            ..Default::default()
        },
        terms_of_delivery: header.terms_of_delivery.clone(),
        terms_of_payment: header.terms_of_payment.clone(),
        mode_of_delivery: header.way_of_delivery.clone(),
        total_weight_kg: Some(total_weight_kg),
        penalty_interest: Some(parties.penalty_interest),
        currency_code: header.currency.clone(),
        vat_country_code: parties.company.country_code.clone(),
        comment: header.remarks.clone(),
        seller_information: Some(company_party(
            parties.company,
            header.our_reference.as_deref(),
        )),
        buyer_information: Some(buyer_party(header, parties.customer)),
        delivery_information: Some(delivery_party(header)),
        payment_options: payment_options(parties.company),
        vat_specification: vat_specification(&product_rows),
        product_rows,
        subtotal: header.net.map(|net| net + fee + freight),
        vat_total: header.total_vat,
        rounding: header.round_off,
        total: header.total,
        ..Default::default()
    }
}

/// A ledger offer as a quotation.
pub fn quotation(offer: &Offer, articles: &[Option<Article>], parties: SalesParties<'_>) -> TradeDocument {
    let mut doc = sales_document(
        &offer.header,
        &offer.offer_rows,
        articles,
        |row| row.quantity,
        parties,
    );
    doc.document_type = Some(DocumentType::Quotation);
    doc.issue_date = offer.offer_date;
    doc.offer_expires_date = offer.expire_date;
    doc.buyer_references.request_for_quotation_id = offer.your_reference_number.clone();
    doc
}

/// A ledger order as an order confirmation.
pub fn order_confirmation(
    order: &Order,
    articles: &[Option<Article>],
    parties: SalesParties<'_>,
) -> TradeDocument {
    let mut doc = sales_document(
        &order.header,
        &order.order_rows,
        articles,
        |row| row.ordered_quantity,
        parties,
    );
    doc.document_type = Some(DocumentType::OrderConfirmation);
    doc.issue_date = order.order_date;
    doc.seller_references.quotation_id = order.offer_reference.clone();
    doc.buyer_references.order_id = order.your_order_number.clone();
    doc
}

/// A ledger invoice as an invoice, or a credit invoice when it credits.
///
/// The payment reference is the OCR number, else the document number.
pub fn invoice(invoice: &Invoice, articles: &[Option<Article>], parties: SalesParties<'_>) -> TradeDocument {
    let mut doc = sales_document(
        &invoice.header,
        &invoice.invoice_rows,
        articles,
        |row| row.delivered_quantity,
        parties,
    );
    doc.document_type = Some(if invoice.credit == Some(true) {
        DocumentType::CreditInvoice
    } else {
        DocumentType::Invoice
    });
    doc.payment_reference = invoice
        .ocr
        .clone()
        .filter(|ocr| !ocr.is_empty())
        .or_else(|| invoice.header.document_number.clone());
    doc.issue_date = invoice.invoice_date;
    doc.due_date = invoice.due_date;
    doc.seller_references.quotation_id = invoice.offer_reference.clone();
    doc.seller_references.order_id = invoice.order_reference.clone();
    doc.seller_references.invoice_id = invoice.invoice_reference.clone();
    doc.buyer_references.order_id = invoice.your_order_number.clone();
    doc.paid_amount = invoice
        .total_to_pay
        .zip(invoice.balance)
        .map(|(to_pay, balance)| to_pay - balance);
    doc.balance_due = invoice.balance;
    doc
}

/// A purchase order to one supplier, derived from a sales order.
///
/// The order is issued `today` by the company, delivered where the sales
/// order is delivered, and totals its rows at purchase price.
pub fn purchase_order(
    order: &Order,
    group: &SupplierGroup,
    company: &CompanySettings,
    today: NaiveDate,
) -> TradeDocument {
    let supplier = &group.supplier;
    let (net, vat) = group.rows.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(net, vat), row| {
            let amount = row.line_amount();
            (net + amount, vat + amount * row.vat_rate.unwrap_or_default())
        },
    );

    TradeDocument {
        id: order.header.document_number.clone(),
        document_type: Some(DocumentType::Order),
        issue_date: Some(today),
        delivery_date: order.header.delivery_date,
        seller_references: References {
            supplier_id: supplier.supplier_number.clone(),
            ..Default::default()
        },
        buyer_references: References {
            customer_id: supplier.our_customer_number.clone(),
            ..Default::default()
        },
        terms_of_delivery: order.header.terms_of_delivery.clone(),
        terms_of_payment: supplier.terms_of_payment.clone(),
        mode_of_delivery: order.header.way_of_delivery.clone(),
        total_weight_kg: Some(group.weight_kg),
        currency_code: supplier.currency.clone(),
        comment: order.header.remarks.clone(),
        seller_information: Some(PartyInformation {
            person_id: supplier.organisation_number.clone(),
            person_name: supplier.name.clone(),
            address_line_1: supplier.address1.clone(),
            address_line_2: supplier.address2.clone(),
            postcode: supplier.zip_code.clone(),
            city_name: supplier.city.clone(),
            country_name: supplier.country.clone(),
            country_code: supplier.country_code.clone(),
            contact_name: supplier.your_reference.clone(),
            phone_number: supplier.phone1.clone(),
            email: supplier.email.clone(),
            vat_number: supplier.vat_number.clone(),
            ..Default::default()
        }),
        buyer_information: Some(company_party(company, supplier.our_reference.as_deref())),
        delivery_information: Some(delivery_party(&order.header)),
        product_rows: group.rows.clone(),
        subtotal: Some(net),
        vat_total: Some(vat),
        rounding: Some(Decimal::ZERO),
        total: Some(net + vat),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::Supplier;

    fn company() -> CompanySettings {
        CompanySettings {
            name: Some("Seller AB".into()),
            country_code: Some("SE".into()),
            iban: Some("SE4550000000058398257466".into()),
            bic: Some("ESSESESS".into()),
            bg: Some("123-4567".into()),
            ..Default::default()
        }
    }

    #[test]
    fn payment_options_skip_missing_accounts() {
        let options = payment_options(&company());
        let names: Vec<_> = options.iter().filter_map(|o| o.name.as_deref()).collect();
        assert_eq!(names, ["IBAN", "BG"]);
        assert_eq!(options[1].bank_identifier_code.as_deref(), Some("BGABSESS"));
    }

    #[test]
    fn invoice_with_fee_freight_and_ocr() {
        let company = company();
        let customer = Customer {
            email: Some("buyer@example.com".into()),
            ..Default::default()
        };
        let ledger = Invoice {
            header: SalesHeader {
                document_number: Some("1001".into()),
                customer_number: Some("7".into()),
                vat_included: Some(false),
                administration_fee: Some(dec!(50)),
                administration_fee_vat: Some(dec!(12.5)),
                net: Some(dec!(200)),
                total_vat: Some(dec!(62.5)),
                total: Some(dec!(312.5)),
                language: Some("SV".into()),
                ..Default::default()
            },
            invoice_date: NaiveDate::from_ymd_opt(2024, 5, 2),
            ocr: Some("10015".into()),
            credit: Some(false),
            total_to_pay: Some(dec!(312.5)),
            balance: Some(dec!(112.5)),
            invoice_rows: vec![SalesRow {
                article_number: Some("A1".into()),
                description: Some("Widget".into()),
                delivered_quantity: Some(dec!(2)),
                price: Some(dec!(100)),
                vat: Some(dec!(25)),
                ..Default::default()
            }],
            ..Default::default()
        };
        let articles = [Some(Article {
            article_number: Some("A1".into()),
            weight: Some(dec!(500)),
            ..Default::default()
        })];
        let parties = SalesParties {
            company: &company,
            customer: &customer,
            penalty_interest: dec!(0.08),
        };

        let doc = invoice(&ledger, &articles, parties);
        assert_eq!(doc.document_type, Some(DocumentType::Invoice));
        assert_eq!(doc.payment_reference.as_deref(), Some("10015"));
        assert_eq!(doc.total_weight_kg, Some(dec!(1)));
        assert_eq!(doc.product_rows.len(), 2);
        assert_eq!(doc.product_rows[1].product_name.as_deref(), Some("Fakturaavgift"));
        assert_eq!(doc.subtotal, Some(dec!(250)));
        assert_eq!(doc.paid_amount, Some(dec!(200)));
        assert_eq!(doc.balance_due, Some(dec!(112.5)));
        assert_eq!(doc.vat_specification.len(), 1);
        assert_eq!(doc.vat_specification[0].taxable_amount, dec!(250));
        assert_eq!(doc.vat_specification[0].tax_amount, dec!(62.5));
        assert_eq!(
            doc.buyer_information.unwrap().email.as_deref(),
            Some("buyer@example.com")
        );
    }

    #[test]
    fn credit_invoice_falls_back_to_document_number() {
        let company = company();
        let customer = Customer::default();
        let ledger = Invoice {
            header: SalesHeader {
                document_number: Some("1002".into()),
                ..Default::default()
            },
            credit: Some(true),
            ..Default::default()
        };
        let parties = SalesParties {
            company: &company,
            customer: &customer,
            penalty_interest: Decimal::ZERO,
        };
        let doc = invoice(&ledger, &[], parties);
        assert_eq!(doc.document_type, Some(DocumentType::CreditInvoice));
        assert_eq!(doc.payment_reference.as_deref(), Some("1002"));
        assert_eq!(doc.subtotal, None);
    }

    #[test]
    fn purchase_order_totals_its_rows() {
        let order = Order {
            header: SalesHeader {
                document_number: Some("12".into()),
                delivery_name: Some("Warehouse".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let group = SupplierGroup {
            supplier: Supplier {
                supplier_number: Some("S1".into()),
                our_customer_number: Some("C-77".into()),
                ..Default::default()
            },
            rows: vec![ProductRow {
                unit_price: Some(dec!(40)),
                quantity: Some(dec!(3)),
                vat_rate: Some(dec!(0.25)),
                ..Default::default()
            }],
            weight_kg: dec!(1.5),
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let doc = purchase_order(&order, &group, &company(), today);

        assert_eq!(doc.document_type, Some(DocumentType::Order));
        assert_eq!(doc.issue_date, Some(today));
        assert_eq!(doc.seller_references.supplier_id.as_deref(), Some("S1"));
        assert_eq!(doc.buyer_references.customer_id.as_deref(), Some("C-77"));
        assert_eq!(doc.subtotal, Some(dec!(120)));
        assert_eq!(doc.vat_total, Some(dec!(30)));
        assert_eq!(doc.total, Some(dec!(150)));
        assert_eq!(doc.total_weight_kg, Some(dec!(1.5)));
        assert_eq!(
            doc.delivery_information.unwrap().person_name.as_deref(),
            Some("Warehouse")
        );
    }

    #[test]
    fn filename_uses_envelope_type() {
        let outbound = OutboundDocument {
            document_type: DocumentType::PurchaseOrder("S1".into()),
            document: TradeDocument {
                id: Some("12".into()),
                ..Default::default()
            },
            email: None,
            language_code: None,
        };
        assert_eq!(outbound.filename(), "purchase_order_S1_12.json");
    }
}

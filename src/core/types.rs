use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::SyncError;

/// Standard name every exchanged trade document file is tagged with.
pub const STANDARD_NAME: &str = "Annytab Dox Trade v1";

/// Deepest product-row nesting accepted when flattening a row tree.
pub const MAX_ROW_DEPTH: usize = 32;

/// The canonical, vendor-neutral trade document exchanged as a JSON file.
///
/// Field names follow the exchange format (snake_case). Every field is
/// optional on the wire; absent values deserialize to `None` / empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeDocument {
    /// Document number assigned by the issuer.
    pub id: Option<String>,
    /// Kind of document.
    pub document_type: Option<DocumentType>,
    /// Reference the payer must quote (OCR, invoice number).
    pub payment_reference: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub offer_expires_date: Option<NaiveDate>,
    /// Correlation identifiers on the seller side.
    pub seller_references: References,
    /// Correlation identifiers on the buyer side.
    pub buyer_references: References,
    pub terms_of_delivery: Option<String>,
    pub terms_of_payment: Option<String>,
    /// Way of delivery.
    pub mode_of_delivery: Option<String>,
    pub total_weight_kg: Option<Decimal>,
    pub penalty_interest: Option<Decimal>,
    /// ISO 4217 currency code.
    pub currency_code: Option<String>,
    /// Country whose VAT rules apply.
    pub vat_country_code: Option<String>,
    pub comment: Option<String>,
    pub seller_information: Option<PartyInformation>,
    pub buyer_information: Option<PartyInformation>,
    pub delivery_information: Option<PartyInformation>,
    pub payment_options: Vec<PaymentOption>,
    /// Line items, possibly nested through [`ProductRow::subrows`].
    pub product_rows: Vec<ProductRow>,
    /// VAT buckets, see [`crate::vat::vat_specification`].
    pub vat_specification: Vec<VatSpecification>,
    pub subtotal: Option<Decimal>,
    pub vat_total: Option<Decimal>,
    pub rounding: Option<Decimal>,
    pub total: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub balance_due: Option<Decimal>,
}

impl TradeDocument {
    /// Parse a document from the raw bytes of an exchange file.
    pub fn from_json(bytes: &[u8]) -> Result<Self, SyncError> {
        serde_json::from_slice(bytes).map_err(|e| SyncError::Document(e.to_string()))
    }

    /// Serialize the document to UTF-8 JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec(self).map_err(|e| SyncError::Document(e.to_string()))
    }

    /// Flatten the product-row tree in depth-first preorder.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Document`] when the tree is nested deeper than
    /// [`MAX_ROW_DEPTH`].
    pub fn flattened_rows(&self) -> Result<Vec<&ProductRow>, SyncError> {
        flatten_rows(&self.product_rows)
    }
}

/// Kind of a trade document.
///
/// The string forms are a contract with the exchange side and serialize
/// verbatim, e.g. `"order_confirmation"` or `"purchase_order_42"`. Codes
/// this crate does not know are kept as [`DocumentType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    RequestForQuotation,
    Quotation,
    Order,
    OrderConfirmation,
    Invoice,
    CreditInvoice,
    /// Purchase order addressed to the supplier with the given number.
    PurchaseOrder(String),
    /// Any other code, kept verbatim.
    Other(String),
}

const PURCHASE_ORDER_PREFIX: &str = "purchase_order_";

impl DocumentType {
    /// Wire code of the document type.
    pub fn code(&self) -> String {
        match self {
            Self::RequestForQuotation => "request_for_quotation".into(),
            Self::Quotation => "quotation".into(),
            Self::Order => "order".into(),
            Self::OrderConfirmation => "order_confirmation".into(),
            Self::Invoice => "invoice".into(),
            Self::CreditInvoice => "credit_invoice".into(),
            Self::PurchaseOrder(supplier) => format!("{PURCHASE_ORDER_PREFIX}{supplier}"),
            Self::Other(code) => code.clone(),
        }
    }

    /// Parse a known wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "request_for_quotation" => Some(Self::RequestForQuotation),
            "quotation" => Some(Self::Quotation),
            "order" => Some(Self::Order),
            "order_confirmation" => Some(Self::OrderConfirmation),
            "invoice" => Some(Self::Invoice),
            "credit_invoice" => Some(Self::CreditInvoice),
            other => other
                .strip_prefix(PURCHASE_ORDER_PREFIX)
                .filter(|supplier| !supplier.is_empty())
                .map(|supplier| Self::PurchaseOrder(supplier.to_string())),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl From<String> for DocumentType {
    fn from(value: String) -> Self {
        Self::from_code(&value).unwrap_or(Self::Other(value))
    }
}

impl From<DocumentType> for String {
    fn from(value: DocumentType) -> Self {
        value.code()
    }
}

/// Correlation identifiers carried by a document for one side of the trade.
///
/// Unknown keys on the wire are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct References {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_for_quotation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
}

/// Seller, buyer or delivery party block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyInformation {
    /// Organisation or personal identity number.
    pub person_id: Option<String>,
    pub person_name: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub address_line_3: Option<String>,
    pub postcode: Option<String>,
    pub city_name: Option<String>,
    pub country_name: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: Option<String>,
    pub state_code: Option<String>,
    pub contact_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub vat_number: Option<String>,
}

/// A way to pay the document (IBAN, BG, PG or BANK).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentOption {
    pub name: Option<String>,
    pub account_reference: Option<String>,
    pub bank_identifier_code: Option<String>,
    pub bank_name: Option<String>,
    pub bank_country_code: Option<String>,
}

/// A line item. Rows nest arbitrarily through `subrows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRow {
    pub product_code: Option<String>,
    pub manufacturer_code: Option<String>,
    /// Global trade item number (EAN).
    pub gtin: Option<String>,
    pub product_name: Option<String>,
    /// VAT as a fraction, e.g. `0.25` for 25 %.
    pub vat_rate: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub unit_code: Option<String>,
    pub unit_price: Option<Decimal>,
    pub subrows: Vec<ProductRow>,
}

impl ProductRow {
    /// Whether the row carries any identifier an article can be resolved by.
    pub fn has_identifier(&self) -> bool {
        [&self.product_code, &self.manufacturer_code, &self.gtin]
            .into_iter()
            .any(|v| is_present(v.as_deref()))
    }

    /// `unit_price * quantity`, absent values counting as zero.
    pub fn line_amount(&self) -> Decimal {
        self.unit_price.unwrap_or_default() * self.quantity.unwrap_or_default()
    }
}

/// Flatten a row tree in depth-first preorder: each node is emitted
/// before its subrows.
pub fn flatten_rows(rows: &[ProductRow]) -> Result<Vec<&ProductRow>, SyncError> {
    let mut out = Vec::new();
    flatten_into(rows, 0, &mut out)?;
    Ok(out)
}

fn flatten_into<'a>(
    rows: &'a [ProductRow],
    depth: usize,
    out: &mut Vec<&'a ProductRow>,
) -> Result<(), SyncError> {
    if rows.is_empty() {
        return Ok(());
    }
    if depth >= MAX_ROW_DEPTH {
        return Err(SyncError::Document(format!(
            "product rows nested deeper than {MAX_ROW_DEPTH} levels"
        )));
    }
    for row in rows {
        out.push(row);
        flatten_into(&row.subrows, depth + 1, out)?;
    }
    Ok(())
}

/// One VAT bucket of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VatSpecification {
    pub tax_rate: Option<Decimal>,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
}

/// `true` when the value is present and not empty.
pub(crate) fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// The value if present and not empty.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

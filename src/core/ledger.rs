//! Accounting back-end resources.
//!
//! Field names follow the accounting API (PascalCase). Single records travel
//! wrapped in a one-entry object keyed by the resource name
//! (`{"Customer": {...}}`), see [`Root`]. Listings carry a
//! [`MetaInformation`] block next to the items.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::{self, DeserializeOwned, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A record type addressed through a single-entry root object.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key of the root object, e.g. `"Customer"`.
    const ROOT: &'static str;
}

/// Wire envelope of a single [`Resource`].
///
/// Serializes as `{ROOT: inner}`. Deserializing picks the `ROOT` entry and
/// ignores any siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct Root<T>(pub T);

impl<T> Root<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Resource> Serialize for Root<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(T::ROOT, &self.0)?;
        map.end()
    }
}

impl<'de, T: Resource> Deserialize<'de> for Root<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RootVisitor<T>(PhantomData<T>);

        impl<'de, T: Resource> Visitor<'de> for RootVisitor<T> {
            type Value = Root<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an object with a {:?} entry", T::ROOT)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Root<T>, A::Error> {
                let mut inner = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == T::ROOT && inner.is_none() {
                        inner = Some(map.next_value::<T>()?);
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                inner.map(Root).ok_or_else(|| de::Error::missing_field(T::ROOT))
            }
        }

        deserializer.deserialize_map(RootVisitor(PhantomData))
    }
}

/// Identifiers arrive either as strings or as bare integers.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(opt_id_string(deserializer)?.unwrap_or_default())
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Integer(i64),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(s) => s,
        Id::Integer(n) => n.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// Low-cardinality reference code families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    TermsOfDelivery,
    TermsOfPayment,
    WayOfDelivery,
    Currency,
    Unit,
    PriceList,
    /// Ledger account, keyed by account number.
    Account,
}

impl ReferenceKind {
    /// Collection path.
    pub fn path(&self) -> &'static str {
        match self {
            Self::TermsOfDelivery => "termsofdeliveries",
            Self::TermsOfPayment => "termsofpayments",
            Self::WayOfDelivery => "wayofdeliveries",
            Self::Currency => "currencies",
            Self::Unit => "units",
            Self::PriceList => "pricelists",
            Self::Account => "accounts",
        }
    }

    /// Root key of a single record.
    pub fn root_key(&self) -> &'static str {
        match self {
            Self::TermsOfDelivery => "TermsOfDelivery",
            Self::TermsOfPayment => "TermsOfPayment",
            Self::WayOfDelivery => "WayOfDelivery",
            Self::Currency => "Currency",
            Self::Unit => "Unit",
            Self::PriceList => "PriceList",
            Self::Account => "Account",
        }
    }

    /// Whether records of this kind are keyed by `Number` instead of `Code`.
    pub fn keyed_by_number(&self) -> bool {
        matches!(self, Self::Account)
    }

    /// A new record with code and description both set to `code`.
    pub fn new_entity(&self, code: &str) -> ReferenceEntity {
        let mut entity = ReferenceEntity {
            description: Some(code.to_string()),
            ..Default::default()
        };
        if self.keyed_by_number() {
            entity.number = Some(code.to_string());
        } else {
            entity.code = Some(code.to_string());
        }
        entity
    }

    /// Wrap a record in its root object.
    pub fn wrap(&self, entity: ReferenceEntity) -> BTreeMap<String, ReferenceEntity> {
        BTreeMap::from([(self.root_key().to_string(), entity)])
    }

    /// Take the record out of its root object.
    pub fn unwrap(&self, mut root: BTreeMap<String, ReferenceEntity>) -> Option<ReferenceEntity> {
        root.remove(self.root_key())
    }
}

/// A reference-data record: a code (or account number) and a description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceEntity {
    #[serde(rename = "Code", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(
        rename = "Number",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_id_string"
    )]
    pub number: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ReferenceEntity {
    /// The natural key, whichever of code or number is set.
    pub fn key(&self) -> Option<&str> {
        self.code.as_deref().or(self.number.as_deref())
    }
}

/// Currency with exchange rates against the base currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Currency {
    pub code: Option<String>,
    pub description: Option<String>,
    pub unit: Option<Decimal>,
    pub buy_rate: Option<Decimal>,
    pub sell_rate: Option<Decimal>,
}

impl Resource for Currency {
    const ROOT: &'static str = "Currency";
}

// ---------------------------------------------------------------------------
// Parties
// ---------------------------------------------------------------------------

/// Customer master record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Customer {
    pub customer_number: Option<String>,
    pub name: Option<String>,
    pub organisation_number: Option<String>,
    #[serde(rename = "VATNumber")]
    pub vat_number: Option<String>,
    #[serde(rename = "VATType")]
    pub vat_type: Option<String>,
    /// `COMPANY` or `PRIVATE`.
    #[serde(rename = "Type")]
    pub kind: Option<String>,
    pub email: Option<String>,
    pub email_offer: Option<String>,
    pub email_order: Option<String>,
    pub email_invoice: Option<String>,
    pub our_reference: Option<String>,
    pub your_reference: Option<String>,
    pub phone1: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub delivery_name: Option<String>,
    pub delivery_phone1: Option<String>,
    pub delivery_address1: Option<String>,
    pub delivery_address2: Option<String>,
    pub delivery_zip_code: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_country_code: Option<String>,
    pub currency: Option<String>,
    pub terms_of_delivery: Option<String>,
    pub terms_of_payment: Option<String>,
    pub way_of_delivery: Option<String>,
    pub price_list: Option<String>,
}

impl Resource for Customer {
    const ROOT: &'static str = "Customer";
}

/// Supplier master record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Supplier {
    pub supplier_number: Option<String>,
    pub name: Option<String>,
    pub organisation_number: Option<String>,
    #[serde(rename = "VATNumber")]
    pub vat_number: Option<String>,
    #[serde(rename = "VATType")]
    pub vat_type: Option<String>,
    pub email: Option<String>,
    pub our_reference: Option<String>,
    pub your_reference: Option<String>,
    /// Our customer number in the supplier's books.
    pub our_customer_number: Option<String>,
    pub phone1: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub currency: Option<String>,
    pub terms_of_payment: Option<String>,
    #[serde(rename = "BIC")]
    pub bic: Option<String>,
    #[serde(rename = "IBAN")]
    pub iban: Option<String>,
    #[serde(rename = "BG")]
    pub bg: Option<String>,
    #[serde(rename = "PG")]
    pub pg: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank: Option<String>,
}

impl Resource for Supplier {
    const ROOT: &'static str = "Supplier";
}

// ---------------------------------------------------------------------------
// Articles and prices
// ---------------------------------------------------------------------------

/// Article master record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Article {
    pub article_number: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "EAN")]
    pub ean: Option<String>,
    pub manufacturer_article_number: Option<String>,
    pub unit: Option<String>,
    pub sales_account: Option<String>,
    pub purchase_account: Option<String>,
    /// Sales account for domestic reverse-charge (construction) sales.
    pub construction_account: Option<String>,
    #[serde(rename = "EUAccount")]
    pub eu_account: Option<String>,
    #[serde(rename = "EUVATAccount")]
    pub eu_vat_account: Option<String>,
    pub export_account: Option<String>,
    pub stock_goods: Option<bool>,
    pub stock_account: Option<String>,
    pub stock_change_account: Option<String>,
    pub supplier_number: Option<String>,
    /// Weight in grams.
    pub weight: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
}

impl Resource for Article {
    const ROOT: &'static str = "Article";
}

/// A price-list entry for an article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Price {
    pub article_number: Option<String>,
    pub price_list: Option<String>,
    pub from_quantity: Decimal,
    #[serde(rename = "Price")]
    pub amount: Option<Decimal>,
}

impl Resource for Price {
    const ROOT: &'static str = "Price";
}

// ---------------------------------------------------------------------------
// Settings, labels, trusted senders
// ---------------------------------------------------------------------------

/// The tenant's own company details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CompanySettings {
    pub name: Option<String>,
    pub organization_number: Option<String>,
    pub address: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub phone1: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "VATNumber")]
    pub vat_number: Option<String>,
    #[serde(rename = "IBAN")]
    pub iban: Option<String>,
    #[serde(rename = "BIC")]
    pub bic: Option<String>,
    #[serde(rename = "BG")]
    pub bg: Option<String>,
    #[serde(rename = "PG")]
    pub pg: Option<String>,
}

impl Resource for CompanySettings {
    const ROOT: &'static str = "CompanySettings";
}

/// A label definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Label {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub description: String,
}

/// A label attached to a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LabelRef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

/// `GET labels` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LabelList {
    pub labels: Vec<Label>,
}

/// Sender addresses whose documents may be imported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EmailSenders {
    pub trusted_senders: Vec<EmailSender>,
    pub rejected_senders: Vec<EmailSender>,
}

impl EmailSenders {
    pub fn is_trusted(&self, email: &str) -> bool {
        self.trusted_senders
            .iter()
            .any(|s| s.email.as_deref() == Some(email))
    }
}

impl Resource for EmailSenders {
    const ROOT: &'static str = "EmailSenders";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EmailSender {
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Sales documents
// ---------------------------------------------------------------------------

/// Fields shared by offers, orders and invoices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SalesHeader {
    pub document_number: Option<String>,
    pub customer_number: Option<String>,
    pub customer_name: Option<String>,
    pub organisation_number: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone1: Option<String>,
    pub our_reference: Option<String>,
    pub your_reference: Option<String>,
    pub delivery_name: Option<String>,
    pub delivery_address1: Option<String>,
    pub delivery_address2: Option<String>,
    pub delivery_zip_code: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_country: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub terms_of_delivery: Option<String>,
    pub terms_of_payment: Option<String>,
    pub way_of_delivery: Option<String>,
    pub currency: Option<String>,
    pub language: Option<String>,
    pub remarks: Option<String>,
    pub comments: Option<String>,
    #[serde(rename = "VATIncluded")]
    pub vat_included: Option<bool>,
    pub labels: Vec<LabelRef>,
    pub administration_fee: Option<Decimal>,
    #[serde(rename = "AdministrationFeeVAT")]
    pub administration_fee_vat: Option<Decimal>,
    pub freight: Option<Decimal>,
    #[serde(rename = "FreightVAT")]
    pub freight_vat: Option<Decimal>,
    pub net: Option<Decimal>,
    #[serde(rename = "TotalVAT")]
    pub total_vat: Option<Decimal>,
    pub round_off: Option<Decimal>,
    pub total: Option<Decimal>,
}

/// A row of an offer, order or invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SalesRow {
    pub article_number: Option<String>,
    pub description: Option<String>,
    /// Offer quantity.
    pub quantity: Option<Decimal>,
    /// Order quantity.
    pub ordered_quantity: Option<Decimal>,
    /// Order and invoice quantity.
    pub delivered_quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub unit: Option<String>,
    /// VAT in percent, e.g. `25`.
    #[serde(rename = "VAT")]
    pub vat: Option<Decimal>,
    pub discount: Option<Decimal>,
    /// `AMOUNT` or `PERCENT`.
    pub discount_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Offer {
    #[serde(flatten)]
    pub header: SalesHeader,
    pub offer_date: Option<NaiveDate>,
    pub expire_date: Option<NaiveDate>,
    pub your_reference_number: Option<String>,
    pub offer_rows: Vec<SalesRow>,
}

impl Resource for Offer {
    const ROOT: &'static str = "Offer";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Order {
    #[serde(flatten)]
    pub header: SalesHeader,
    pub order_date: Option<NaiveDate>,
    pub your_order_number: Option<String>,
    pub offer_reference: Option<String>,
    pub external_invoice_reference1: Option<String>,
    pub external_invoice_reference2: Option<String>,
    pub order_rows: Vec<SalesRow>,
}

impl Resource for Order {
    const ROOT: &'static str = "Order";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Invoice {
    #[serde(flatten)]
    pub header: SalesHeader,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub your_order_number: Option<String>,
    pub offer_reference: Option<String>,
    pub order_reference: Option<String>,
    pub invoice_reference: Option<String>,
    #[serde(rename = "OCR")]
    pub ocr: Option<String>,
    pub credit: Option<bool>,
    pub total_to_pay: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub invoice_rows: Vec<SalesRow>,
}

impl Resource for Invoice {
    const ROOT: &'static str = "Invoice";
}

// ---------------------------------------------------------------------------
// Supplier invoices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SupplierInvoice {
    pub given_number: Option<String>,
    pub supplier_number: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub comments: Option<String>,
    pub supplier_invoice_rows: Vec<SupplierInvoiceRow>,
}

impl Resource for SupplierInvoice {
    const ROOT: &'static str = "SupplierInvoice";
}

/// A supplier-invoice row. Either a product row or a synthetic booking
/// row identified by `code` (`TOT`, `VAT`, `ROV`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SupplierInvoiceRow {
    pub code: Option<String>,
    pub total: Option<Decimal>,
    pub article_number: Option<String>,
    pub account: Option<String>,
    pub item_description: Option<String>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub unit: Option<String>,
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// Paging metadata of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaInformation {
    #[serde(rename = "@TotalResources")]
    pub total_resources: Option<u32>,
    #[serde(rename = "@TotalPages")]
    pub total_pages: Option<u32>,
    #[serde(rename = "@CurrentPage")]
    pub current_page: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CustomerSummary {
    pub customer_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CustomerList {
    pub customers: Vec<CustomerSummary>,
    pub meta_information: Option<MetaInformation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SupplierSummary {
    pub supplier_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SupplierList {
    pub suppliers: Vec<SupplierSummary>,
    pub meta_information: Option<MetaInformation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ArticleSummary {
    pub article_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ArticleList {
    pub articles: Vec<ArticleSummary>,
    pub meta_information: Option<MetaInformation>,
}

/// A listed offer, order or invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DocumentSummary {
    pub document_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OfferList {
    pub offers: Vec<DocumentSummary>,
    pub meta_information: Option<MetaInformation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OrderList {
    pub orders: Vec<DocumentSummary>,
    pub meta_information: Option<MetaInformation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct InvoiceList {
    pub invoices: Vec<DocumentSummary>,
    pub meta_information: Option<MetaInformation>,
}

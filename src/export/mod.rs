//! Accounting to exchange export.
//!
//! Unsent offers, orders and invoices that carry the `a-dox-trade-v1` label
//! become quotations, order confirmations and (credit) invoices. Orders
//! labelled `a-dox-trade-v1-po` additionally fan out into one purchase order
//! per supplier of their articles. After the first successful send the
//! source document is marked sent, once.
//!
//! Unit prices are reconstructed as net prices ([`net_price`]); invoice fees
//! and freight become extra product rows.

mod cache;
mod document;
mod gate;
mod pagination;
mod pricing;
mod runner;

pub use cache::{RunCache, RunContext};
pub use document::{
    OutboundDocument, SalesParties, company_party, invoice, order_confirmation, payment_options,
    purchase_order, quotation,
};
pub use gate::{
    EXPORT_LABEL, Eligibility, PURCHASE_ORDER_LABEL, SentMarker, SupplierGroup, group_by_supplier,
};
pub use pagination::{DEFAULT_PAGE_SIZE, Paged, fetch_all};
pub use pricing::{DiscountType, add_freight, add_invoice_fee, net_price};
pub use runner::{ExportSummary, Exporter, send};

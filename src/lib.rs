//! # tradesync
//!
//! Reconciles trade documents (quotations, orders, invoices, credit invoices)
//! between a document-exchange service and a Fortnox-style accounting back-end,
//! in both directions.
//!
//! Inbound, a canonical [`TradeDocument`](crate::core::TradeDocument) becomes a
//! sequence of idempotent upserts: reference codes, the counterparty, one
//! article per identified product row, and finally the offer, order or
//! supplier invoice itself. Outbound, unsent offers, orders and invoices that
//! carry the export label are turned back into canonical documents, including
//! net price reconstruction, fee and freight rows, VAT buckets and
//! per-supplier purchase orders.
//!
//! All monetary values use [`rust_decimal::Decimal`].
//! Collaborators (accounting API, document exchange, currency rates) are async
//! traits; [`http`] ships `reqwest` implementations of the first and last.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document and ledger models, client traits, configuration, VAT rules |
//! | `import` (default) | Exchange → accounting import |
//! | `export` (default) | Accounting → exchange export |
//! | `http` | `reqwest` accounting client and currency-rate source |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod vat;

#[cfg(feature = "import")]
pub mod import;

#[cfg(feature = "export")]
pub mod export;

#[cfg(feature = "http")]
pub mod http;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

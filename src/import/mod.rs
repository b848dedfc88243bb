//! Exchange to accounting import.
//!
//! Every step is an idempotent upsert keyed by a natural key (code, email,
//! GTIN, article number): look the record up, create it when missing. There
//! is no transaction around a document; reference data created before a
//! later step fails stays in place.
//!
//! ```no_run
//! # async fn demo<C, X>(client: &C, exchange: &X) -> Result<(), tradesync::SyncError>
//! # where C: tradesync::AccountingClient, X: tradesync::DocumentExchange {
//! use tradesync::LedgerDefaults;
//! use tradesync::import::Importer;
//!
//! let importer = Importer::new(client, exchange, &LedgerDefaults::default());
//! importer.prepare().await;
//! let summary = importer.run().await?;
//! println!("{} imported, {} failed", summary.imported, summary.failed);
//! # Ok(())
//! # }
//! ```

mod article;
mod currency;
mod document;
mod party;
mod reference;
mod runner;

pub use article::resolve_article;
pub use currency::{inverse_rate, upsert_currencies};
pub use document::{add_offer, add_order, add_supplier_invoice};
pub use party::{upsert_customer, upsert_supplier};
pub use reference::ensure_reference;
pub use runner::{ImportSummary, Importer, PAGE_SIZE};

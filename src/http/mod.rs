//! `reqwest` implementations of the accounting client and the
//! currency-rate source.
//!
//! The document exchange has no implementation here; hosts bring their own
//! [`DocumentExchange`](crate::core::DocumentExchange).

mod ledger;
mod rates;

pub use ledger::LedgerHttpClient;
pub use rates::{CACHE_FILE, FixerRateSource};

//! Core types: the canonical trade document, accounting resources,
//! collaborator traits, errors and settings.
//!
//! Canonical documents use snake_case JSON; accounting resources use the
//! accounting API's PascalCase JSON wrapped in a root object.

mod client;
mod config;
mod error;
pub mod ledger;
mod rates;
pub mod text;
mod types;

pub use client::*;
pub use config::*;
pub use error::*;
pub use ledger::{Resource, Root};
pub use rates::*;
pub use types::*;

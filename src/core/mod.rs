//! Core invoice types, builders, and errors.
//!
//! This module models the subset of a GOBL `bill.Invoice` that the NAV
//! conversion reads: parties, lines, taxes, totals, currency, and regime tags.

mod builder;
pub mod countries;
mod error;
mod types;

pub use builder::*;
pub use countries::is_eu_tax_country;
pub use error::*;
pub use types::*;

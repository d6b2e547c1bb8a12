//! # szamla
//!
//! Hungarian e-invoicing for GOBL documents: conversion of a GOBL
//! `bill.Invoice` into the NAV Online Invoice (OSA 3.0) `InvoiceData` XML,
//! and an async client that reports it to NAV.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Amounts in the issue currency are converted to HUF with the invoice's
//! exchange rate and rounded half away from zero.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use szamla::core::*;
//!
//! let invoice = InvoiceBuilder::new("SZ-2024-001", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .supplier(PartyBuilder::new("Minta Kft.")
//!         .tax_id("HU", "12345678202")
//!         .address(AddressBuilder::new("Budapest", "1051", "HU").street("Fő").number("1").build())
//!         .build())
//!     .customer(PartyBuilder::new("Vevő Bt.")
//!         .tax_id("HU", "87654321213")
//!         .address(AddressBuilder::new("Szeged", "6720", "HU").street("Kárász").number("5").build())
//!         .build())
//!     .add_line(LineBuilder::new("Tanácsadás", dec!(2), dec!(50000)).unit("h").vat(dec!(27)).build())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(invoice.totals.payable, dec!(127000.00));
//!
//! let xml = szamla::nav::to_nav_xml(&invoice).unwrap();
//! assert!(xml.contains("<customerVatStatus>DOMESTIC</customerVatStatus>"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | GOBL invoice types, builders, totals |
//! | `nav` (default) | NAV `InvoiceData` XML generation |
//! | `gateway` | NAV Online Invoice API client (token exchange, reporting, status) |
//! | `cli` | `szamla` command line converter |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "nav")]
pub mod nav;

#[cfg(feature = "gateway")]
pub mod gateway;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

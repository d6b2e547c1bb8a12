//! NAV Online Invoice (OSA 3.0) `InvoiceData` generation.
//!
//! Converts a GOBL [`Invoice`] into the XML document Hungarian issuers report
//! to NAV. The conversion is a pure function: no I/O, no shared state.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use szamla::core::*;
//! use szamla::nav;
//!
//! let invoice = InvoiceBuilder::new("SZ-2024-001", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .supplier(PartyBuilder::new("Minta Kft.")
//!         .tax_id("HU", "12345678202")
//!         .address(AddressBuilder::new("Budapest", "1051", "HU").street("Fő").number("1").build())
//!         .build())
//!     .add_line(LineBuilder::new("Tanácsadás", dec!(1), dec!(10000)).vat(dec!(27)).build())
//!     .build()
//!     .unwrap();
//!
//! let xml = nav::to_nav_xml(&invoice).unwrap();
//! assert!(xml.contains("<invoiceVatAmount>2700.00</invoiceVatAmount>"));
//! ```

mod address;
mod amount;
mod detail;
mod document;
mod lines;
mod party;
mod summary;
mod taxnumber;
mod units;
mod vatrate;
pub(crate) mod xml_utils;

use serde::{Deserialize, Serialize};

use crate::core::{Invoice, NavError};

pub use address::{DetailedAddress, NavAddress, SimpleAddress, address_detail};
pub use amount::{HUF_SCALE, RATE_SCALE, resolve_rate, to_huf};
pub use detail::{InvoiceCategory, InvoiceDetail, PaymentMethod};
pub use document::Document;
pub use lines::{LineAmounts, LineDiscount, NavLine, ProductCode};
pub use party::{CustomerInfo, CustomerVatData, CustomerVatStatus, SupplierInfo};
pub use summary::{InvoiceSummary, SummaryByVatRate};
pub use taxnumber::{TaxNumber, decompose};
pub use units::nav_unit;
pub use vatrate::{
    EXT_EXEMPTION_CODE, EXT_OUT_OF_SCOPE_CODE, MarginScheme, RateSource, TaxInfo, VatRate,
    classify, classify_combo, classify_total,
};

/// OSA 3.0 namespace URIs.
pub mod ns {
    pub const DATA: &str = "http://schemas.nav.gov.hu/OSA/3.0/data";
    pub const BASE: &str = "http://schemas.nav.gov.hu/OSA/3.0/base";
    pub const COMMON: &str = "http://schemas.nav.gov.hu/NTCA/1.0/common";
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
    pub const DATA_SCHEMA_LOCATION: &str = "http://schemas.nav.gov.hu/OSA/3.0/data invoiceData.xsd";
}

/// Conversion options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Report every address in detailed form, even without a street type.
    pub detailed_addresses: bool,
    /// Public place category used when a detailed address has no street type.
    pub public_place_category: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            detailed_addresses: false,
            public_place_category: "utca".to_string(),
        }
    }
}

/// Convert an invoice to NAV `InvoiceData` XML.
pub fn to_nav_xml(invoice: &Invoice) -> Result<String, NavError> {
    to_nav_xml_with(invoice, &ConvertOptions::default())
}

pub fn to_nav_xml_with(invoice: &Invoice, options: &ConvertOptions) -> Result<String, NavError> {
    Document::from_invoice_with(invoice, options)?.to_xml()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_defaults() {
        let opts: ConvertOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, ConvertOptions::default());
        assert_eq!(opts.public_place_category, "utca");

        let opts: ConvertOptions = serde_json::from_str(r#"{"detailed_addresses":true}"#).unwrap();
        assert!(opts.detailed_addresses);
        assert_eq!(opts.public_place_category, "utca");
    }
}

//! Document assembly and rendering.

use chrono::NaiveDate;

use super::amount::resolve_rate;
use super::detail::{DATE_FORMAT, InvoiceDetail};
use super::lines::{NavLine, map_lines};
use super::party::{CustomerInfo, SupplierInfo};
use super::summary::InvoiceSummary;
use super::vatrate::TaxInfo;
use super::xml_utils::XmlWriter;
use super::{ConvertOptions, ns};
use crate::core::{Invoice, NavError};

/// A NAV `InvoiceData` document.
///
/// Built in one pass: exchange rate, head, lines, summary. Any failure aborts
/// the conversion; a `Document` is always complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub supplier: SupplierInfo,
    pub customer: Option<CustomerInfo>,
    pub detail: InvoiceDetail,
    pub lines: Vec<NavLine>,
    pub summary: InvoiceSummary,
}

impl Document {
    pub fn from_invoice(invoice: &Invoice) -> Result<Self, NavError> {
        Self::from_invoice_with(invoice, &ConvertOptions::default())
    }

    /// Credit notes are reported with inverted signs.
    pub fn from_invoice_with(invoice: &Invoice, options: &ConvertOptions) -> Result<Self, NavError> {
        if invoice.is_credit_note() {
            return Self::build(&invoice.inverted(), options);
        }
        Self::build(invoice, options)
    }

    fn build(invoice: &Invoice, options: &ConvertOptions) -> Result<Self, NavError> {
        let rate = resolve_rate(invoice)?;
        let info = TaxInfo::from_invoice(invoice);

        let supplier = SupplierInfo::from_party(&invoice.supplier, options)?;
        let customer = invoice
            .customer
            .as_ref()
            .map(|c| CustomerInfo::from_party(c, options))
            .transpose()?;
        let detail = InvoiceDetail::new(invoice, &info, rate);
        let lines = map_lines(&invoice.lines, &info, rate)?;
        let summary = InvoiceSummary::new(invoice, &info, rate)?;

        Ok(Self {
            invoice_number: invoice.code.clone(),
            issue_date: invoice.issue_date,
            supplier,
            customer,
            detail,
            lines,
            summary,
        })
    }

    /// Render as indented UTF-8 XML with declaration.
    pub fn to_xml(&self) -> Result<String, NavError> {
        let mut w = XmlWriter::new()?;
        w.start_element_with_attrs(
            "InvoiceData",
            &[
                ("xmlns", ns::DATA),
                ("xmlns:xsi", ns::XSI),
                ("xsi:schemaLocation", ns::DATA_SCHEMA_LOCATION),
                ("xmlns:common", ns::COMMON),
                ("xmlns:base", ns::BASE),
            ],
        )?;
        w.text_element("invoiceNumber", &self.invoice_number)?;
        w.text_element(
            "invoiceIssueDate",
            &self.issue_date.format(DATE_FORMAT).to_string(),
        )?;
        w.bool_element("completenessIndicator", false)?;

        w.start_element("invoiceMain")?;
        w.start_element("invoice")?;

        w.start_element("invoiceHead")?;
        self.supplier.write_xml(&mut w)?;
        if let Some(customer) = &self.customer {
            customer.write_xml(&mut w)?;
        }
        self.detail.write_xml(&mut w)?;
        w.end_element("invoiceHead")?;

        if !self.lines.is_empty() {
            w.start_element("invoiceLines")?;
            w.bool_element("mergedItemIndicator", false)?;
            for line in &self.lines {
                line.write_xml(&mut w)?;
            }
            w.end_element("invoiceLines")?;
        }

        self.summary.write_xml(&mut w)?;

        w.end_element("invoice")?;
        w.end_element("invoiceMain")?;
        w.end_element("InvoiceData")?;
        w.into_string()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, NavError> {
        self.to_xml().map(String::into_bytes)
    }
}

//! Invoice summary: totals per VAT rate and invoice totals.

use rust_decimal::Decimal;

use super::amount::{sum, to_huf};
use super::vatrate::{TaxInfo, VatRate, classify_total};
use super::xml_utils::XmlWriter;
use crate::core::{CATEGORY_VAT, Invoice, NavError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryByVatRate {
    pub vat_rate: VatRate,
    pub net: Decimal,
    pub net_huf: Decimal,
    pub vat: Decimal,
    pub vat_huf: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSummary {
    pub by_vat_rate: Vec<SummaryByVatRate>,
    pub net: Decimal,
    pub net_huf: Decimal,
    pub vat: Decimal,
    pub vat_huf: Decimal,
}

impl InvoiceSummary {
    pub fn new(invoice: &Invoice, info: &TaxInfo, rate: Decimal) -> Result<Self, NavError> {
        let rates = invoice.totals.category_rates(CATEGORY_VAT);
        let by_vat_rate = rates
            .iter()
            .map(|rate_total| {
                Ok(SummaryByVatRate {
                    vat_rate: classify_total(rate_total, info)?,
                    net: rate_total.base,
                    net_huf: to_huf(rate_total.base, rate)?,
                    vat: rate_total.amount,
                    vat_huf: to_huf(rate_total.amount, rate)?,
                })
            })
            .collect::<Result<Vec<_>, NavError>>()?;
        let total_vat = sum(rates.iter().map(|r| r.amount))?;

        Ok(Self {
            by_vat_rate,
            net: invoice.totals.total,
            net_huf: to_huf(invoice.totals.total, rate)?,
            vat: total_vat,
            vat_huf: to_huf(total_vat, rate)?,
        })
    }

    pub fn write_xml(&self, w: &mut XmlWriter) -> Result<(), NavError> {
        w.start_element("invoiceSummary")?;
        w.start_element("summaryNormal")?;
        for entry in &self.by_vat_rate {
            w.start_element("summaryByVatRate")?;
            w.start_element("vatRate")?;
            entry.vat_rate.write_xml(w)?;
            w.end_element("vatRate")?;
            w.start_element("vatRateNetData")?;
            w.amount_element("vatRateNetAmount", entry.net)?;
            w.amount_element("vatRateNetAmountHUF", entry.net_huf)?;
            w.end_element("vatRateNetData")?;
            w.start_element("vatRateVatData")?;
            w.amount_element("vatRateVatAmount", entry.vat)?;
            w.amount_element("vatRateVatAmountHUF", entry.vat_huf)?;
            w.end_element("vatRateVatData")?;
            w.end_element("summaryByVatRate")?;
        }
        w.amount_element("invoiceNetAmount", self.net)?;
        w.amount_element("invoiceNetAmountHUF", self.net_huf)?;
        w.amount_element("invoiceVatAmount", self.vat)?;
        w.amount_element("invoiceVatAmountHUF", self.vat_huf)?;
        w.end_element("summaryNormal")?;
        w.end_element("invoiceSummary")?;
        Ok(())
    }
}

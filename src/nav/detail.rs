//! Invoice detail block: category, delivery, currency and payment.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::vatrate::TaxInfo;
use super::xml_utils::{XmlWriter, format_decimal};
use crate::core::{Invoice, NavError, Period};

/// Date format of every NAV date element.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceCategory {
    Normal,
    Simplified,
}

impl InvoiceCategory {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Simplified => "SIMPLIFIED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Transfer,
    Cash,
    Card,
    Other,
}

impl PaymentMethod {
    /// Map a GOBL payment means key. Sub-keys after `+` are ignored.
    pub fn from_key(key: &str) -> Self {
        let base = key.split('+').next().unwrap_or_default();
        match base {
            "cash" => Self::Cash,
            "credit-transfer" | "debit-transfer" => Self::Transfer,
            "card" => Self::Card,
            _ => Self::Other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Transfer => "TRANSFER",
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDetail {
    pub category: InvoiceCategory,
    pub delivery_date: NaiveDate,
    pub delivery_period: Option<Period>,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub payment_date: Option<NaiveDate>,
}

impl InvoiceDetail {
    pub fn new(invoice: &Invoice, info: &TaxInfo, rate: Decimal) -> Self {
        let category = if info.simplified {
            InvoiceCategory::Simplified
        } else {
            InvoiceCategory::Normal
        };
        let delivery = invoice.delivery.as_ref();
        let payment = invoice.payment.as_ref();

        Self {
            category,
            delivery_date: delivery
                .and_then(|d| d.date)
                .unwrap_or(invoice.issue_date),
            delivery_period: delivery.and_then(|d| d.period),
            currency: invoice.currency.clone(),
            exchange_rate: rate,
            payment_method: payment
                .and_then(|p| p.instructions.as_ref())
                .map(|i| PaymentMethod::from_key(&i.key)),
            payment_date: payment
                .and_then(|p| p.terms.as_ref())
                .and_then(|t| t.due_dates.first())
                .map(|d| d.date),
        }
    }

    pub fn write_xml(&self, w: &mut XmlWriter) -> Result<(), NavError> {
        w.start_element("invoiceDetail")?;
        w.text_element("invoiceCategory", self.category.code())?;
        w.text_element(
            "invoiceDeliveryDate",
            &self.delivery_date.format(DATE_FORMAT).to_string(),
        )?;
        if let Some(period) = &self.delivery_period {
            w.text_element(
                "invoiceDeliveryPeriodStart",
                &period.start.format(DATE_FORMAT).to_string(),
            )?;
            w.text_element(
                "invoiceDeliveryPeriodEnd",
                &period.end.format(DATE_FORMAT).to_string(),
            )?;
        }
        w.text_element("currencyCode", &self.currency)?;
        w.text_element("exchangeRate", &format_decimal(self.exchange_rate))?;
        if let Some(method) = self.payment_method {
            w.text_element("paymentMethod", method.code())?;
        }
        if let Some(date) = self.payment_date {
            w.text_element("paymentDate", &date.format(DATE_FORMAT).to_string())?;
        }
        w.text_element("invoiceAppearance", "EDI")?;
        w.end_element("invoiceDetail")?;
        Ok(())
    }
}

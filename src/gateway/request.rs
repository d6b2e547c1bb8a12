//! Request envelopes of the invoice service.

use chrono::{DateTime, Utc};

use super::config::{Software, User, random_id};
use super::crypto::{
    PASSWORD_CRYPTO_TYPE, SIGNATURE_CRYPTO_TYPE, SIGNATURE_TIME_FORMAT, manage_invoice_signature,
    password_hash, request_signature,
};
use crate::core::NavError;
use crate::nav::xml_utils::XmlWriter;

pub const API_NS: &str = "http://schemas.nav.gov.hu/OSA/3.0/api";
pub const COMMON_NS: &str = "http://schemas.nav.gov.hu/NTCA/1.0/common";

pub const TOKEN_EXCHANGE_ENDPOINT: &str = "invoiceService/v3/tokenExchange";
pub const MANAGE_INVOICE_ENDPOINT: &str = "invoiceService/v3/manageInvoice";
pub const QUERY_TRANSACTION_STATUS_ENDPOINT: &str = "invoiceService/v3/queryTransactionStatus";

pub const REQUEST_VERSION: &str = "3.0";
pub const HEADER_VERSION: &str = "1.0";

/// Longest request id NAV accepts.
pub const MAX_REQUEST_ID_LEN: usize = 30;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Operation of a manageInvoice request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvoiceOperation {
    #[default]
    Create,
    Modify,
    Storno,
}

impl InvoiceOperation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Modify => "MODIFY",
            Self::Storno => "STORNO",
        }
    }
}

/// Identity of one request: unique id and the time it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl RequestHeader {
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// The request id is the second-precision timestamp plus a random suffix.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        let mut request_id = timestamp.format(SIGNATURE_TIME_FORMAT).to_string();
        let suffix = rand::random::<usize>() % (MAX_REQUEST_ID_LEN - request_id.len() + 1);
        request_id.push_str(&random_id(suffix));
        Self {
            request_id,
            timestamp,
        }
    }
}

pub fn token_exchange_request(
    header: &RequestHeader,
    user: &User,
    software: &Software,
) -> Result<String, NavError> {
    let signature = request_signature(&header.request_id, header.timestamp, &user.sign_key);
    let mut w = open("TokenExchangeRequest")?;
    write_basic(&mut w, header, user, &signature, software)?;
    close(w, "TokenExchangeRequest")
}

/// Report one invoice. `invoice_data` is the base64 encoded `InvoiceData`.
pub fn manage_invoice_request(
    header: &RequestHeader,
    user: &User,
    software: &Software,
    exchange_token: &str,
    operation: InvoiceOperation,
    invoice_data: &str,
) -> Result<String, NavError> {
    let signature = manage_invoice_signature(
        &header.request_id,
        header.timestamp,
        &user.sign_key,
        [(operation.code(), invoice_data)],
    );
    let mut w = open("ManageInvoiceRequest")?;
    write_basic(&mut w, header, user, &signature, software)?;
    w.text_element("exchangeToken", exchange_token)?;
    w.start_element("invoiceOperations")?;
    w.bool_element("compressedContent", false)?;
    w.start_element("invoiceOperation")?;
    w.text_element("index", "1")?;
    w.text_element("invoiceOperation", operation.code())?;
    w.text_element("invoiceData", invoice_data)?;
    w.end_element("invoiceOperation")?;
    w.end_element("invoiceOperations")?;
    close(w, "ManageInvoiceRequest")
}

pub fn query_transaction_status_request(
    header: &RequestHeader,
    user: &User,
    software: &Software,
    transaction_id: &str,
) -> Result<String, NavError> {
    let signature = request_signature(&header.request_id, header.timestamp, &user.sign_key);
    let mut w = open("QueryTransactionStatusRequest")?;
    write_basic(&mut w, header, user, &signature, software)?;
    w.text_element("transactionId", transaction_id)?;
    close(w, "QueryTransactionStatusRequest")
}

fn open(root: &str) -> Result<XmlWriter, NavError> {
    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs(root, &[("xmlns:common", COMMON_NS), ("xmlns", API_NS)])?;
    Ok(w)
}

fn close(mut w: XmlWriter, root: &str) -> Result<String, NavError> {
    w.end_element(root)?;
    w.into_string()
}

fn write_basic(
    w: &mut XmlWriter,
    header: &RequestHeader,
    user: &User,
    signature: &str,
    software: &Software,
) -> Result<(), NavError> {
    w.start_element("common:header")?;
    w.text_element("common:requestId", &header.request_id)?;
    w.text_element(
        "common:timestamp",
        &header.timestamp.format(TIMESTAMP_FORMAT).to_string(),
    )?;
    w.text_element("common:requestVersion", REQUEST_VERSION)?;
    w.text_element("common:headerVersion", HEADER_VERSION)?;
    w.end_element("common:header")?;

    w.start_element("common:user")?;
    w.text_element("common:login", &user.login)?;
    w.text_element_with_attrs(
        "common:passwordHash",
        &password_hash(&user.password),
        &[("cryptoType", PASSWORD_CRYPTO_TYPE)],
    )?;
    w.text_element("common:taxNumber", &user.tax_number)?;
    w.text_element_with_attrs(
        "common:requestSignature",
        signature,
        &[("cryptoType", SIGNATURE_CRYPTO_TYPE)],
    )?;
    w.end_element("common:user")?;

    w.start_element("software")?;
    w.text_element("softwareId", &software.id)?;
    w.text_element("softwareName", &software.name)?;
    w.text_element("softwareOperation", software.operation.code())?;
    w.text_element("softwareMainVersion", &software.main_version)?;
    w.text_element("softwareDevName", &software.dev_name)?;
    w.text_element("softwareDevContact", &software.dev_contact)?;
    w.text_element("softwareDevCountryCode", &software.dev_country_code)?;
    w.text_element("softwareDevTaxNumber", &software.dev_tax_number)?;
    w.end_element("software")?;
    Ok(())
}

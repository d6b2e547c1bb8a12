//! NAV Online Invoice API client (OSA 3.0 invoice service).
//!
//! Covers the calls needed to report an invoice: token exchange,
//! `manageInvoice` and `queryTransactionStatus`.
//!
//! # Example
//!
//! ```no_run
//! use szamla::core::TaxIdentity;
//! use szamla::gateway::*;
//!
//! # async fn run(invoice_xml: Vec<u8>) -> Result<(), GatewayError> {
//! let user = User::new("techuser", "password", "sign-key", "exchange-key-16b", "12345678");
//! let software = Software::new(
//!     &TaxIdentity::new("HU", "12345678"),
//!     "szamla",
//!     SoftwareOperation::OnlineService,
//!     "0.1.0",
//!     "Minta Kft.",
//!     "dev@example.com",
//! );
//! let client = NavClient::new(GatewayConfig::default(), user, software)?;
//!
//! let transaction_id = client.report_invoice(&invoice_xml, InvoiceOperation::Create).await?;
//! for result in client.transaction_status(&transaction_id).await? {
//!     println!("{}: {}", result.index, result.invoice_status);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
pub mod crypto;
mod error;
mod request;
mod response;
mod retry;
mod token;

pub use client::NavClient;
pub use config::{
    Environment, GatewayConfig, PRODUCTION_URL, SOFTWARE_ID_LEN, Software, SoftwareOperation,
    TESTING_URL, User,
};
pub use error::GatewayError;
pub use request::{
    API_NS, COMMON_NS, InvoiceOperation, MANAGE_INVOICE_ENDPOINT, MAX_REQUEST_ID_LEN,
    QUERY_TRANSACTION_STATUS_ENDPOINT, RequestHeader, TOKEN_EXCHANGE_ENDPOINT,
    manage_invoice_request, query_transaction_status_request, token_exchange_request,
};
pub use response::{
    ApiResult, ManageInvoiceResponse, Pointer, ProcessingResult, TokenExchangeResponse,
    ValidationMessage, parse_error, parse_manage_invoice, parse_token_exchange,
    parse_transaction_status,
};
pub use retry::BASE_DELAY_MS;
pub use token::{EXPIRY_MARGIN_SECS, TokenCache, TokenInfo};

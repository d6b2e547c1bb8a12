//! Async NAV Online Invoice API client.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::config::{GatewayConfig, Software, User};
use super::crypto::decrypt_token;
use super::error::GatewayError;
use super::request::{
    InvoiceOperation, MANAGE_INVOICE_ENDPOINT, QUERY_TRANSACTION_STATUS_ENDPOINT, RequestHeader,
    TOKEN_EXCHANGE_ENDPOINT, manage_invoice_request, query_transaction_status_request,
    token_exchange_request,
};
use super::response::{
    ProcessingResult, parse_error, parse_manage_invoice, parse_token_exchange,
    parse_transaction_status,
};
use super::retry::with_retry;
use super::token::{TokenCache, TokenInfo};
use crate::nav::Document;

/// NAV error code of an expired or already used exchange token.
const INVALID_EXCHANGE_TOKEN: &str = "INVALID_EXCHANGE_TOKEN";

/// Client for token exchange, invoice reporting and status queries.
///
/// Owns its HTTP client and token cache. Share a cache between clients of the
/// same technical user with [`NavClient::with_token_cache`].
#[derive(Debug)]
pub struct NavClient {
    http: reqwest::Client,
    config: GatewayConfig,
    base_url: String,
    user: User,
    software: Software,
    tokens: Arc<TokenCache>,
}

impl NavClient {
    pub fn new(config: GatewayConfig, user: User, software: Software) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            config,
            user,
            software,
            tokens: Arc::new(TokenCache::new()),
        })
    }

    pub fn with_token_cache(mut self, tokens: Arc<TokenCache>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    /// A valid exchange token, from the cache or a new token exchange.
    pub async fn fetch_token(&self) -> Result<String, GatewayError> {
        if let Some(cached) = self.tokens.get(&self.user.login, &self.user.tax_number) {
            tracing::debug!(login = %self.user.login, "using cached exchange token");
            return Ok(cached.token);
        }
        let info = self.exchange_token().await?;
        let token = info.token.clone();
        self.tokens
            .insert(&self.user.login, &self.user.tax_number, info);
        Ok(token)
    }

    /// Request and decrypt a new exchange token, bypassing the cache.
    pub async fn exchange_token(&self) -> Result<TokenInfo, GatewayError> {
        let body = self
            .post(TOKEN_EXCHANGE_ENDPOINT, || {
                token_exchange_request(&RequestHeader::now(), &self.user, &self.software)
            })
            .await?;
        let resp = parse_token_exchange(&body)?;
        let token = decrypt_token(&resp.encoded_token, &self.user.exchange_key)?;
        tracing::info!(login = %self.user.login, valid_to = %resp.valid_to, "exchange token obtained");
        Ok(TokenInfo {
            token,
            expires_at: resp.valid_to,
        })
    }

    /// Report one `InvoiceData` document; returns the NAV transaction id.
    pub async fn report_invoice(
        &self,
        invoice_xml: &[u8],
        operation: InvoiceOperation,
    ) -> Result<String, GatewayError> {
        let token = self.fetch_token().await?;
        let data = BASE64.encode(invoice_xml);

        let body = self
            .post(MANAGE_INVOICE_ENDPOINT, || {
                manage_invoice_request(
                    &RequestHeader::now(),
                    &self.user,
                    &self.software,
                    &token,
                    operation,
                    &data,
                )
            })
            .await
            .inspect_err(|e| {
                if let GatewayError::Api { error_code, .. } = e {
                    if error_code == INVALID_EXCHANGE_TOKEN {
                        self.tokens
                            .invalidate(&self.user.login, &self.user.tax_number);
                    }
                }
            })?;

        let transaction_id = parse_manage_invoice(&body)?.transaction_id;
        tracing::info!(%transaction_id, operation = operation.code(), "invoice reported");
        Ok(transaction_id)
    }

    /// Render and report a converted document.
    pub async fn report_document(
        &self,
        document: &Document,
        operation: InvoiceOperation,
    ) -> Result<String, GatewayError> {
        let xml = document.to_bytes()?;
        self.report_invoice(&xml, operation).await
    }

    /// Processing results of a reported transaction.
    pub async fn transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<Vec<ProcessingResult>, GatewayError> {
        let body = self
            .post(QUERY_TRANSACTION_STATUS_ENDPOINT, || {
                query_transaction_status_request(
                    &RequestHeader::now(),
                    &self.user,
                    &self.software,
                    transaction_id,
                )
            })
            .await?;
        parse_transaction_status(&body)
    }

    /// POST an envelope; every attempt gets a fresh request id and signature.
    async fn post<F>(&self, endpoint: &str, envelope: F) -> Result<String, GatewayError>
    where
        F: Fn() -> Result<String, crate::core::NavError>,
    {
        let url = format!("{}{endpoint}", self.base_url);
        with_retry(self.config.max_retries, endpoint, || {
            let body = envelope();
            let url = url.as_str();
            async move {
                let body = body?;
                tracing::debug!(url, bytes = body.len(), "sending NAV request");
                let resp = self
                    .http
                    .post(url)
                    .header(CONTENT_TYPE, "application/xml")
                    .header(ACCEPT, "application/xml")
                    .body(body)
                    .send()
                    .await?;
                let status = resp.status();
                let text = resp.text().await?;
                if status.is_success() {
                    Ok(text)
                } else {
                    Err(parse_error(status.as_u16(), &text))
                }
            }
        })
        .await
    }
}

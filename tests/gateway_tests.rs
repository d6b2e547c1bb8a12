#![cfg(feature = "gateway")]

use aes::Aes128;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Duration, NaiveDate, SecondsFormat, Utc};
use rust_decimal_macros::dec;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use szamla::core::*;
use szamla::gateway::*;
use szamla::nav::Document;

const LOGIN: &str = "techuser";
const TAX_NUMBER: &str = "12345678";
const EXCHANGE_KEY: &str = "0123456789abcdef";
const TOKEN: &str = "a6a6b2cd-9ff5-4c34-9fb3-2c5e8ec4a8b4";

fn encrypt_token(plain: &str, key: &str) -> String {
    let pad = 16 - plain.len() % 16;
    let mut data = plain.as_bytes().to_vec();
    data.extend(std::iter::repeat_n(pad as u8, pad));
    let cipher = Aes128::new_from_slice(key.as_bytes()).unwrap();
    for block in data.chunks_exact_mut(16) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    BASE64.encode(data)
}

fn token_response() -> String {
    let valid_to = (Utc::now() + Duration::minutes(5)).to_rfc3339_opts(SecondsFormat::Millis, true);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TokenExchangeResponse xmlns="http://schemas.nav.gov.hu/OSA/3.0/api" xmlns:common="http://schemas.nav.gov.hu/NTCA/1.0/common">
  <common:header><common:requestId>RID1</common:requestId></common:header>
  <common:result><common:funcCode>OK</common:funcCode></common:result>
  <encodedExchangeToken>{}</encodedExchangeToken>
  <tokenValidityTo>{valid_to}</tokenValidityTo>
</TokenExchangeResponse>"#,
        encrypt_token(TOKEN, EXCHANGE_KEY)
    )
}

const MANAGE_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ManageInvoiceResponse xmlns="http://schemas.nav.gov.hu/OSA/3.0/api" xmlns:common="http://schemas.nav.gov.hu/NTCA/1.0/common">
  <common:result><common:funcCode>OK</common:funcCode></common:result>
  <transactionId>4OYE2J5GEOGWKMYV</transactionId>
</ManageInvoiceResponse>"#;

const STATUS_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<QueryTransactionStatusResponse xmlns="http://schemas.nav.gov.hu/OSA/3.0/api" xmlns:common="http://schemas.nav.gov.hu/NTCA/1.0/common">
  <common:result><common:funcCode>OK</common:funcCode></common:result>
  <processingResults>
    <processingResult>
      <index>1</index>
      <invoiceStatus>DONE</invoiceStatus>
      <businessValidationMessages>
        <validationResultCode>WARN</validationResultCode>
        <validationErrorCode>INCORRECT_PRODUCT_CODE_VALUE</validationErrorCode>
        <message>Hibás termékkód</message>
        <pointer><tag>productCodeValue</tag><value>8471</value><line>1</line></pointer>
      </businessValidationMessages>
      <compressedContentIndicator>false</compressedContentIndicator>
    </processingResult>
  </processingResults>
</QueryTransactionStatusResponse>"#;

fn error_response(code: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<GeneralErrorResponse xmlns="http://schemas.nav.gov.hu/OSA/3.0/api" xmlns:common="http://schemas.nav.gov.hu/NTCA/1.0/common">
  <common:result>
    <common:funcCode>ERROR</common:funcCode>
    <common:errorCode>{code}</common:errorCode>
    <common:message>Request rejected</common:message>
  </common:result>
</GeneralErrorResponse>"#
    )
}

fn client(server: &MockServer) -> NavClient {
    let config = GatewayConfig {
        base_url: Some(server.uri()),
        max_retries: 2,
        timeout_secs: 5,
        ..GatewayConfig::default()
    };
    let user = User::new(LOGIN, "password", "sign-key", EXCHANGE_KEY, TAX_NUMBER);
    let software = Software::new(
        &TaxIdentity::new("HU", TAX_NUMBER),
        "szamla",
        SoftwareOperation::OnlineService,
        "0.1.0",
        "Minta Kft.",
        "dev@example.com",
    );
    NavClient::new(config, user, software).unwrap()
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/{TOKEN_EXCHANGE_ENDPOINT}")))
        .and(body_string_contains("<TokenExchangeRequest"))
        .and(body_string_contains(&format!("<common:login>{LOGIN}</common:login>")))
        .respond_with(ResponseTemplate::new(200).set_body_string(token_response()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn invoice_xml() -> Vec<u8> {
    let invoice = InvoiceBuilder::new("SZ-2024-001", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        .supplier(
            PartyBuilder::new("Minta Kft.")
                .tax_id("HU", "12345678202")
                .address(
                    AddressBuilder::new("Budapest", "1051", "HU")
                        .street("Fő")
                        .number("1")
                        .build(),
                )
                .build(),
        )
        .add_line(LineBuilder::new("Tanácsadás", dec!(1), dec!(10000)).vat(dec!(27)).build())
        .build()
        .unwrap();
    Document::from_invoice(&invoice).unwrap().to_bytes().unwrap()
}

#[tokio::test]
async fn fetch_token_decrypts_and_caches() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    let client = client(&server);

    assert_eq!(client.fetch_token().await.unwrap(), TOKEN);
    // Second call is served from the cache.
    assert_eq!(client.fetch_token().await.unwrap(), TOKEN);
    assert!(client.token_cache().get(LOGIN, TAX_NUMBER).is_some());
}

#[tokio::test]
async fn report_invoice_returns_transaction_id() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let xml = invoice_xml();
    let encoded = BASE64.encode(&xml);
    Mock::given(method("POST"))
        .and(path(format!("/{MANAGE_INVOICE_ENDPOINT}")))
        .and(body_string_contains(&format!("<exchangeToken>{TOKEN}</exchangeToken>")))
        .and(body_string_contains("<invoiceOperation>CREATE</invoiceOperation>"))
        .and(body_string_contains(&format!("<invoiceData>{encoded}</invoiceData>")))
        .respond_with(ResponseTemplate::new(200).set_body_string(MANAGE_RESPONSE))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let id = client.report_invoice(&xml, InvoiceOperation::Create).await.unwrap();
    assert_eq!(id, "4OYE2J5GEOGWKMYV");

    // The token is reused for the next report.
    let id = client.report_invoice(&xml, InvoiceOperation::Create).await.unwrap();
    assert_eq!(id, "4OYE2J5GEOGWKMYV");
}

#[tokio::test]
async fn report_document_renders_invoice() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(format!("/{MANAGE_INVOICE_ENDPOINT}")))
        .and(body_string_contains("<invoiceOperation>STORNO</invoiceOperation>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MANAGE_RESPONSE))
        .expect(1)
        .mount(&server)
        .await;

    let invoice = InvoiceBuilder::new("SZ-2024-002", NaiveDate::from_ymd_opt(2024, 6, 16).unwrap())
        .supplier(
            PartyBuilder::new("Minta Kft.")
                .tax_id("HU", "12345678202")
                .address(AddressBuilder::new("Budapest", "1051", "HU").street("Fő").build())
                .build(),
        )
        .build()
        .unwrap();
    let doc = Document::from_invoice(&invoice).unwrap();

    let id = client(&server)
        .report_document(&doc, InvoiceOperation::Storno)
        .await
        .unwrap();
    assert_eq!(id, "4OYE2J5GEOGWKMYV");
}

#[tokio::test]
async fn transaction_status_parses_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{QUERY_TRANSACTION_STATUS_ENDPOINT}")))
        .and(body_string_contains("<transactionId>4OYE2J5GEOGWKMYV</transactionId>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_RESPONSE))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server)
        .transaction_status("4OYE2J5GEOGWKMYV")
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.is_done());
    assert_eq!(result.index, 1);
    let warning = &result.business_validation_messages[0];
    assert_eq!(warning.result_code, "WARN");
    assert_eq!(
        warning.error_code.as_deref(),
        Some("INCORRECT_PRODUCT_CODE_VALUE")
    );
    assert_eq!(
        warning.pointer.as_ref().unwrap().value.as_deref(),
        Some("8471")
    );
}

#[tokio::test]
async fn api_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{TOKEN_EXCHANGE_ENDPOINT}")))
        .respond_with(ResponseTemplate::new(400).set_body_string(error_response("INVALID_SECURITY_USER")))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).fetch_token().await.unwrap_err();
    match &err {
        GatewayError::Api {
            status, error_code, ..
        } => {
            assert_eq!(*status, 400);
            assert_eq!(error_code, "INVALID_SECURITY_USER");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn invalid_token_clears_cache() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(format!("/{MANAGE_INVOICE_ENDPOINT}")))
        .respond_with(ResponseTemplate::new(400).set_body_string(error_response("INVALID_EXCHANGE_TOKEN")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .report_invoice(&invoice_xml(), InvoiceOperation::Modify)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Api { .. }));
    assert!(client.token_cache().get(LOGIN, TAX_NUMBER).is_none());
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{QUERY_TRANSACTION_STATUS_ENDPOINT}")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/{QUERY_TRANSACTION_STATUS_ENDPOINT}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_RESPONSE))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server).transaction_status("ID1").await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{QUERY_TRANSACTION_STATUS_ENDPOINT}")))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).transaction_status("ID1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Server { status: 500, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn shared_cache_skips_token_exchange() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;

    let cache = std::sync::Arc::new(TokenCache::new());
    cache.insert(
        LOGIN,
        TAX_NUMBER,
        TokenInfo {
            token: "cached-token".into(),
            expires_at: Utc::now() + Duration::minutes(5),
        },
    );
    let client = client(&server).with_token_cache(cache);
    assert_eq!(client.fetch_token().await.unwrap(), "cached-token");
}

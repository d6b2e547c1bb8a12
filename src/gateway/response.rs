//! Response parsing.
//!
//! Elements are matched by local name, so responses parse the same whatever
//! prefixes NAV binds to its namespaces.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;

use super::error::GatewayError;

/// `result` block common to every response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResult {
    pub func_code: String,
    pub error_code: Option<String>,
    pub message: Option<String>,
}

impl ApiResult {
    pub fn is_ok(&self) -> bool {
        self.func_code == "OK"
    }
}

/// Encrypted token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExchangeResponse {
    pub result: ApiResult,
    pub encoded_token: String,
    pub valid_to: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageInvoiceResponse {
    pub result: ApiResult,
    pub transaction_id: String,
}

/// Processing state of one reported invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingResult {
    pub index: u32,
    pub batch_index: Option<u32>,
    /// RECEIVED, PROCESSING, SAVED, DONE, ABORTED.
    pub invoice_status: String,
    pub technical_validation_messages: Vec<ValidationMessage>,
    pub business_validation_messages: Vec<ValidationMessage>,
    pub compressed_content_indicator: bool,
}

impl ProcessingResult {
    pub fn is_done(&self) -> bool {
        self.invoice_status == "DONE"
    }

    pub fn is_aborted(&self) -> bool {
        self.invoice_status == "ABORTED"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationMessage {
    /// ERROR, WARN or INFO.
    pub result_code: String,
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub pointer: Option<Pointer>,
}

/// Location of a business validation finding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pointer {
    pub tag: Option<String>,
    pub value: Option<String>,
    pub line: Option<String>,
    pub original_invoice_number: Option<String>,
}

enum Node<'a> {
    Open(&'a [String]),
    Text(&'a [String], &'a str),
    Close(&'a [String]),
}

fn walk(xml: &str, mut visit: impl FnMut(Node<'_>)) -> Result<(), GatewayError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                visit(Node::Open(&path));
            }
            Ok(Event::Empty(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                visit(Node::Open(&path));
                visit(Node::Close(&path));
                path.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| GatewayError::Response(format!("invalid text: {err}")))?;
                if !text.is_empty() {
                    visit(Node::Text(&path, &text));
                }
            }
            Ok(Event::End(_)) => {
                visit(Node::Close(&path));
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GatewayError::Response(format!(
                    "XML error at position {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn leaf(path: &[String]) -> (&str, &str) {
    let name = path.last().map(String::as_str).unwrap_or_default();
    let parent = path
        .len()
        .checked_sub(2)
        .map(|i| path[i].as_str())
        .unwrap_or_default();
    (name, parent)
}

fn root(path: &[String]) -> &str {
    path.first().map(String::as_str).unwrap_or_default()
}

/// Collect the `result` block (or the flat fields of a `GeneralExceptionResponse`).
fn read_result(result: &mut ApiResult, path: &[String], text: &str) {
    let (name, parent) = leaf(path);
    if parent != "result" && path.len() != 2 {
        return;
    }
    match name {
        "funcCode" => result.func_code = text.to_string(),
        "errorCode" => result.error_code = Some(text.to_string()),
        "message" => result.message = Some(text.to_string()),
        _ => {}
    }
}

fn missing(what: &str) -> GatewayError {
    GatewayError::Response(format!("missing {what} in response"))
}

pub fn parse_token_exchange(xml: &str) -> Result<TokenExchangeResponse, GatewayError> {
    let mut result = ApiResult::default();
    let mut token = None;
    let mut valid_to = None;
    walk(xml, |node| {
        if let Node::Text(path, text) = node {
            read_result(&mut result, path, text);
            match leaf(path).0 {
                "encodedExchangeToken" => token = Some(text.to_string()),
                "tokenValidityTo" => valid_to = Some(text.to_string()),
                _ => {}
            }
        }
    })?;

    let valid_to = valid_to.ok_or_else(|| missing("tokenValidityTo"))?;
    let valid_to = DateTime::parse_from_rfc3339(&valid_to)
        .map_err(|e| GatewayError::Response(format!("invalid tokenValidityTo {valid_to:?}: {e}")))?
        .with_timezone(&Utc);
    Ok(TokenExchangeResponse {
        result,
        encoded_token: token.ok_or_else(|| missing("encodedExchangeToken"))?,
        valid_to,
    })
}

pub fn parse_manage_invoice(xml: &str) -> Result<ManageInvoiceResponse, GatewayError> {
    let mut result = ApiResult::default();
    let mut transaction_id = None;
    walk(xml, |node| {
        if let Node::Text(path, text) = node {
            read_result(&mut result, path, text);
            if leaf(path).0 == "transactionId" {
                transaction_id = Some(text.to_string());
            }
        }
    })?;
    Ok(ManageInvoiceResponse {
        result,
        transaction_id: transaction_id.ok_or_else(|| missing("transactionId"))?,
    })
}

pub fn parse_transaction_status(xml: &str) -> Result<Vec<ProcessingResult>, GatewayError> {
    let mut results = Vec::new();
    let mut current: Option<ProcessingResult> = None;
    let mut message: Option<ValidationMessage> = None;
    let mut bad_number = None;

    walk(xml, |node| match node {
        Node::Open(path) => match leaf(path).0 {
            "processingResult" => current = Some(ProcessingResult::default()),
            "technicalValidationMessages" | "businessValidationMessages" => {
                message = Some(ValidationMessage::default());
            }
            "pointer" => {
                if let Some(m) = message.as_mut() {
                    m.pointer = Some(Pointer::default());
                }
            }
            _ => {}
        },
        Node::Text(path, text) => {
            let (name, parent) = leaf(path);
            if let Some(m) = message.as_mut() {
                let text = Some(text.to_string());
                match (parent, name) {
                    ("pointer", "tag") => set_pointer(m, |p| p.tag = text),
                    ("pointer", "value") => set_pointer(m, |p| p.value = text),
                    ("pointer", "line") => set_pointer(m, |p| p.line = text),
                    ("pointer", "originalInvoiceNumber") => {
                        set_pointer(m, |p| p.original_invoice_number = text)
                    }
                    (_, "validationResultCode") => m.result_code = text.unwrap_or_default(),
                    (_, "validationErrorCode") => m.error_code = text,
                    (_, "message") => m.message = text,
                    _ => {}
                }
                return;
            }
            let Some(r) = current.as_mut() else {
                return;
            };
            match name {
                "index" => match text.parse() {
                    Ok(i) => r.index = i,
                    Err(_) => bad_number = Some(text.to_string()),
                },
                "batchIndex" => match text.parse() {
                    Ok(i) => r.batch_index = Some(i),
                    Err(_) => bad_number = Some(text.to_string()),
                },
                "invoiceStatus" => r.invoice_status = text.to_string(),
                "compressedContentIndicator" => r.compressed_content_indicator = text == "true",
                _ => {}
            }
        }
        Node::Close(path) => match leaf(path).0 {
            "technicalValidationMessages" => {
                if let (Some(m), Some(r)) = (message.take(), current.as_mut()) {
                    r.technical_validation_messages.push(m);
                }
            }
            "businessValidationMessages" => {
                if let (Some(m), Some(r)) = (message.take(), current.as_mut()) {
                    r.business_validation_messages.push(m);
                }
            }
            "processingResult" => results.extend(current.take()),
            _ => {}
        },
    })?;

    if let Some(value) = bad_number {
        return Err(GatewayError::Response(format!("invalid index {value:?}")));
    }
    Ok(results)
}

fn set_pointer(m: &mut ValidationMessage, set: impl FnOnce(&mut Pointer)) {
    set(m.pointer.get_or_insert_with(Pointer::default));
}

/// Turn a non-success answer into an error. Bodies that are not a NAV
/// `GeneralErrorResponse`/`GeneralExceptionResponse` become `Server` errors
/// for 5xx and `Response` errors otherwise.
pub fn parse_error(status: u16, body: &str) -> GatewayError {
    let mut result = ApiResult::default();
    let mut is_general = false;
    let parsed = walk(body, |node| match node {
        Node::Open(path) if path.len() == 1 => {
            is_general = matches!(
                root(path),
                "GeneralErrorResponse" | "GeneralExceptionResponse"
            );
        }
        Node::Text(path, text) => read_result(&mut result, path, text),
        _ => {}
    });

    if parsed.is_ok() && is_general {
        return GatewayError::Api {
            status,
            func_code: result.func_code,
            error_code: result.error_code.unwrap_or_default(),
            message: result.message.unwrap_or_default(),
        };
    }
    if status >= 500 {
        return GatewayError::Server {
            status,
            body: body.to_string(),
        };
    }
    GatewayError::Response(format!("unexpected HTTP {status} response"))
}

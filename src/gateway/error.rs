use thiserror::Error;

use crate::core::NavError;

/// Errors from the NAV Online Invoice API client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Connection failure or timeout.
    #[error("NAV transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// NAV answered with a server error.
    #[error("NAV server error: HTTP {status}")]
    Server { status: u16, body: String },

    /// NAV rejected the request (`GeneralErrorResponse`).
    #[error("NAV API error (HTTP {status}): {error_code}: {message}")]
    Api {
        status: u16,
        func_code: String,
        error_code: String,
        message: String,
    },

    /// The response could not be read.
    #[error("NAV response error: {0}")]
    Response(String),

    /// The exchange token could not be decrypted.
    #[error("token decryption failed: {0}")]
    Decrypt(String),

    /// Building the request document failed.
    #[error(transparent)]
    Document(#[from] NavError),
}

impl GatewayError {
    /// Transport failures and 5xx answers are worth retrying; everything else
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Server { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

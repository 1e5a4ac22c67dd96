use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::RpcError;

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Solana RPC error: {0}")]
    SolanaRpc(String),

    #[error("No quote available")]
    NoQuoteAvailable,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("API error: {service} - {message}")]
    Api {
        service: String,
        message: String,
        status: Option<u16>,
    },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Transaction payload error: {0}")]
    Payload(String),

    #[error("Signer returned the null signature sentinel")]
    NullSignature,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, SwapError>;

impl SwapError {
    pub fn api(service: impl Into<String>, message: impl Into<String>, status: Option<u16>) -> Self {
        SwapError::Api {
            service: service.into(),
            message: message.into(),
            status,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            SwapError::NetworkError(_) | SwapError::SolanaRpc(_) => true,
            SwapError::Api { status: Some(status), .. } => *status >= 500,
            SwapError::HttpError { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SwapError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            SwapError::HttpError {
                status,
                message: err.to_string(),
            }
        } else {
            SwapError::NetworkError(err.to_string())
        }
    }
}

/// Three-way classification of a balance-lookup failure at the RPC boundary.
///
/// `MissingAccount` is not a failure: an associated token account that was
/// never created reads as a zero balance. `RateLimited` covers 403/429
/// responses where the balance is genuinely unknown and must not be shown as
/// an empty wallet. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceErrorKind {
    MissingAccount,
    RateLimited,
    Other,
}

impl fmt::Display for BalanceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAccount => write!(f, "account not created yet"),
            Self::RateLimited => write!(f, "rate limited or access denied"),
            Self::Other => write!(f, "other RPC failure"),
        }
    }
}

impl BalanceErrorKind {
    /// Classifies a solana client error by its transport/RPC structure,
    /// never by message substrings.
    pub fn classify(err: &ClientError) -> Self {
        match err.kind() {
            ClientErrorKind::Reqwest(e) => match e.status() {
                Some(StatusCode::FORBIDDEN) | Some(StatusCode::TOO_MANY_REQUESTS) => {
                    Self::RateLimited
                }
                _ => Self::Other,
            },
            ClientErrorKind::RpcError(RpcError::ForUser(_)) => Self::MissingAccount,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_constructor() {
        let err = SwapError::api("jupiter", "internal server error", Some(502));
        assert!(matches!(err, SwapError::Api { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_precondition_errors_not_retryable() {
        assert!(!SwapError::NoQuoteAvailable.is_retryable());
        assert!(!SwapError::NullSignature.is_retryable());
        assert!(!SwapError::InvalidAmount("0".into()).is_retryable());
    }

    #[test]
    fn test_balance_error_kind_display() {
        assert_eq!(
            BalanceErrorKind::RateLimited.to_string(),
            "rate limited or access denied"
        );
        assert_ne!(BalanceErrorKind::MissingAccount, BalanceErrorKind::Other);
    }
}

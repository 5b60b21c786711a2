use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

/// Errors surfaced by the API. Every variant is terminal for the current request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad input, rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The caller left out a required query parameter.
    #[error("Missing parameters")]
    MissingParameters,

    /// The pinning service refused or failed the upload.
    #[error("{0}")]
    Upload(String),

    /// The node or the contract rejected a call.
    #[error("{0}")]
    Contract(String),

    /// Return data did not match the expected ABI layout.
    #[error("Couldn't decode contract response: {0}")]
    Decode(String),

    #[error("Contract not deployed on this network")]
    NotDeployed,

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(u64),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::MissingParameters
            | ApiError::NotDeployed
            | ApiError::UnsupportedChain(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upload(_) | ApiError::Contract(_) | ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

/// Rewrites wallet and node error text into something a viewer can act on.
/// Unknown messages pass through verbatim.
pub fn friendly_message(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();

    if lower.contains("user rejected") || lower.contains("user denied") {
        return "Transaction was rejected in your wallet".to_string();
    }

    if lower.contains("insufficient funds") {
        return "Insufficient funds to cover the price and gas".to_string();
    }

    if let Some(start) = lower.find("execution reverted") {
        let reason = raw[start + "execution reverted".len()..]
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .trim();

        return if reason.is_empty() {
            "The contract rejected this transaction".to_string()
        } else {
            format!("Transaction reverted: {}", reason)
        };
    }

    raw.to_string()
}

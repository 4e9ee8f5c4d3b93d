//! Error types for the Twitter API client.
//!
//! # Design
//! Every non-2xx response lands in `Api` with the status code, the error
//! details decoded from the body, and the rate-limit window when the service
//! reported one. Callers that care about a specific condition use the
//! `is_*` helpers instead of matching on status codes.

use serde::Deserialize;
use thiserror::Error;

use crate::http::HttpResponse;

/// Twitter's error code for an exhausted rate-limit window.
pub const RATE_LIMIT_EXCEEDED_CODE: i64 = 88;

/// Errors returned by `GigClient` parse methods and by `Operation`s.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response: connection refused, timeout,
    /// TLS failure, or the task executing it panicked.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {}", join_messages(.errors))]
    Api {
        status: u16,
        errors: Vec<ErrorDetail>,
        rate_limit: Option<RateLimit>,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request parameters could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The operation was cancelled through its handle before it finished.
    #[error("operation cancelled")]
    Cancelled,

    /// Client configuration was missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// One entry of Twitter's `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

/// Rate-limit window reported in the `x-rate-limit-*` response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
    /// Epoch seconds at which the window resets.
    pub reset: u64,
}

impl RateLimit {
    pub fn from_response(response: &HttpResponse) -> Option<Self> {
        Some(Self {
            limit: response.header("x-rate-limit-limit")?.trim().parse().ok()?,
            remaining: response.header("x-rate-limit-remaining")?.trim().parse().ok()?,
            reset: response.header("x-rate-limit-reset")?.trim().parse().ok()?,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Many { errors: Vec<ErrorDetail> },
    Single { error: String },
}

impl ApiError {
    /// Build an `Api` error from a non-2xx response.
    ///
    /// Structured bodies (`{"errors":[...]}` or `{"error":"..."}`) are decoded;
    /// anything else becomes a single detail with code 0 carrying the raw body.
    pub fn from_response(response: &HttpResponse) -> Self {
        let errors = match serde_json::from_str::<ErrorBody>(&response.body) {
            Ok(ErrorBody::Many { errors }) => errors,
            Ok(ErrorBody::Single { error }) => vec![ErrorDetail {
                code: 0,
                message: error,
            }],
            Err(_) => vec![ErrorDetail {
                code: 0,
                message: response.body.clone(),
            }],
        };
        ApiError::Api {
            status: response.status,
            errors,
            rate_limit: RateLimit::from_response(response),
        }
    }

    /// HTTP status for `Api` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message; for `Api` errors the joined detail messages.
    pub fn message(&self) -> String {
        match self {
            ApiError::Api { errors, .. } => join_messages(errors),
            other => other.to_string(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::Api { status, errors, .. } => {
                *status == 429 || errors.iter().any(|e| e.code == RATE_LIMIT_EXCEEDED_CODE)
            }
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn rate_limit(&self) -> Option<RateLimit> {
        match self {
            ApiError::Api { rate_limit, .. } => *rate_limit,
            _ => None,
        }
    }
}

fn join_messages(errors: &[ErrorDetail]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

//! Error types for the Veltro SDK.
//!
//! This module provides a unified error type for all SDK operations,
//! with rich error information from the API.

use thiserror::Error;

/// Result type for Veltro operations.
pub type Result<T> = std::result::Result<T, VeltroError>;

/// Errors that can occur when using the Veltro SDK.
#[derive(Error, Debug)]
pub enum VeltroError {
    /// Application token does not match the expected format.
    #[error("invalid application token: {0}")]
    InvalidCredential(String),

    /// Invalid configuration value (endpoint, language, timezone, token).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Network-level failure (connection, DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be decoded, or a response is missing
    /// fields required by the API contract.
    #[error("malformed API response ({http_code}): {message}")]
    MalformedResponse {
        /// What went wrong while decoding.
        message: String,
        /// HTTP status code of the offending response.
        http_code: u16,
        /// Raw response body, for diagnostics.
        body: String,
    },

    /// A call was issued before the transport was configured.
    #[error("API client is not initialized")]
    NotInitialized,

    /// HTTP verb outside the supported set.
    #[error("HTTP method not implemented by the client: {0}")]
    UnsupportedMethod(String),

    /// Non-2xx response from the API.
    #[error("API error ({http_code}): {body}")]
    Api {
        /// HTTP status code.
        http_code: u16,
        /// Serialized response, including the decoded payload.
        body: String,
    },

    /// Login completed at the HTTP level but returned no usable token.
    #[error("authentication failed ({http_code}): {message}")]
    Auth {
        /// Server-provided error message, when present.
        message: String,
        /// HTTP status code.
        http_code: u16,
        /// Raw response body.
        body: String,
    },

    /// A required field was absent from caller-supplied input; checked
    /// before any request is issued.
    #[error("required field is missing: {0}")]
    MissingField(&'static str),
}

impl VeltroError {
    /// Returns the HTTP status code if this error carries one.
    pub fn http_code(&self) -> Option<u16> {
        match self {
            VeltroError::Api { http_code, .. }
            | VeltroError::Auth { http_code, .. }
            | VeltroError::MalformedResponse { http_code, .. } => Some(*http_code),
            VeltroError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the raw response body if this error carries one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            VeltroError::Api { body, .. }
            | VeltroError::Auth { body, .. }
            | VeltroError::MalformedResponse { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns true if this error indicates rejected credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            VeltroError::Auth { .. }
                | VeltroError::InvalidCredential(_)
                | VeltroError::Api { http_code: 401, .. }
                | VeltroError::Api { http_code: 403, .. }
        )
    }
}

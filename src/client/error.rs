//! Client Error Types
//!
//! Every asynchronous chat operation resolves either to success or to one of
//! these errors. The `Display` output is the user-visible message stored in
//! the notice area.
//!
//! # Error Categories
//!
//! - `Unauthorized` - session missing or expired (401); halts polling
//! - `Validation` - caught before any network round-trip
//! - `Remote` - the backend answered with a non-2xx status
//! - `Network` - the request never got an answer
//! - `Decode` - the backend answered with a body we could not read

use crate::shared::config::ConfigError;
use crate::shared::error::SharedError;
use thiserror::Error;

/// Message shown for transport failures
pub const NETWORK_ERROR_MESSAGE: &str = "Network error: check your connection";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Your session has expired. Please sign in again.")]
    Unauthorized,

    #[error("{message}")]
    Validation { field: String, message: String },

    /// Non-2xx answer; `message` is the server's `error` field when present
    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network { detail: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ChatError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build an error from a failed HTTP status and its (possibly JSON) body.
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return Self::Unauthorized;
        }
        let server_message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty());

        let message = server_message.unwrap_or_else(|| match status {
            403 => "You are not allowed to do that".to_string(),
            404 => "User or message not found".to_string(),
            409 => "Request already sent or already resolved".to_string(),
            _ => format!("Request failed with status {}", status),
        });
        Self::Remote { status, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ChatError::Unauthorized)
    }
}

impl From<SharedError> for ChatError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::MissingId { .. } => Self::Decode(err.to_string()),
            SharedError::EmptyText { .. } => Self::Validation {
                field: err.field().to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), "")
        } else {
            Self::Network { detail: err.to_string() }
        }
    }
}

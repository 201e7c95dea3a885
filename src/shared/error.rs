//! Shared Error Types
//!
//! Errors raised while turning wire data and user input into the normalized
//! chat model. They do not depend on the transport, so any front end can
//! produce them.
//!
//! # Error Categories
//!
//! - `MissingId` - a wire record that cannot be identified (dropped on load)
//! - `EmptyText` - message text that is blank after trimming
//!
//! # Usage
//!
//! ```rust
//! use campus_chat::shared::error::{require_text, SharedError};
//!
//! assert_eq!(require_text("message", "  hi ").unwrap(), "hi");
//! assert_eq!(
//!     require_text("message", " "),
//!     Err(SharedError::EmptyText { field: "message".into() })
//! );
//! ```
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// A contact or directory row came without any usable id
    #[error("{record} has no id")]
    MissingId {
        /// Kind of record, for log output
        record: &'static str,
    },

    #[error("Message text cannot be empty")]
    EmptyText { field: String },
}

impl SharedError {
    pub fn missing_id(record: &'static str) -> Self {
        Self::MissingId { record }
    }

    /// Field a validation error refers to
    pub fn field(&self) -> &str {
        match self {
            SharedError::MissingId { .. } => "id",
            SharedError::EmptyText { field } => field,
        }
    }
}

/// Trim a chat text, rejecting text that is blank.
pub fn require_text(field: &str, text: &str) -> Result<String, SharedError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SharedError::EmptyText { field: field.to_string() });
    }
    Ok(trimmed.to_string())
}

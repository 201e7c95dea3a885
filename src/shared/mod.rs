//! Shared Module
//!
//! Types shared by every front end of the chat: the normalized data model,
//! its wire shapes, configuration and validation errors.

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Contacts, messages and directory users
pub mod messaging;

pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::SharedError;

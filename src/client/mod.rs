//! Chat client
//!
//! Everything a front end needs to drive the contact-request chat: the REST
//! client, its configuration and error taxonomy, and the state container with
//! its controller.

pub mod chat_api;
pub mod config;
pub mod error;
pub mod messaging;

pub use chat_api::{ChatApi, HttpChatApi};
pub use config::Config;
pub use error::ChatError;
pub use messaging::{ChatController, ChatState, Outcome, SkipReason};

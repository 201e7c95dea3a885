//! Messaging Module
//!
//! This module contains all the data structures for the contact-request chat:
//!
//! - `Contact` - A relationship between the current user and another user
//! - `ChatMessage` - A message exchanged with a contact
//! - `DirectoryUser` - An entry of the all-users directory
//!
//! # Usage
//!
//! ```rust
//! use campus_chat::shared::messaging::{ChatMessage, Contact, ContactStatus, DirectoryUser};
//! ```

pub mod contact;
pub mod directory;
pub mod message;

pub use contact::{
    ConnectRequest, Contact, ContactQuery, ContactStatus, RawContact, RequestSide,
    RespondAction, RespondRequest, RespondResponse, UserId,
};
pub use directory::{DirectoryUser, RawDirectoryUser};
pub use message::{
    ChatMessage, DeleteMessageResponse, EditMessageRequest, MessageId, MessageType,
    SendMessageRequest, DELETED_PLACEHOLDER,
};

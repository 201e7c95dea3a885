//! Chat Message Data Structure
//!
//! Represents one message between the current user and a contact.

use super::contact::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a chat message
pub type MessageId = i64;

/// Text shown in place of a deleted message
pub const DELETED_PLACEHOLDER: &str = "This message was deleted";

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    System,
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    /// Message text; holds the placeholder once tombstoned
    pub message: String,
    #[serde(default)]
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Create a new text message
    pub fn new_text(
        id: MessageId,
        sender_id: UserId,
        receiver_id: UserId,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sender_id,
            receiver_id,
            message: message.into(),
            message_type: MessageType::Text,
            created_at,
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            deleted_at: None,
            is_read: false,
            read_at: None,
        }
    }

    /// The contact this message belongs to, from the current user's view
    pub fn counterpart(&self, me: UserId) -> UserId {
        if self.sender_id == me {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    /// Whether the message involves the given contact at all
    pub fn involves(&self, user: UserId) -> bool {
        self.sender_id == user || self.receiver_id == user
    }

    /// Replace the content with the deleted placeholder, keeping the row
    pub fn tombstone(&mut self, at: DateTime<Utc>) {
        self.message = DELETED_PLACEHOLDER.to_string();
        self.is_deleted = true;
        self.deleted_at = Some(at);
    }

    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(at);
        }
    }

    /// Text to render
    pub fn display_text(&self) -> &str {
        if self.is_deleted {
            DELETED_PLACEHOLDER
        } else {
            &self.message
        }
    }

    /// Get a preview of the message (first N characters)
    pub fn preview(&self, max_chars: usize) -> String {
        let text = self.display_text();
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            let mut preview: String = text.chars().take(max_chars.saturating_sub(3)).collect();
            preview.push_str("...");
            preview
        }
    }
}

/// Request to send a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub receiver_id: UserId,
    pub message: String,
    #[serde(default)]
    pub message_type: MessageType,
}

/// Request to edit a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditMessageRequest {
    pub message: String,
}

/// Response after deleting a message
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeleteMessageResponse {
    #[serde(alias = "messageId")]
    pub message_id: Option<MessageId>,
    pub message: Option<String>,
}

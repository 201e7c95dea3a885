//! Contact Data Structure
//!
//! A contact is the relationship between the signed-in user and one other
//! user. The backend hands contacts out in two overlapping shapes depending on
//! the endpoint; [`RawContact`] accepts both and [`Contact::from_raw`] turns
//! them into the single normalized shape the store works with.

use crate::shared::error::SharedError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a portal user (and therefore of a contact)
pub type UserId = i64;

/// Canonical connection status of a relationship
///
/// The wire protocol uses both `"request"` and `"pending"` for the same
/// pending relationship seen from either side. Both map to `Pending`; the side
/// is recorded separately in `initiated_by_me`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    NotContact,
    #[serde(alias = "request")]
    Pending,
    Accepted,
    Rejected,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::NotContact => "not_contact",
            ContactStatus::Pending => "pending",
            ContactStatus::Accepted => "accepted",
            ContactStatus::Rejected => "rejected",
        }
    }

    /// Parse a wire status. Unknown strings are treated as no relationship.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "request" | "pending" => ContactStatus::Pending,
            "accepted" => ContactStatus::Accepted,
            "rejected" => ContactStatus::Rejected,
            _ => ContactStatus::NotContact,
        }
    }
}

/// Which side of a pending request the current user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSide {
    /// The current user sent the request
    Outgoing,
    /// The current user received the request
    Incoming,
}

impl RequestSide {
    pub fn from_initiated(initiated_by_me: bool) -> Self {
        if initiated_by_me {
            RequestSide::Outgoing
        } else {
            RequestSide::Incoming
        }
    }

    /// Legacy label: the initiator sees "request", the recipient "pending"
    pub fn label(&self) -> &'static str {
        match self {
            RequestSide::Outgoing => "request",
            RequestSide::Incoming => "pending",
        }
    }
}

/// Infer who initiated a pending relationship when the flag is missing.
pub(crate) fn infer_initiated(raw_status: Option<&str>, flag: Option<bool>) -> bool {
    match flag {
        Some(flag) => flag,
        None => matches!(raw_status.map(|s| s.trim().to_lowercase()), Some(s) if s == "request"),
    }
}

/// Normalized contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    /// The other user's id
    pub contact_id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub avatar_url: Option<String>,
    pub status: ContactStatus,
    /// Distinguishes an outgoing request from an incoming one
    pub initiated_by_me: bool,
    pub is_favorite: bool,
    /// Carried for display; no operation sets or checks it yet
    pub is_blocked: bool,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub last_interaction: Option<DateTime<Utc>>,
    pub unread_count: u32,
}

impl Contact {
    /// Minimal contact with no relationship yet
    pub fn new(contact_id: UserId, name: impl Into<String>) -> Self {
        Self {
            contact_id,
            name: name.into(),
            email: None,
            role: None,
            department: None,
            avatar_url: None,
            status: ContactStatus::NotContact,
            initiated_by_me: false,
            is_favorite: false,
            is_blocked: false,
            last_message: None,
            last_message_time: None,
            last_interaction: None,
            unread_count: 0,
        }
    }

    /// Normalize a wire contact. Prefers `contact_id` over `id` and
    /// `contact_name` over `name`.
    pub fn from_raw(raw: RawContact) -> Result<Self, SharedError> {
        let contact_id = raw
            .contact_id
            .or(raw.id)
            .ok_or_else(|| SharedError::missing_id("Contact"))?;

        let raw_status = raw.status.as_deref().or(raw.contact_status.as_deref());
        let status = raw_status.map(ContactStatus::from_wire).unwrap_or_default();
        let initiated_by_me = infer_initiated(
            raw_status,
            raw.initiated_by_me.or(raw.is_contact_initiated_by_me),
        );

        let name = raw
            .contact_name
            .or(raw.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("User {}", contact_id));

        Ok(Self {
            contact_id,
            name,
            email: raw.contact_email.or(raw.email),
            role: raw.contact_role.or(raw.role),
            department: raw.contact_department.or(raw.department),
            avatar_url: raw.avatar_url,
            status,
            initiated_by_me,
            is_favorite: raw.is_favorite.unwrap_or(false),
            is_blocked: raw.is_blocked.unwrap_or(false),
            last_message: raw.last_message,
            last_message_time: raw.last_message_time,
            last_interaction: raw.last_interaction,
            unread_count: raw.unread_count.unwrap_or(0),
        })
    }

    /// Which side of a pending request this user is on, if pending
    pub fn request_side(&self) -> Option<RequestSide> {
        (self.status == ContactStatus::Pending)
            .then(|| RequestSide::from_initiated(self.initiated_by_me))
    }

    /// Label for display: the legacy `request`/`pending` split is derived here
    pub fn display_label(&self) -> &'static str {
        match self.request_side() {
            Some(side) => side.label(),
            None => self.status.as_str(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ContactStatus::Accepted
    }

    /// Get avatar initial (first letter of the name)
    pub fn avatar_initial(&self) -> char {
        self.name.chars().next().unwrap_or('?').to_ascii_uppercase()
    }
}

/// Contact as sent by the backend, in either of its shapes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawContact {
    pub id: Option<UserId>,
    pub contact_id: Option<UserId>,
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub contact_email: Option<String>,
    pub role: Option<String>,
    pub contact_role: Option<String>,
    pub department: Option<String>,
    pub contact_department: Option<String>,
    pub avatar_url: Option<String>,
    pub status: Option<String>,
    pub contact_status: Option<String>,
    pub initiated_by_me: Option<bool>,
    pub is_contact_initiated_by_me: Option<bool>,
    pub is_favorite: Option<bool>,
    pub is_blocked: Option<bool>,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub last_interaction: Option<DateTime<Utc>>,
    pub unread_count: Option<u32>,
}

/// Filters accepted by the contact listing endpoint
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ContactQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContactStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub favorites_only: bool,
}

/// Body of the create-contact (connect) call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectRequest {
    pub contact_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

/// Answer to a pending request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RespondAction {
    Accept,
    Reject,
    Cancel,
}

impl RespondAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RespondAction::Accept => "accept",
            RespondAction::Reject => "reject",
            RespondAction::Cancel => "cancel",
        }
    }
}

/// Body of the respond call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RespondRequest {
    pub action: RespondAction,
}

/// Acknowledgement of a respond call, optionally with the resulting contact
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RespondResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub status: Option<String>,
    pub contact: Option<RawContact>,
}

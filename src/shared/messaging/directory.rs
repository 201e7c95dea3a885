//! Directory User
//!
//! An entry of the "all users" listing, annotated with the current
//! connection status toward that user. Distinct from a [`Contact`]: every
//! portal user appears here whether or not a relationship exists.
//!
//! [`Contact`]: super::contact::Contact

use super::contact::{infer_initiated, Contact, ContactStatus, UserId};
use crate::shared::error::SharedError;
use serde::{Deserialize, Serialize};

/// Normalized directory entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub department: Option<String>,
    pub contact_status: ContactStatus,
    pub initiated_by_me: bool,
}

impl DirectoryUser {
    pub fn from_raw(raw: RawDirectoryUser) -> Result<Self, SharedError> {
        let id = raw
            .id
            .or(raw.user_id)
            .ok_or_else(|| SharedError::missing_id("Directory user"))?;
        let status = raw
            .contact_status
            .as_deref()
            .map(ContactStatus::from_wire)
            .unwrap_or_default();
        let initiated_by_me =
            infer_initiated(raw.contact_status.as_deref(), raw.is_contact_initiated_by_me);

        Ok(Self {
            id,
            name: raw.name.unwrap_or_else(|| format!("User {}", id)),
            email: raw.email.unwrap_or_default(),
            role: raw.role,
            department: raw.department,
            contact_status: status,
            initiated_by_me,
        })
    }

    /// Seed a contact row from this directory entry (used after a connect)
    pub fn to_contact(&self) -> Contact {
        let mut contact = Contact::new(self.id, self.name.clone());
        contact.email = Some(self.email.clone()).filter(|e| !e.is_empty());
        contact.role = self.role.clone();
        contact.department = self.department.clone();
        contact.status = self.contact_status;
        contact.initiated_by_me = self.initiated_by_me;
        contact
    }
}

/// Directory user as sent by `/chat/users/all`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawDirectoryUser {
    pub id: Option<UserId>,
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub contact_status: Option<String>,
    pub is_contact_initiated_by_me: Option<bool>,
}

//! Contact Store reducers and the request state machine.
//!
//! ```text
//!  not_contact ──connect──▶ pending(initiated_by_me) ──cancel──▶ (removed)
//!      ▲                       │
//!      │                       ├─accept (recipient)──▶ accepted ──remove──▶ not_contact
//!      │                       └─reject (recipient)──▶ (removed)
//!  rejected ──request_again──▶ pending(initiated_by_me)
//! ```
//!
//! The reducers here are only applied after the backend confirmed the
//! transition; a failed call leaves the store untouched.

use super::state::ChatState;
use crate::shared::messaging::{Contact, ContactStatus, DirectoryUser, UserId};

/// Transition of the contact-request state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOp {
    Connect,
    RequestAgain,
    Accept,
    Reject,
    Cancel,
    Remove,
}

/// Whether `op` may run from the given status and request side.
pub fn transition_allowed(op: ContactOp, status: ContactStatus, initiated_by_me: bool) -> bool {
    match op {
        ContactOp::Connect => matches!(status, ContactStatus::NotContact | ContactStatus::Rejected),
        ContactOp::RequestAgain => status == ContactStatus::Rejected,
        ContactOp::Accept | ContactOp::Reject => {
            status == ContactStatus::Pending && !initiated_by_me
        }
        ContactOp::Cancel => status == ContactStatus::Pending && initiated_by_me,
        ContactOp::Remove => status == ContactStatus::Accepted,
    }
}

/// Which controls a UI should offer for a relationship
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactActions {
    pub can_connect: bool,
    pub can_request_again: bool,
    pub can_accept: bool,
    pub can_reject: bool,
    pub can_cancel: bool,
    pub can_remove: bool,
    pub can_message: bool,
}

impl ContactActions {
    pub fn for_relationship(status: ContactStatus, initiated_by_me: bool) -> Self {
        let allowed = |op| transition_allowed(op, status, initiated_by_me);
        Self {
            // a rejected relationship is offered as "request again", not "connect"
            can_connect: status == ContactStatus::NotContact,
            can_request_again: allowed(ContactOp::RequestAgain),
            can_accept: allowed(ContactOp::Accept),
            can_reject: allowed(ContactOp::Reject),
            can_cancel: allowed(ContactOp::Cancel),
            can_remove: allowed(ContactOp::Remove),
            can_message: status == ContactStatus::Accepted,
        }
    }

    pub fn for_contact(contact: &Contact) -> Self {
        Self::for_relationship(contact.status, contact.initiated_by_me)
    }
}

impl ChatState {
    /// Replace the Contact Store with a fetched list
    pub fn apply_contact_list(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts;

        if let Some(selected) = self.selected_contact_id {
            if self.contact(selected).is_none() {
                tracing::info!("[CHAT] Selected contact {} no longer listed, clearing selection", selected);
                self.selected_contact_id = None;
            }
        }

        let accepted: Vec<UserId> = self
            .contacts
            .iter()
            .filter(|c| c.is_accepted())
            .map(|c| c.contact_id)
            .collect();
        self.threads.retain(|id, _| accepted.contains(id));
    }

    pub fn apply_directory(&mut self, users: Vec<DirectoryUser>) {
        self.directory = users;
    }

    /// Mirror a relationship change into the directory listing
    fn sync_directory(&mut self, user_id: UserId, status: ContactStatus, initiated_by_me: bool) {
        if let Some(user) = self.directory.iter_mut().find(|u| u.id == user_id) {
            user.contact_status = status;
            user.initiated_by_me = initiated_by_me;
        }
    }

    fn upsert_contact(&mut self, contact: Contact) {
        match self.contact_mut(contact.contact_id) {
            Some(existing) => *existing = contact,
            None => self.contacts.push(contact),
        }
    }

    /// connect / request_again succeeded: the relationship is an outgoing request
    pub fn apply_connected(&mut self, user_id: UserId, echoed: Option<Contact>) {
        let mut contact = match (self.contact(user_id).cloned(), echoed) {
            (_, Some(echoed)) if echoed.contact_id == user_id => echoed,
            (Some(existing), _) => existing,
            (None, _) => self
                .directory_user(user_id)
                .map(|u| u.to_contact())
                .unwrap_or_else(|| Contact::new(user_id, format!("User {}", user_id))),
        };
        contact.status = ContactStatus::Pending;
        contact.initiated_by_me = true;

        self.upsert_contact(contact);
        self.sync_directory(user_id, ContactStatus::Pending, true);
        self.contacts_revision += 1;
    }

    /// accept succeeded
    pub fn apply_accepted(&mut self, contact_id: UserId, echoed: Option<Contact>) {
        if let Some(echoed) = echoed.filter(|c| c.contact_id == contact_id) {
            self.upsert_contact(echoed);
        }
        let initiated = match self.contact_mut(contact_id) {
            Some(contact) => {
                contact.status = ContactStatus::Accepted;
                contact.initiated_by_me
            }
            None => false,
        };
        self.sync_directory(contact_id, ContactStatus::Accepted, initiated);
        self.contacts_revision += 1;
    }

    /// reject / cancel succeeded: the row disappears with its messages
    pub fn apply_request_closed(&mut self, contact_id: UserId) {
        self.contacts.retain(|c| c.contact_id != contact_id);
        self.threads.remove(&contact_id);
        if self.selected_contact_id == Some(contact_id) {
            self.selected_contact_id = None;
        }
        self.sync_directory(contact_id, ContactStatus::NotContact, false);
        self.contacts_revision += 1;
    }

    /// remove succeeded: the relationship is dissolved back to not_contact
    pub fn apply_contact_removed(&mut self, contact_id: UserId) {
        if let Some(contact) = self.contact_mut(contact_id) {
            contact.status = ContactStatus::NotContact;
            contact.initiated_by_me = false;
            contact.unread_count = 0;
        }
        self.threads.remove(&contact_id);
        if self.selected_contact_id == Some(contact_id) {
            self.selected_contact_id = None;
        }
        self.sync_directory(contact_id, ContactStatus::NotContact, false);
        self.contacts_revision += 1;
    }

    pub fn apply_favorite(&mut self, contact_id: UserId, is_favorite: bool) {
        if let Some(contact) = self.contact_mut(contact_id) {
            contact.is_favorite = is_favorite;
        }
    }
}

//! Chat State
//!
//! The session-scoped state container: Contact Store, Message Store,
//! selection, in-flight guards and notices. It is mutated only through the
//! reducer methods in `contacts` and `messages`, which the controller applies
//! after a remote call has succeeded.

use super::messages::MessageThread;
use super::notices::NoticeBoard;
use crate::client::error::ChatError;
use crate::shared::messaging::{ChatMessage, Contact, ContactStatus, DirectoryUser, MessageId, UserId};
use std::collections::{HashMap, HashSet};

/// Category of a remote operation, used for per-target in-flight tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Connect,
    Respond,
    Remove,
    Favorite,
    Send,
    Edit,
    Delete,
    FetchMessages,
    MarkRead,
}

/// Operations currently awaiting the backend, keyed by category and target id
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    active: HashSet<(OperationKind, i64)>,
}

impl InFlight {
    /// Claim the slot; returns false when the same operation is already running
    pub fn begin(&mut self, kind: OperationKind, id: i64) -> bool {
        self.active.insert((kind, id))
    }

    pub fn finish(&mut self, kind: OperationKind, id: i64) {
        self.active.remove(&(kind, id));
    }

    /// Whether the control for this operation and target should be disabled
    pub fn is_busy(&self, kind: OperationKind, id: i64) -> bool {
        self.active.contains(&(kind, id))
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

/// A destructive action waiting for the user's explicit confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    RemoveContact(UserId),
    DeleteMessage(MessageId),
}

impl ConfirmAction {
    pub fn prompt(&self) -> &'static str {
        match self {
            ConfirmAction::RemoveContact(_) => "Remove this contact? Your conversation will be closed.",
            ConfirmAction::DeleteMessage(_) => "Delete this message?",
        }
    }
}

/// The main state for the chat client
#[derive(Debug, Default)]
pub struct ChatState {
    /// Current user's ID
    pub current_user_id: Option<UserId>,

    /// Contact Store: one row per counterpart user
    pub contacts: Vec<Contact>,
    /// Directory of all portal users
    pub directory: Vec<DirectoryUser>,
    /// Message Store: newest-first thread per contact
    pub threads: HashMap<UserId, MessageThread>,

    /// Currently selected contact
    pub selected_contact_id: Option<UserId>,

    pub in_flight: InFlight,
    /// Contact list loads awaiting the backend; drives the global spinner
    pub loading_contacts: u32,
    /// Directory loads awaiting the backend
    pub loading_directory: u32,

    /// Set on a 401; shows the sign-in banner and halts polling
    pub session_expired: bool,
    /// Bumped on logout so late results from the old session are dropped
    pub session_epoch: u64,
    /// Bumped by every local change to contact rows (transitions, sends,
    /// mark-read); list fetches started before it are discarded
    pub contacts_revision: u64,

    pub notices: NoticeBoard,
    pub pending_confirmation: Option<ConfirmAction>,
}

impl ChatState {
    pub fn new(current_user_id: Option<UserId>, notices: NoticeBoard) -> Self {
        Self {
            current_user_id,
            notices,
            ..Default::default()
        }
    }

    pub fn contact(&self, contact_id: UserId) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.contact_id == contact_id)
    }

    pub fn contact_mut(&mut self, contact_id: UserId) -> Option<&mut Contact> {
        self.contacts.iter_mut().find(|c| c.contact_id == contact_id)
    }

    pub fn directory_user(&self, user_id: UserId) -> Option<&DirectoryUser> {
        self.directory.iter().find(|u| u.id == user_id)
    }

    /// Relationship toward a user: the Contact Store wins, then the directory,
    /// otherwise no relationship
    pub fn relationship(&self, user_id: UserId) -> (ContactStatus, bool) {
        if let Some(contact) = self.contact(user_id) {
            return (contact.status, contact.initiated_by_me);
        }
        if let Some(user) = self.directory_user(user_id) {
            return (user.contact_status, user.initiated_by_me);
        }
        (ContactStatus::NotContact, false)
    }

    /// Whether the contact list spinner should show
    pub fn is_loading_contacts(&self) -> bool {
        self.loading_contacts > 0
    }

    pub fn is_loading_directory(&self) -> bool {
        self.loading_directory > 0
    }

    pub fn is_accepted(&self, contact_id: UserId) -> bool {
        self.contact(contact_id).map(|c| c.is_accepted()).unwrap_or(false)
    }

    /// Get the currently selected contact, always read from the store
    pub fn selected_contact(&self) -> Option<&Contact> {
        self.selected_contact_id.and_then(|id| self.contact(id))
    }

    /// Messages for a contact, newest first
    pub fn messages_for(&self, contact_id: UserId) -> &[ChatMessage] {
        self.threads
            .get(&contact_id)
            .map(|t| t.messages.as_slice())
            .unwrap_or(&[])
    }

    /// Get messages for the currently selected contact
    pub fn selected_messages(&self) -> &[ChatMessage] {
        match self.selected_contact_id {
            Some(id) => self.messages_for(id),
            None => &[],
        }
    }

    /// Clear the current selection
    pub fn clear_selection(&mut self) {
        self.selected_contact_id = None;
    }

    /// Total unread messages across contacts
    pub fn total_unread(&self) -> u32 {
        self.contacts.iter().map(|c| c.unread_count).sum()
    }

    /// Count of incoming requests awaiting an answer
    pub fn incoming_request_count(&self) -> usize {
        self.contacts
            .iter()
            .filter(|c| c.status == ContactStatus::Pending && !c.initiated_by_me)
            .count()
    }

    /// Store a failed operation's message; a 401 also raises the session banner
    pub fn record_error(&mut self, error: &ChatError) {
        if error.is_unauthorized() {
            self.session_expired = true;
        }
        self.notices.push_error(error.to_string());
    }

    /// Drop everything tied to the session (logout)
    pub fn clear(&mut self) {
        let epoch = self.session_epoch.wrapping_add(1);
        let notices = NoticeBoard::new(self.notices.ttl());
        *self = Self {
            session_epoch: epoch,
            notices,
            ..Default::default()
        };
    }
}

//! Chat Controller
//!
//! Runs every chat operation as a transaction against the shared
//! [`ChatState`]:
//!
//! 1. take the write lock, check the precondition and claim the in-flight slot
//! 2. release the lock and await the remote call
//! 3. re-take the lock; apply the reducer on success, or only record the
//!    error on failure
//!
//! A precondition miss is not an error: the call returns
//! `Ok(Outcome::Skipped(..))` without touching the network.

use super::contacts::{transition_allowed, ContactOp};
use super::messages::{page_offset, MESSAGE_PAGE_SIZE};
use super::notices::NoticeBoard;
use super::state::{ChatState, ConfirmAction, OperationKind};
use crate::client::chat_api::ChatApi;
use crate::client::error::ChatError;
use crate::shared::config::AppConfig;
use crate::shared::error::require_text;
use crate::shared::messaging::{
    ConnectRequest, Contact, ContactQuery, ContactStatus, EditMessageRequest, MessageId, MessageType,
    RespondAction, SendMessageRequest, UserId,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Result of an operation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
}

/// Why an operation was a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The same operation on the same target is still awaiting the backend
    InFlight,
    /// The relationship's status does not allow this transition
    NotAllowed(ContactStatus),
    /// Messaging requires an accepted contact
    NotAccepted,
    UnknownContact,
    UnknownMessage,
    /// Only the sender may edit a message
    NotOwner,
    AlreadyDeleted,
    NoMorePages,
    NothingToConfirm,
    /// Polling is halted until the user signs in again
    SessionExpired,
    /// The result arrived for a session or contact that is no longer current
    Stale,
}

pub type ChatResult = Result<Outcome, ChatError>;

/// Ticket for a claimed in-flight slot
struct Ticket {
    kind: OperationKind,
    target: i64,
    epoch: u64,
}

pub struct ChatController<A: ChatApi> {
    api: A,
    state: Arc<RwLock<ChatState>>,
}

impl<A: ChatApi> ChatController<A> {
    pub fn new(api: A, config: &AppConfig, current_user_id: Option<UserId>) -> Self {
        let ttl = chrono::Duration::seconds(config.notice_ttl_secs as i64);
        let state = ChatState::new(current_user_id, NoticeBoard::new(ttl));
        Self {
            api,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Shared handle to the state container, for readers such as a UI
    pub fn state(&self) -> Arc<RwLock<ChatState>> {
        Arc::clone(&self.state)
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, ChatState> {
        self.state.read().await
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Claim the slot for a user action after checking its precondition.
    /// A new user action also dismisses the previous error notice.
    async fn begin(
        &self,
        kind: OperationKind,
        target: i64,
        check: impl FnOnce(&ChatState) -> Result<(), SkipReason>,
    ) -> Result<Ticket, SkipReason> {
        self.claim(kind, target, true, check).await
    }

    async fn claim(
        &self,
        kind: OperationKind,
        target: i64,
        user_action: bool,
        check: impl FnOnce(&ChatState) -> Result<(), SkipReason>,
    ) -> Result<Ticket, SkipReason> {
        let mut state = self.state.write().await;
        if user_action {
            state.notices.clear_errors();
        }
        if let Err(reason) = check(&*state) {
            tracing::debug!("[CHAT] {:?} on {} skipped: {:?}", kind, target, reason);
            return Err(reason);
        }
        if !state.in_flight.begin(kind, target) {
            tracing::debug!("[CHAT] {:?} on {} already in flight", kind, target);
            return Err(SkipReason::InFlight);
        }
        Ok(Ticket { kind, target, epoch: state.session_epoch })
    }

    /// Release the slot and apply the result. `apply` returns `false` when
    /// the result is no longer relevant.
    async fn finish<T>(
        &self,
        ticket: Ticket,
        result: Result<T, ChatError>,
        apply: impl FnOnce(&mut ChatState, T) -> bool,
    ) -> ChatResult {
        let mut state = self.state.write().await;
        if state.session_epoch != ticket.epoch {
            tracing::warn!(
                "[CHAT] Dropping {:?} result for {} from a previous session",
                ticket.kind,
                ticket.target
            );
            return Ok(Outcome::Skipped(SkipReason::Stale));
        }
        state.in_flight.finish(ticket.kind, ticket.target);

        match result {
            Ok(value) => {
                if apply(&mut *state, value) {
                    Ok(Outcome::Applied)
                } else {
                    tracing::warn!("[CHAT] Discarding stale {:?} result for {}", ticket.kind, ticket.target);
                    Ok(Outcome::Skipped(SkipReason::Stale))
                }
            }
            Err(e) => {
                tracing::error!("[CHAT] {:?} on {} failed: {}", ticket.kind, ticket.target, e);
                state.record_error(&e);
                Err(e)
            }
        }
    }

    /// Surface a client-side validation error without any network call
    async fn reject_input(&self, error: ChatError) -> ChatResult {
        let mut state = self.state.write().await;
        state.notices.clear_errors();
        state.record_error(&error);
        Err(error)
    }

    // ---------------------------------------------------------------------
    // Contact list and directory
    // ---------------------------------------------------------------------

    /// Fetch the contact list. Discarded if a local transition happened meanwhile.
    pub async fn load_contacts(&self, query: &ContactQuery) -> ChatResult {
        let (epoch, revision) = {
            let mut state = self.state.write().await;
            state.loading_contacts += 1;
            (state.session_epoch, state.contacts_revision)
        };

        let result = self.api.list_contacts(query).await;

        let mut state = self.state.write().await;
        if state.session_epoch != epoch {
            return Ok(Outcome::Skipped(SkipReason::Stale));
        }
        state.loading_contacts = state.loading_contacts.saturating_sub(1);
        match result {
            Ok(contacts) if state.contacts_revision == revision => {
                tracing::info!("[CHAT] Loaded {} contacts", contacts.len());
                state.apply_contact_list(contacts);
                Ok(Outcome::Applied)
            }
            Ok(_) => {
                tracing::debug!("[CHAT] Contact list superseded by a local transition");
                Ok(Outcome::Skipped(SkipReason::Stale))
            }
            Err(e) => {
                tracing::error!("[CHAT] Failed to load contacts: {}", e);
                state.record_error(&e);
                Err(e)
            }
        }
    }

    pub async fn load_directory(&self) -> ChatResult {
        let (epoch, revision) = {
            let mut state = self.state.write().await;
            state.loading_directory += 1;
            (state.session_epoch, state.contacts_revision)
        };

        let result = self.api.list_directory().await;

        let mut state = self.state.write().await;
        if state.session_epoch != epoch {
            return Ok(Outcome::Skipped(SkipReason::Stale));
        }
        state.loading_directory = state.loading_directory.saturating_sub(1);
        match result {
            Ok(users) if state.contacts_revision == revision => {
                tracing::info!("[CHAT] Loaded {} directory users", users.len());
                state.apply_directory(users);
                Ok(Outcome::Applied)
            }
            Ok(_) => Ok(Outcome::Skipped(SkipReason::Stale)),
            Err(e) => {
                tracing::error!("[CHAT] Failed to load directory: {}", e);
                state.record_error(&e);
                Err(e)
            }
        }
    }

    /// Load contacts and directory concurrently
    pub async fn refresh(&self) -> ChatResult {
        let query = ContactQuery::default();
        let (contacts, directory) =
            futures_util::future::join(self.load_contacts(&query), self.load_directory()).await;
        contacts?;
        directory
    }

    // ---------------------------------------------------------------------
    // Request state machine
    // ---------------------------------------------------------------------

    async fn send_request(&self, user_id: UserId, op: ContactOp) -> ChatResult {
        let ticket = match self
            .begin(OperationKind::Connect, user_id, |state| {
                let (status, initiated) = state.relationship(user_id);
                if transition_allowed(op, status, initiated) {
                    Ok(())
                } else {
                    Err(SkipReason::NotAllowed(status))
                }
            })
            .await
        {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let request = ConnectRequest { contact_id: user_id, is_favorite: None };
        let result = self.api.create_contact(&request).await;

        self.finish(ticket, result, |state, echoed| {
            state.apply_connected(user_id, echoed);
            state.notices.push_success("Connection request sent");
            tracing::info!("[CHAT] Connection request sent to {}", user_id);
            true
        })
        .await
    }

    /// Send a connection request to a user with no relationship (or a rejected one)
    pub async fn connect(&self, user_id: UserId) -> ChatResult {
        self.send_request(user_id, ContactOp::Connect).await
    }

    /// Ask again after a rejection
    pub async fn request_again(&self, user_id: UserId) -> ChatResult {
        self.send_request(user_id, ContactOp::RequestAgain).await
    }

    async fn respond(&self, contact_id: UserId, op: ContactOp, action: RespondAction) -> ChatResult {
        let ticket = match self
            .begin(OperationKind::Respond, contact_id, |state| {
                let contact = state.contact(contact_id).ok_or(SkipReason::UnknownContact)?;
                if transition_allowed(op, contact.status, contact.initiated_by_me) {
                    Ok(())
                } else {
                    Err(SkipReason::NotAllowed(contact.status))
                }
            })
            .await
        {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let result = self.api.respond(contact_id, action).await;

        self.finish(ticket, result, |state, response| {
            match action {
                RespondAction::Accept => {
                    let echoed = response
                        .contact
                        .and_then(|raw| Contact::from_raw(raw).ok());
                    state.apply_accepted(contact_id, echoed);
                    state.notices.push_success("Request accepted");
                }
                RespondAction::Reject => {
                    state.apply_request_closed(contact_id);
                    state.notices.push_success("Request rejected");
                }
                RespondAction::Cancel => {
                    state.apply_request_closed(contact_id);
                    state.notices.push_success("Request cancelled");
                }
            }
            tracing::info!("[CHAT] Responded {} to contact {}", action.as_str(), contact_id);
            true
        })
        .await
    }

    /// Accept an incoming request
    pub async fn accept(&self, contact_id: UserId) -> ChatResult {
        self.respond(contact_id, ContactOp::Accept, RespondAction::Accept).await
    }

    /// Reject an incoming request; the contact disappears from the store
    pub async fn reject(&self, contact_id: UserId) -> ChatResult {
        self.respond(contact_id, ContactOp::Reject, RespondAction::Reject).await
    }

    /// Withdraw an outgoing request; the contact disappears from the store
    pub async fn cancel(&self, contact_id: UserId) -> ChatResult {
        self.respond(contact_id, ContactOp::Cancel, RespondAction::Cancel).await
    }

    /// Mark or unmark a contact as favorite
    pub async fn set_favorite(&self, contact_id: UserId, is_favorite: bool) -> ChatResult {
        let ticket = match self
            .begin(OperationKind::Favorite, contact_id, |state| {
                state
                    .contact(contact_id)
                    .map(|_| ())
                    .ok_or(SkipReason::UnknownContact)
            })
            .await
        {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let request = ConnectRequest { contact_id, is_favorite: Some(is_favorite) };
        let result = self.api.create_contact(&request).await;

        self.finish(ticket, result, |state, _| {
            state.apply_favorite(contact_id, is_favorite);
            state.contact(contact_id).is_some()
        })
        .await
    }

    async fn remove_contact(&self, contact_id: UserId) -> ChatResult {
        let ticket = match self
            .begin(OperationKind::Remove, contact_id, |state| {
                let contact = state.contact(contact_id).ok_or(SkipReason::UnknownContact)?;
                if transition_allowed(ContactOp::Remove, contact.status, contact.initiated_by_me) {
                    Ok(())
                } else {
                    Err(SkipReason::NotAllowed(contact.status))
                }
            })
            .await
        {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let result = self.api.remove_contact(contact_id).await;

        self.finish(ticket, result, |state, ()| {
            state.apply_contact_removed(contact_id);
            state.notices.push_success("Contact removed");
            tracing::info!("[CHAT] Removed contact {}", contact_id);
            true
        })
        .await
    }

    // ---------------------------------------------------------------------
    // Confirmation of destructive actions
    // ---------------------------------------------------------------------

    /// Stage a destructive action; nothing is sent until [`confirm`](Self::confirm)
    pub async fn request_confirmation(&self, action: ConfirmAction) {
        let mut state = self.state.write().await;
        state.notices.clear_errors();
        state.pending_confirmation = Some(action);
    }

    pub async fn dismiss_confirmation(&self) {
        self.state.write().await.pending_confirmation = None;
    }

    /// Run the staged destructive action
    pub async fn confirm(&self) -> ChatResult {
        let action = self.state.write().await.pending_confirmation.take();
        match action {
            Some(ConfirmAction::RemoveContact(contact_id)) => self.remove_contact(contact_id).await,
            Some(ConfirmAction::DeleteMessage(message_id)) => self.delete_message(message_id).await,
            None => Ok(Outcome::Skipped(SkipReason::NothingToConfirm)),
        }
    }

    // ---------------------------------------------------------------------
    // Messages
    // ---------------------------------------------------------------------

    /// Fetch one page of a contact's messages (page 1 replaces, later pages merge)
    pub async fn fetch_messages(&self, contact_id: UserId, page: u32) -> ChatResult {
        self.fetch_page(contact_id, page, true).await
    }

    /// A user fetch applies the page as loaded; a background one (poll) only
    /// merges the newest page into the thread.
    async fn fetch_page(&self, contact_id: UserId, page: u32, user_action: bool) -> ChatResult {
        let page = page.max(1);
        let ticket = match self
            .claim(OperationKind::FetchMessages, contact_id, user_action, |state| {
                accepted_contact(state, contact_id)
            })
            .await
        {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let result = self
            .api
            .list_messages(contact_id, MESSAGE_PAGE_SIZE, page_offset(page))
            .await;

        self.finish(ticket, result, |state, messages| {
            if !state.is_accepted(contact_id) {
                return false;
            }
            tracing::debug!("[CHAT] Page {} for {}: {} messages", page, contact_id, messages.len());
            if user_action {
                state.apply_fetched_page(contact_id, page, messages);
            } else {
                state.apply_polled_page(contact_id, messages);
            }
            true
        })
        .await
    }

    /// Fetch the next older page if the last one was full
    pub async fn load_older(&self, contact_id: UserId) -> ChatResult {
        let next = {
            let state = self.state.read().await;
            match state.threads.get(&contact_id) {
                Some(thread) if thread.has_more => thread.page + 1,
                Some(_) => return Ok(Outcome::Skipped(SkipReason::NoMorePages)),
                None => 1,
            }
        };
        self.fetch_messages(contact_id, next).await
    }

    /// Send a text message to an accepted contact
    pub async fn send_message(&self, receiver_id: UserId, text: &str) -> ChatResult {
        let text = match require_text("message", text) {
            Ok(text) => text,
            Err(e) => return self.reject_input(e.into()).await,
        };

        let ticket = match self
            .begin(OperationKind::Send, receiver_id, |state| {
                accepted_contact(state, receiver_id)
            })
            .await
        {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let request = SendMessageRequest {
            receiver_id,
            message: text,
            message_type: MessageType::Text,
        };
        let result = self.api.send_message(&request).await;

        self.finish(ticket, result, |state, message| {
            if !state.is_accepted(receiver_id) {
                return false;
            }
            tracing::info!("[CHAT] Sent message {} to {}", message.id, receiver_id);
            state.apply_sent(receiver_id, message);
            true
        })
        .await
    }

    /// Edit one of the current user's messages
    pub async fn edit_message(&self, message_id: MessageId, text: &str) -> ChatResult {
        let text = match require_text("message", text) {
            Ok(text) => text,
            Err(e) => return self.reject_input(e.into()).await,
        };

        let ticket = match self
            .begin(OperationKind::Edit, message_id, |state| {
                let (_, message) = state.find_message(message_id).ok_or(SkipReason::UnknownMessage)?;
                if Some(message.sender_id) != state.current_user_id {
                    return Err(SkipReason::NotOwner);
                }
                if message.is_deleted {
                    return Err(SkipReason::AlreadyDeleted);
                }
                Ok(())
            })
            .await
        {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let request = EditMessageRequest { message: text };
        let result = self.api.edit_message(message_id, &request).await;

        self.finish(ticket, result, |state, mut edited| {
            edited.id = message_id;
            let applied = state.apply_edited(&edited, Utc::now());
            if applied {
                state.notices.push_success("Message updated");
            }
            applied
        })
        .await
    }

    async fn delete_message(&self, message_id: MessageId) -> ChatResult {
        let ticket = match self
            .begin(OperationKind::Delete, message_id, |state| {
                let (_, message) = state.find_message(message_id).ok_or(SkipReason::UnknownMessage)?;
                if message.is_deleted {
                    return Err(SkipReason::AlreadyDeleted);
                }
                Ok(())
            })
            .await
        {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let result = self.api.delete_message(message_id).await;

        self.finish(ticket, result, |state, response| {
            let deleted_id = response.message_id.unwrap_or(message_id);
            let applied = state.apply_deleted(deleted_id, Utc::now());
            if applied {
                state.notices.push_success("Message deleted");
            }
            applied
        })
        .await
    }

    /// Mark every message of an accepted contact read, locally and remotely
    pub async fn mark_as_read(&self, contact_id: UserId) -> ChatResult {
        self.mark_read(contact_id, true).await
    }

    async fn mark_read(&self, contact_id: UserId, user_action: bool) -> ChatResult {
        let ticket = match self
            .claim(OperationKind::MarkRead, contact_id, user_action, |state| {
                accepted_contact(state, contact_id)
            })
            .await
        {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let result = self.api.mark_read(contact_id).await;

        self.finish(ticket, result, |state, ()| {
            state.apply_mark_read(contact_id, Utc::now());
            true
        })
        .await
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    /// Change the active chat. Selecting an accepted contact marks it read
    /// locally, fetches its first page, then marks it read remotely.
    pub async fn select_contact(&self, contact_id: Option<UserId>) -> ChatResult {
        let Some(contact_id) = contact_id else {
            self.state.write().await.clear_selection();
            return Ok(Outcome::Applied);
        };

        {
            let mut state = self.state.write().await;
            let Some(contact) = state.contact(contact_id) else {
                return Ok(Outcome::Skipped(SkipReason::UnknownContact));
            };
            let accepted = contact.is_accepted();
            state.selected_contact_id = Some(contact_id);
            if !accepted {
                return Ok(Outcome::Applied);
            }
            state.apply_mark_read(contact_id, Utc::now());
        }

        let fetched = self.fetch_messages(contact_id, 1).await;

        if self.state.read().await.selected_contact_id != Some(contact_id) {
            tracing::debug!("[CHAT] Selection moved away from {}, skipping mark-read", contact_id);
            return fetched;
        }

        // part of the same user action: keep a fetch error visible
        let marked = self.mark_read(contact_id, false).await;
        fetched?;
        marked?;
        Ok(Outcome::Applied)
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    /// Install a fresh session cookie after the user signed in again
    pub async fn reauthenticate(&self, session_cookie: String, current_user_id: Option<UserId>) {
        self.api.set_session(Some(session_cookie));
        let mut state = self.state.write().await;
        state.session_expired = false;
        state.notices.clear_errors();
        if current_user_id.is_some() {
            state.current_user_id = current_user_id;
        }
        tracing::info!("[CHAT] Session renewed, polling resumes");
    }

    /// Drop the session and everything cached for it
    pub async fn logout(&self) {
        self.api.set_session(None);
        self.state.write().await.clear();
        tracing::info!("[CHAT] Logged out, chat state cleared");
    }

    /// One background refresh: contacts, then the open conversation's first page
    pub async fn poll_once(&self) -> ChatResult {
        let selected = {
            let state = self.state.read().await;
            if state.session_expired {
                return Ok(Outcome::Skipped(SkipReason::SessionExpired));
            }
            state.selected_contact_id
        };

        self.load_contacts(&ContactQuery::default()).await?;

        if let Some(contact_id) = selected {
            self.fetch_page(contact_id, 1, false).await?;
        }
        Ok(Outcome::Applied)
    }

    /// Drop notices that outlived their TTL
    pub async fn expire_notices(&self) {
        self.state.write().await.notices.expire(Utc::now());
    }
}

fn accepted_contact(state: &ChatState, contact_id: UserId) -> Result<(), SkipReason> {
    match state.contact(contact_id) {
        Some(contact) if contact.is_accepted() => Ok(()),
        Some(_) => Err(SkipReason::NotAccepted),
        None => Err(SkipReason::UnknownContact),
    }
}

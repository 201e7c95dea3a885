//! Message Store reducers.
//!
//! Each accepted contact owns a [`MessageThread`] kept newest first by
//! `created_at`. Edits and deletes mutate rows in place; nothing is ever
//! removed from a thread except when the whole relationship goes away.

use super::state::ChatState;
use crate::shared::messaging::{ChatMessage, MessageId, UserId};
use chrono::{DateTime, Utc};

/// Fixed page size of the message listing endpoint
pub const MESSAGE_PAGE_SIZE: u32 = 50;

/// Offset of a 1-based page
pub fn page_offset(page: u32) -> u32 {
    page.saturating_sub(1) * MESSAGE_PAGE_SIZE
}

/// Messages exchanged with one contact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageThread {
    /// Newest first
    pub messages: Vec<ChatMessage>,
    /// Last page loaded (0 before the first fetch)
    pub page: u32,
    pub has_more: bool,
}

impl MessageThread {
    /// Stable sort newest first; ties keep their insertion order
    fn sort_newest_first(&mut self) {
        self.messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    fn position(&self, message_id: MessageId) -> Option<usize> {
        self.messages.iter().position(|m| m.id == message_id)
    }

    /// Merge messages not already present, then restore ordering
    fn merge(&mut self, incoming: Vec<ChatMessage>) {
        for message in incoming {
            match self.position(message.id) {
                Some(idx) => self.messages[idx] = message,
                None => self.messages.push(message),
            }
        }
        self.sort_newest_first();
    }

    pub fn newest(&self) -> Option<&ChatMessage> {
        self.messages.first()
    }
}

impl ChatState {
    /// Apply one fetched page. Page 1 replaces the thread, keeping only local
    /// messages the server did not return and that are at least as new as
    /// its newest row (sent while the fetch was in flight); an empty page 1
    /// keeps every local row. Later pages are merged.
    pub fn apply_fetched_page(&mut self, contact_id: UserId, page: u32, fetched: Vec<ChatMessage>) {
        let has_more = fetched.len() as u32 == MESSAGE_PAGE_SIZE;
        let thread = self.threads.entry(contact_id).or_default();

        if page <= 1 {
            let newest_fetched = fetched.iter().map(|m| m.created_at).max();
            let ids: Vec<MessageId> = fetched.iter().map(|m| m.id).collect();
            let kept: Vec<ChatMessage> = thread
                .messages
                .drain(..)
                .filter(|m| !ids.contains(&m.id))
                .filter(|m| newest_fetched.map_or(true, |newest| m.created_at >= newest))
                .collect();
            thread.messages = kept;
            thread.merge(fetched);
            thread.page = 1;
        } else {
            thread.merge(fetched);
            thread.page = thread.page.max(page);
        }
        thread.has_more = has_more;
    }

    /// Background refresh of the newest page: merged by id into whatever the
    /// user has loaded, so older pages and the paging cursor survive
    pub fn apply_polled_page(&mut self, contact_id: UserId, fetched: Vec<ChatMessage>) {
        let loaded_pages = self.threads.get(&contact_id).map_or(0, |t| t.page);
        if loaded_pages == 0 {
            self.apply_fetched_page(contact_id, 1, fetched);
            return;
        }
        let full = fetched.len() as u32 == MESSAGE_PAGE_SIZE;
        if let Some(thread) = self.threads.get_mut(&contact_id) {
            thread.merge(fetched);
            if thread.page == 1 {
                thread.has_more = full;
            }
        }
    }

    /// A sent message came back from the backend: head of the thread plus
    /// the contact's preview fields
    pub fn apply_sent(&mut self, contact_id: UserId, message: ChatMessage) {
        self.contacts_revision += 1;
        let sent_at = message.created_at;
        let preview = message.message.clone();

        let thread = self.threads.entry(contact_id).or_default();
        match thread.position(message.id) {
            Some(idx) => thread.messages[idx] = message,
            None => thread.messages.insert(0, message),
        }
        thread.sort_newest_first();

        if let Some(contact) = self.contact_mut(contact_id) {
            contact.last_message = Some(preview);
            contact.last_message_time = Some(sent_at);
            contact.last_interaction = Some(sent_at);
        }
    }

    /// Locate a message across every thread (messages are keyed by contact)
    pub fn find_message(&self, message_id: MessageId) -> Option<(UserId, &ChatMessage)> {
        self.threads.iter().find_map(|(contact_id, thread)| {
            thread
                .messages
                .iter()
                .find(|m| m.id == message_id)
                .map(|m| (*contact_id, m))
        })
    }

    fn locate(&self, message_id: MessageId) -> Option<(UserId, usize)> {
        self.threads.iter().find_map(|(contact_id, thread)| {
            thread.position(message_id).map(|idx| (*contact_id, idx))
        })
    }

    /// Keep the preview in step when the newest message of a thread changes
    fn refresh_preview(&mut self, contact_id: UserId) {
        let newest_text = self
            .threads
            .get(&contact_id)
            .and_then(|t| t.newest())
            .map(|m| m.display_text().to_string());
        if let (Some(text), Some(contact)) = (newest_text, self.contact_mut(contact_id)) {
            contact.last_message = Some(text);
        }
    }

    /// Edit confirmed: only the text and edit flags change, in place
    pub fn apply_edited(&mut self, edited: &ChatMessage, now: DateTime<Utc>) -> bool {
        let Some((contact_id, idx)) = self.locate(edited.id) else {
            return false;
        };
        if let Some(thread) = self.threads.get_mut(&contact_id) {
            let row = &mut thread.messages[idx];
            row.message = edited.message.clone();
            row.is_edited = true;
            row.edited_at = edited.edited_at.or(Some(now));
        }
        if idx == 0 {
            self.refresh_preview(contact_id);
        }
        true
    }

    /// Delete confirmed: tombstone in place, the row and its index stay
    pub fn apply_deleted(&mut self, message_id: MessageId, now: DateTime<Utc>) -> bool {
        let Some((contact_id, idx)) = self.locate(message_id) else {
            return false;
        };
        if let Some(thread) = self.threads.get_mut(&contact_id) {
            thread.messages[idx].tombstone(now);
        }
        if idx == 0 {
            self.refresh_preview(contact_id);
        }
        true
    }

    /// Reset the unread counter and flag every message read
    pub fn apply_mark_read(&mut self, contact_id: UserId, now: DateTime<Utc>) {
        self.contacts_revision += 1;
        if let Some(contact) = self.contact_mut(contact_id) {
            contact.unread_count = 0;
        }
        if let Some(thread) = self.threads.get_mut(&contact_id) {
            for message in thread.messages.iter_mut() {
                message.mark_read(now);
            }
        }
    }
}

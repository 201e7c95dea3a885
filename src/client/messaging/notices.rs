//! Transient success/error notices (toasts).
//!
//! Errors are cleared by the next user action or once they outlive the
//! configured TTL; successes only expire.

use crate::shared::config::DEFAULT_NOTICE_TTL_SECS;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
    ttl: Duration,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_NOTICE_TTL_SECS as i64))
    }
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { notices: Vec::new(), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn push(&mut self, kind: NoticeKind, message: String) -> Uuid {
        let id = Uuid::new_v4();
        self.notices.push(Notice {
            id,
            kind,
            message,
            raised_at: Utc::now(),
        });
        id
    }

    pub fn push_success(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NoticeKind::Success, message.into())
    }

    pub fn push_error(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NoticeKind::Error, message.into())
    }

    pub fn dismiss(&mut self, id: Uuid) {
        self.notices.retain(|n| n.id != id);
    }

    pub fn clear_errors(&mut self) {
        self.notices.retain(|n| n.kind != NoticeKind::Error);
    }

    /// Drop notices older than the TTL
    pub fn expire(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.notices.retain(|n| now - n.raised_at < ttl);
    }

    pub fn latest_error(&self) -> Option<&Notice> {
        self.notices.iter().rev().find(|n| n.kind == NoticeKind::Error)
    }

    pub fn latest_success(&self) -> Option<&Notice> {
        self.notices.iter().rev().find(|n| n.kind == NoticeKind::Success)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

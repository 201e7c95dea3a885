//! Derived views over the Contact Store and the user directory.
//!
//! Pure functions: same inputs, same output, no caches.

use crate::shared::messaging::{Contact, ContactStatus, DirectoryUser};
use std::cmp::Ordering;

fn normalized(query: &str) -> String {
    query.trim().to_lowercase()
}

fn contains(field: Option<&str>, needle: &str) -> bool {
    field.map(|f| f.to_lowercase().contains(needle)).unwrap_or(false)
}

/// Contact sidebar filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    /// Matched against name, role and department
    pub search: String,
    pub status: Option<ContactStatus>,
    pub favorites_only: bool,
}

pub fn filter_contacts<'a>(contacts: &'a [Contact], filter: &ContactFilter) -> Vec<&'a Contact> {
    let needle = normalized(&filter.search);
    contacts
        .iter()
        .filter(|c| filter.status.map(|s| c.status == s).unwrap_or(true))
        .filter(|c| !filter.favorites_only || c.is_favorite)
        .filter(|c| {
            needle.is_empty()
                || contains(Some(&c.name), &needle)
                || contains(c.role.as_deref(), &needle)
                || contains(c.department.as_deref(), &needle)
        })
        .collect()
}

/// Which relationships the directory shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserView {
    #[default]
    All,
    /// Accepted contacts
    Contacts,
    /// Pending requests in either direction
    Pending,
    /// No relationship, or a rejected one
    NotConnected,
}

impl UserView {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(UserView::All),
            "contacts" | "accepted" => Some(UserView::Contacts),
            "pending" | "request" => Some(UserView::Pending),
            "not_contact" | "not_connected" => Some(UserView::NotConnected),
            _ => None,
        }
    }

    pub fn matches(&self, status: ContactStatus) -> bool {
        match self {
            UserView::All => true,
            UserView::Contacts => status == ContactStatus::Accepted,
            UserView::Pending => status == ContactStatus::Pending,
            UserView::NotConnected => {
                matches!(status, ContactStatus::NotContact | ContactStatus::Rejected)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    Role,
    Department,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
    /// Matched against name, email, role and department
    pub search: String,
    pub view: UserView,
    pub sort: SortKey,
}

/// Missing values sort last; ties fall back to name, then id
fn compare_users(a: &DirectoryUser, b: &DirectoryUser, key: SortKey) -> Ordering {
    let field = |u: &DirectoryUser| -> Option<String> {
        match key {
            SortKey::Name => Some(u.name.to_lowercase()),
            SortKey::Role => u.role.as_ref().map(|r| r.to_lowercase()),
            SortKey::Department => u.department.as_ref().map(|d| d.to_lowercase()),
        }
    };
    let primary = match (field(a), field(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    primary
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn filter_directory<'a>(users: &'a [DirectoryUser], filter: &DirectoryFilter) -> Vec<&'a DirectoryUser> {
    let needle = normalized(&filter.search);
    let mut result: Vec<&DirectoryUser> = users
        .iter()
        .filter(|u| filter.view.matches(u.contact_status))
        .filter(|u| {
            needle.is_empty()
                || contains(Some(&u.name), &needle)
                || contains(Some(&u.email), &needle)
                || contains(u.role.as_deref(), &needle)
                || contains(u.department.as_deref(), &needle)
        })
        .collect();
    result.sort_by(|a, b| compare_users(a, b, filter.sort));
    result
}

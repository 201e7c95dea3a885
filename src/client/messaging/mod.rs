//! Messaging Module
//!
//! The session-scoped chat state and the operations that mutate it.
//!
//! - `state` - the state container (Contact Store, Message Store, selection)
//! - `contacts` - contact-request state machine and Contact Store reducers
//! - `messages` - Message Store reducers
//! - `filters` - pure derived views (contact sidebar, user directory)
//! - `notices` - success/error toasts
//! - `controller` - transactional operations against the backend
//! - `polling` - background refresh

pub mod contacts;
pub mod controller;
pub mod filters;
pub mod messages;
pub mod notices;
pub mod polling;
pub mod state;

pub use contacts::{transition_allowed, ContactActions, ContactOp};
pub use controller::{ChatController, ChatResult, Outcome, SkipReason};
pub use filters::{filter_contacts, filter_directory, ContactFilter, DirectoryFilter, SortKey, UserView};
pub use messages::{MessageThread, MESSAGE_PAGE_SIZE};
pub use notices::{Notice, NoticeBoard, NoticeKind};
pub use polling::ContactPoller;
pub use state::{ChatState, ConfirmAction, InFlight, OperationKind};

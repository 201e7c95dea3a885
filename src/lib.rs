//! Campus Chat - Client Library
//!
//! Client side of the contact-request chat in the university administration
//! portal: connection requests between users, and one-to-one conversations
//! once a request is accepted.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared with any other front end
//!   - Contact, message and directory models with their wire shapes
//!   - Configuration and validation errors
//!
//! - **`client`** - The session client
//!   - `ChatApi` trait and the reqwest-backed `HttpChatApi`
//!   - `ChatState` container (Contact Store, Message Store, selection)
//!   - `ChatController` running every operation as a transaction
//!   - Background polling
//!
//! # Usage
//!
//! ```rust,no_run
//! use campus_chat::client::{ChatController, Config, HttpChatApi};
//!
//! # async fn run() -> Result<(), campus_chat::client::ChatError> {
//! let mut config = Config::new();
//! config.set_session(Some("session-cookie".to_string()));
//! let app = config.app().clone();
//!
//! let controller = ChatController::new(HttpChatApi::new(config)?, &app, Some(7));
//! controller.refresh().await?;
//! controller.connect(42).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Consistency
//!
//! No state is changed before the backend confirms an operation. A failed
//! call only records an error notice; the stores keep their previous
//! contents.
//!
//! # Thread Safety
//!
//! State lives behind `Arc<tokio::sync::RwLock<ChatState>>`. The lock is
//! never held across a remote call, so readers (a UI, the poller) are not
//! blocked by slow requests.

/// Shared types and data structures
pub mod shared;

/// Chat client: REST API, state container and controller
pub mod client;

//! # Background Contact Polling
//!
//! Keeps the contact list (unread counts, previews, incoming requests) and
//! the open conversation fresh while the user is idle.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn run(controller: std::sync::Arc<campus_chat::client::ChatController<campus_chat::client::HttpChatApi>>) {
//! use campus_chat::client::messaging::polling::ContactPoller;
//! use std::time::Duration;
//!
//! let poller = ContactPoller::start(controller, Duration::from_secs(15));
//! // ...
//! poller.stop().await;
//! # }
//! ```
//!
//! Polling pauses while the session is flagged expired and resumes on its own
//! once the controller is re-authenticated.

use super::controller::{ChatController, Outcome, SkipReason};
use crate::client::chat_api::ChatApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to the polling task
pub struct ContactPoller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ContactPoller {
    /// Spawn the polling loop on the current tokio runtime
    pub fn start<A: ChatApi>(controller: Arc<ChatController<A>>, interval: Duration) -> Self {
        let (shutdown, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut halted = false;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                controller.expire_notices().await;

                match controller.poll_once().await {
                    Ok(Outcome::Skipped(SkipReason::SessionExpired)) => {
                        if !halted {
                            tracing::warn!("[CHAT] Session expired, polling halted");
                            halted = true;
                        }
                    }
                    Ok(_) => {
                        if halted {
                            tracing::info!("[CHAT] Polling resumed");
                            halted = false;
                        }
                    }
                    Err(e) => tracing::warn!("[CHAT] Poll failed: {}", e),
                }
            }
            tracing::debug!("[CHAT] Poller stopped");
        });

        Self { shutdown, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the loop and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!("[CHAT] Poller task failed: {}", e);
        }
    }
}

//! Controller integration tests
//!
//! Request state machine, message operations, confirmation and session
//! handling, driven through the scripted `FakeChatApi`.

use crate::common::*;
use assert_matches::assert_matches;
use campus_chat::client::messaging::{ConfirmAction, ContactActions};
use campus_chat::client::{ChatError, Outcome, SkipReason};
use campus_chat::shared::messaging::{ContactStatus, DELETED_PLACEHOLDER};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Request state machine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_accept_incoming_request() {
    let controller = controller_with(vec![contact_json(7, "pending", false)]).await;
    controller.api().reply(Endpoint::Respond, json!({"success": true, "status": "accepted"}));

    let outcome = crate::assert_ok!(controller.accept(7).await);
    assert_eq!(outcome, Outcome::Applied);

    let state = controller.read().await;
    let contact = state.contact(7).expect("contact kept");
    assert_eq!(contact.status, ContactStatus::Accepted);

    let actions = ContactActions::for_contact(contact);
    assert!(!actions.can_accept);
    assert!(!actions.can_reject);
    assert!(actions.can_message);
    assert_eq!(state.notices.latest_success().unwrap().message, "Request accepted");

    let calls = controller.api().calls_to(Endpoint::Respond);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, Some(7));
    assert_eq!(calls[0].body, json!({"action": "accept"}));
}

#[tokio::test]
async fn test_reject_removes_contact_and_selection() {
    let controller = controller_with(vec![
        contact_json(7, "pending", false),
        contact_json(8, "accepted", false),
    ])
    .await;
    controller.select_contact(Some(7)).await.unwrap();
    assert_eq!(controller.read().await.selected_contact_id, Some(7));

    let outcome = controller.reject(7).await.unwrap();

    assert_eq!(outcome, Outcome::Applied);
    let state = controller.read().await;
    assert!(state.contact(7).is_none());
    assert!(state.contact(8).is_some());
    assert_eq!(state.selected_contact_id, None);
    assert_eq!(controller.api().calls_to(Endpoint::Respond)[0].body, json!({"action": "reject"}));
}

#[tokio::test]
async fn test_accept_refused_for_own_request() {
    let controller = controller_with(vec![contact_json(7, "request", true)]).await;

    let outcome = controller.accept(7).await.unwrap();

    assert_eq!(outcome, Outcome::Skipped(SkipReason::NotAllowed(ContactStatus::Pending)));
    assert!(controller.api().calls().is_empty());
}

#[tokio::test]
async fn test_connect_then_cancel_returns_to_not_connected() {
    let controller = controller();
    controller
        .api()
        .reply(Endpoint::ListDirectory, json!([directory_json(9, "Grace", "not_contact")]));
    controller.load_directory().await.unwrap();

    assert_eq!(controller.connect(9).await.unwrap(), Outcome::Applied);
    {
        let state = controller.read().await;
        let contact = state.contact(9).expect("outgoing request listed");
        assert_eq!(contact.status, ContactStatus::Pending);
        assert!(contact.initiated_by_me);
        assert_eq!(contact.name, "Grace");
        assert_eq!(state.directory_user(9).unwrap().contact_status, ContactStatus::Pending);
    }

    assert_eq!(controller.cancel(9).await.unwrap(), Outcome::Applied);

    let state = controller.read().await;
    assert!(state.contact(9).is_none());
    assert_eq!(state.relationship(9), (ContactStatus::NotContact, false));
    assert_eq!(
        controller.api().endpoints(),
        vec![Endpoint::ListDirectory, Endpoint::CreateContact, Endpoint::Respond]
    );
    assert_eq!(controller.api().calls_to(Endpoint::CreateContact)[0].body, json!({"contact_id": 9}));
}

#[tokio::test]
async fn test_connect_skipped_while_pending() {
    let controller = controller_with(vec![contact_json(5, "request", true)]).await;

    let outcome = controller.connect(5).await.unwrap();

    assert_eq!(outcome, Outcome::Skipped(SkipReason::NotAllowed(ContactStatus::Pending)));
    assert!(controller.api().calls().is_empty());
}

#[tokio::test]
async fn test_request_again_after_rejection() {
    let controller = controller_with(vec![contact_json(8, "rejected", true)]).await;

    assert_eq!(controller.request_again(8).await.unwrap(), Outcome::Applied);

    let state = controller.read().await;
    let contact = state.contact(8).unwrap();
    assert_eq!(contact.status, ContactStatus::Pending);
    assert!(contact.initiated_by_me);
}

#[tokio::test]
async fn test_failed_respond_leaves_state_untouched() {
    let controller = controller_with(vec![contact_json(7, "pending", false)]).await;
    controller.api().fail(
        Endpoint::Respond,
        ChatError::from_status(400, r#"{"error": "Request already handled"}"#),
    );

    let err = controller.accept(7).await.unwrap_err();
    assert_matches!(err, ChatError::Remote { status: 400, .. });

    let state = controller.read().await;
    let contact = state.contact(7).unwrap();
    assert_eq!(contact.status, ContactStatus::Pending);
    assert!(!contact.initiated_by_me);
    assert!(state.in_flight.is_idle());
    assert_eq!(state.notices.latest_error().unwrap().message, "Request already handled");
}

#[tokio::test]
async fn test_next_action_clears_previous_error() {
    let controller = controller_with(vec![
        contact_json(7, "pending", false),
        contact_json(8, "pending", false),
    ])
    .await;
    controller.api().fail(Endpoint::Respond, ChatError::Network { detail: "reset".into() });

    crate::assert_err!(controller.accept(7).await);
    assert!(controller.read().await.notices.latest_error().is_some());

    controller.accept(8).await.unwrap();
    assert!(controller.read().await.notices.latest_error().is_none());
}

#[tokio::test]
async fn test_in_flight_respond_is_not_duplicated() {
    let controller = controller_with(vec![contact_json(7, "pending", false)]).await;
    let gate = controller.api().hold_next(Endpoint::Respond);

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.accept(7).await })
    };
    controller.api().wait_for(Endpoint::Respond, 1).await;

    crate::assert_skipped!(controller.accept(7).await, SkipReason::InFlight);
    crate::assert_skipped!(controller.reject(7).await, SkipReason::InFlight);

    gate.add_permits(1);
    assert_eq!(first.await.unwrap().unwrap(), Outcome::Applied);
    assert_eq!(controller.api().calls_to(Endpoint::Respond).len(), 1);
    assert!(controller.read().await.in_flight.is_idle());
}

#[tokio::test]
async fn test_set_favorite() {
    let controller = controller_with(vec![contact_json(42, "accepted", false)]).await;

    assert_eq!(controller.set_favorite(42, true).await.unwrap(), Outcome::Applied);

    assert!(controller.read().await.contact(42).unwrap().is_favorite);
    assert_eq!(
        controller.api().calls_to(Endpoint::CreateContact)[0].body,
        json!({"contact_id": 42, "is_favorite": true})
    );
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_send_hello_to_accepted_contact() {
    let controller = controller_with(vec![contact_json(42, "accepted", false)]).await;
    controller.api().reply(Endpoint::ListMessages, json!([message_json(10, 42, ME, 10)]));
    controller.fetch_messages(42, 1).await.unwrap();

    let mut sent = message_json(11, ME, 42, 20);
    sent["message"] = json!("hello");
    controller.api().reply(Endpoint::SendMessage, sent);

    assert_eq!(controller.send_message(42, "  hello ").await.unwrap(), Outcome::Applied);

    let state = controller.read().await;
    assert_eq!(state.contact(42).unwrap().last_message.as_deref(), Some("hello"));
    let messages = state.messages_for(42);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, 11);
    assert_eq!(messages[0].message, "hello");
    assert_eq!(
        controller.api().calls_to(Endpoint::SendMessage)[0].body,
        json!({"receiver_id": 42, "message": "hello", "message_type": "text"})
    );
}

#[tokio::test]
async fn test_messaging_requires_accepted_contact() {
    let controller = controller_with(vec![
        contact_json(5, "request", true),
        contact_json(6, "pending", false),
        contact_json(7, "rejected", true),
        contact_json(8, "not_contact", false),
    ])
    .await;

    for id in [5, 6, 7, 8] {
        crate::assert_skipped!(controller.send_message(id, "hi").await, SkipReason::NotAccepted);
        crate::assert_skipped!(controller.fetch_messages(id, 1).await, SkipReason::NotAccepted);
        crate::assert_skipped!(controller.mark_as_read(id).await, SkipReason::NotAccepted);
    }
    crate::assert_skipped!(controller.send_message(99, "hi").await, SkipReason::UnknownContact);
    assert!(controller.api().calls().is_empty());
}

#[tokio::test]
async fn test_blank_message_is_rejected_locally() {
    let controller = controller_with(vec![contact_json(42, "accepted", false)]).await;

    let err = controller.send_message(42, "   ").await.unwrap_err();

    assert_matches!(err, ChatError::Validation { .. });
    assert!(controller.api().calls().is_empty());
    let state = controller.read().await;
    crate::assert_contains!(state.notices.latest_error().unwrap().message, "cannot be empty");
}

async fn controller_with_thread() -> Arc<campus_chat::client::ChatController<FakeChatApi>> {
    let controller = controller_with(vec![contact_json(42, "accepted", false)]).await;
    controller.api().reply(
        Endpoint::ListMessages,
        json!([message_json(11, ME, 42, 20), message_json(10, 42, ME, 10)]),
    );
    controller.fetch_messages(42, 1).await.unwrap();
    controller.api().clear_calls();
    controller
}

#[tokio::test]
async fn test_edit_own_message_in_place() {
    let controller = controller_with_thread().await;
    let mut edited = message_json(11, ME, 42, 20);
    edited["message"] = json!("fixed");
    edited["is_edited"] = json!(true);
    controller.api().reply(Endpoint::EditMessage, edited);

    assert_eq!(controller.edit_message(11, "fixed").await.unwrap(), Outcome::Applied);

    let state = controller.read().await;
    let messages = state.messages_for(42);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, 11);
    assert_eq!(messages[0].sender_id, ME);
    assert_eq!(messages[0].message, "fixed");
    assert!(messages[0].is_edited);
    assert!(messages[0].edited_at.is_some());
    assert_eq!(messages[1].id, 10);
    assert_eq!(state.contact(42).unwrap().last_message.as_deref(), Some("fixed"));
    assert_eq!(controller.api().calls_to(Endpoint::EditMessage)[0].body, json!({"message": "fixed"}));
}

#[tokio::test]
async fn test_edit_someone_elses_message_is_skipped() {
    let controller = controller_with_thread().await;

    crate::assert_skipped!(controller.edit_message(10, "mine now").await, SkipReason::NotOwner);
    assert!(controller.api().calls().is_empty());
}

#[tokio::test]
async fn test_delete_after_confirmation_keeps_length() {
    let controller = controller_with_thread().await;

    controller.request_confirmation(ConfirmAction::DeleteMessage(10)).await;
    assert!(controller.api().calls().is_empty());
    assert_eq!(
        controller.read().await.pending_confirmation,
        Some(ConfirmAction::DeleteMessage(10))
    );

    assert_eq!(controller.confirm().await.unwrap(), Outcome::Applied);

    let state = controller.read().await;
    let messages = state.messages_for(42);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].id, 10);
    assert!(messages[1].is_deleted);
    assert_eq!(messages[1].message, DELETED_PLACEHOLDER);
    assert_eq!(state.pending_confirmation, None);
}

#[tokio::test]
async fn test_dismissed_confirmation_sends_nothing() {
    let controller = controller_with_thread().await;

    controller.request_confirmation(ConfirmAction::DeleteMessage(10)).await;
    controller.dismiss_confirmation().await;

    assert_eq!(
        controller.confirm().await.unwrap(),
        Outcome::Skipped(SkipReason::NothingToConfirm)
    );
    assert!(controller.api().calls().is_empty());
}

#[tokio::test]
async fn test_remove_contact_after_confirmation() {
    let controller = controller_with_thread().await;
    controller.select_contact(Some(42)).await.unwrap();

    controller.request_confirmation(ConfirmAction::RemoveContact(42)).await;
    assert_eq!(controller.confirm().await.unwrap(), Outcome::Applied);

    let state = controller.read().await;
    assert_eq!(state.contact(42).unwrap().status, ContactStatus::NotContact);
    assert!(state.messages_for(42).is_empty());
    assert_eq!(state.selected_contact_id, None);
    assert_eq!(state.notices.latest_success().unwrap().message, "Contact removed");
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unauthorized_halts_polling_until_reauthenticated() {
    let controller = controller_with(vec![contact_json(42, "accepted", false)]).await;
    controller.api().fail(Endpoint::ListContacts, ChatError::Unauthorized);

    crate::assert_err!(controller.poll_once().await, ChatError::Unauthorized);
    assert!(controller.read().await.session_expired);

    assert_eq!(
        controller.poll_once().await.unwrap(),
        Outcome::Skipped(SkipReason::SessionExpired)
    );
    assert_eq!(controller.api().calls_to(Endpoint::ListContacts).len(), 1);

    controller.reauthenticate("fresh-cookie".to_string(), None).await;
    assert_eq!(controller.api().session().as_deref(), Some("fresh-cookie"));
    assert!(!controller.read().await.session_expired);

    assert_eq!(controller.poll_once().await.unwrap(), Outcome::Applied);
    assert_eq!(controller.api().calls_to(Endpoint::ListContacts).len(), 2);
}

#[tokio::test]
async fn test_logout_drops_late_results() {
    let controller = controller_with(vec![contact_json(42, "accepted", false)]).await;
    controller.api().reply(Endpoint::SendMessage, message_json(11, ME, 42, 20));
    let gate = controller.api().hold_next(Endpoint::SendMessage);

    let send = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.send_message(42, "late").await })
    };
    controller.api().wait_for(Endpoint::SendMessage, 1).await;

    controller.logout().await;
    gate.add_permits(1);

    assert_eq!(send.await.unwrap().unwrap(), Outcome::Skipped(SkipReason::Stale));
    let state = controller.read().await;
    assert!(state.contacts.is_empty());
    assert!(state.messages_for(42).is_empty());
    assert_eq!(state.current_user_id, None);
    assert_eq!(controller.api().session(), None);
}

#[tokio::test]
async fn test_contact_list_older_than_local_transition_is_discarded() {
    let controller = controller_with(vec![]).await;
    controller.api().reply(Endpoint::ListContacts, json!([]));
    let gate = controller.api().hold_next(Endpoint::ListContacts);

    let load = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.load_contacts(&Default::default()).await })
    };
    controller.api().wait_for(Endpoint::ListContacts, 1).await;

    assert_eq!(controller.connect(9).await.unwrap(), Outcome::Applied);
    gate.add_permits(1);

    assert_eq!(load.await.unwrap().unwrap(), Outcome::Skipped(SkipReason::Stale));
    let state = controller.read().await;
    assert_eq!(state.contact(9).unwrap().status, ContactStatus::Pending);
    assert!(!state.is_loading_contacts());
}

#[tokio::test]
async fn test_contact_list_in_flight_during_send_keeps_preview() {
    let controller = controller_with(vec![contact_json(42, "accepted", false)]).await;
    controller.api().reply(Endpoint::ListContacts, json!([contact_json(42, "accepted", false)]));
    controller.api().reply(Endpoint::SendMessage, message_json(9, ME, 42, 90));
    let gate = controller.api().hold_next(Endpoint::ListContacts);

    let load = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.load_contacts(&Default::default()).await })
    };
    controller.api().wait_for(Endpoint::ListContacts, 1).await;

    assert_eq!(controller.send_message(42, "message 9").await.unwrap(), Outcome::Applied);
    gate.add_permits(1);

    assert_eq!(load.await.unwrap().unwrap(), Outcome::Skipped(SkipReason::Stale));
    let state = controller.read().await;
    assert_eq!(state.messages_for(42)[0].id, 9);
    assert_eq!(state.contact(42).unwrap().last_message.as_deref(), Some("message 9"));
}

#[tokio::test]
async fn test_send_result_dropped_after_contact_removed() {
    let controller = controller_with(vec![contact_json(42, "accepted", false)]).await;
    controller.api().reply(Endpoint::SendMessage, message_json(9, ME, 42, 90));
    let gate = controller.api().hold_next(Endpoint::SendMessage);

    let send = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.send_message(42, "message 9").await })
    };
    controller.api().wait_for(Endpoint::SendMessage, 1).await;

    controller.request_confirmation(ConfirmAction::RemoveContact(42)).await;
    assert_eq!(controller.confirm().await.unwrap(), Outcome::Applied);
    gate.add_permits(1);

    assert_eq!(send.await.unwrap().unwrap(), Outcome::Skipped(SkipReason::Stale));
    let state = controller.read().await;
    assert_eq!(state.contact(42).unwrap().status, ContactStatus::NotContact);
    assert!(!state.threads.contains_key(&42));
}

#[tokio::test]
async fn test_spinner_stays_on_while_any_contact_load_runs() {
    let controller = controller_with(vec![]).await;
    let query = Default::default();
    let gate = controller.api().hold_next(Endpoint::ListContacts);

    let mut first = tokio_test::task::spawn(controller.load_contacts(&query));
    tokio_test::assert_pending!(first.poll());
    assert!(controller.read().await.is_loading_contacts());

    crate::assert_ok!(controller.load_contacts(&query).await);
    assert!(controller.read().await.is_loading_contacts());

    gate.add_permits(1);
    assert!(first.is_woken());
    crate::assert_ok!(tokio_test::assert_ready!(first.poll()));
    assert!(!controller.read().await.is_loading_contacts());
}

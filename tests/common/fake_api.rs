//! Scripted in-memory `ChatApi`
//!
//! Each endpoint has a queue of JSON responses (or errors) in the backend's
//! wire shape. Unscripted list
//! calls answer with an empty list; unscripted sends and edits fail. A call can
//! be held in flight until the test releases it.

use campus_chat::client::{ChatApi, ChatError};
use campus_chat::shared::messaging::{
    ChatMessage, ConnectRequest, Contact, ContactQuery, DeleteMessageResponse, DirectoryUser,
    EditMessageRequest, MessageId, RawContact, RawDirectoryUser, RespondAction, RespondResponse,
    SendMessageRequest, UserId,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListContacts,
    ListMessages,
    SendMessage,
    EditMessage,
    DeleteMessage,
    MarkRead,
    CreateContact,
    Respond,
    RemoveContact,
    ListDirectory,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub endpoint: Endpoint,
    pub target: Option<i64>,
    pub body: Value,
}

#[derive(Default)]
pub struct FakeChatApi {
    responses: Mutex<HashMap<Endpoint, VecDeque<Result<Value, ChatError>>>>,
    calls: Mutex<Vec<Call>>,
    hold: Mutex<Option<(Endpoint, Arc<Semaphore>)>>,
    session: Mutex<Option<String>>,
}

impl FakeChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful JSON answer for the next call to `endpoint`
    pub fn reply(&self, endpoint: Endpoint, value: Value) {
        self.push(endpoint, Ok(value));
    }

    /// Queue a failure for the next call to `endpoint`
    pub fn fail(&self, endpoint: Endpoint, error: ChatError) {
        self.push(endpoint, Err(error));
    }

    fn push(&self, endpoint: Endpoint, response: Result<Value, ChatError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(response);
    }

    /// Hold the next call to `endpoint` until the returned gate gets a permit
    pub fn hold_next(&self, endpoint: Endpoint) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.hold.lock().unwrap() = Some((endpoint, Arc::clone(&gate)));
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.calls().into_iter().map(|c| c.endpoint).collect()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.endpoint == endpoint).collect()
    }

    /// Yield until `endpoint` has been called `count` times
    pub async fn wait_for(&self, endpoint: Endpoint, count: usize) {
        for _ in 0..1_000 {
            if self.calls_to(endpoint).len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("{:?} was not called {} times", endpoint, count);
    }

    pub fn session(&self) -> Option<String> {
        self.session.lock().unwrap().clone()
    }

    fn default_for(endpoint: Endpoint) -> Result<Value, ChatError> {
        match endpoint {
            Endpoint::ListContacts | Endpoint::ListMessages | Endpoint::ListDirectory => Ok(json!([])),
            Endpoint::MarkRead | Endpoint::RemoveContact | Endpoint::CreateContact => Ok(Value::Null),
            Endpoint::Respond | Endpoint::DeleteMessage => Ok(json!({})),
            Endpoint::SendMessage | Endpoint::EditMessage => Err(ChatError::Remote {
                status: 500,
                message: "unscripted call".to_string(),
            }),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        target: Option<i64>,
        body: Value,
    ) -> Result<T, ChatError> {
        self.calls.lock().unwrap().push(Call { endpoint, target, body });

        let gate = {
            let mut hold = self.hold.lock().unwrap();
            match hold.take() {
                Some((held, gate)) if held == endpoint => Some(gate),
                other => {
                    *hold = other;
                    None
                }
            }
        };
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&endpoint)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Self::default_for(endpoint));

        let value = response?;
        Ok(serde_json::from_value(value).expect("scripted response has the wrong shape"))
    }
}

impl ChatApi for FakeChatApi {
    fn set_session(&self, cookie: Option<String>) {
        *self.session.lock().unwrap() = cookie;
    }

    async fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<Contact>, ChatError> {
        let rows: Vec<RawContact> = self
            .call(Endpoint::ListContacts, None, serde_json::to_value(query).unwrap())
            .await?;
        Ok(rows.into_iter().filter_map(|raw| Contact::from_raw(raw).ok()).collect())
    }

    async fn list_messages(
        &self,
        contact_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.call(
            Endpoint::ListMessages,
            Some(contact_id),
            json!({"limit": limit, "offset": offset}),
        )
        .await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<ChatMessage, ChatError> {
        self.call(
            Endpoint::SendMessage,
            Some(request.receiver_id),
            serde_json::to_value(request).unwrap(),
        )
        .await
    }

    async fn edit_message(
        &self,
        message_id: MessageId,
        request: &EditMessageRequest,
    ) -> Result<ChatMessage, ChatError> {
        self.call(
            Endpoint::EditMessage,
            Some(message_id),
            serde_json::to_value(request).unwrap(),
        )
        .await
    }

    async fn delete_message(&self, message_id: MessageId) -> Result<DeleteMessageResponse, ChatError> {
        self.call(Endpoint::DeleteMessage, Some(message_id), Value::Null).await
    }

    async fn mark_read(&self, contact_id: UserId) -> Result<(), ChatError> {
        self.call(Endpoint::MarkRead, Some(contact_id), Value::Null).await
    }

    async fn create_contact(&self, request: &ConnectRequest) -> Result<Option<Contact>, ChatError> {
        let echoed: Option<RawContact> = self
            .call(
                Endpoint::CreateContact,
                Some(request.contact_id),
                serde_json::to_value(request).unwrap(),
            )
            .await?;
        Ok(echoed.and_then(|raw| Contact::from_raw(raw).ok()))
    }

    async fn respond(
        &self,
        contact_id: UserId,
        action: RespondAction,
    ) -> Result<RespondResponse, ChatError> {
        self.call(Endpoint::Respond, Some(contact_id), json!({"action": action.as_str()}))
            .await
    }

    async fn remove_contact(&self, contact_id: UserId) -> Result<(), ChatError> {
        self.call(Endpoint::RemoveContact, Some(contact_id), Value::Null).await
    }

    async fn list_directory(&self) -> Result<Vec<DirectoryUser>, ChatError> {
        let rows: Vec<RawDirectoryUser> = self.call(Endpoint::ListDirectory, None, Value::Null).await?;
        Ok(rows
            .into_iter()
            .filter_map(|raw| DirectoryUser::from_raw(raw).ok())
            .collect())
    }
}

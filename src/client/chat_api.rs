//! Chat API Client
//!
//! [`ChatApi`] is the seam between the state container and the REST backend:
//! one async method per chat endpoint. [`HttpChatApi`] is the production
//! implementation over `reqwest`; tests substitute a scripted fake.

use crate::client::config::Config;
use crate::client::error::ChatError;
use crate::shared::messaging::{
    ChatMessage, ConnectRequest, Contact, ContactQuery, DeleteMessageResponse, DirectoryUser,
    EditMessageRequest, MessageId, RawContact, RawDirectoryUser, RespondAction, RespondRequest,
    RespondResponse, SendMessageRequest, UserId,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::sync::Mutex;

/// Remote operations consumed by the chat client
pub trait ChatApi: Send + Sync + 'static {
    /// Replace the session cookie used for subsequent calls
    fn set_session(&self, cookie: Option<String>);

    fn list_contacts(
        &self,
        query: &ContactQuery,
    ) -> impl Future<Output = Result<Vec<Contact>, ChatError>> + Send;

    fn list_messages(
        &self,
        contact_id: UserId,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, ChatError>> + Send;

    fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> impl Future<Output = Result<ChatMessage, ChatError>> + Send;

    fn edit_message(
        &self,
        message_id: MessageId,
        request: &EditMessageRequest,
    ) -> impl Future<Output = Result<ChatMessage, ChatError>> + Send;

    fn delete_message(
        &self,
        message_id: MessageId,
    ) -> impl Future<Output = Result<DeleteMessageResponse, ChatError>> + Send;

    fn mark_read(&self, contact_id: UserId) -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Create (or update) a contact row. Returns the contact if the backend echoed one.
    fn create_contact(
        &self,
        request: &ConnectRequest,
    ) -> impl Future<Output = Result<Option<Contact>, ChatError>> + Send;

    fn respond(
        &self,
        contact_id: UserId,
        action: RespondAction,
    ) -> impl Future<Output = Result<RespondResponse, ChatError>> + Send;

    fn remove_contact(
        &self,
        contact_id: UserId,
    ) -> impl Future<Output = Result<(), ChatError>> + Send;

    fn list_directory(&self) -> impl Future<Output = Result<Vec<DirectoryUser>, ChatError>> + Send;
}

/// List endpoints answer with a bare array or an object wrapping one
#[derive(Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "contacts", alias = "messages", alias = "users")]
        data: Vec<T>,
    },
}

impl<T> ListEnvelope<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Wrapped { data } => data,
        }
    }
}

/// Normalize raw contacts, dropping rows that cannot be identified
fn normalize_contacts(raw: Vec<RawContact>) -> Vec<Contact> {
    raw.into_iter()
        .filter_map(|row| match Contact::from_raw(row) {
            Ok(contact) => Some(contact),
            Err(e) => {
                tracing::warn!("[CHAT] Dropping malformed contact row: {}", e);
                None
            }
        })
        .collect()
}

/// Pull a contact out of a create-contact answer (`{contact: {..}}` or bare)
fn contact_from_value(value: serde_json::Value) -> Option<Contact> {
    let inner = match value.get("contact") {
        Some(contact) => contact.clone(),
        None => value,
    };
    let raw: RawContact = serde_json::from_value(inner).ok()?;
    Contact::from_raw(raw).ok()
}

/// reqwest-backed implementation of [`ChatApi`]
pub struct HttpChatApi {
    config: Config,
    client: Client,
    session: Mutex<Option<String>>,
}

impl HttpChatApi {
    pub fn new(config: Config) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(config.app().request_timeout())
            .build()
            .map_err(|e| ChatError::Network { detail: e.to_string() })?;
        let session = Mutex::new(config.session_cookie().map(str::to_string));
        Ok(Self { config, client, session })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let cookie = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        match cookie {
            Some(value) => builder.header(
                reqwest::header::COOKIE,
                format!("{}={}", crate::client::config::SESSION_COOKIE_NAME, value),
            ),
            None => builder,
        }
    }

    /// Send a request and return the body of a successful answer
    async fn execute(&self, builder: RequestBuilder) -> Result<String, ChatError> {
        let response = self
            .authorized(builder)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ChatError::Network { detail: e.to_string() })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Network { detail: e.to_string() })?;

        if !status.is_success() {
            tracing::warn!("[CHAT] Request failed: {} - {}", status, body);
            return Err(ChatError::from_status(status.as_u16(), &body));
        }
        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ChatError> {
        let body = self.execute(builder).await?;
        serde_json::from_str(&body).map_err(|e| ChatError::Decode(e.to_string()))
    }
}

impl ChatApi for HttpChatApi {
    fn set_session(&self, cookie: Option<String>) {
        *self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = cookie;
    }

    async fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<Contact>, ChatError> {
        let url = self.config.api_url("/chat/contacts");
        let envelope: ListEnvelope<RawContact> =
            self.execute_json(self.client.get(&url).query(query)).await?;
        Ok(normalize_contacts(envelope.into_vec()))
    }

    async fn list_messages(
        &self,
        contact_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let url = self.config.api_url(&format!("/chat/messages/{}", contact_id));
        let envelope: ListEnvelope<ChatMessage> = self
            .execute_json(
                self.client
                    .get(&url)
                    .query(&[("limit", limit), ("offset", offset)]),
            )
            .await?;
        Ok(envelope.into_vec())
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<ChatMessage, ChatError> {
        let url = self.config.api_url("/chat/messages");
        self.execute_json(self.client.post(&url).json(request)).await
    }

    async fn edit_message(
        &self,
        message_id: MessageId,
        request: &EditMessageRequest,
    ) -> Result<ChatMessage, ChatError> {
        let url = self.config.api_url(&format!("/chat/messages/{}", message_id));
        self.execute_json(self.client.put(&url).json(request)).await
    }

    async fn delete_message(&self, message_id: MessageId) -> Result<DeleteMessageResponse, ChatError> {
        let url = self.config.api_url(&format!("/chat/messages/{}", message_id));
        let body = self.execute(self.client.delete(&url)).await?;
        if body.trim().is_empty() {
            return Ok(DeleteMessageResponse::default());
        }
        serde_json::from_str(&body).map_err(|e| ChatError::Decode(e.to_string()))
    }

    async fn mark_read(&self, contact_id: UserId) -> Result<(), ChatError> {
        let url = self.config.api_url(&format!("/chat/messages/read/{}", contact_id));
        self.execute(self.client.put(&url)).await.map(|_| ())
    }

    async fn create_contact(&self, request: &ConnectRequest) -> Result<Option<Contact>, ChatError> {
        let url = self.config.api_url("/chat/contacts");
        let body = self.execute(self.client.post(&url).json(request)).await?;
        Ok(serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(contact_from_value))
    }

    async fn respond(
        &self,
        contact_id: UserId,
        action: RespondAction,
    ) -> Result<RespondResponse, ChatError> {
        let url = self
            .config
            .api_url(&format!("/chat/contacts/{}/respond", contact_id));
        let body = self
            .execute(self.client.post(&url).json(&RespondRequest { action }))
            .await?;
        if body.trim().is_empty() {
            return Ok(RespondResponse::default());
        }
        serde_json::from_str(&body).map_err(|e| ChatError::Decode(e.to_string()))
    }

    async fn remove_contact(&self, contact_id: UserId) -> Result<(), ChatError> {
        let url = self.config.api_url(&format!("/chat/contacts/{}", contact_id));
        self.execute(self.client.delete(&url)).await.map(|_| ())
    }

    async fn list_directory(&self) -> Result<Vec<DirectoryUser>, ChatError> {
        let url = self.config.api_url("/chat/users/all");
        let envelope: ListEnvelope<RawDirectoryUser> =
            self.execute_json(self.client.get(&url)).await?;
        Ok(envelope
            .into_vec()
            .into_iter()
            .filter_map(|raw| DirectoryUser::from_raw(raw).ok())
            .collect())
    }
}

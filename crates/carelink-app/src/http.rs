//! REST collaborator over reqwest.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use carelink_client::{
    ApiError, ChatMessage, MessageApi, MessageId, MessagePage, OutgoingMessage, TokenProvider,
};
use reqwest::multipart;
use serde::Deserialize;

/// Paginated list shape returned by the messages endpoint.
#[derive(Debug, Deserialize)]
struct Paginated<T> {
    next: Option<String>,
    results: Vec<T>,
}

/// [`MessageApi`] implementation against the clinic REST API.
///
/// Endpoints:
/// - `GET  {base}/consultations/{id}/messages/?page=n` (newest first)
/// - `POST {base}/consultations/{id}/messages/` (multipart, optional file)
/// - `PATCH/DELETE {base}/consultations/{id}/messages/{message_id}/`
/// - `GET  {base}/messages/{message_id}/attachment/` (binary blob)
pub struct HttpMessageApi {
    http: reqwest::Client,
    base: String,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for HttpMessageApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMessageApi").field("base", &self.base).finish()
    }
}

impl HttpMessageApi {
    /// Create a client rooted at the REST base URL.
    pub fn new(base: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        let base: String = base.into();
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    async fn bearer(&self) -> Result<String, ApiError> {
        self.tokens.access_token().await.ok_or(ApiError::Unauthorized)
    }

    fn messages_url(&self, conversation_id: i64) -> String {
        format!("{}/consultations/{conversation_id}/messages/", self.base)
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status { status: response.status().as_u16() })
    }
}

fn network(error: reqwest::Error) -> ApiError {
    ApiError::Network(error.to_string())
}

#[async_trait]
impl MessageApi for HttpMessageApi {
    async fn fetch_page(&self, conversation_id: i64, page: u32) -> Result<MessagePage, ApiError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.messages_url(conversation_id))
            .query(&[("page", page)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(network)?;
        let body: Paginated<ChatMessage> = check_status(response)?
            .json()
            .await
            .map_err(|error| ApiError::Decode(error.to_string()))?;
        Ok(MessagePage { messages: body.results, has_more: body.next.is_some() })
    }

    async fn send_message(
        &self,
        conversation_id: i64,
        draft: OutgoingMessage,
    ) -> Result<ChatMessage, ApiError> {
        let token = self.bearer().await?;
        let mut form = multipart::Form::new().text("message", draft.content);
        if let Some(upload) = draft.attachment {
            let part = multipart::Part::stream(upload.bytes)
                .file_name(upload.file_name)
                .mime_str(&upload.content_type)
                .map_err(|error| ApiError::Request(error.to_string()))?;
            form = form.part("attachment", part);
        }
        let response = self
            .http
            .post(self.messages_url(conversation_id))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        check_status(response)?.json().await.map_err(|error| ApiError::Decode(error.to_string()))
    }

    async fn edit_message(
        &self,
        conversation_id: i64,
        id: MessageId,
        content: &str,
    ) -> Result<ChatMessage, ApiError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .patch(format!("{}{id}/", self.messages_url(conversation_id)))
            .bearer_auth(token)
            .json(&serde_json::json!({ "message": content }))
            .send()
            .await
            .map_err(network)?;
        check_status(response)?.json().await.map_err(|error| ApiError::Decode(error.to_string()))
    }

    async fn delete_message(&self, conversation_id: i64, id: MessageId) -> Result<(), ApiError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .delete(format!("{}{id}/", self.messages_url(conversation_id)))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network)?;
        check_status(response)?;
        Ok(())
    }

    async fn fetch_attachment(&self, message_id: MessageId) -> Result<Bytes, ApiError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(format!("{}/messages/{message_id}/attachment/", self.base))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network)?;
        check_status(response)?.bytes().await.map_err(network)
    }
}

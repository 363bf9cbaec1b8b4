//! `StudyBackend` implementation over the REST + streaming endpoints.

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

use sage_common::{ApiError, ChatSession, Goal, NotificationRecord, SessionId, StoredMessage};

use crate::{FragmentStream, StudyBackend};

use super::client::ApiClient;

impl ApiClient {
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .headers(self.auth_headers())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl StudyBackend for ApiClient {
    async fn list_sessions(&self) -> Result<Vec<ChatSession>, ApiError> {
        self.get_json("/chat/sessions").await
    }

    async fn create_session(&self, title: &str) -> Result<ChatSession, ApiError> {
        let response = self
            .http
            .post(self.url("/chat/sessions"))
            .headers(self.auth_headers())
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn rename_session(&self, id: SessionId, title: &str) -> Result<ChatSession, ApiError> {
        let response = self
            .http
            .patch(self.url(&format!("/chat/sessions/{id}")))
            .headers(self.auth_headers())
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/chat/sessions/{id}")))
            .headers(self.auth_headers())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn history(&self, id: SessionId) -> Result<Vec<StoredMessage>, ApiError> {
        self.get_json(&format!("/chat/history/{id}")).await
    }

    async fn list_goals(&self) -> Result<Vec<Goal>, ApiError> {
        self.get_json("/goals/").await
    }

    async fn list_notifications(&self) -> Result<Vec<NotificationRecord>, ApiError> {
        self.get_json("/notifications/").await
    }

    async fn mark_notification_read(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .http
            .patch(self.url(&format!("/notifications/{id}/read")))
            .headers(self.auth_headers())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete_notification(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/notifications/{id}")))
            .headers(self.auth_headers())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn send_message(
        &self,
        session: SessionId,
        message: &str,
    ) -> Result<FragmentStream, ApiError> {
        debug!(session = %session, "opening chat stream");

        let response = self
            .http
            .post(self.url("/chat/message"))
            .headers(self.auth_headers())
            .json(&serde_json::json!({ "message": message, "session_id": session }))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let fragments = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| ApiError::Network(e.to_string()))
            })
            .boxed();
        Ok(fragments)
    }
}

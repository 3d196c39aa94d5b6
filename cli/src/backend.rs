use pitchside_core::backend::{BackendError, ProfileBackend};
use pitchside_core::error::ApiError;
use pitchside_core::profile::{Connection, Message, NewProfileRequest, Profile, UserProfile};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::util::client;

/// [`ProfileBackend`] over the Pitchside REST API.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(api_url: &str, token: Option<String>) -> Self {
        Self {
            client: client(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, format!("{}{path}", self.api_url));
        if let Some(t) = &self.token {
            req = req.header("Authorization", format!("Bearer {t}"));
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(error = %e, "request to Pitchside API failed");
            BackendError::Network(e.to_string())
        })?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        // Error bodies are best effort; a proxy may answer with HTML.
        let body = resp.json::<ApiError>().await.ok();
        tracing::warn!(status = status.as_u16(), error = ?body.as_ref().map(|b| &b.error), "Pitchside API rejected request");
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        self.send(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl ProfileBackend for HttpBackend {
    async fn create_profile(&self, request: &NewProfileRequest) -> Result<Profile, BackendError> {
        self.send_json(self.request(reqwest::Method::POST, "/v1/profiles").json(request))
            .await
    }

    async fn fetch_user_profile(&self) -> Result<UserProfile, BackendError> {
        self.send_json(self.request(reqwest::Method::GET, "/v1/me/profile"))
            .await
    }

    async fn update_user_profile(
        &self,
        profile: &UserProfile,
    ) -> Result<Option<UserProfile>, BackendError> {
        let resp = self
            .send(self.request(reqwest::Method::PUT, "/v1/me/profile").json(profile))
            .await?;
        if resp.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        resp.json::<UserProfile>()
            .await
            .map(Some)
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn list_connections(&self) -> Result<Vec<Connection>, BackendError> {
        self.send_json(self.request(reqwest::Method::GET, "/v1/connections"))
            .await
    }

    async fn add_connection(&self, user_id: Uuid) -> Result<Connection, BackendError> {
        self.send_json(
            self.request(reqwest::Method::POST, "/v1/connections")
                .json(&json!({ "user_id": user_id })),
        )
        .await
    }

    async fn remove_connection(&self, connection_id: Uuid) -> Result<(), BackendError> {
        let path = format!("/v1/connections/{connection_id}");
        self.send(self.request(reqwest::Method::DELETE, &path))
            .await
            .map(|_| ())
    }

    async fn list_messages(&self, with_user: Uuid) -> Result<Vec<Message>, BackendError> {
        self.send_json(
            self.request(reqwest::Method::GET, "/v1/messages")
                .query(&[("with", with_user.to_string())]),
        )
        .await
    }

    async fn send_message(&self, recipient_id: Uuid, body: &str) -> Result<Message, BackendError> {
        self.send_json(
            self.request(reqwest::Method::POST, "/v1/messages")
                .json(&json!({ "recipient_id": recipient_id, "body": body })),
        )
        .await
    }
}

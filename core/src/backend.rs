use std::future::Future;

use uuid::Uuid;

use crate::error::ApiError;
use crate::profile::{Connection, Message, NewProfileRequest, Profile, UserProfile};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("could not reach the Pitchside API: {0}")]
    Network(String),
    #[error("Pitchside API returned {status}: {}", .body.as_ref().map(|b| b.message.as_str()).unwrap_or("no details"))]
    Status { status: u16, body: Option<ApiError> },
    #[error("unexpected response from the Pitchside API: {0}")]
    Decode(String),
}

impl BackendError {
    /// Text suitable for a toast body.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Network(_) => {
                "Check your connection and try again.".to_string()
            }
            BackendError::Status {
                body: Some(body), ..
            } => body.message.clone(),
            BackendError::Status { status, .. } if *status >= 500 => {
                "The server had a problem. Please try again.".to_string()
            }
            BackendError::Status { .. } => "The request was rejected.".to_string(),
            BackendError::Decode(_) => "The server sent an unexpected response.".to_string(),
        }
    }

    /// Field the backend blamed, for inline display next to the control.
    pub fn field(&self) -> Option<&str> {
        match self {
            BackendError::Status {
                body: Some(body), ..
            } if body.is_validation() => body.field.as_deref(),
            _ => None,
        }
    }
}

/// The REST collaborator the engine talks to. Implemented over HTTP by the
/// CLI; tests use an in-memory fake.
pub trait ProfileBackend {
    fn create_profile(
        &self,
        request: &NewProfileRequest,
    ) -> impl Future<Output = Result<Profile, BackendError>> + Send;

    fn fetch_user_profile(&self) -> impl Future<Output = Result<UserProfile, BackendError>> + Send;

    /// `Ok(None)` means the update was accepted without an authoritative body.
    fn update_user_profile(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<Option<UserProfile>, BackendError>> + Send;

    fn list_connections(&self) -> impl Future<Output = Result<Vec<Connection>, BackendError>> + Send;

    fn add_connection(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Connection, BackendError>> + Send;

    fn remove_connection(
        &self,
        connection_id: Uuid,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn list_messages(
        &self,
        with_user: Uuid,
    ) -> impl Future<Output = Result<Vec<Message>, BackendError>> + Send;

    fn send_message(
        &self,
        recipient_id: Uuid,
        body: &str,
    ) -> impl Future<Output = Result<Message, BackendError>> + Send;
}

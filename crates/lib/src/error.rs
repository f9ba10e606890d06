//! Error taxonomy shared by the store, provider, orchestrator, and gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;

use crate::gateway::ErrorBody;

/// Every failure the relay can surface to an HTTP caller.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Request input violated a field rule (missing, empty, not an integer).
    #[error("{0}")]
    Validation(String),
    /// The provider could not decode or verify an inbound webhook.
    #[error("{0}")]
    MalformedPayload(String),
    /// The store failed; message is the storage layer's own text.
    #[error("{0}")]
    Persistence(String),
    /// A store call ran past the orchestrator's deadline.
    #[error("deadline exceeded after {}ms", .0.as_millis())]
    DeadlineExceeded(Duration),
    /// The provider failed to send an outbound message.
    #[error("{0}")]
    Delivery(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            // Decode failures stay server errors: the platform signs payloads upstream.
            RelayError::MalformedPayload(_)
            | RelayError::Persistence(_)
            | RelayError::DeadlineExceeded(_)
            | RelayError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for RelayError {
    fn from(e: sqlx::Error) -> Self {
        RelayError::Persistence(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for RelayError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        RelayError::Persistence(e.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

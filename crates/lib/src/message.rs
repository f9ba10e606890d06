//! Message entity and the validated input the store accepts.
//!
//! A [`NewMessage`] can only be built through [`NewMessage::new`], so an empty
//! `user_id` or `message` never reaches a store. Identity and timestamps are
//! assigned by the store when it turns a `NewMessage` into a [`Message`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// A persisted message as returned by the store and the read API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user_id: String,
    pub message: String,
}

/// Validated sender and text, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    user_id: String,
    message: String,
}

impl NewMessage {
    /// Validate and build. Both fields must be non-empty; content is kept verbatim.
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Result<Self, RelayError> {
        let user_id = user_id.into();
        let message = message.into();
        if user_id.is_empty() {
            return Err(RelayError::Validation("user_id must not be empty".to_string()));
        }
        if message.is_empty() {
            return Err(RelayError::Validation("message must not be empty".to_string()));
        }
        Ok(Self { user_id, message })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attach store-assigned identity and creation time.
    pub fn into_message(self, id: String, created_at: DateTime<Utc>) -> Message {
        Message {
            id,
            created_at,
            updated_at: None,
            user_id: self.user_id,
            message: self.message,
        }
    }
}

/// One page of a filtered query plus the count of every matching record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub messages: Vec<Message>,
    pub total_count: u64,
}

/// True when records remain past this page: `offset + limit < total_count`.
pub fn has_next(offset: u64, limit: u64, total_count: u64) -> bool {
    offset.saturating_add(limit) < total_count
}

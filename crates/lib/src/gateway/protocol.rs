//! Gateway HTTP wire types: list envelope, broadcast request, status and error bodies.

use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::message::{has_next, Message, Page};

pub const DEFAULT_OFFSET: u64 = 0;
pub const DEFAULT_LIMIT: u64 = 20;

/// `GET /messages` query: repeated `user_id`, optional `offset` and `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMessagesQuery {
    pub user_ids: Vec<String>,
    pub offset: u64,
    pub limit: u64,
}

impl Default for ListMessagesQuery {
    fn default() -> Self {
        Self {
            user_ids: Vec::new(),
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_count(name: &str, raw: &str) -> Result<u64, RelayError> {
    raw.trim().parse::<u64>().map_err(|_| {
        RelayError::Validation(format!(
            "{} must be a non-negative integer, got {:?}",
            name, raw
        ))
    })
}

impl ListMessagesQuery {
    /// Build from decoded query pairs. Unknown keys are ignored; the last
    /// `offset`/`limit` wins when repeated.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, RelayError> {
        let mut q = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "user_id" => {
                    if value.is_empty() {
                        return Err(RelayError::Validation(
                            "user_id must not be empty".to_string(),
                        ));
                    }
                    q.user_ids.push(value);
                }
                "offset" => q.offset = parse_count("offset", &value)?,
                "limit" => q.limit = parse_count("limit", &value)?,
                _ => {}
            }
        }
        Ok(q)
    }
}

/// `GET /messages` response envelope. `data` is always an array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub total_count: u64,
    pub offset: u64,
    pub limit: u64,
    pub has_next: bool,
    pub data: Vec<Message>,
}

impl ListMessagesResponse {
    pub fn new(offset: u64, limit: u64, page: Page) -> Self {
        Self {
            total_count: page.total_count,
            offset,
            limit,
            has_next: has_next(offset, limit, page.total_count),
            data: page.messages,
        }
    }
}

/// `POST /messages` body: `{ "message": string }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
}

impl SendMessageRequest {
    /// The text to broadcast; missing or empty is a validation error naming the field.
    pub fn into_text(self) -> Result<String, RelayError> {
        match self.message {
            Some(m) if !m.is_empty() => Ok(m),
            Some(_) => Err(RelayError::Validation("message must not be empty".to_string())),
            None => Err(RelayError::Validation("message is required".to_string())),
        }
    }
}

/// Success acknowledgment: `{ "status": "OK" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
        }
    }
}

/// Failure body: `{ "error": message }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

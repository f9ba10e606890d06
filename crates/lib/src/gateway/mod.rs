//! Gateway: HTTP surface over the message orchestrator.
//!
//! `GET /messages` pages stored messages, `POST /messages` broadcasts through
//! the provider, `POST /webhook` decodes and stores inbound provider events.
//! Failures are `{"error": ...}` bodies; see [`crate::error::RelayError`] for status mapping.

mod protocol;
mod server;

pub use protocol::{
    ErrorBody, ListMessagesQuery, ListMessagesResponse, SendMessageRequest, StatusBody,
    DEFAULT_LIMIT, DEFAULT_OFFSET,
};
pub use server::{router, run_gateway, GatewayState};

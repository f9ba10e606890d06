//! Provider trait: the boundary between the relay and a chat platform.

use async_trait::async_trait;

use crate::channels::inbound::InboundRequest;
use crate::error::RelayError;
use crate::message::NewMessage;

/// Decode inbound webhooks and broadcast outbound text for one platform.
#[async_trait]
pub trait MessageProvider: Send + Sync {
    /// Provider id (e.g. "line").
    fn id(&self) -> &str;

    /// Parse and verify a webhook. Only text message events produce a message;
    /// failures are [`RelayError::MalformedPayload`].
    fn decode_inbound(&self, req: &InboundRequest) -> Result<NewMessage, RelayError>;

    /// Send `text` to every subscriber of the channel. One attempt; failures
    /// are [`RelayError::Delivery`].
    async fn send_broadcast(&self, text: &str) -> Result<(), RelayError>;
}

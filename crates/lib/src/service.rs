//! Message orchestrator: composes the store and the provider for the gateway.
//!
//! Store calls run under a fixed per-call deadline derived from `context_timeout`.
//! When the deadline fires the store future is dropped, which abandons the
//! in-flight query, and [`RelayError::DeadlineExceeded`] is returned. Provider
//! calls are not wrapped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::channels::{InboundRequest, MessageProvider};
use crate::error::RelayError;
use crate::message::{Message, NewMessage, Page};
use crate::store::MessageStore;

/// Default per-call store deadline.
pub const DEFAULT_CONTEXT_TIMEOUT: Duration = Duration::from_secs(5);

/// Stateless between calls; clones share the same store and provider handles.
#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    provider: Arc<dyn MessageProvider>,
    context_timeout: Duration,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        provider: Arc<dyn MessageProvider>,
        context_timeout: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            context_timeout,
        }
    }

    pub fn context_timeout(&self) -> Duration {
        self.context_timeout
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    /// Persist a decoded message within the store deadline.
    pub async fn insert(&self, msg: NewMessage) -> Result<Message, RelayError> {
        self.bounded(self.store.insert(msg)).await
    }

    /// Decode a webhook through the provider.
    pub fn decode_inbound(&self, req: &InboundRequest) -> Result<NewMessage, RelayError> {
        self.provider.decode_inbound(req)
    }

    /// Broadcast `text` through the provider.
    pub async fn broadcast(&self, text: &str) -> Result<(), RelayError> {
        self.provider.send_broadcast(text).await
    }

    /// One page of messages for `user_ids` (empty = all) within the store deadline.
    pub async fn find_by_user(
        &self,
        offset: u64,
        limit: u64,
        user_ids: &[String],
    ) -> Result<Page, RelayError> {
        self.bounded(self.store.find_by_user(offset, limit, user_ids))
            .await
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, RelayError>>,
    ) -> Result<T, RelayError> {
        match tokio::time::timeout(self.context_timeout, call).await {
            Ok(res) => res,
            Err(_) => Err(RelayError::DeadlineExceeded(self.context_timeout)),
        }
    }
}

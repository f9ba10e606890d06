//! In-memory message store, used when no database is configured.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::MessageStore;
use crate::error::RelayError;
use crate::message::{Message, NewMessage, Page};

/// Messages held in insertion order behind a shared lock.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Vec<Message>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, msg: NewMessage) -> Result<Message, RelayError> {
        let stored = msg.into_message(uuid::Uuid::new_v4().to_string(), chrono::Utc::now());
        self.inner.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_user(
        &self,
        offset: u64,
        limit: u64,
        user_ids: &[String],
    ) -> Result<Page, RelayError> {
        let g = self.inner.read().await;
        let matches = |m: &&Message| user_ids.is_empty() || user_ids.iter().any(|u| *u == m.user_id);
        let total_count = g.iter().filter(matches).count() as u64;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let messages = g.iter().filter(matches).skip(skip).take(take).cloned().collect();
        Ok(Page {
            messages,
            total_count,
        })
    }
}

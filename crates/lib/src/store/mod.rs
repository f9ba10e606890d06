//! Message persistence.
//!
//! [`MessageStore`] is the seam the orchestrator talks to. [`MemoryStore`] keeps
//! records in process; [`SqliteStore`] persists them through a sqlx pool.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::message::{Message, NewMessage, Page};

/// Insert and paginated lookup over the single message collection.
///
/// Implementations assign `id` and `created_at`, keep insertion order stable,
/// and report failures as [`RelayError::Persistence`].
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message; returns it with store-assigned identity and timestamp.
    async fn insert(&self, msg: NewMessage) -> Result<Message, RelayError>;

    /// Up to `limit` messages starting at `offset`, in insertion order.
    /// Empty `user_ids` matches everything; otherwise any listed id matches.
    async fn find_by_user(
        &self,
        offset: u64,
        limit: u64,
        user_ids: &[String],
    ) -> Result<Page, RelayError>;
}

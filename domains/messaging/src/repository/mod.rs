//! Message store abstractions and implementations for the Messaging domain
//!
//! The store is the external collaborator holding messages; the change feed
//! delivers row-change notifications for it.

pub mod memory;
pub mod messages;
pub mod realtime;

use async_trait::async_trait;
use campusnest_common::{Pagination, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Message, NewMessage};

pub use memory::{InMemoryMessageStore, MemoryChangeFeed};
pub use messages::MessageRepository;
pub use realtime::{PgChangeFeed, REALTIME_CHANNEL};

/// Durable message storage with joined sender/receiver/property summaries
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Every message where the user is sender or receiver, newest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Message>>;

    /// Insert and return the created row in the same shape as `list_for_user`
    async fn insert(&self, message: &NewMessage) -> Result<Message>;

    /// Mark messages addressed to `receiver_id` as read, returning how many changed
    async fn mark_read(&self, receiver_id: Uuid, message_ids: &[Uuid]) -> Result<u64>;

    /// Inquiries about one listing, newest first
    async fn list_for_property(&self, property_id: Uuid, page: Pagination)
        -> Result<Vec<Message>>;

    /// Owner of a listing, `None` if it does not exist
    async fn property_landlord(&self, property_id: Uuid) -> Result<Option<Uuid>>;
}

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// Notification that a message row changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageChange {
    pub op: ChangeOp,
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
}

impl MessageChange {
    /// Whether either subscription channel of the viewer (as receiver, as sender) matches
    pub fn concerns(&self, viewer_id: Uuid) -> bool {
        self.receiver_id == viewer_id || self.sender_id == viewer_id
    }
}

/// Stream of message row changes
#[async_trait]
pub trait ChangeFeed: Send {
    /// Next change; `Ok(None)` once the feed is closed
    async fn next_change(&mut self) -> Result<Option<MessageChange>>;
}

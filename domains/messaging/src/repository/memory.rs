//! In-memory message store
//!
//! Used for local development (`MESSAGE_STORE=memory`) and tests. Summaries are
//! joined at read time exactly like the Postgres projection, so a message whose
//! profile was never registered comes back with a `None` summary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use campusnest_common::{Error, Pagination, Result};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{ChangeFeed, ChangeOp, MessageChange, MessageStore};
use crate::domain::entities::{Message, NewMessage, PropertySummary, UserSummary};

const CHANGE_CAPACITY: usize = 256;

/// Stored row without joined summaries
#[derive(Debug, Clone)]
struct StoredMessage {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    sender_id: Uuid,
    receiver_id: Uuid,
    property_id: Option<Uuid>,
    read: bool,
    phone_number: Option<String>,
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, UserSummary>,
    properties: HashMap<Uuid, (PropertySummary, Uuid)>,
    messages: Vec<StoredMessage>,
}

impl Tables {
    fn join(&self, row: &StoredMessage) -> Message {
        Message {
            id: row.id,
            content: row.content.clone(),
            created_at: row.created_at,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            property_id: row.property_id,
            read: row.read,
            phone_number: row.phone_number.clone(),
            property: row
                .property_id
                .and_then(|id| self.properties.get(&id))
                .map(|(summary, _)| summary.clone()),
            sender: self.profiles.get(&row.sender_id).cloned(),
            receiver: self.profiles.get(&row.receiver_id).cloned(),
        }
    }

    /// Newest first
    fn select<F>(&self, predicate: F) -> Vec<Message>
    where
        F: Fn(&StoredMessage) -> bool,
    {
        let mut rows: Vec<&StoredMessage> = self.messages.iter().filter(|m| predicate(m)).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().map(|row| self.join(row)).collect()
    }
}

pub struct InMemoryMessageStore {
    tables: RwLock<Tables>,
    changes: broadcast::Sender<MessageChange>,
    offline: AtomicBool,
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            tables: RwLock::new(Tables::default()),
            changes,
            offline: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("Message store is offline".to_string()));
        }
        Ok(())
    }

    fn publish(&self, op: ChangeOp, row: &StoredMessage) {
        // No subscribers is not an error
        let _ = self.changes.send(MessageChange {
            op,
            id: row.id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
        });
    }

    /// Simulate an unreachable backend: every call fails with `Error::Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn add_profile(&self, profile: UserSummary) {
        self.write().profiles.insert(profile.id, profile);
    }

    pub fn add_property(&self, property: PropertySummary, landlord_id: Uuid) {
        self.write()
            .properties
            .insert(property.id, (property, landlord_id));
    }

    /// Insert with an explicit timestamp, publishing an INSERT change
    pub fn insert_at(&self, message: &NewMessage, created_at: DateTime<Utc>) -> Message {
        let row = StoredMessage {
            id: Uuid::new_v4(),
            content: message.content.clone(),
            created_at,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            property_id: message.property_id,
            read: false,
            phone_number: message.phone_number.clone(),
        };
        let joined = {
            let mut tables = self.write();
            tables.messages.push(row.clone());
            tables.join(&row)
        };
        self.publish(ChangeOp::Insert, &row);
        joined
    }

    /// Remove a message, publishing a DELETE change
    pub fn delete(&self, message_id: Uuid) -> bool {
        let removed = {
            let mut tables = self.write();
            let position = tables.messages.iter().position(|m| m.id == message_id);
            position.map(|i| tables.messages.remove(i))
        };
        match removed {
            Some(row) => {
                self.publish(ChangeOp::Delete, &row);
                true
            }
            None => false,
        }
    }

    /// Subscribe to row changes made from now on
    pub fn feed(&self) -> MemoryChangeFeed {
        MemoryChangeFeed {
            receiver: self.changes.subscribe(),
        }
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Message>> {
        self.ensure_online()?;
        Ok(self
            .read()
            .select(|m| m.sender_id == user_id || m.receiver_id == user_id))
    }

    async fn insert(&self, message: &NewMessage) -> Result<Message> {
        self.ensure_online()?;
        Ok(self.insert_at(message, Utc::now()))
    }

    async fn mark_read(&self, receiver_id: Uuid, message_ids: &[Uuid]) -> Result<u64> {
        self.ensure_online()?;
        let changed: Vec<StoredMessage> = {
            let mut tables = self.write();
            tables
                .messages
                .iter_mut()
                .filter(|m| m.receiver_id == receiver_id && !m.read && message_ids.contains(&m.id))
                .map(|m| {
                    m.read = true;
                    m.clone()
                })
                .collect()
        };
        for row in &changed {
            self.publish(ChangeOp::Update, row);
        }
        Ok(changed.len() as u64)
    }

    async fn list_for_property(
        &self,
        property_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Message>> {
        self.ensure_online()?;
        let messages = self.read().select(|m| m.property_id == Some(property_id));
        Ok(page.window(messages))
    }

    async fn property_landlord(&self, property_id: Uuid) -> Result<Option<Uuid>> {
        self.ensure_online()?;
        Ok(self
            .read()
            .properties
            .get(&property_id)
            .map(|(_, landlord)| *landlord))
    }
}

/// Change feed over the in-memory store's broadcast channel
pub struct MemoryChangeFeed {
    receiver: broadcast::Receiver<MessageChange>,
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    async fn next_change(&mut self) -> Result<Option<MessageChange>> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Ok(Some(change)),
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // A full refresh covers whatever was skipped
                    tracing::warn!(skipped, "Change feed lagged");
                }
            }
        }
    }
}

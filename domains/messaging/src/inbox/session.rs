//! Inbox session
//!
//! One session backs one presentation (full inbox page or floating overlay).
//! It owns the viewer's message list and everything derived from it. The list
//! is only ever replaced wholesale and re-aggregated, never patched.
//!
//! Every replacement carries a sequence number taken from a monotonically
//! increasing counter. A replacement is applied only if its number is greater
//! than the last applied one, so a slow refresh that resolves after a newer
//! refresh or a local append is discarded instead of overwriting fresher data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use campusnest_common::{Error, Result};
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::aggregator::{aggregate, conversation_key, messages_in, unread_total};
use crate::domain::entities::{Conversation, ConversationKey, Message, NewMessage};
use crate::domain::state::{ComposerEvent, ComposerState, ComposerStateMachine};
use crate::repository::MessageStore;

/// Result of one refresh attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched list replaced the session state
    Applied { seq: u64, conversations: usize },
    /// A newer replacement was applied first; the response was discarded
    Stale { seq: u64 },
    /// The store call failed; the last good state is kept
    Failed { seq: u64 },
}

impl RefreshOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Applied { seq, .. } | Self::Stale { seq } | Self::Failed { seq } => *seq,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of a send attempt that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Stored and appended locally
    Sent(Message),
    /// Another send was already in flight
    Ignored,
}

/// Read-only view of a session for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboxSnapshot {
    pub conversations: Vec<Conversation>,
    pub active: Option<ConversationKey>,
    pub active_messages: Vec<Message>,
    pub draft: String,
    pub sending: bool,
    pub unread_total: usize,
}

#[derive(Debug, Default)]
struct SessionState {
    messages: Vec<Message>,
    conversations: Vec<Conversation>,
    active: Option<ConversationKey>,
    draft: String,
    composer: ComposerState,
    applied_seq: u64,
}

impl SessionState {
    /// Replace the message list and recompute everything derived from it
    fn replace(&mut self, messages: Vec<Message>, viewer_id: Uuid, seq: u64) {
        self.messages = messages;
        self.applied_seq = seq;
        self.conversations = aggregate(&self.messages, viewer_id);

        let still_present = self
            .active
            .is_some_and(|key| self.conversations.iter().any(|c| c.key == key));
        if !still_present {
            self.active = self.conversations.first().map(|c| c.key);
        }
    }

    fn transition(&mut self, event: ComposerEvent) -> Result<()> {
        self.composer = ComposerStateMachine::transition(self.composer, event)
            .map_err(|e| Error::Validation(e.to_string()))?;
        Ok(())
    }
}

pub struct InboxSession {
    viewer_id: Uuid,
    store: Arc<dyn MessageStore>,
    state: Mutex<SessionState>,
    next_seq: AtomicU64,
    version: watch::Sender<u64>,
}

impl InboxSession {
    /// Create an empty session; call `refresh` to load
    pub fn new(viewer_id: Uuid, store: Arc<dyn MessageStore>) -> Self {
        Self {
            viewer_id,
            store,
            state: Mutex::new(SessionState::default()),
            next_seq: AtomicU64::new(0),
            version: watch::Sender::new(0),
        }
    }

    pub fn viewer_id(&self) -> Uuid {
        self.viewer_id
    }

    /// Notified with a new version number whenever visible state changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn changed(&self) {
        self.version.send_modify(|version| *version += 1);
    }

    /// Re-fetch the viewer's messages and re-aggregate
    pub async fn refresh(&self) -> RefreshOutcome {
        let seq = self.claim_seq();

        let messages = match self.store.list_for_user(self.viewer_id).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    viewer_id = %self.viewer_id,
                    seq,
                    "Inbox refresh failed, keeping last good state"
                );
                return RefreshOutcome::Failed { seq };
            }
        };

        let conversations = {
            let mut state = self.lock();
            if seq <= state.applied_seq {
                tracing::debug!(seq, applied = state.applied_seq, "Discarding stale refresh");
                return RefreshOutcome::Stale { seq };
            }
            state.replace(messages, self.viewer_id, seq);
            state.conversations.len()
        };

        self.changed();
        RefreshOutcome::Applied { seq, conversations }
    }

    /// Make `key` the active conversation. Only keys currently listed are accepted.
    pub fn select(&self, key: ConversationKey) -> Result<()> {
        {
            let mut state = self.lock();
            if !state.conversations.iter().any(|c| c.key == key) {
                return Err(Error::NotFound(format!("Conversation {} not found", key)));
            }
            state.active = Some(key);
        }
        self.changed();
        Ok(())
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock().draft = text.into();
        self.changed();
    }

    /// Send the draft to the active conversation.
    ///
    /// On success the draft is cleared and the stored message is appended
    /// locally. On failure the draft is kept for a retry.
    pub async fn send(&self) -> Result<SendOutcome> {
        let message = {
            let mut state = self.lock();
            if state.composer.is_sending() {
                return Ok(SendOutcome::Ignored);
            }
            let key = state
                .active
                .ok_or_else(|| Error::Validation("No active conversation".to_string()))?;
            let message = NewMessage::new(
                self.viewer_id,
                key.counterpart_id(),
                key.property_id(),
                &state.draft,
                None,
            )?;
            state.transition(ComposerEvent::Submit)?;
            message
        };
        self.changed();

        self.deliver(message, true).await
    }

    /// First message to a landlord from a listing page. Does not need an
    /// existing conversation and leaves the draft alone. The new
    /// conversation becomes active.
    pub async fn start_inquiry(
        &self,
        property_id: Uuid,
        landlord_id: Uuid,
        content: &str,
        phone_number: Option<&str>,
    ) -> Result<SendOutcome> {
        let message = NewMessage::new(
            self.viewer_id,
            landlord_id,
            Some(property_id),
            content,
            phone_number,
        )?;
        {
            let mut state = self.lock();
            if state.composer.is_sending() {
                return Ok(SendOutcome::Ignored);
            }
            state.transition(ComposerEvent::Submit)?;
        }
        self.changed();

        let outcome = self.deliver(message, false).await?;
        if let SendOutcome::Sent(ref sent) = outcome {
            // No key if the landlord has no profile row
            match conversation_key(sent, self.viewer_id).map(|key| self.select(key)) {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    tracing::debug!(error = %e, landlord_id = %landlord_id, "Inquiry conversation not selected");
                }
                None => {
                    tracing::debug!(landlord_id = %landlord_id, "Inquiry receiver has no profile, conversation not listed");
                }
            }
        }
        Ok(outcome)
    }

    async fn deliver(&self, message: NewMessage, clear_draft: bool) -> Result<SendOutcome> {
        let result = self.store.insert(&message).await;

        let outcome = {
            let mut state = self.lock();
            match result {
                Ok(stored) => {
                    state.transition(ComposerEvent::Succeed)?;
                    if clear_draft {
                        state.draft.clear();
                    }
                    // A refresh may already have picked up the committed row
                    let mut messages = state.messages.clone();
                    match messages.iter_mut().find(|m| m.id == stored.id) {
                        Some(existing) => *existing = stored.clone(),
                        None => messages.push(stored.clone()),
                    }
                    state.replace(messages, self.viewer_id, self.claim_seq());
                    Ok(SendOutcome::Sent(stored))
                }
                Err(e) => {
                    state.transition(ComposerEvent::Fail)?;
                    tracing::warn!(
                        error = %e,
                        receiver_id = %message.receiver_id,
                        "Message send failed, draft kept"
                    );
                    Err(e)
                }
            }
        };

        self.changed();
        outcome
    }

    /// Mark the active conversation's unread messages as read, then refresh.
    /// Returns how many rows the store changed.
    pub async fn mark_active_read(&self) -> Result<u64> {
        let ids: Vec<Uuid> = {
            let state = self.lock();
            let Some(key) = state.active else {
                return Ok(0);
            };
            messages_in(&state.messages, &key, self.viewer_id)
                .iter()
                .filter(|m| m.is_unread_for(self.viewer_id))
                .map(|m| m.id)
                .collect()
        };
        if ids.is_empty() {
            return Ok(0);
        }

        let changed = self.store.mark_read(self.viewer_id, &ids).await?;

        {
            let mut state = self.lock();
            let mut messages = state.messages.clone();
            for message in messages.iter_mut().filter(|m| ids.contains(&m.id)) {
                message.read = true;
            }
            state.replace(messages, self.viewer_id, self.claim_seq());
        }
        self.changed();

        self.refresh().await;
        Ok(changed)
    }

    pub fn unread_total(&self) -> usize {
        unread_total(&self.lock().messages, self.viewer_id)
    }

    pub fn snapshot(&self) -> InboxSnapshot {
        let state = self.lock();
        let active_messages = state
            .active
            .map(|key| messages_in(&state.messages, &key, self.viewer_id))
            .unwrap_or_default();

        InboxSnapshot {
            conversations: state.conversations.clone(),
            active: state.active,
            active_messages,
            draft: state.draft.clone(),
            sending: state.composer.is_sending(),
            unread_total: unread_total(&state.messages, self.viewer_id),
        }
    }
}

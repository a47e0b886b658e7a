//! Inbox API handlers
//!
//! Conversations are aggregated per request from the viewer's full message list:
//! - GET  /v1/inbox                           - Conversations, most recent first
//! - GET  /v1/inbox/unread                    - Unread total
//! - GET  /v1/inbox/conversations/{key}       - One conversation's messages
//! - POST /v1/inbox/conversations/{key}/read  - Mark a conversation read

use axum::{
    extract::{Path, State},
    Json,
};
use campusnest_auth::AuthUser;
use campusnest_common::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::messages::MessageResponse;
use crate::api::middleware::MessagingState;
use crate::domain::aggregator::{aggregate, messages_in, unread_total};
use crate::domain::entities::{Conversation, ConversationKey, Message, PropertySummary, UserSummary};

/// Conversation list entry
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: ConversationKey,
    pub title: String,
    pub property: Option<PropertySummary>,
    pub counterpart: UserSummary,
    pub counterpart_name: String,
    pub last_message: Option<MessageResponse>,
    pub last_message_at: DateTime<Utc>,
    pub message_count: usize,
    pub unread_count: usize,
}

impl ConversationResponse {
    fn for_viewer(conversation: Conversation, viewer_id: Uuid) -> Self {
        let last_message = conversation
            .latest_message()
            .cloned()
            .map(|m| MessageResponse::for_viewer(m, viewer_id));

        Self {
            id: conversation.key,
            title: conversation.title().to_string(),
            counterpart_name: conversation.counterpart.display_name(),
            message_count: conversation.message_count(),
            property: conversation.property,
            counterpart: conversation.counterpart,
            last_message,
            last_message_at: conversation.last_message_at,
            unread_count: conversation.unread_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub conversations: Vec<ConversationResponse>,
    pub unread_total: usize,
}

#[derive(Debug, Serialize)]
pub struct ConversationMessagesResponse {
    pub id: ConversationKey,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked: u64,
}

#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub unread: usize,
}

/// Messages of one conversation, 404 if it has none
async fn load_conversation(
    state: &MessagingState,
    viewer_id: Uuid,
    raw_key: &str,
) -> Result<(ConversationKey, Vec<Message>)> {
    let key = ConversationKey::parse(raw_key)?;
    let messages = state.store.list_for_user(viewer_id).await?;
    let messages = messages_in(&messages, &key, viewer_id);
    if messages.is_empty() {
        return Err(Error::NotFound("Conversation not found".to_string()));
    }
    Ok((key, messages))
}

/// List the viewer's conversations
pub async fn get_inbox(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
) -> Result<Json<InboxResponse>> {
    let messages = state.store.list_for_user(ctx.user_id).await?;
    let unread_total = unread_total(&messages, ctx.user_id);

    let conversations = aggregate(&messages, ctx.user_id)
        .into_iter()
        .map(|c| ConversationResponse::for_viewer(c, ctx.user_id))
        .collect();

    Ok(Json(InboxResponse {
        conversations,
        unread_total,
    }))
}

/// Messages of one conversation, oldest first
pub async fn get_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    Path(key): Path<String>,
) -> Result<Json<ConversationMessagesResponse>> {
    let (key, messages) = load_conversation(&state, ctx.user_id, &key).await?;

    Ok(Json(ConversationMessagesResponse {
        id: key,
        messages: messages
            .into_iter()
            .map(|m| MessageResponse::for_viewer(m, ctx.user_id))
            .collect(),
    }))
}

/// Mark every unread message addressed to the viewer in a conversation as read
pub async fn mark_conversation_read(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    Path(key): Path<String>,
) -> Result<Json<MarkReadResponse>> {
    let (key, messages) = load_conversation(&state, ctx.user_id, &key).await?;

    let unread: Vec<Uuid> = messages
        .iter()
        .filter(|m| m.is_unread_for(ctx.user_id))
        .map(|m| m.id)
        .collect();
    let marked = state.store.mark_read(ctx.user_id, &unread).await?;

    tracing::debug!(conversation = %key, marked, "Conversation marked read");
    Ok(Json(MarkReadResponse { marked }))
}

/// Unread total for the launcher badge
pub async fn unread_count(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
) -> Result<Json<UnreadResponse>> {
    let messages = state.store.list_for_user(ctx.user_id).await?;
    Ok(Json(UnreadResponse {
        unread: unread_total(&messages, ctx.user_id),
    }))
}

//! Message API handlers
//!
//! - POST /v1/messages - Send a message as the authenticated viewer

use axum::{extract::State, http::StatusCode, Json};
use campusnest_auth::AuthUser;
use campusnest_common::{Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::MessagingState;
use crate::domain::entities::{Message, NewMessage};

/// Request for sending a message
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    /// Listing the message is about; absent for general inquiries
    #[serde(default)]
    pub property_id: Option<Uuid>,
    /// Trimmed and length-checked by `NewMessage::new`
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Message as seen by one viewer
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    #[serde(flatten)]
    pub message: Message,
    pub is_outgoing: bool,
}

impl MessageResponse {
    pub fn for_viewer(message: Message, viewer_id: Uuid) -> Self {
        let is_outgoing = message.is_outgoing(viewer_id);
        Self {
            message,
            is_outgoing,
        }
    }
}

/// Send a message
pub async fn send_message(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let new_message = NewMessage::new(
        ctx.user_id,
        req.receiver_id,
        req.property_id,
        &req.content,
        req.phone_number.as_deref(),
    )?;

    let created = state.store.insert(&new_message).await?;

    tracing::info!(
        message_id = %created.id,
        sender_id = %ctx.user_id,
        receiver_id = %created.receiver_id,
        "Message sent"
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::for_viewer(created, ctx.user_id)),
    ))
}

//! Route definitions for Messaging domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{inbox, messages, properties};
use super::middleware::MessagingState;

/// Create inbox routes
fn inbox_routes() -> Router<MessagingState> {
    Router::new()
        .route("/v1/inbox", get(inbox::get_inbox))
        .route("/v1/inbox/unread", get(inbox::unread_count))
        .route(
            "/v1/inbox/conversations/{key}",
            get(inbox::get_conversation),
        )
        .route(
            "/v1/inbox/conversations/{key}/read",
            post(inbox::mark_conversation_read),
        )
}

/// Create message routes
fn message_routes() -> Router<MessagingState> {
    Router::new().route("/v1/messages", post(messages::send_message))
}

/// Create landlord property routes
fn property_routes() -> Router<MessagingState> {
    Router::new().route(
        "/v1/properties/{id}/inquiries",
        get(properties::list_inquiries),
    )
}

/// Create all Messaging domain API routes
pub fn routes() -> Router<MessagingState> {
    Router::new()
        .merge(inbox_routes())
        .merge(message_routes())
        .merge(property_routes())
}

//! Landlord property inquiry handlers
//!
//! - GET /v1/properties/{id}/inquiries - Messages about one listing (owner only)

use axum::{
    extract::{Path, Query, State},
    Json,
};
use campusnest_auth::AuthUser;
use campusnest_common::{Error, Pagination, Result};
use uuid::Uuid;

use super::messages::MessageResponse;
use crate::api::middleware::MessagingState;

/// List inquiries for a property the viewer owns, newest first
pub async fn list_inquiries(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    Path(property_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<MessageResponse>>> {
    if !ctx.is_landlord() {
        return Err(Error::Authorization(
            "Only landlord accounts can view property inquiries".to_string(),
        ));
    }

    // Someone else's listing is reported exactly like a missing one
    match state.store.property_landlord(property_id).await? {
        Some(landlord_id) if landlord_id == ctx.user_id => {}
        _ => return Err(Error::NotFound("Property not found".to_string())),
    }

    let messages = state.store.list_for_property(property_id, page).await?;
    Ok(Json(
        messages
            .into_iter()
            .map(|m| MessageResponse::for_viewer(m, ctx.user_id))
            .collect(),
    ))
}

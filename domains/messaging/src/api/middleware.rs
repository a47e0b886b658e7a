//! Messaging domain state and auth backend integration

use std::sync::Arc;

use axum::extract::FromRef;
use campusnest_auth::AuthBackend;

use crate::repository::MessageStore;

/// Application state for the Messaging domain
#[derive(Clone)]
pub struct MessagingState {
    pub store: Arc<dyn MessageStore>,
    pub auth: AuthBackend,
}

impl MessagingState {
    pub fn new(store: Arc<dyn MessageStore>, auth: AuthBackend) -> Self {
        Self { store, auth }
    }
}

impl FromRef<MessagingState> for AuthBackend {
    fn from_ref(state: &MessagingState) -> Self {
        state.auth.clone()
    }
}

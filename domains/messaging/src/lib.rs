//! Messaging domain: conversation aggregation, composer, realtime refresh

pub mod api;
pub mod domain;
pub mod inbox;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::aggregator::{aggregate, conversation_key, messages_in, unread_total};
pub use domain::entities::{
    Conversation, ConversationKey, Message, NewMessage, PropertySummary, UserSummary,
    NO_PROPERTY_KEY,
};
pub use domain::state::{ComposerEvent, ComposerState, ComposerStateMachine, StateError};

// Re-export inbox types
pub use inbox::{
    InboxSession, InboxSnapshot, MessagingOverlay, OverlayBus, OverlayEvent, OverlayState,
    RealtimeHandle, RealtimeRefresh, RefreshOutcome, SendOutcome,
};

// Re-export repository types
pub use repository::{
    ChangeFeed, ChangeOp, InMemoryMessageStore, MemoryChangeFeed, MessageChange,
    MessageRepository, MessageStore, PgChangeFeed, REALTIME_CHANNEL,
};

// Re-export API types
pub use api::routes;
pub use api::MessagingState;

//! Inbox presentations: per-view session state, realtime refresh, and the
//! floating overlay with its event bus

pub mod overlay;
pub mod refresh;
pub mod session;

pub use overlay::{MessagingOverlay, OverlayBus, OverlayEvent, OverlayState};
pub use refresh::{RealtimeHandle, RealtimeRefresh};
pub use session::{InboxSession, InboxSnapshot, RefreshOutcome, SendOutcome};
